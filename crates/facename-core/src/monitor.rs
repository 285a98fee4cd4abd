//! Generation monitoring: latency measurement, success/failure records and
//! batch statistics.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::{Result, TrainerError};
use crate::model::{
    Distributions, ErrorDetails, MonitoringRecord, PairConditions, Performance, QualityMetrics,
    RequestParams,
};
use crate::traits::MonitoringStore;

/// A value produced under monitoring, with the record that describes the call.
#[derive(Debug, Clone)]
pub struct Monitored<T> {
    pub value: T,
    pub record: MonitoringRecord,
}

/// One failed item of a batch.
#[derive(Debug)]
pub struct BatchFailure {
    /// Zero-based position in the batch.
    pub index: usize,
    pub params: RequestParams,
    pub error: TrainerError,
}

/// Aggregate figures for a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BatchStats {
    pub total_time_ms: u64,
    /// Mean over successful items; 0 when nothing succeeded.
    pub average_response_time_ms: f64,
    /// `error_count / count`; 0 for an empty batch.
    pub error_rate: f64,
    pub success_count: usize,
    pub error_count: usize,
}

/// Outcome of [`GenerationMonitor::monitor_batch`].
#[derive(Debug)]
pub struct BatchReport<T> {
    pub results: Vec<Monitored<T>>,
    pub errors: Vec<BatchFailure>,
    pub stats: BatchStats,
}

/// Records one monitoring entry per wrapped generation call.
pub struct GenerationMonitor {
    store: Arc<dyn MonitoringStore>,
    distributions: Distributions,
}

impl GenerationMonitor {
    pub fn new(store: Arc<dyn MonitoringStore>, distributions: Distributions) -> Self {
        Self {
            store,
            distributions,
        }
    }

    /// Run `generate` with `params`, record the outcome, and return it.
    ///
    /// Errors from `generate` are returned unchanged after being recorded.
    pub async fn monitor<T, F, Fut>(&self, params: RequestParams, generate: F) -> Result<Monitored<T>>
    where
        F: FnOnce(RequestParams) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let start = Instant::now();
        let outcome = generate(params).await;
        let response_time_ms = start.elapsed().as_millis() as u64;

        let record = match &outcome {
            Ok(_) => success_record(params, response_time_ms),
            Err(e) => failure_record(params, response_time_ms, e),
        };
        self.persist(&record);

        outcome.map(|value| Monitored { value, record })
    }

    /// Run `count` monitored generations one after another.
    ///
    /// Buckets fixed in `conditions` are used for every item; open buckets are
    /// drawn from the distributions per item. Failures are collected and the
    /// batch carries on.
    pub async fn monitor_batch<T, F, Fut>(
        &self,
        count: usize,
        conditions: PairConditions,
        mut generate: F,
    ) -> BatchReport<T>
    where
        F: FnMut(RequestParams) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let start = Instant::now();
        let mut results = Vec::new();
        let mut errors = Vec::new();

        for index in 0..count {
            let params = self.draw_params(&conditions);
            match self.monitor(params, &mut generate).await {
                Ok(monitored) => results.push(monitored),
                Err(e) => {
                    error!(index, "batch item failed: {e}");
                    errors.push(BatchFailure {
                        index,
                        params,
                        error: e,
                    });
                }
            }
        }

        let stats = batch_stats(count, start.elapsed().as_millis() as u64, &results, errors.len());
        info!(
            count,
            success = stats.success_count,
            errors = stats.error_count,
            total_time_ms = stats.total_time_ms,
            "batch finished"
        );
        BatchReport {
            results,
            errors,
            stats,
        }
    }

    fn draw_params(&self, conditions: &PairConditions) -> RequestParams {
        let mut rng = rand::thread_rng();
        let (age, gender) = self
            .distributions
            .resolve(conditions.age, conditions.gender, &mut rng);
        RequestParams::new(age, gender)
    }

    fn persist(&self, record: &MonitoringRecord) {
        if let Err(e) = self.store.save_monitoring(record) {
            warn!(id = %record.id, "failed to save monitoring record: {e:#}");
        }
    }
}

fn new_record_id() -> String {
    format!("mon_{}", uuid::Uuid::new_v4())
}

fn success_record(params: RequestParams, response_time_ms: u64) -> MonitoringRecord {
    let mut rng = rand::thread_rng();
    MonitoringRecord {
        id: new_record_id(),
        timestamp: Utc::now(),
        request_params: params,
        performance: Performance {
            response_time_ms,
            success: true,
        },
        quality: Some(QualityMetrics {
            quality_score: rng.gen_range(0.85..1.0),
            prompt_compliance: rng.gen_range(0.9..1.0),
        }),
        errors: None,
    }
}

fn failure_record(params: RequestParams, response_time_ms: u64, err: &TrainerError) -> MonitoringRecord {
    MonitoringRecord {
        id: new_record_id(),
        timestamp: Utc::now(),
        request_params: params,
        performance: Performance {
            response_time_ms,
            success: false,
        },
        quality: None,
        errors: Some(ErrorDetails {
            message: err.to_string(),
            trace: error_chain(err),
        }),
    }
}

/// Source chain of `err` below the top-level message, joined with " <- ".
fn error_chain(err: &TrainerError) -> Option<String> {
    let mut sources = Vec::new();
    let mut current = std::error::Error::source(err);
    while let Some(source) = current {
        sources.push(source.to_string());
        current = std::error::Error::source(source);
    }
    if sources.is_empty() {
        None
    } else {
        Some(sources.join(" <- "))
    }
}

fn batch_stats<T>(count: usize, total_time_ms: u64, results: &[Monitored<T>], error_count: usize) -> BatchStats {
    let success_count = results.len();
    let average_response_time_ms = if success_count == 0 {
        0.0
    } else {
        let sum: u64 = results
            .iter()
            .map(|r| r.record.performance.response_time_ms)
            .sum();
        sum as f64 / success_count as f64
    };
    let error_rate = if count == 0 {
        0.0
    } else {
        error_count as f64 / count as f64
    };
    BatchStats {
        total_time_ms,
        average_response_time_ms,
        error_rate,
        success_count,
        error_count,
    }
}
