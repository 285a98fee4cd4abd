//! The `facename batch` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use facename_core::model::{Age, FacePairRecord, Gender};
use facename_core::monitor::BatchReport;
use facename_report::write_batch_report;

use super::{conditions, pairs_table};
use crate::app::App;

pub async fn execute(
    config_path: Option<PathBuf>,
    count: usize,
    age: Option<Age>,
    gender: Option<Gender>,
    html: Option<PathBuf>,
) -> Result<()> {
    let app = App::load(config_path.as_deref())?;
    let service = &app.service;

    eprintln!("Running batch of {count}...");
    let report = service
        .monitor()
        .monitor_batch(count, conditions(age, gender), move |params| async move {
            let image = service.images().generate_face_image(&params).await?;
            service.pair_from_image(image)
        })
        .await;

    let pairs: Vec<FacePairRecord> = report.results.iter().map(|m| m.value.clone()).collect();
    if !pairs.is_empty() {
        println!("{}", pairs_table(&pairs));
    }
    for failure in &report.errors {
        eprintln!("  FAIL #{}: {}", failure.index + 1, failure.error);
    }
    print_stats(&report);

    if let Some(path) = html {
        write_batch_report(&report, &path)?;
        eprintln!("HTML report: {}", path.display());
    }
    Ok(())
}

fn print_stats(report: &BatchReport<FacePairRecord>) {
    let stats = &report.stats;
    let mut table = Table::new();
    table.set_header(vec!["Succeeded", "Failed", "Error rate", "Avg response", "Total time"]);
    table.add_row(vec![
        Cell::new(stats.success_count),
        Cell::new(stats.error_count),
        Cell::new(format!("{:.1}%", stats.error_rate * 100.0)),
        Cell::new(format!("{:.0}ms", stats.average_response_time_ms)),
        Cell::new(format!("{}ms", stats.total_time_ms)),
    ]);
    println!("{table}");
}
