//! The `facename stats` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use facename_core::history::ProgressHistory;
use facename_providers::load_config_from;

use crate::app::open_stores;

/// Monitoring records summarized.
const MONITORING_WINDOW: usize = 100;

pub fn execute(config_path: Option<PathBuf>, limit: usize) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let (faces, monitoring) = open_stores(&config)?;
    let history = ProgressHistory::load(config.history_path())?;

    println!("Stored pairs: {}", faces.count_faces()?);
    println!("Test runs:    {}", history.run_count());
    if let Some(avg) = history.average_accuracy() {
        println!("Avg accuracy: {avg:.1}%");
    }

    let recent = history.recent(limit);
    if !recent.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Date", "Course", "Score", "Accuracy"]);
        for run in recent {
            table.add_row(vec![
                Cell::new(run.timestamp.format("%Y-%m-%d %H:%M")),
                Cell::new(run.course.to_string().to_uppercase()),
                Cell::new(format!("{}/{}", run.correct_count, run.question_count)),
                Cell::new(format!("{}%", run.accuracy)),
            ]);
        }
        println!("\nRecent runs\n{table}");
    }

    let weakest = history.weakest(limit);
    if !weakest.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Name", "Attempts", "Correct", "Weakness", "Last seen"]);
        for (_, stats) in weakest {
            table.add_row(vec![
                Cell::new(&stats.name),
                Cell::new(stats.attempts),
                Cell::new(stats.correct),
                Cell::new(format!("{:.0}%", stats.weakness_score * 100.0)),
                Cell::new(stats.last_seen.format("%Y-%m-%d")),
            ]);
        }
        println!("\nFaces to practice\n{table}");
    }

    let records = monitoring.recent_monitoring(MONITORING_WINDOW)?;
    if !records.is_empty() {
        let ok: Vec<u64> = records
            .iter()
            .filter(|r| r.performance.success)
            .map(|r| r.performance.response_time_ms)
            .collect();
        let avg = if ok.is_empty() {
            0.0
        } else {
            ok.iter().sum::<u64>() as f64 / ok.len() as f64
        };
        println!(
            "\nGenerations (last {}): {} ok, {} failed, avg response {avg:.0}ms",
            records.len(),
            ok.len(),
            records.len() - ok.len()
        );
    }

    Ok(())
}
