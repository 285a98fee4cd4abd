//! Self-contained HTML reports.

pub mod html;

pub use html::{generate_batch_html, generate_results_html, write_batch_report, write_results_report};
