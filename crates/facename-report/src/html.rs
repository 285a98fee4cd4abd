//! HTML report generator.
//!
//! Produces self-contained HTML files with all CSS inlined. Face images are
//! referenced by path, resolved against the caller's image root.

use anyhow::Result;
use chrono::Utc;
use std::path::Path;

use facename_core::monitor::BatchReport;
use facename_core::quiz::{Course, ResultDetail, TestResults};

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn course_title(course: Course) -> &'static str {
    match course {
        Course::A => "Course A: name to face",
        Course::B => "Course B: face to name",
    }
}

fn open_document(html: &mut String, title: &str) {
    html.push_str("<!DOCTYPE html>\n<html lang=\"ja\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!("<title>{}</title>\n", html_escape(title)));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");
}

/// Generate the results page for a finished test.
///
/// `details` are the answers joined with their pairs; `image_root` is the
/// directory the pairs' `image_uri` values are relative to.
pub fn generate_results_html(results: &TestResults, details: &[ResultDetail], image_root: &Path) -> String {
    let mut html = String::new();
    open_document(&mut html, "facename results");

    html.push_str("<header>\n");
    html.push_str("<h1>Test results</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">{} | {} questions | {}</p>\n",
        course_title(results.course),
        results.question_count,
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    html.push_str("<section class=\"dashboard\">\n");
    html.push_str(&format!(
        "<p class=\"score\">{} / {} correct</p>\n<p class=\"accuracy\">Accuracy: {}%</p>\n",
        results.correct_count,
        results.question_count,
        results.accuracy()
    ));
    html.push_str("</section>\n");

    html.push_str("<section class=\"results\">\n");
    html.push_str("<div class=\"grid\">\n");
    for detail in details {
        let class = if detail.answer.is_correct { "pass" } else { "fail" };
        let tag = if detail.answer.is_correct {
            "Correct"
        } else {
            "Incorrect"
        };
        let src = image_root.join(&detail.face.image_uri);
        let answer = if detail.answer.user_answer.is_empty() {
            "-".to_string()
        } else {
            html_escape(&detail.answer.user_answer)
        };

        html.push_str(&format!("<div class=\"card {class}\">\n"));
        html.push_str(&format!(
            "<img src=\"{}\" alt=\"{}\">\n",
            html_escape(&src.display().to_string()),
            html_escape(&detail.face.full_name())
        ));
        html.push_str(&format!(
            "<p class=\"name\">{}</p>\n",
            html_escape(&detail.face.full_name())
        ));
        html.push_str(&format!("<p class=\"answer\">Your answer: {answer}</p>\n"));
        if let Some(level) = detail.answer.match_level {
            html.push_str(&format!("<p class=\"match\">Match: {}</p>\n", level.as_str()));
        }
        html.push_str(&format!("<span class=\"tag {class}\">{tag}</span>\n"));
        html.push_str("</div>\n");
    }
    html.push_str("</div>\n</section>\n");

    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(results).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Generate the summary page for a batch generation run.
pub fn generate_batch_html<T>(report: &BatchReport<T>) -> String {
    let stats = &report.stats;
    let mut html = String::new();
    open_document(&mut html, "facename batch report");

    html.push_str("<header>\n");
    html.push_str("<h1>Batch generation</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">{} succeeded | {} failed | {}</p>\n",
        stats.success_count,
        stats.error_count,
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Total time</th><th>Avg response</th><th>Error rate</th></tr></thead>\n");
    html.push_str(&format!(
        "<tbody><tr><td>{}ms</td><td>{:.0}ms</td><td>{:.1}%</td></tr></tbody>\n",
        stats.total_time_ms,
        stats.average_response_time_ms,
        stats.error_rate * 100.0
    ));
    html.push_str("</table>\n");
    if !report.results.is_empty() {
        let timings: Vec<(String, u64)> = report
            .results
            .iter()
            .map(|m| (m.record.id.clone(), m.record.performance.response_time_ms))
            .collect();
        html.push_str(&generate_bar_chart(&timings));
    }
    html.push_str("</section>\n");

    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Items</h2>\n");
    html.push_str("<table class=\"results-table\">\n");
    html.push_str("<thead><tr><th>Record</th><th>Age</th><th>Gender</th><th>Status</th><th>Response</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for item in &report.results {
        let params = &item.record.request_params;
        html.push_str(&format!(
            "<tr class=\"pass\"><td>{}</td><td>{}</td><td>{}</td><td>OK</td><td>{}ms</td></tr>\n",
            html_escape(&item.record.id),
            params.age.map(|a| a.to_string()).unwrap_or_else(|| "-".into()),
            params.gender.map(|g| g.as_str()).unwrap_or("-"),
            item.record.performance.response_time_ms
        ));
    }
    for failure in &report.errors {
        html.push_str(&format!(
            "<tr class=\"fail\"><td>#{}</td><td>{}</td><td>{}</td><td>FAIL</td><td>{}</td></tr>\n",
            failure.index + 1,
            failure.params.age.map(|a| a.to_string()).unwrap_or_else(|| "-".into()),
            failure.params.gender.map(|g| g.as_str()).unwrap_or("-"),
            html_escape(&failure.error.to_string())
        ));
    }
    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write a results page to a file.
pub fn write_results_report(
    results: &TestResults,
    details: &[ResultDetail],
    image_root: &Path,
    path: &Path,
) -> Result<()> {
    write_file(path, &generate_results_html(results, details, image_root))
}

/// Write a batch page to a file.
pub fn write_batch_report<T>(report: &BatchReport<T>, path: &Path) -> Result<()> {
    write_file(path, &generate_batch_html(report))
}

fn write_file(path: &Path, html: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

fn generate_bar_chart(timings: &[(String, u64)]) -> String {
    let bar_height = 24;
    let max_width = 400;
    let padding = 8;
    let label_width = 320;

    let slowest = timings.iter().map(|(_, ms)| *ms).max().unwrap_or(0).max(1);
    let total_height = timings.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 80,
        total_height
    );

    for (i, (label, ms)) in timings.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let width = (*ms as f64 / slowest as f64 * max_width as f64) as usize;

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(label)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"#3b82f6\" rx=\"4\"/>\n",
            label_width, y, width, bar_height
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{}ms</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            ms
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Hiragino Sans', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
.score { font-size: 2rem; font-weight: bold; margin: 0.5rem 0; }
.accuracy { font-size: 1.25rem; margin: 0; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); }
.grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(200px, 1fr)); gap: 1rem; }
.card { border: 1px solid var(--border); border-radius: 8px; padding: 0.75rem; }
.card img { width: 100%; border-radius: 4px; }
.name { font-weight: bold; margin: 0.5rem 0 0.25rem; }
.answer, .match { margin: 0.25rem 0; color: #6b7280; }
.tag { display: inline-block; padding: 0.1rem 0.5rem; border-radius: 4px; font-size: 0.85rem; }
.pass { background: var(--pass); }
.fail { background: var(--fail); }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;
