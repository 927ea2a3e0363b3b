use super::model::{corruption_label, percent, ReportMetrics};
use crate::evaluation::MockResults;
use log::info;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no report available")]
    NoReport,
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Html,
    Summary,
}

impl ExportKind {
    pub fn file_name(&self, results: &MockResults) -> String {
        let stamp = results.completed_at.format("%Y%m%d-%H%M%S");
        match self {
            ExportKind::Html => format!("evaluation-report-{}.html", stamp),
            ExportKind::Summary => format!("evaluation-summary-{}.txt", stamp),
        }
    }
}

pub fn render_html(metrics: &ReportMetrics, results: &MockResults) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>Evaluation Report</title></head><body>\n");
    html.push_str("<h1>Evaluation Report</h1>\n");
    let _ = writeln!(html, "<p>{}</p>", results.summary());
    let _ = writeln!(html, "<p>Completed at {}</p>", results.completed_at.to_rfc3339());

    html.push_str("<h2>Key Metrics</h2>\n<ul>\n");
    for card in metrics.key_metrics() {
        let _ = writeln!(html, "<li>{}: {} ({})</li>", card.title, card.value, card.change);
    }
    html.push_str("</ul>\n");

    html.push_str("<h2>Per-Class Performance</h2>\n<table>\n<tr><th>Class</th><th>Precision</th><th>Recall</th><th>F1</th><th>Support</th></tr>\n");
    for c in &metrics.per_class {
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            c.class,
            percent(c.precision),
            percent(c.recall),
            percent(c.f1),
            c.support
        );
    }
    html.push_str("</table>\n");

    html.push_str("<h2>Robustness Analysis</h2>\n<ul>\n");
    for (key, acc) in &metrics.robustness {
        let _ = writeln!(html, "<li>{}: {}</li>", corruption_label(key), percent(*acc));
    }
    html.push_str("</ul>\n");

    let e = &metrics.efficiency;
    let _ = writeln!(
        html,
        "<h2>Model Efficiency</h2>\n<ul><li>Model Size: {}</li><li>Parameters: {}</li><li>Inference Time: {}</li><li>Memory Usage: {}</li></ul>",
        e.model_size, e.parameters, e.inference_time, e.memory_usage
    );

    let cal = &metrics.calibration;
    let _ = writeln!(
        html,
        "<h2>Model Calibration</h2>\n<ul><li>Brier Score: {:.3}</li><li>Expected Calibration Error: {:.3}</li><li>Confidence-Accuracy: {}</li></ul>",
        cal.brier_score,
        cal.ece,
        percent(cal.confidence_accuracy)
    );
    html.push_str("</body></html>\n");
    html
}

pub fn render_summary(metrics: &ReportMetrics, results: &MockResults) -> String {
    let o = &metrics.overall;
    let mut text = String::new();
    let _ = writeln!(text, "Model Evaluation Summary");
    let _ = writeln!(text, "Completed: {}", results.completed_at.to_rfc3339());
    let _ = writeln!(text);
    let _ = writeln!(text, "{}", results.summary());
    let _ = writeln!(text);
    let _ = writeln!(text, "Accuracy:  {}", percent(o.accuracy));
    let _ = writeln!(text, "Precision: {}", percent(o.precision));
    let _ = writeln!(text, "Recall:    {}", percent(o.recall));
    let _ = writeln!(text, "F1 Score:  {}", percent(o.f1_score));
    let _ = writeln!(text, "Inference: {}", metrics.efficiency.inference_time);
    text
}

/// 写出报告文件，返回文件路径
pub fn export_report(
    dir: &Path,
    kind: ExportKind,
    metrics: &ReportMetrics,
    results: Option<&MockResults>,
) -> Result<PathBuf, ExportError> {
    let results = results.ok_or(ExportError::NoReport)?;
    let io_err = |path: &Path| {
        let path = path.display().to_string();
        move |source| ExportError::Io { path, source }
    };

    std::fs::create_dir_all(dir).map_err(io_err(dir))?;
    let path = dir.join(kind.file_name(results));
    let body = match kind {
        ExportKind::Html => render_html(metrics, results),
        ExportKind::Summary => render_summary(metrics, results),
    };
    std::fs::write(&path, body).map_err(io_err(&path))?;
    info!("📄 报告已导出: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::model::REPORT_METRICS;
    use chrono::{TimeZone, Utc};

    fn results() -> MockResults {
        MockResults::at(Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap())
    }

    #[test]
    fn html_contains_dashboard_sections() {
        let html = render_html(&REPORT_METRICS, &results());
        assert!(html.contains("<h1>Evaluation Report</h1>"));
        assert!(html.contains("<td>Class B</td><td>84.7%</td>"));
        assert!(html.contains("Motion blur: 68.1%"));
        assert!(html.contains("Brier Score: 0.089"));
    }

    #[test]
    fn summary_lists_overall_metrics() {
        let text = render_summary(&REPORT_METRICS, &results());
        assert!(text.contains("Accuracy:  87.4%"));
        assert!(text.contains("F1 Score:  87.6%"));
    }

    #[test]
    fn export_writes_named_file() {
        let dir = std::env::temp_dir().join(format!("mleval-report-{}", rand::random::<u32>()));
        let path = export_report(&dir, ExportKind::Summary, &REPORT_METRICS, Some(&results())).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            "evaluation-summary-20240501-123000.txt"
        );
        assert!(std::fs::read_to_string(&path).unwrap().starts_with("Model Evaluation Summary"));
    }

    #[test]
    fn export_without_report_fails() {
        let err = export_report(Path::new("unused"), ExportKind::Html, &REPORT_METRICS, None).unwrap_err();
        assert!(matches!(err, ExportError::NoReport));
    }
}
