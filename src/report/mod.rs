pub mod export;
pub mod model;

pub use export::{export_report, ExportKind};
pub use model::{report_view, ReportMetrics, ReportView, REPORT_METRICS};
