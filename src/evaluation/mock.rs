use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 运行结束时写回任务表、并交给报告页的模拟结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MockResults {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    #[serde(rename = "f1Score")]
    pub f1_score: f64,
    #[serde(rename = "completedAt")]
    pub completed_at: DateTime<Utc>,
}

impl MockResults {
    pub fn at(completed_at: DateTime<Utc>) -> Self {
        Self {
            accuracy: 0.874,
            precision: 0.891,
            recall: 0.862,
            f1_score: 0.876,
            completed_at,
        }
    }

    pub fn report_html(&self) -> String {
        format!(
            "<html><body><h1>Evaluation Report</h1><p>Accuracy: {}</p></body></html>",
            self.accuracy
        )
    }

    pub fn summary(&self) -> String {
        format!(
            "Model achieved {:.1}% accuracy with strong precision and recall scores.",
            self.accuracy * 100.0
        )
    }
}
