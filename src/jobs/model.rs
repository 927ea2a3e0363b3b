use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// 一次运行内状态只能前进：pending -> running -> completed/failed
    pub fn can_advance_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Running)
                | (JobStatus::Pending, JobStatus::Failed)
                | (JobStatus::Running, JobStatus::Completed)
                | (JobStatus::Running, JobStatus::Failed)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(JobStatus::Pending),
            "running" => Ok(JobStatus::Running),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(format!("unknown job status: {}", other)),
        }
    }
}

/// 上传文件的元数据（name/size/type），不包含文件内容
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct FileInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub size: u64,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub mime: String,
}

/// 托管表里的 json 列可能为 null 或缺字段，一律按空值处理
fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationJob {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub name: String,
    pub status: JobStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dataset_info: FileInfo,
    #[serde(default, deserialize_with = "null_as_default")]
    pub model_info: FileInfo,
    #[serde(default)]
    pub results: Option<Value>,
    #[serde(default)]
    pub report_html: Option<String>,
    #[serde(default)]
    pub summary_text: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// 插入新任务时写入的字段
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewJob {
    pub user_id: String,
    pub name: String,
    pub dataset_info: FileInfo,
    pub model_info: FileInfo,
    pub status: JobStatus,
}

impl NewJob {
    pub fn pending(user_id: &str, name: &str, dataset_info: FileInfo, model_info: FileInfo) -> Self {
        Self {
            user_id: user_id.to_string(),
            name: name.trim().to_string(),
            dataset_info,
            model_info,
            status: JobStatus::Pending,
        }
    }
}

/// update-status 的补丁：status/updated_at 必写，其余字段只在提供时写入
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct JobUpdate {
    pub status: JobStatus,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobUpdate {
    pub fn status(status: JobStatus) -> Self {
        Self::status_at(status, Utc::now())
    }

    pub fn status_at(status: JobStatus, now: DateTime<Utc>) -> Self {
        Self {
            status,
            updated_at: now,
            results: None,
            report_html: None,
            summary_text: None,
            error_message: None,
            completed_at: (status == JobStatus::Completed).then_some(now),
        }
    }

    pub fn with_results(mut self, results: Value) -> Self {
        if !results.is_null() {
            self.results = Some(results);
        }
        self
    }

    pub fn with_report_html(mut self, html: impl Into<String>) -> Self {
        self.report_html = Some(html.into()).filter(|s: &String| !s.is_empty());
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary_text = Some(summary.into()).filter(|s: &String| !s.is_empty());
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into()).filter(|s: &String| !s.is_empty());
        self
    }
}
