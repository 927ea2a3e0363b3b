use crate::jobs::model::{EvaluationJob, JobUpdate, NewJob};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed row: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid row: {0}")]
    Invalid(String),
    #[error("job not found: {0}")]
    NotFound(String),
    #[error("no signed-in user")]
    Unauthenticated,
}

/// `evaluation_jobs` 表的读写契约（托管 REST 或本地 SQLite）
#[async_trait]
pub trait JobStore: Send + Sync {
    /// 按 user_id 过滤，created_at 倒序
    async fn list_jobs(&self, user_id: &str) -> Result<Vec<EvaluationJob>, StoreError>;

    async fn insert_job(&self, job: NewJob) -> Result<EvaluationJob, StoreError>;

    async fn update_job(&self, job_id: &str, update: JobUpdate) -> Result<(), StoreError>;

    async fn delete_job(&self, job_id: &str) -> Result<(), StoreError>;

    fn describe(&self) -> String;
}
