use crate::jobs::model::{EvaluationJob, FileInfo, JobStatus, JobUpdate, NewJob};
use crate::storage::entity::evaluation_job::{
    self, ActiveModel as JobActiveModel, Entity as JobEntity, Model as JobModel,
};
use crate::storage::store::{JobStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::info;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;

/// 本地 SQLite 版本的任务表，未配置托管后端时使用
pub struct JobRepository {
    db: Arc<DatabaseConnection>,
}

impl JobRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    fn new_job_id() -> String {
        let raw = format!("{:032x}", rand::random::<u128>());
        format!(
            "{}-{}-{}-{}-{}",
            &raw[0..8],
            &raw[8..12],
            &raw[12..16],
            &raw[16..20],
            &raw[20..32]
        )
    }
}

fn to_micros(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_micros()
}

fn from_micros(v: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_micros(v).unwrap_or_default()
}

impl TryFrom<JobModel> for EvaluationJob {
    type Error = StoreError;

    fn try_from(model: JobModel) -> Result<Self, Self::Error> {
        let status = model
            .status
            .parse::<JobStatus>()
            .map_err(StoreError::Invalid)?;
        let dataset_info: FileInfo = serde_json::from_str(&model.dataset_info)?;
        let model_info: FileInfo = serde_json::from_str(&model.model_info)?;
        let results = match model.results {
            Some(raw) => Some(serde_json::from_str(&raw)?),
            None => None,
        };

        Ok(EvaluationJob {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            status,
            dataset_info,
            model_info,
            results,
            report_html: model.report_html,
            summary_text: model.summary_text,
            error_message: model.error_message,
            created_at: from_micros(model.created_at),
            updated_at: from_micros(model.updated_at),
            completed_at: model.completed_at.map(from_micros),
        })
    }
}

#[async_trait]
impl JobStore for JobRepository {
    async fn list_jobs(&self, user_id: &str) -> Result<Vec<EvaluationJob>, StoreError> {
        let rows = JobEntity::find()
            .filter(evaluation_job::Column::UserId.eq(user_id))
            .order_by_desc(evaluation_job::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;
        rows.into_iter().map(EvaluationJob::try_from).collect()
    }

    async fn insert_job(&self, job: NewJob) -> Result<EvaluationJob, StoreError> {
        let now = to_micros(Utc::now());
        let active_model = JobActiveModel {
            id: Set(Self::new_job_id()),
            user_id: Set(job.user_id),
            name: Set(job.name),
            status: Set(job.status.as_str().to_string()),
            dataset_info: Set(serde_json::to_string(&job.dataset_info)?),
            model_info: Set(serde_json::to_string(&job.model_info)?),
            results: Set(None),
            report_html: Set(None),
            summary_text: Set(None),
            error_message: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            completed_at: Set(None),
        };

        let model = active_model.insert(self.db.as_ref()).await?;
        info!("本地任务已入库 [{}]: {}", model.id, model.name);
        EvaluationJob::try_from(model)
    }

    async fn update_job(&self, job_id: &str, update: JobUpdate) -> Result<(), StoreError> {
        let mut query = JobEntity::update_many()
            .col_expr(
                evaluation_job::Column::Status,
                Expr::value(update.status.as_str()),
            )
            .col_expr(
                evaluation_job::Column::UpdatedAt,
                Expr::value(to_micros(update.updated_at)),
            );

        if let Some(results) = update.results {
            query = query.col_expr(
                evaluation_job::Column::Results,
                Expr::value(results.to_string()),
            );
        }
        if let Some(html) = update.report_html {
            query = query.col_expr(evaluation_job::Column::ReportHtml, Expr::value(html));
        }
        if let Some(summary) = update.summary_text {
            query = query.col_expr(evaluation_job::Column::SummaryText, Expr::value(summary));
        }
        if let Some(message) = update.error_message {
            query = query.col_expr(evaluation_job::Column::ErrorMessage, Expr::value(message));
        }
        if let Some(done_at) = update.completed_at {
            query = query.col_expr(
                evaluation_job::Column::CompletedAt,
                Expr::value(to_micros(done_at)),
            );
        }

        let res = query
            .filter(evaluation_job::Column::Id.eq(job_id))
            .exec(self.db.as_ref())
            .await?;
        if res.rows_affected == 0 {
            return Err(StoreError::NotFound(job_id.to_string()));
        }
        Ok(())
    }

    async fn delete_job(&self, job_id: &str) -> Result<(), StoreError> {
        JobEntity::delete_by_id(job_id.to_string())
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }

    fn describe(&self) -> String {
        "local sqlite".to_string()
    }
}
