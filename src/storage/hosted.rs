use crate::jobs::model::{EvaluationJob, JobUpdate, NewJob};
use crate::session::urls::url_evaluation_jobs;
use crate::session::{AuthError, HostedSession};
use crate::storage::store::{JobStore, StoreError};
use async_trait::async_trait;
use log::info;
use reqwest::Response;
use serde_json::Value;
use std::sync::Arc;

impl From<AuthError> for StoreError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Http(err) => StoreError::Http(err),
            AuthError::Rejected { status, body } => StoreError::Status { status, body },
            AuthError::NotSignedIn | AuthError::MissingUser | AuthError::MissingCredentials => {
                StoreError::Unauthenticated
            }
        }
    }
}

/// 托管 `evaluation_jobs` 表（PostgREST 风格接口）
pub struct HostedJobStore {
    session: Arc<HostedSession>,
}

pub fn list_query(user_id: &str) -> Vec<(&'static str, String)> {
    vec![
        ("select", "*".to_string()),
        ("user_id", format!("eq.{}", user_id)),
        ("order", "created_at.desc".to_string()),
    ]
}

pub fn id_filter(job_id: &str) -> Vec<(&'static str, String)> {
    vec![("id", format!("eq.{}", job_id))]
}

async fn expect_success(resp: Response) -> Result<Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        body,
    })
}

impl HostedJobStore {
    pub fn new(session: Arc<HostedSession>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl JobStore for HostedJobStore {
    async fn list_jobs(&self, user_id: &str) -> Result<Vec<EvaluationJob>, StoreError> {
        let url = url_evaluation_jobs(self.session.base_url());
        let query = list_query(user_id);
        let resp = self
            .session
            .request(|client| client.get(&url).query(&query))
            .await?;
        let resp = expect_success(resp).await?;
        Ok(resp.json::<Vec<EvaluationJob>>().await?)
    }

    async fn insert_job(&self, job: NewJob) -> Result<EvaluationJob, StoreError> {
        let url = url_evaluation_jobs(self.session.base_url());
        let resp = self
            .session
            .request(|client| {
                client
                    .post(&url)
                    .header("Prefer", "return=representation")
                    .json(&job)
            })
            .await?;
        let resp = expect_success(resp).await?;
        let mut rows = resp.json::<Vec<EvaluationJob>>().await?;
        if rows.is_empty() {
            return Err(StoreError::Invalid("insert returned no row".to_string()));
        }
        let created = rows.remove(0);
        info!("托管任务已创建 [{}]: {}", created.id, created.name);
        Ok(created)
    }

    async fn update_job(&self, job_id: &str, update: JobUpdate) -> Result<(), StoreError> {
        let url = url_evaluation_jobs(self.session.base_url());
        let query = id_filter(job_id);
        let resp = self
            .session
            .request(|client| {
                client
                    .patch(&url)
                    .query(&query)
                    .header("Prefer", "return=representation")
                    .json(&update)
            })
            .await?;
        let resp = expect_success(resp).await?;
        let rows = resp.json::<Vec<Value>>().await?;
        if rows.is_empty() {
            return Err(StoreError::NotFound(job_id.to_string()));
        }
        Ok(())
    }

    async fn delete_job(&self, job_id: &str) -> Result<(), StoreError> {
        let url = url_evaluation_jobs(self.session.base_url());
        let query = id_filter(job_id);
        let resp = self
            .session
            .request(|client| client.delete(&url).query(&query))
            .await?;
        expect_success(resp).await?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("hosted {}", self.session.base_url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::model::JobStatus;
    use crate::session::hosted_session::tests::{header, http, serve, session_at, token_body};
    use crate::session::Authenticator;
    use serde_json::json;

    fn row(id: &str, status: &str) -> Value {
        json!({
            "id": id,
            "user_id": "u1",
            "name": "nightly",
            "status": status,
            "dataset_info": {"name": "cats.zip", "size": 5120, "type": "application/zip"},
            "model_info": {"name": "net.h5", "size": 2048, "type": ""},
            "created_at": "2024-05-01T10:00:00+00:00",
            "updated_at": "2024-05-01T10:00:00+00:00"
        })
    }

    async fn signed_in_store(
        responses: Vec<String>,
    ) -> (HostedJobStore, Arc<std::sync::Mutex<Vec<String>>>) {
        let mut all = vec![http("200 OK", &token_body("access-1", "refresh-1", "u1"))];
        all.extend(responses);
        let (base, seen) = serve(all).await;
        let session = Arc::new(session_at(&base, 3));
        session.sign_in("ana@example.com", "pw").await.unwrap();
        (HostedJobStore::new(session), seen)
    }

    #[tokio::test]
    async fn lists_owner_rows_with_auth_headers() {
        let body = json!([row("j2", "pending"), row("j1", "completed")]).to_string();
        let (store, seen) = signed_in_store(vec![http("200 OK", &body)]).await;

        let jobs = store.list_jobs("u1").await.unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].id, "j2");
        assert_eq!(jobs[1].status, JobStatus::Completed);

        let seen = seen.lock().unwrap();
        let request = &seen[1];
        assert!(request.starts_with("GET /rest/v1/evaluation_jobs?"));
        assert!(request.contains("user_id=eq.u1"));
        assert!(request.contains("order=created_at.desc"));
        assert_eq!(header(request, "authorization"), Some("Bearer access-1"));
        assert_eq!(header(request, "apikey"), Some("anon-key"));
    }

    #[tokio::test]
    async fn insert_asks_for_the_created_row() {
        let body = json!([row("j9", "pending")]).to_string();
        let (store, seen) = signed_in_store(vec![http("201 Created", &body)]).await;

        let created = store
            .insert_job(NewJob::pending("u1", "nightly", Default::default(), Default::default()))
            .await
            .unwrap();
        assert_eq!(created.id, "j9");

        let seen = seen.lock().unwrap();
        assert!(seen[1].starts_with("POST /rest/v1/evaluation_jobs "));
        assert_eq!(header(&seen[1], "prefer"), Some("return=representation"));
        assert!(seen[1].contains(r#""status":"pending""#));
    }

    #[tokio::test]
    async fn patch_matching_no_row_is_not_found() {
        let (store, seen) = signed_in_store(vec![http("200 OK", "[]")]).await;

        let err = store
            .update_job("missing", JobUpdate::status(JobStatus::Running))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(id) if id == "missing"));
        let seen = seen.lock().unwrap();
        assert!(seen[1].starts_with("PATCH /rest/v1/evaluation_jobs?id=eq.missing "));
    }

    #[tokio::test]
    async fn error_status_surfaces_as_store_error() {
        let (store, _seen) =
            signed_in_store(vec![http("500 Internal Server Error", r#"{"message":"boom"}"#)]).await;
        let err = store.delete_job("j1").await.unwrap_err();
        assert!(matches!(err, StoreError::Status { status: 500, .. }));
    }

    #[test]
    fn list_filters_by_owner_newest_first() {
        let q = list_query("user-1");
        assert!(q.contains(&("user_id", "eq.user-1".to_string())));
        assert!(q.contains(&("order", "created_at.desc".to_string())));
        assert!(q.contains(&("select", "*".to_string())));
        assert_eq!(id_filter("j1"), vec![("id", "eq.j1".to_string())]);
    }

    #[test]
    fn decodes_hosted_rows() {
        let rows = json!([{
            "id": "b9d1c1e2-0000-4000-8000-000000000001",
            "user_id": "user-1",
            "name": "resnet check",
            "status": "completed",
            "dataset_info": {"name": "cats.zip", "size": 5120, "type": "application/zip"},
            "model_info": {"name": "resnet.keras", "size": 2048, "type": ""},
            "results": {"accuracy": 0.874},
            "report_html": "<html></html>",
            "summary_text": null,
            "error_message": null,
            "created_at": "2024-05-01T10:00:00.123456+00:00",
            "updated_at": "2024-05-01T10:01:00+00:00",
            "completed_at": "2024-05-01T10:01:00+00:00"
        }]);
        let jobs: Vec<EvaluationJob> = serde_json::from_value(rows).unwrap();
        assert_eq!(jobs.len(), 1);
        let job = &jobs[0];
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.dataset_info.size, 5120);
        assert_eq!(job.results, Some(json!({"accuracy": 0.874})));
        assert!(job.summary_text.is_none());
        assert!(job.completed_at.is_some());
    }

    #[test]
    fn insert_body_carries_owner_and_pending_status() {
        let job = NewJob::pending(
            "user-1",
            "job",
            Default::default(),
            Default::default(),
        );
        let body = serde_json::to_value(&job).unwrap();
        assert_eq!(body["user_id"], json!("user-1"));
        assert_eq!(body["status"], json!("pending"));
        assert!(body.get("dataset_info").is_some());
    }

    #[test]
    fn auth_errors_map_to_store_errors() {
        let e: StoreError = AuthError::NotSignedIn.into();
        assert!(matches!(e, StoreError::Unauthenticated));
        let e: StoreError = AuthError::Rejected {
            status: 403,
            body: "nope".into(),
        }
        .into();
        assert!(matches!(e, StoreError::Status { status: 403, .. }));
    }
}
