use crate::app_state::{AppEvent, Toast};
use crate::jobs::model::{EvaluationJob, FileInfo, JobUpdate, NewJob};
use crate::session::UserIdentity;
use crate::storage::JobStore;
use log::{error, info};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

/// 任务表的 CRUD 封装，按当前用户过滤
///
/// 每次写操作之后都会重新拉取完整列表并推送给 UI。
/// 所有失败都在这里记录日志并转成通知，调用方只拿到 Option/bool。
pub struct JobService {
    store: Arc<dyn JobStore>,
    user: RwLock<Option<UserIdentity>>,
    evt_tx: mpsc::UnboundedSender<AppEvent>,
}

impl JobService {
    pub fn new(store: Arc<dyn JobStore>, evt_tx: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self {
            store,
            user: RwLock::new(None),
            evt_tx,
        }
    }

    #[cfg(test)]
    pub fn event_sender(&self) -> mpsc::UnboundedSender<AppEvent> {
        self.evt_tx.clone()
    }

    pub fn store_name(&self) -> String {
        self.store.describe()
    }

    async fn user_id(&self) -> Option<String> {
        self.user.read().await.as_ref().map(|u| u.id.clone())
    }

    /// 切换当前用户；有用户时立即拉取任务，退出时清空列表
    pub async fn set_user(&self, user: Option<UserIdentity>) {
        let signed_in = user.is_some();
        *self.user.write().await = user;
        if signed_in {
            self.fetch_jobs().await;
        } else {
            let _ = self.evt_tx.send(AppEvent::Jobs(Vec::new()));
        }
    }

    pub async fn fetch_jobs(&self) -> Option<Vec<EvaluationJob>> {
        let user_id = self.user_id().await?;

        let _ = self.evt_tx.send(AppEvent::JobsLoading(true));
        let result = self.store.list_jobs(&user_id).await;
        let _ = self.evt_tx.send(AppEvent::JobsLoading(false));

        match result {
            Ok(jobs) => {
                let _ = self.evt_tx.send(AppEvent::Jobs(jobs.clone()));
                Some(jobs)
            }
            Err(e) => {
                error!("Error fetching evaluation jobs: {}", e);
                self.notify(Toast::error("Error", "Failed to load evaluation jobs"));
                None
            }
        }
    }

    pub async fn create_job(
        &self,
        name: &str,
        dataset_info: FileInfo,
        model_info: FileInfo,
    ) -> Option<EvaluationJob> {
        let user_id = self.user_id().await?;

        let new_job = NewJob::pending(&user_id, name, dataset_info, model_info);
        match self.store.insert_job(new_job).await {
            Ok(job) => {
                info!("✓ 评估任务已创建 [{}]: {}", job.id, job.name);
                self.notify(Toast::info("Success", "Evaluation job created successfully"));
                self.fetch_jobs().await;
                Some(job)
            }
            Err(e) => {
                error!("Error creating evaluation job: {}", e);
                self.notify(Toast::error("Error", "Failed to create evaluation job"));
                None
            }
        }
    }

    pub async fn update_job_status(&self, job_id: &str, update: JobUpdate) -> bool {
        let status = update.status;
        match self.store.update_job(job_id, update).await {
            Ok(()) => {
                info!("任务状态更新 [{}]: {}", job_id, status);
                self.fetch_jobs().await;
                true
            }
            Err(e) => {
                error!("Error updating job status: {}", e);
                self.notify(Toast::error("Error", "Failed to update job status"));
                false
            }
        }
    }

    pub async fn delete_job(&self, job_id: &str) -> bool {
        match self.store.delete_job(job_id).await {
            Ok(()) => {
                info!("任务已删除 [{}]", job_id);
                self.notify(Toast::info("Success", "Evaluation job deleted successfully"));
                self.fetch_jobs().await;
                true
            }
            Err(e) => {
                error!("Error deleting evaluation job: {}", e);
                self.notify(Toast::error("Error", "Failed to delete evaluation job"));
                false
            }
        }
    }

    fn notify(&self, toast: Toast) {
        let _ = self.evt_tx.send(AppEvent::Toast(toast));
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::app_state::ToastVariant;
    use crate::jobs::model::JobStatus;
    use crate::storage::store::StoreError;
    use crate::storage::{establish_connection, JobRepository};
    use async_trait::async_trait;

    pub(crate) async fn memory_service() -> (Arc<JobService>, mpsc::UnboundedReceiver<AppEvent>) {
        let db = establish_connection("sqlite::memory:").await.unwrap();
        let store: Arc<dyn JobStore> = Arc::new(JobRepository::new(Arc::new(db)));
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(JobService::new(store, tx)), rx)
    }

    pub(crate) fn user(id: &str) -> UserIdentity {
        UserIdentity {
            id: id.to_string(),
            email: None,
        }
    }

    pub(crate) fn drain(rx: &mut mpsc::UnboundedReceiver<AppEvent>) -> Vec<AppEvent> {
        let mut out = Vec::new();
        while let Ok(evt) = rx.try_recv() {
            out.push(evt);
        }
        out
    }

    fn dataset() -> FileInfo {
        FileInfo {
            name: "data.tar.gz".into(),
            size: 4096,
            mime: "application/gzip".into(),
        }
    }

    fn model() -> FileInfo {
        FileInfo {
            name: "model.keras".into(),
            size: 1024,
            mime: "application/octet-stream".into(),
        }
    }

    fn job_lists(events: &[AppEvent]) -> Vec<usize> {
        events
            .iter()
            .filter_map(|e| match e {
                AppEvent::Jobs(list) => Some(list.len()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn no_user_means_no_calls() {
        let (svc, mut rx) = memory_service().await;
        assert!(svc.fetch_jobs().await.is_none());
        assert!(svc.create_job("x", dataset(), model()).await.is_none());
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn create_refetches_and_notifies() {
        let (svc, mut rx) = memory_service().await;
        svc.set_user(Some(user("alice"))).await;
        drain(&mut rx);

        let job = svc.create_job("First run", dataset(), model()).await.unwrap();
        assert_eq!(job.status, JobStatus::Pending);

        let events = drain(&mut rx);
        assert_eq!(job_lists(&events), vec![1]);
        assert!(events.iter().any(|e| matches!(
            e,
            AppEvent::Toast(t) if t.description == "Evaluation job created successfully"
                && t.variant == ToastVariant::Default
        )));
    }

    #[tokio::test]
    async fn update_and_delete_refetch() {
        let (svc, mut rx) = memory_service().await;
        svc.set_user(Some(user("alice"))).await;
        let job = svc.create_job("run", dataset(), model()).await.unwrap();
        drain(&mut rx);

        assert!(
            svc.update_job_status(&job.id, JobUpdate::status(JobStatus::Running))
                .await
        );
        let events = drain(&mut rx);
        let refreshed = events.iter().find_map(|e| match e {
            AppEvent::Jobs(list) => Some(list.clone()),
            _ => None,
        });
        assert_eq!(refreshed.unwrap()[0].status, JobStatus::Running);

        assert!(svc.delete_job(&job.id).await);
        assert_eq!(job_lists(&drain(&mut rx)), vec![0]);
    }

    #[tokio::test]
    async fn failed_update_surfaces_error_toast() {
        let (svc, mut rx) = memory_service().await;
        svc.set_user(Some(user("alice"))).await;
        drain(&mut rx);

        assert!(
            !svc.update_job_status("missing", JobUpdate::status(JobStatus::Running))
                .await
        );
        let events = drain(&mut rx);
        assert!(job_lists(&events).is_empty());
        assert!(events.iter().any(|e| matches!(
            e,
            AppEvent::Toast(t) if t.description == "Failed to update job status"
                && t.variant == ToastVariant::Destructive
        )));
    }

    struct BrokenStore;

    #[async_trait]
    impl JobStore for BrokenStore {
        async fn list_jobs(&self, _: &str) -> Result<Vec<EvaluationJob>, StoreError> {
            Err(StoreError::Unauthenticated)
        }
        async fn insert_job(&self, _: NewJob) -> Result<EvaluationJob, StoreError> {
            Err(StoreError::Unauthenticated)
        }
        async fn update_job(&self, _: &str, _: JobUpdate) -> Result<(), StoreError> {
            Err(StoreError::Unauthenticated)
        }
        async fn delete_job(&self, _: &str) -> Result<(), StoreError> {
            Err(StoreError::Unauthenticated)
        }
        fn describe(&self) -> String {
            "broken".into()
        }
    }

    #[tokio::test]
    async fn load_failure_is_reported_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let svc = JobService::new(Arc::new(BrokenStore), tx);
        svc.set_user(Some(user("alice"))).await;

        let events = drain(&mut rx);
        let toasts: Vec<&Toast> = events
            .iter()
            .filter_map(|e| match e {
                AppEvent::Toast(t) => Some(t),
                _ => None,
            })
            .collect();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].description, "Failed to load evaluation jobs");
        assert!(matches!(events.last(), Some(AppEvent::Toast(_))));
        assert!(!svc.delete_job("x").await);
    }

    #[tokio::test]
    async fn sign_out_clears_list() {
        let (svc, mut rx) = memory_service().await;
        svc.set_user(Some(user("alice"))).await;
        svc.create_job("run", dataset(), model()).await.unwrap();
        drain(&mut rx);

        svc.set_user(None).await;
        assert_eq!(job_lists(&drain(&mut rx)), vec![0]);
        assert!(svc.fetch_jobs().await.is_none());
    }
}
