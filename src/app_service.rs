use crate::app_state::{AppEvent, Toast};
use crate::commands::{AppCommand, HELP_TEXT};
use crate::evaluation::{EvaluationRunner, MockResults};
use crate::jobs::JobService;
use crate::report::{export_report, ExportKind, REPORT_METRICS};
use crate::session::{AuthState, Authenticator, UserIdentity};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// 后台任务持有的服务集合，逐条处理 UI 发来的命令
pub struct AppService {
    auth: Arc<dyn Authenticator>,
    jobs: Arc<JobService>,
    runner: Arc<EvaluationRunner>,
    report_dir: PathBuf,
    evt_tx: mpsc::UnboundedSender<AppEvent>,
    running: Option<JoinHandle<()>>,
}

impl AppService {
    pub fn new(
        auth: Arc<dyn Authenticator>,
        jobs: Arc<JobService>,
        runner: Arc<EvaluationRunner>,
        report_dir: PathBuf,
        evt_tx: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            auth,
            jobs,
            runner,
            report_dir,
            evt_tx,
            running: None,
        }
    }

    fn send(&self, evt: AppEvent) {
        let _ = self.evt_tx.send(evt);
    }

    /// 解析已有会话；没有会话且配置了账号时自动登录
    pub async fn bootstrap(&self, credentials: Option<(String, String)>) {
        let resolved = match self.auth.resolve().await {
            Ok(user) => user,
            Err(e) => {
                warn!("会话解析失败: {}", e);
                None
            }
        };

        let user = match (resolved, credentials) {
            (Some(user), _) => Some(user),
            (None, Some((email, password))) => self.sign_in(&email, &password).await,
            (None, None) => None,
        };
        self.apply_user(user).await;
    }

    async fn sign_in(&self, email: &str, password: &str) -> Option<UserIdentity> {
        match self.auth.sign_in(email, password).await {
            Ok(user) => {
                info!("✓ 已登录: {}", user);
                Some(user)
            }
            Err(e) => {
                warn!("登录失败: {}", e);
                self.send(AppEvent::Toast(Toast::error("Sign in failed", e.to_string())));
                None
            }
        }
    }

    async fn apply_user(&self, user: Option<UserIdentity>) {
        let state = match &user {
            Some(u) => AuthState::SignedIn(u.clone()),
            None => AuthState::SignedOut,
        };
        self.send(AppEvent::Auth(state));
        self.jobs.set_user(user).await;
    }

    fn is_running(&self) -> bool {
        self.running.as_ref().map(|h| !h.is_finished()).unwrap_or(false)
    }

    pub async fn handle(&mut self, cmd: AppCommand) {
        match cmd {
            AppCommand::Login { email, password } => {
                if let Some(user) = self.sign_in(&email, &password).await {
                    self.apply_user(Some(user)).await;
                }
            }
            AppCommand::Logout => {
                if let Err(e) = self.auth.sign_out().await {
                    warn!("退出登录失败: {}", e);
                }
                self.apply_user(None).await;
            }
            AppCommand::Refresh => {
                self.jobs.fetch_jobs().await;
            }
            AppCommand::CreateJob {
                name,
                dataset,
                model,
            } => {
                if let Some(job) = self.jobs.create_job(&name, dataset, model).await {
                    self.send(AppEvent::JobCreated(job));
                }
            }
            AppCommand::RunJob(job) => {
                if self.is_running() {
                    self.send(AppEvent::Log("已有评估任务在运行".to_string()));
                    return;
                }
                let runner = self.runner.clone();
                self.running = Some(tokio::spawn(async move {
                    let _ = runner.run(Some(&job)).await;
                }));
            }
            AppCommand::DeleteJob(id) => {
                self.jobs.delete_job(&id).await;
            }
            AppCommand::ExportReport { kind, results } => self.export(kind, &results),
            AppCommand::ViewReport(results) => {
                if let Some(path) = self.write_report(ExportKind::Html, &results) {
                    self.send(AppEvent::Toast(Toast::info(
                        "Opening report",
                        format!("The interactive report is at {}", path.display()),
                    )));
                }
            }
            AppCommand::Help => self.send(AppEvent::Log(HELP_TEXT.to_string())),
            AppCommand::Unknown(msg) => self.send(AppEvent::Log(msg)),
            other => {
                warn!("后台收到未解析的命令: {:?}", other);
            }
        }
    }

    fn write_report(&self, kind: ExportKind, results: &MockResults) -> Option<PathBuf> {
        match export_report(&self.report_dir, kind, &REPORT_METRICS, Some(results)) {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("导出报告失败: {}", e);
                self.send(AppEvent::Toast(Toast::error("Export failed", e.to_string())));
                None
            }
        }
    }

    fn export(&self, kind: ExportKind, results: &MockResults) {
        let Some(path) = self.write_report(kind, results) else {
            return;
        };
        let toast = match kind {
            ExportKind::Html => Toast::info(
                "Report downloaded",
                format!("The comprehensive HTML report has been saved to {}", path.display()),
            ),
            ExportKind::Summary => Toast::info(
                "Summary downloaded",
                format!("The model evaluation summary has been saved to {}", path.display()),
            ),
        };
        self.send(AppEvent::Toast(toast));
    }

    /// 等待正在进行的评估结束
    #[cfg(test)]
    pub async fn join_running(&mut self) {
        if let Some(handle) = self.running.take() {
            let _ = handle.await;
        }
    }
}
