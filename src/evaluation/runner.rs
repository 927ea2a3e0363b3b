use super::driver::StepDriver;
use super::mock::MockResults;
use super::model::{progress_at, EvaluationError, StepStatus, StepUpdate, PIPELINE_STEPS};
use crate::app_state::{AppEvent, Toast};
use crate::jobs::{EvaluationJob, JobService, JobStatus, JobUpdate};
use chrono::Utc;
use log::{error, info, warn};
use std::sync::Arc;
use tokio::sync::mpsc;

/// 流水线失败时写入任务的固定信息
pub const PIPELINE_FAILED_MESSAGE: &str = "Evaluation pipeline failed.";

pub struct EvaluationRunner {
    jobs: Arc<JobService>,
    driver: Arc<dyn StepDriver>,
    evt_tx: mpsc::UnboundedSender<AppEvent>,
}

impl EvaluationRunner {
    pub fn new(
        jobs: Arc<JobService>,
        driver: Arc<dyn StepDriver>,
        evt_tx: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            jobs,
            driver,
            evt_tx,
        }
    }

    fn send(&self, evt: AppEvent) {
        let _ = self.evt_tx.send(evt);
    }

    /// 运行固定的 16 步流水线
    ///
    /// 只有 pending 状态的任务可以启动。步骤严格按顺序执行，
    /// 任何一步出错都会把任务标记为 failed，不重试也不保存部分结果。
    pub async fn run(&self, job: Option<&EvaluationJob>) -> Result<MockResults, EvaluationError> {
        let job = match job {
            Some(j) if j.status.can_advance_to(JobStatus::Running) => j,
            other => {
                self.send(AppEvent::Toast(Toast::error(
                    "Cannot start evaluation",
                    "Please select a valid evaluation job first.",
                )));
                return Err(match other {
                    Some(j) => EvaluationError::NotRunnable(j.id.clone()),
                    None => EvaluationError::NoJob,
                });
            }
        };

        info!("▶ 开始评估任务 [{}]: {}", job.id, job.name);
        self.send(AppEvent::EvaluationStarted {
            job_id: job.id.clone(),
        });
        self.jobs
            .update_job_status(&job.id, JobUpdate::status(JobStatus::Running))
            .await;

        let outcome = self.run_steps().await;
        let result = match outcome {
            Ok(()) => {
                self.send(AppEvent::Progress(100.0));
                let results = MockResults::at(Utc::now());
                let payload = serde_json::to_value(&results).unwrap_or_default();
                let update = JobUpdate::status(JobStatus::Completed)
                    .with_results(payload)
                    .with_report_html(results.report_html())
                    .with_summary(results.summary());
                self.jobs.update_job_status(&job.id, update).await;

                info!("✓ 评估完成 [{}]", job.id);
                self.send(AppEvent::EvaluationComplete(results.clone()));
                self.send(AppEvent::Toast(Toast::info(
                    "Evaluation completed!",
                    "Your comprehensive model evaluation report is ready.",
                )));
                Ok(results)
            }
            Err(e) => {
                error!("✗ 评估失败 [{}]: {}", job.id, e);
                let update = JobUpdate::status(JobStatus::Failed).with_error(PIPELINE_FAILED_MESSAGE);
                self.jobs.update_job_status(&job.id, update).await;
                self.send(AppEvent::Toast(Toast::error(
                    "Evaluation failed",
                    "An error occurred during the evaluation process.",
                )));
                Err(e)
            }
        };

        self.send(AppEvent::EvaluationFinished);
        result
    }

    async fn run_steps(&self) -> Result<(), EvaluationError> {
        for (index, step) in PIPELINE_STEPS.iter().enumerate() {
            self.send(AppEvent::Progress(progress_at(index)));
            self.send(AppEvent::Step(StepUpdate {
                index,
                status: StepStatus::Running,
                duration: None,
            }));

            match self.driver.execute(index, step).await {
                Ok(took) => {
                    self.send(AppEvent::Step(StepUpdate {
                        index,
                        status: StepStatus::Completed,
                        duration: Some(took),
                    }));
                }
                Err(e) => {
                    warn!("步骤 {} ({}) 出错: {}", index + 1, step.id, e);
                    self.send(AppEvent::Step(StepUpdate {
                        index,
                        status: StepStatus::Error,
                        duration: None,
                    }));
                    return Err(e);
                }
            }
        }
        Ok(())
    }
}
