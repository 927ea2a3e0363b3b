use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Error,
}

impl StepStatus {
    pub fn label(&self) -> &'static str {
        match self {
            StepStatus::Pending => "Pending",
            StepStatus::Running => "Running",
            StepStatus::Completed => "Completed",
            StepStatus::Error => "Error",
        }
    }
}

/// 固定步骤表中的一项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepDefinition {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub scripted_ms: u64,
}

impl StepDefinition {
    pub fn scripted_duration(&self) -> Duration {
        Duration::from_millis(self.scripted_ms)
    }
}

const fn step(
    id: &'static str,
    title: &'static str,
    description: &'static str,
    scripted_ms: u64,
) -> StepDefinition {
    StepDefinition {
        id,
        title,
        description,
        scripted_ms,
    }
}

pub const STEP_COUNT: usize = 16;

pub const PIPELINE_STEPS: [StepDefinition; STEP_COUNT] = [
    step("env", "Environment Snapshot", "Recording Python version, libraries, and random seed", 500),
    step("dataset", "Dataset Analysis", "Summarizing class names and image counts", 800),
    step("split", "Train/Test Split", "Creating stratified split with recorded ratio", 600),
    step("model", "Model Loading", "Loading and validating pre-trained Keras model", 1000),
    step("preprocess", "Data Preprocessing", "Resizing and normalizing images", 1200),
    step("inference", "Model Inference", "Running predictions on test set", 2000),
    step("metrics", "Performance Metrics", "Computing accuracy, precision, recall, F1 scores", 800),
    step("visualization", "Visualizations", "Generating confusion matrix and ROC curves", 1500),
    step("bootstrap", "Bootstrap Analysis", "Computing 95% confidence intervals", 1000),
    step("baseline", "Baseline Comparison", "Training simple baseline model", 2500),
    step("statistical", "Statistical Testing", "Performing significance tests vs baseline", 800),
    step("calibration", "Model Calibration", "Analyzing calibration and uncertainty", 1200),
    step("robustness", "Robustness Testing", "Testing against noise, blur, compression", 1800),
    step("explainability", "Explainability Analysis", "Generating Grad-CAM and attention maps", 2200),
    step("efficiency", "Efficiency Metrics", "Measuring inference time and memory usage", 600),
    step("report", "Report Generation", "Compiling comprehensive HTML report", 1000),
];

/// 视图内的步骤状态，每次运行重新创建
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationStep {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub status: StepStatus,
    pub duration: Option<Duration>,
}

impl From<&StepDefinition> for EvaluationStep {
    fn from(def: &StepDefinition) -> Self {
        Self {
            id: def.id,
            title: def.title,
            description: def.description,
            status: StepStatus::Pending,
            duration: None,
        }
    }
}

pub fn fresh_steps() -> Vec<EvaluationStep> {
    PIPELINE_STEPS.iter().map(EvaluationStep::from).collect()
}

/// 运行器推送给 UI 的单步变化
#[derive(Debug, Clone, PartialEq)]
pub struct StepUpdate {
    pub index: usize,
    pub status: StepStatus,
    pub duration: Option<Duration>,
}

impl StepUpdate {
    pub fn apply(&self, steps: &mut [EvaluationStep]) {
        if let Some(step) = steps.get_mut(self.index) {
            step.status = self.status;
            if self.duration.is_some() {
                step.duration = self.duration;
            }
        }
    }
}

/// 第 index 步开始时的进度（百分比）
pub fn progress_at(index: usize) -> f64 {
    (index as f64 / STEP_COUNT as f64) * 100.0
}

#[derive(Debug, Error, PartialEq)]
pub enum EvaluationError {
    #[error("job {0} is not pending")]
    NotRunnable(String),
    #[error("no job selected")]
    NoJob,
    #[error("step {step} failed: {reason}")]
    StepFailed { step: &'static str, reason: String },
}
