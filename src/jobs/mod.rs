pub mod model;
pub mod service;

pub use model::{EvaluationJob, FileInfo, JobStatus, JobUpdate};
pub use service::JobService;
