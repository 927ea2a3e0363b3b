pub mod driver;
pub mod mock;
pub mod model;
pub mod runner;

pub use driver::ScriptedDriver;
pub use mock::MockResults;
pub use model::{fresh_steps, EvaluationStep, StepStatus, StepUpdate, STEP_COUNT};
pub use runner::EvaluationRunner;
