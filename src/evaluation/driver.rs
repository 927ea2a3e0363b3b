use super::model::{EvaluationError, StepDefinition};
use async_trait::async_trait;
use std::time::Duration;

/// 单步执行器。默认实现只按脚本时长等待。
#[async_trait]
pub trait StepDriver: Send + Sync {
    /// 返回记录到步骤上的耗时
    async fn execute(&self, index: usize, step: &StepDefinition)
        -> Result<Duration, EvaluationError>;
}

pub struct ScriptedDriver {
    scale: f64,
}

impl ScriptedDriver {
    /// `scale` 为等待时间倍率，0 表示不等待
    pub fn new(scale: f64) -> Self {
        Self {
            scale: if scale.is_finite() { scale.max(0.0) } else { 1.0 },
        }
    }
}

#[async_trait]
impl StepDriver for ScriptedDriver {
    async fn execute(
        &self,
        _index: usize,
        step: &StepDefinition,
    ) -> Result<Duration, EvaluationError> {
        let wait = step.scripted_duration().mul_f64(self.scale);
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
        // 记录的是脚本时长，不是实际等待时间
        Ok(step.scripted_duration())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::model::PIPELINE_STEPS;

    #[tokio::test]
    async fn reports_scripted_duration_even_when_scaled_to_zero() {
        let driver = ScriptedDriver::new(0.0);
        let took = driver.execute(9, &PIPELINE_STEPS[9]).await.unwrap();
        assert_eq!(took, Duration::from_millis(2500));
    }

    #[test]
    fn clamps_bad_scales() {
        assert_eq!(ScriptedDriver::new(-3.0).scale, 0.0);
        assert_eq!(ScriptedDriver::new(f64::NAN).scale, 1.0);
    }
}
