use crate::core::Result;
use crate::job::JobExecution;
use async_trait::async_trait;

/// Callbacks around a job run. Errors are logged by the launcher and never
/// change the run's status.
#[async_trait]
pub trait JobListener: Send + Sync {
    async fn before_job(&self, _execution: &JobExecution) -> Result<()> {
        Ok(())
    }

    async fn after_job(&self, _execution: &JobExecution) -> Result<()> {
        Ok(())
    }
}

pub struct NoopListener;

impl JobListener for NoopListener {}
