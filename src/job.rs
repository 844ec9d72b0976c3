//! Minimal batch layer: jobs, their runs, and the launcher that executes them.

pub mod execution;
pub mod launcher;
pub mod listener;
pub mod registry;

pub use self::execution::*;
pub use self::launcher::JobLauncher;
pub use self::listener::{JobListener, NoopListener};
pub use self::registry::JobRegistry;

use crate::core::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// The unit of work a job executes on every run.
#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> &str;

    async fn execute(&self) -> Result<StepSummary>;
}

/// A named step plus the listener notified around each of its runs.
pub struct Job {
    name: String,
    step: Arc<dyn Step>,
    listener: Arc<dyn JobListener>,
    restartable: bool,
}

impl Job {
    pub fn new(name: impl Into<String>, step: Arc<dyn Step>) -> Self {
        Self {
            name: name.into(),
            step,
            listener: Arc::new(NoopListener),
            restartable: true,
        }
    }

    pub fn with_listener(mut self, listener: Arc<dyn JobListener>) -> Self {
        self.listener = listener;
        self
    }

    /// A non-restartable job refuses to rerun parameters whose last run failed.
    pub fn with_restartable(mut self, restartable: bool) -> Self {
        self.restartable = restartable;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn step(&self) -> &dyn Step {
        self.step.as_ref()
    }

    pub fn listener(&self) -> &dyn JobListener {
        self.listener.as_ref()
    }

    pub fn is_restartable(&self) -> bool {
        self.restartable
    }
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("name", &self.name)
            .field("step", &self.step.name())
            .field("restartable", &self.restartable)
            .finish()
    }
}
