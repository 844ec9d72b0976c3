use crate::core::LaunchError;
use crate::job::{JOB_ID, JOB_NAME, Job, JobExecution, JobParameters, JobRegistry, RUN_ID};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Runs jobs to completion in the calling task.
///
/// Launch problems come back as [`LaunchError`]; anything that goes wrong
/// inside the step is recorded on the returned execution as `FAILED`. A run
/// whose future is dropped midway is recorded as `ABANDONED`.
#[derive(Debug, Clone)]
pub struct JobLauncher {
    registry: Arc<JobRegistry>,
}

impl JobLauncher {
    pub fn new(registry: Arc<JobRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Fresh parameters for `job`: the invocation time plus a process-wide run
    /// id, so every call identifies a new job instance.
    pub fn next_parameters(&self, job: &Job) -> JobParameters {
        JobParameters::builder()
            .add_string(JOB_ID, Utc::now().timestamp_millis().to_string())
            .add_string(JOB_NAME, job.name())
            .add_long(RUN_ID, self.registry.next_run_id())
            .build()
    }

    /// Runs `job` with freshly generated parameters.
    pub async fn launch(&self, job: &Job) -> Result<JobExecution, LaunchError> {
        let parameters = self.next_parameters(job);
        self.run(job, parameters).await
    }

    pub async fn run(
        &self,
        job: &Job,
        parameters: JobParameters,
    ) -> Result<JobExecution, LaunchError> {
        validate(job, &parameters)?;

        let mut execution = self.registry.begin(job, &parameters)?;
        let guard = AbandonOnDrop {
            registry: &self.registry,
            job_name: job.name(),
            parameters: &parameters,
            armed: true,
        };
        info!(job = job.name(), step = job.step().name(), %parameters, "Job launched");

        if let Err(e) = job.listener().before_job(&execution).await {
            warn!(job = job.name(), error = %e, "before_job listener failed");
        }

        match job.step().execute().await {
            Ok(summary) => {
                execution.complete(summary);
            }
            Err(e) => {
                error!(job = job.name(), step = job.step().name(), error = %e, "Step failed");
                execution.fail(e.to_string());
            }
        }

        if let Err(e) = job.listener().after_job(&execution).await {
            warn!(job = job.name(), error = %e, "after_job listener failed");
        }

        self.registry.finish(&execution);
        guard.disarm();

        info!(
            job = job.name(),
            %parameters,
            status = %execution.status,
            read = execution.summary.read_count,
            filtered = execution.summary.filter_count,
            written = execution.summary.write_count,
            "Job finished"
        );

        Ok(execution)
    }
}

struct AbandonOnDrop<'a> {
    registry: &'a JobRegistry,
    job_name: &'a str,
    parameters: &'a JobParameters,
    armed: bool,
}

impl AbandonOnDrop<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for AbandonOnDrop<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!(
                job = self.job_name,
                parameters = %self.parameters,
                "Job dropped before finishing, marking it ABANDONED"
            );
            self.registry.abandon(self.job_name, self.parameters);
        }
    }
}

fn validate(job: &Job, parameters: &JobParameters) -> Result<(), LaunchError> {
    match parameters.job_name() {
        None => Err(LaunchError::InvalidJobParameters(format!(
            "missing '{JOB_NAME}' parameter"
        ))),
        Some(name) if name != job.name() => Err(LaunchError::InvalidJobParameters(format!(
            "'{JOB_NAME}' is '{}' but the job is '{}'",
            name,
            job.name()
        ))),
        Some(_) => Ok(()),
    }
}
