use crate::core::LaunchError;
use crate::job::{BatchStatus, Job, JobExecution, JobParameters};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

/// Finished runs kept per job before the oldest are forgotten.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

type InstanceKey = (String, JobParameters);

/// In-process record of job runs, keyed by job name and parameters.
///
/// Running executions are always kept. Finished ones are pruned oldest first
/// once a job has more than `history_limit` of them.
#[derive(Debug)]
pub struct JobRegistry {
    runs: Mutex<HashMap<InstanceKey, JobExecution>>,
    next_run_id: AtomicI64,
    history_limit: usize,
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::with_history_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history_limit(history_limit: usize) -> Self {
        Self {
            runs: Mutex::new(HashMap::new()),
            next_run_id: AtomicI64::new(0),
            history_limit: history_limit.max(1),
        }
    }

    /// Monotonic run counter, unique for the life of the process.
    pub fn next_run_id(&self) -> i64 {
        self.next_run_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Registers a new run, refusing parameters that are running, already
    /// complete, or failed on a job that cannot be restarted.
    pub fn begin(
        &self,
        job: &Job,
        parameters: &JobParameters,
    ) -> Result<JobExecution, LaunchError> {
        let key = (job.name().to_string(), parameters.clone());
        let mut runs = self.runs.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(previous) = runs.get(&key) {
            match previous.status {
                BatchStatus::Started => {
                    return Err(LaunchError::JobAlreadyRunning {
                        job_name: job.name().to_string(),
                        parameters: parameters.to_string(),
                    });
                }
                BatchStatus::Completed => {
                    return Err(LaunchError::JobInstanceAlreadyComplete {
                        job_name: job.name().to_string(),
                        parameters: parameters.to_string(),
                    });
                }
                _ if !job.is_restartable() => {
                    return Err(LaunchError::JobRestartNotAllowed {
                        job_name: job.name().to_string(),
                    });
                }
                _ => {}
            }
        }

        let execution = JobExecution::started(job.name(), parameters.clone());
        runs.insert(key, execution.clone());
        Ok(execution)
    }

    pub fn finish(&self, execution: &JobExecution) {
        let key = (execution.job_name.clone(), execution.parameters.clone());
        let mut runs = self.runs.lock().unwrap_or_else(|e| e.into_inner());
        runs.insert(key, execution.clone());
        prune(&mut runs, &execution.job_name, self.history_limit);
    }

    /// Marks a run that is still `STARTED` as `ABANDONED`.
    pub fn abandon(&self, job_name: &str, parameters: &JobParameters) {
        let mut runs = self.runs.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(execution) = runs.get_mut(&(job_name.to_string(), parameters.clone())) {
            if execution.status.is_running() {
                execution.abandon();
            }
        }
        prune(&mut runs, job_name, self.history_limit);
    }

    /// Runs of one job, oldest first.
    pub fn runs_for(&self, job_name: &str) -> Vec<JobExecution> {
        let runs = self.runs.lock().unwrap_or_else(|e| e.into_inner());
        let mut found: Vec<JobExecution> = runs
            .iter()
            .filter(|((name, _), _)| name == job_name)
            .map(|(_, execution)| execution.clone())
            .collect();
        found.sort_by_key(|execution| execution.start_time);
        found
    }

    pub fn last_run(&self, job_name: &str) -> Option<JobExecution> {
        self.runs_for(job_name).pop()
    }
}

fn prune(runs: &mut HashMap<InstanceKey, JobExecution>, job_name: &str, limit: usize) {
    let mut finished: Vec<(InstanceKey, DateTime<Utc>)> = runs
        .iter()
        .filter(|((name, _), execution)| name == job_name && !execution.status.is_running())
        .map(|(key, execution)| (key.clone(), execution.start_time))
        .collect();

    if finished.len() <= limit {
        return;
    }

    finished.sort_by_key(|(_, start_time)| *start_time);
    let excess = finished.len() - limit;
    for (key, _) in finished.into_iter().take(excess) {
        runs.remove(&key);
    }
}
