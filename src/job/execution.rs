use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const JOB_NAME: &str = "jobName";
pub const JOB_ID: &str = "jobId";
pub const RUN_ID: &str = "run.id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    Started,
    Completed,
    Failed,
    Stopped,
    Abandoned,
    Unknown,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Started => "STARTED",
            BatchStatus::Completed => "COMPLETED",
            BatchStatus::Failed => "FAILED",
            BatchStatus::Stopped => "STOPPED",
            BatchStatus::Abandoned => "ABANDONED",
            BatchStatus::Unknown => "UNKNOWN",
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, BatchStatus::Started)
    }

    pub fn is_unsuccessful(&self) -> bool {
        matches!(
            self,
            BatchStatus::Failed
                | BatchStatus::Stopped
                | BatchStatus::Abandoned
                | BatchStatus::Unknown
        )
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifying parameters of a job run. Two runs with equal parameters are the
/// same job instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobParameters {
    values: BTreeMap<String, String>,
}

impl JobParameters {
    pub fn builder() -> JobParametersBuilder {
        JobParametersBuilder::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn job_name(&self) -> Option<&str> {
        self.get(JOB_NAME)
    }
}

impl fmt::Display for JobParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, value)) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}={value}")?;
        }
        f.write_str("}")
    }
}

#[derive(Debug, Default)]
pub struct JobParametersBuilder {
    values: BTreeMap<String, String>,
}

impl JobParametersBuilder {
    pub fn add_string(mut self, key: &str, value: impl Into<String>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    pub fn add_long(self, key: &str, value: i64) -> Self {
        self.add_string(key, value.to_string())
    }

    pub fn build(self) -> JobParameters {
        JobParameters { values: self.values }
    }
}

/// Counters collected by a step while it runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSummary {
    pub read_count: u64,
    pub filter_count: u64,
    pub write_count: u64,
    pub commit_count: u64,
}

/// One run of a job and how it ended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobExecution {
    pub job_name: String,
    pub parameters: JobParameters,
    pub status: BatchStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub summary: StepSummary,
    pub failure: Option<String>,
}

impl JobExecution {
    pub fn started(job_name: &str, parameters: JobParameters) -> Self {
        Self {
            job_name: job_name.to_string(),
            parameters,
            status: BatchStatus::Started,
            start_time: Utc::now(),
            end_time: None,
            summary: StepSummary::default(),
            failure: None,
        }
    }

    pub fn complete(&mut self, summary: StepSummary) {
        self.status = BatchStatus::Completed;
        self.summary = summary;
        self.end_time = Some(Utc::now());
    }

    pub fn fail(&mut self, failure: String) {
        self.status = BatchStatus::Failed;
        self.failure = Some(failure);
        self.end_time = Some(Utc::now());
    }

    /// The run was dropped before it could finish.
    pub fn abandon(&mut self) {
        self.status = BatchStatus::Abandoned;
        self.end_time = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_in_upper_case() {
        assert_eq!(
            serde_json::to_string(&BatchStatus::Completed).unwrap(),
            "\"COMPLETED\""
        );
        assert_eq!(
            serde_json::from_str::<BatchStatus>("\"ABANDONED\"").unwrap(),
            BatchStatus::Abandoned
        );
        assert_eq!(BatchStatus::Failed.to_string(), "FAILED");
    }

    #[test]
    fn parameters_are_ordered_and_comparable() {
        let a = JobParameters::builder()
            .add_string(JOB_NAME, "personFromDbJob")
            .add_long(RUN_ID, 1)
            .build();
        let b = JobParameters::builder()
            .add_long(RUN_ID, 1)
            .add_string(JOB_NAME, "personFromDbJob")
            .build();

        assert_eq!(a, b);
        assert_eq!(a.to_string(), "{jobName=personFromDbJob, run.id=1}");
        assert_eq!(a.job_name(), Some("personFromDbJob"));
    }

    #[test]
    fn execution_transitions() {
        let mut execution = JobExecution::started("job", JobParameters::default());
        assert!(execution.status.is_running());

        execution.fail("boom".into());
        assert_eq!(execution.status, BatchStatus::Failed);
        assert!(execution.status.is_unsuccessful());
        assert!(execution.end_time.is_some());
    }
}
