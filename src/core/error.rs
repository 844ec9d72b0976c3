use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Source error: {0}")]
    Source(#[from] anyhow::Error),

    #[error("Transform error: {0}")]
    Transform(String),

    #[error("Malformed input at line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors raised by the launcher before a job run starts. These are never
/// folded into a run's terminal status; they reach the caller as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LaunchError {
    #[error("A job execution for '{job_name}' with parameters {parameters} is already running")]
    JobAlreadyRunning { job_name: String, parameters: String },

    #[error("A job instance for '{job_name}' with parameters {parameters} is already complete")]
    JobInstanceAlreadyComplete { job_name: String, parameters: String },

    #[error("Invalid job parameters: {0}")]
    InvalidJobParameters(String),

    #[error("Job '{job_name}' is not restartable")]
    JobRestartNotAllowed { job_name: String },
}
