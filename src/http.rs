//! HTTP triggers for the person jobs.

use crate::config::HttpConfig;
use crate::core::LaunchError;
use crate::job::{BatchStatus, Job, JobLauncher};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use std::sync::Arc;
use tokio::task::JoinError;
use tracing::{error, warn};

#[derive(Clone)]
pub struct AppState {
    pub launcher: JobLauncher,
    pub csv_job: Arc<Job>,
    pub db_job: Arc<Job>,
}

pub fn router(state: AppState, config: &HttpConfig) -> Router {
    Router::new()
        .route(&config.csv_path(), get(process_csv))
        .route(&config.db_path(), get(process_db))
        .with_state(state)
}

/// Launcher failures surface as a server error; job failures do not.
#[derive(Debug)]
pub enum ApiError {
    Launch(LaunchError),
    /// The task running the jobs panicked or was cancelled by the runtime.
    Interrupted(String),
}

impl From<LaunchError> for ApiError {
    fn from(err: LaunchError) -> Self {
        Self::Launch(err)
    }
}

impl From<JoinError> for ApiError {
    fn from(err: JoinError) -> Self {
        Self::Interrupted(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match self {
            ApiError::Launch(err) => {
                error!(error = %err, "job launch rejected");
                err.to_string()
            }
            ApiError::Interrupted(reason) => {
                error!(error = %reason, "job task did not finish");
                format!("job task did not finish: {reason}")
            }
        };
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": message })),
        )
            .into_response()
    }
}

// Runs are spawned so a client that hangs up cannot cancel them halfway.

/// Imports the CSV file, then migrates the table. Answers with the status of
/// the migration run.
async fn process_csv(State(state): State<AppState>) -> Result<Json<BatchStatus>, ApiError> {
    let status = tokio::spawn(import_then_migrate(state)).await??;
    Ok(Json(status))
}

async fn process_db(State(state): State<AppState>) -> Result<Json<BatchStatus>, ApiError> {
    let status = tokio::spawn(migrate(state)).await??;
    Ok(Json(status))
}

async fn import_then_migrate(state: AppState) -> Result<BatchStatus, LaunchError> {
    let imported = state.launcher.launch(&state.csv_job).await?;
    if imported.status != BatchStatus::Completed {
        warn!(
            job = %imported.job_name,
            status = %imported.status,
            "CSV import did not complete, running the migration anyway"
        );
    }

    migrate(state).await
}

async fn migrate(state: AppState) -> Result<BatchStatus, LaunchError> {
    let migrated = state.launcher.launch(&state.db_job).await?;
    Ok(migrated.status)
}
