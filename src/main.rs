use anyhow::{Context, Result};
use clap::Parser;
use person_etl::config::load_config;
use person_etl::http::{AppState, router};
use person_etl::job::{JobLauncher, JobRegistry};
use person_etl::{db, jobs};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "person-etl",
    about = "Runs the person CSV import and table migration jobs over HTTP"
)]
struct Args {
    /// TOML configuration file; PERSON_ETL_* environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref()).context("failed to load configuration")?;

    let pool = db::connect(&config.database)
        .await
        .with_context(|| format!("failed to connect to {}", config.database.url))?;
    db::ensure_schema(&pool).await.context("failed to create tables")?;

    let state = AppState {
        launcher: JobLauncher::new(Arc::new(JobRegistry::new())),
        csv_job: Arc::new(jobs::csv_job(pool.clone(), &config.batch)?),
        db_job: Arc::new(jobs::db_job(pool.clone(), &config.batch)),
    };
    let app = router(state, &config.http);

    let address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    info!(
        %address,
        csv = %config.http.csv_path(),
        db = %config.http.db_path(),
        input_file = %config.batch.input_file.display(),
        "person-etl listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    pool.close().await;
    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested"),
        Err(e) => {
            warn!(error = %e, "cannot listen for Ctrl-C, running until killed");
            std::future::pending::<()>().await;
        }
    }
}
