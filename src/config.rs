//! Application configuration: defaults, then an optional TOML file, then
//! `PERSON_ETL_*` environment variables (`__` separates nested keys, e.g.
//! `PERSON_ETL_SERVER__PORT=9000`).

use crate::core::{PipelineError, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

pub const ENV_PREFIX: &str = "PERSON_ETL_";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub batch: BatchConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://person_etl.db".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// CSV file imported by the CSV job.
    pub input_file: PathBuf,
    /// Records read per transaction.
    pub chunk_size: usize,
    /// Rows fetched per query by the database reader.
    pub page_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            input_file: PathBuf::from("data/persons.csv"),
            chunk_size: crate::pipeline::DEFAULT_CHUNK_SIZE,
            page_size: crate::source::db::DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub context_path: String,
    pub csv_endpoint: String,
    pub db_endpoint: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            context_path: "/api/batch".to_string(),
            csv_endpoint: "/csv".to_string(),
            db_endpoint: "/db".to_string(),
        }
    }
}

impl HttpConfig {
    pub fn csv_path(&self) -> String {
        join_path(&self.context_path, &self.csv_endpoint)
    }

    pub fn db_path(&self) -> String {
        join_path(&self.context_path, &self.db_endpoint)
    }
}

fn join_path(context: &str, endpoint: &str) -> String {
    format!("{}{}", context.trim_end_matches('/'), endpoint)
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if self.batch.chunk_size == 0 {
            return Err(PipelineError::Config("batch.chunk_size must be greater than 0".into()));
        }
        if self.batch.page_size == 0 {
            return Err(PipelineError::Config("batch.page_size must be greater than 0".into()));
        }
        if self.database.max_connections == 0 {
            return Err(PipelineError::Config(
                "database.max_connections must be greater than 0".into(),
            ));
        }
        for (key, path) in [
            ("http.csv_endpoint", &self.http.csv_endpoint),
            ("http.db_endpoint", &self.http.db_endpoint),
        ] {
            if !path.starts_with('/') {
                return Err(PipelineError::Config(format!(
                    "{key} must start with '/', got '{path}'"
                )));
            }
        }
        if !self.http.context_path.is_empty() && !self.http.context_path.starts_with('/') {
            return Err(PipelineError::Config(format!(
                "http.context_path must be empty or start with '/', got '{}'",
                self.http.context_path
            )));
        }
        if self.http.csv_path() == self.http.db_path() {
            return Err(PipelineError::Config(
                "http.csv_endpoint and http.db_endpoint must differ".into(),
            ));
        }
        Ok(())
    }
}

pub fn figment(config_file: Option<&Path>) -> Figment {
    let figment = Figment::from(Serialized::defaults(AppConfig::default()));
    let figment = match config_file {
        Some(path) => figment.merge(Toml::file(path)),
        None => figment,
    };
    figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
}

pub fn load_config(config_file: Option<&Path>) -> Result<AppConfig> {
    info!(config_file = ?config_file, "loading configuration");

    let config: AppConfig = figment(config_file)
        .extract()
        .map_err(|e| PipelineError::Config(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn toml_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_match_the_documented_values() {
        let config = AppConfig::default();

        assert_eq!(config.batch.chunk_size, 10);
        assert_eq!(config.batch.page_size, 100);
        assert_eq!(config.http.csv_path(), "/api/batch/csv");
        assert_eq!(config.http.db_path(), "/api/batch/db");
        assert_eq!(config.server.bind_address(), "0.0.0.0:8080");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn file_overrides_only_what_it_names() {
        let file = toml_file(
            r#"
            [batch]
            input_file = "/srv/people.csv"

            [http]
            context_path = "/etl/"
            csv_endpoint = "/from-csv"
            "#,
        );

        let config = load_config(Some(file.path())).unwrap();

        assert_eq!(config.batch.input_file, PathBuf::from("/srv/people.csv"));
        assert_eq!(config.batch.chunk_size, 10);
        assert_eq!(config.http.csv_path(), "/etl/from-csv");
        assert_eq!(config.http.db_path(), "/etl/db");
    }

    #[test]
    fn invalid_values_are_rejected() {
        let file = toml_file(
            r#"
            [batch]
            chunk_size = 0
            "#,
        );
        assert!(matches!(load_config(Some(file.path())), Err(PipelineError::Config(_))));

        let mut config = AppConfig::default();
        config.http.db_endpoint = "db".into();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.http.db_endpoint = config.http.csv_endpoint.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_context_path_is_allowed() {
        let mut config = AppConfig::default();
        config.http.context_path = String::new();

        assert!(config.validate().is_ok());
        assert_eq!(config.http.csv_path(), "/csv");
    }
}
