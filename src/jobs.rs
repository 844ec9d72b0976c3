//! Assembly of the two person jobs.

use crate::config::BatchConfig;
use crate::core::{PERSON_MIGRATE_TABLE, PERSON_TABLE, Person, PersonMigrate, Result};
use crate::job::Job;
use crate::listener::{CsvJobListener, DbJobListener};
use crate::pipeline::Pipeline;
use crate::sink::UpsertSink;
use crate::source::{CsvSource, DbSource};
use crate::transform::{CsvPersonTransform, DbPersonTransform};
use sqlx::SqlitePool;
use std::sync::Arc;

pub const CSV_JOB_NAME: &str = "personFromCsvJob";
pub const DB_JOB_NAME: &str = "personFromDbJob";

/// CSV file → uppercase names of valid emails → upsert into `Person`.
pub fn csv_job(pool: SqlitePool, config: &BatchConfig) -> Result<Job> {
    let pipeline: Pipeline<Person, Person> = Pipeline::new(
        "csvStep",
        Box::new(CsvSource::new(&config.input_file)),
        Box::new(CsvPersonTransform::new()?),
        Box::new(UpsertSink::<Person>::new(pool.clone(), PERSON_TABLE)),
    )
    .with_chunk_size(config.chunk_size);

    Ok(Job::new(CSV_JOB_NAME, Arc::new(pipeline))
        .with_listener(Arc::new(CsvJobListener::new(pool))))
}

/// `Person` table → lowercase names → upsert into `Person_Migrate`.
pub fn db_job(pool: SqlitePool, config: &BatchConfig) -> Job {
    let pipeline: Pipeline<Person, PersonMigrate> = Pipeline::new(
        "dbStep",
        Box::new(DbSource::new(pool.clone(), PERSON_TABLE).with_page_size(config.page_size)),
        Box::new(DbPersonTransform),
        Box::new(UpsertSink::<PersonMigrate>::new(pool, PERSON_MIGRATE_TABLE)),
    )
    .with_chunk_size(config.chunk_size);

    Job::new(DB_JOB_NAME, Arc::new(pipeline)).with_listener(Arc::new(DbJobListener))
}
