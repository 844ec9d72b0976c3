//! Completion listeners for the two person jobs.

use crate::core::{PERSON_TABLE, Person, Result, TableSchema};
use crate::job::{BatchStatus, JobExecution, JobListener};
use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::info;

/// After a successful CSV import, logs every row now in `Person`.
pub struct CsvJobListener {
    pool: SqlitePool,
    schema: TableSchema,
}

impl CsvJobListener {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            schema: TableSchema::person(PERSON_TABLE),
        }
    }

    pub async fn imported_rows(&self) -> Result<Vec<Person>> {
        let rows: Vec<Person> = sqlx::query_as(&self.schema.select_all_sql())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

#[async_trait]
impl JobListener for CsvJobListener {
    async fn after_job(&self, execution: &JobExecution) -> Result<()> {
        if execution.status != BatchStatus::Completed {
            return Ok(());
        }

        info!(job = %execution.job_name, "Job finished, verifying results");
        for person in self.imported_rows().await? {
            info!(job = %execution.job_name, "Record <{}>", person);
        }
        Ok(())
    }
}

pub struct DbJobListener;

#[async_trait]
impl JobListener for DbJobListener {
    async fn after_job(&self, execution: &JobExecution) -> Result<()> {
        if execution.status == BatchStatus::Completed {
            info!(job = %execution.job_name, "Job finished, verify the migrated records");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::job::JobParameters;

    #[tokio::test]
    async fn csv_listener_reads_back_the_table() {
        let pool = test_pool().await;
        sqlx::query(
            "INSERT INTO Person (id, nombre, email) \
             VALUES (2, 'B', 'b@x.com'), (1, 'A', 'a@x.com')",
        )
        .execute(&pool)
        .await
        .unwrap();

        let listener = CsvJobListener::new(pool);
        let rows = listener.imported_rows().await.unwrap();
        assert_eq!(rows[0], Person::new(Some(1), "A", "a@x.com"));
        assert_eq!(rows.len(), 2);

        let mut execution = JobExecution::started("personFromCsvJob", JobParameters::default());
        execution.complete(Default::default());
        listener.after_job(&execution).await.unwrap();
    }

    #[tokio::test]
    async fn csv_listener_skips_failed_runs() {
        let pool = test_pool().await;
        sqlx::query("DROP TABLE Person").execute(&pool).await.unwrap();

        let listener = CsvJobListener::new(pool);
        let mut execution = JobExecution::started("personFromCsvJob", JobParameters::default());
        execution.fail("broken".into());

        assert!(listener.after_job(&execution).await.is_ok());
        execution.complete(Default::default());
        assert!(listener.after_job(&execution).await.is_err());
    }
}
