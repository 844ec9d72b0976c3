use crate::core::{PersonRow, Result, Sink, TableSchema};
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::marker::PhantomData;
use tracing::debug;

/// Rows per `INSERT` statement; three bound parameters each keeps a statement
/// well under SQLite's host parameter limit.
const ROWS_PER_STATEMENT: usize = 300;

/// Upserts each chunk into a person table inside one transaction. A chunk goes
/// out as a single multi-row statement unless it exceeds `ROWS_PER_STATEMENT`.
pub struct UpsertSink<T> {
    pool: SqlitePool,
    schema: TableSchema,
    written: u64,
    _record: PhantomData<fn(T)>,
}

impl<T> UpsertSink<T> {
    pub fn new(pool: SqlitePool, table: &str) -> Self {
        Self {
            pool,
            schema: TableSchema::person(table),
            written: 0,
            _record: PhantomData,
        }
    }

    /// Records written since the sink was created.
    pub fn written(&self) -> u64 {
        self.written
    }
}

#[async_trait]
impl<T: PersonRow> Sink<T> for UpsertSink<T> {
    async fn write_batch(&mut self, records: Vec<T>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let prefix = self.schema.insert_prefix_sql();
        let on_conflict = self.schema.upsert_conflict_sql();
        let mut tx = self.pool.begin().await?;

        for rows in records.chunks(ROWS_PER_STATEMENT) {
            let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(&prefix);
            query.push_values(rows, |mut row, record| {
                row.push_bind(record.id())
                    .push_bind(record.name())
                    .push_bind(record.email());
            });
            query.push(&on_conflict);
            query.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;
        self.written += records.len() as u64;

        debug!(table = %self.schema.table, count = records.len(), "chunk committed");
        Ok(())
    }
}
