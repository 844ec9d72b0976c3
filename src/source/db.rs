use crate::core::{Person, PipelineError, RecordStream, Result, Source, TableSchema};
use async_trait::async_trait;
use futures::stream::{self, TryStreamExt};
use sqlx::SqlitePool;
use tracing::debug;

pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Reads every row of a person table in id order, one page at a time.
///
/// Pages are fetched with keyset pagination, so no connection is held between
/// pages and rows inserted behind the cursor are never read twice.
pub struct DbSource {
    pool: SqlitePool,
    schema: TableSchema,
    page_size: usize,
}

impl DbSource {
    pub fn new(pool: SqlitePool, table: &str) -> Self {
        Self {
            pool,
            schema: TableSchema::person(table),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

#[derive(Clone, Copy)]
enum Cursor {
    Start,
    After(i64),
    Done,
}

#[derive(Clone)]
struct PageQueries {
    first: String,
    after: String,
}

async fn next_page(
    pool: SqlitePool,
    queries: PageQueries,
    cursor: Cursor,
    page_size: i64,
) -> Result<Option<(Vec<Person>, Cursor)>> {
    let page: Vec<Person> = match cursor {
        Cursor::Done => return Ok(None),
        Cursor::Start => {
            sqlx::query_as(&queries.first)
                .bind(page_size)
                .fetch_all(&pool)
                .await?
        }
        Cursor::After(last_id) => {
            sqlx::query_as(&queries.after)
                .bind(last_id)
                .bind(page_size)
                .fetch_all(&pool)
                .await?
        }
    };

    if page.is_empty() {
        return Ok(None);
    }

    debug!(rows = page.len(), "fetched source page");

    let next = match page.last().and_then(|p| p.id) {
        Some(last_id) if (page.len() as i64) == page_size => Cursor::After(last_id),
        _ => Cursor::Done,
    };
    Ok(Some((page, next)))
}

#[async_trait]
impl Source<Person> for DbSource {
    async fn read(&self) -> Result<RecordStream<Person>> {
        let pool = self.pool.clone();
        let queries = PageQueries {
            first: self.schema.select_first_page_sql(),
            after: self.schema.select_page_sql(),
        };
        let page_size = self.page_size as i64;

        let pages = stream::try_unfold(Cursor::Start, move |cursor| {
            next_page(pool.clone(), queries.clone(), cursor, page_size)
        });

        let stream = pages
            .map_ok(|page| stream::iter(page.into_iter().map(Ok::<Person, PipelineError>)))
            .try_flatten();

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PERSON_TABLE;
    use crate::db::test_pool;

    async fn seed(pool: &SqlitePool, count: i64) {
        for id in (1..=count).rev() {
            sqlx::query("INSERT INTO Person (id, nombre, email) VALUES (?, ?, ?)")
                .bind(id)
                .bind(format!("Name{id}"))
                .bind(format!("p{id}@x.com"))
                .execute(pool)
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn reads_all_rows_in_id_order_across_pages() {
        let pool = test_pool().await;
        seed(&pool, 25).await;

        let source = DbSource::new(pool, PERSON_TABLE).with_page_size(10);
        let people: Vec<Person> = source.read().await.unwrap().try_collect().await.unwrap();

        let ids: Vec<i64> = people.iter().filter_map(|p| p.id).collect();
        assert_eq!(ids, (1..=25).collect::<Vec<_>>());
        assert_eq!(people[4].name, "Name5");
    }

    #[tokio::test]
    async fn exact_page_multiple_terminates() {
        let pool = test_pool().await;
        seed(&pool, 20).await;

        let source = DbSource::new(pool, PERSON_TABLE).with_page_size(10);
        let people: Vec<Person> = source.read().await.unwrap().try_collect().await.unwrap();

        assert_eq!(people.len(), 20);
    }

    #[tokio::test]
    async fn empty_table_yields_nothing() {
        let pool = test_pool().await;

        let source = DbSource::new(pool, PERSON_TABLE);
        let people: Vec<Person> = source.read().await.unwrap().try_collect().await.unwrap();

        assert!(people.is_empty());
    }

    #[tokio::test]
    async fn smallest_possible_id_is_not_skipped() {
        let pool = test_pool().await;
        for (id, name) in [(1, "One"), (i64::MIN, "Min")] {
            sqlx::query("INSERT INTO Person (id, nombre, email) VALUES (?, ?, 'x@x.com')")
                .bind(id)
                .bind(name)
                .execute(&pool)
                .await
                .unwrap();
        }

        let source = DbSource::new(pool, PERSON_TABLE).with_page_size(1);
        let people: Vec<Person> = source.read().await.unwrap().try_collect().await.unwrap();

        let ids: Vec<Option<i64>> = people.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![Some(i64::MIN), Some(1)]);
    }
}
