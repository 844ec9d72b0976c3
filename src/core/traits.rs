use crate::core::Result;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

pub type RecordStream<T> = Pin<Box<dyn Stream<Item = Result<T>> + Send>>;

/// Produces a finite stream of records. Every call to `read` starts over from
/// the beginning, so one source serves every run of a job.
#[async_trait]
pub trait Source<T>: Send + Sync {
    async fn read(&self) -> Result<RecordStream<T>>;

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
pub trait Sink<T: Send + 'static>: Send + Sync {
    async fn write(&mut self, record: T) -> Result<()> {
        self.write_batch(vec![record]).await
    }

    /// Writes one chunk. Implementations must apply the whole chunk or none of it.
    async fn write_batch(&mut self, records: Vec<T>) -> Result<()>;

    async fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.flush().await
    }
}

/// Single-record processor. `Ok(None)` filters the record out.
#[async_trait]
pub trait Transform<I: Send + 'static, O>: Send + Sync {
    async fn transform(&self, record: I) -> Result<Option<O>>;
}
