use crate::core::{Result, Sink, Source, Transform};
use crate::job::{Step, StepSummary};
use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::Mutex;
use tracing::debug;

pub const DEFAULT_CHUNK_SIZE: usize = 10;

/// Chunk-oriented read → transform → write loop.
///
/// Records are read one at a time; every `chunk_size` records read, the ones
/// that survived the transform are handed to the sink as a single batch. A
/// failure anywhere stops the run and leaves the open chunk unwritten.
pub struct Pipeline<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    name: String,
    source: Box<dyn Source<I>>,
    transform: Box<dyn Transform<I, O>>,
    sink: Mutex<Box<dyn Sink<O>>>,
    chunk_size: usize,
}

impl<I, O> Pipeline<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    pub fn new(
        name: impl Into<String>,
        source: Box<dyn Source<I>>,
        transform: Box<dyn Transform<I, O>>,
        sink: Box<dyn Sink<O>>,
    ) -> Self {
        Self {
            name: name.into(),
            source,
            transform,
            sink: Mutex::new(sink),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub async fn run(&self) -> Result<StepSummary> {
        let mut sink = self.sink.lock().await;
        let mut stream = self.source.read().await?;
        let mut summary = StepSummary::default();

        let mut chunk = Vec::with_capacity(self.chunk_size);
        let mut read_in_chunk = 0;

        while let Some(record_result) = stream.next().await {
            let record = record_result?;
            summary.read_count += 1;
            read_in_chunk += 1;

            match self.transform.transform(record).await? {
                Some(output) => chunk.push(output),
                None => summary.filter_count += 1,
            }

            if read_in_chunk == self.chunk_size {
                self.commit(&mut **sink, std::mem::take(&mut chunk), &mut summary)
                    .await?;
                read_in_chunk = 0;
            }
        }

        if read_in_chunk > 0 {
            self.commit(&mut **sink, chunk, &mut summary).await?;
        }

        sink.close().await?;
        self.source.close().await?;

        Ok(summary)
    }

    async fn commit(
        &self,
        sink: &mut dyn Sink<O>,
        chunk: Vec<O>,
        summary: &mut StepSummary,
    ) -> Result<()> {
        let count = chunk.len();
        sink.write_batch(chunk).await?;
        summary.write_count += count as u64;
        summary.commit_count += 1;
        debug!(step = %self.name, written = count, "chunk processed");
        Ok(())
    }
}

#[async_trait]
impl<I, O> Step for Pipeline<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self) -> Result<StepSummary> {
        self.run().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PipelineError, RecordStream};
    use futures::stream;
    use std::sync::Arc;

    struct VecSource(Vec<Result<i64>>);

    #[async_trait]
    impl Source<i64> for VecSource {
        async fn read(&self) -> Result<RecordStream<i64>> {
            let items: Vec<Result<i64>> = self
                .0
                .iter()
                .map(|item| match item {
                    Ok(n) => Ok(*n),
                    Err(e) => Err(PipelineError::Transform(e.to_string())),
                })
                .collect();
            Ok(Box::pin(stream::iter(items)))
        }
    }

    struct KeepEven;

    #[async_trait]
    impl Transform<i64, i64> for KeepEven {
        async fn transform(&self, record: i64) -> Result<Option<i64>> {
            Ok((record % 2 == 0).then_some(record))
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSink {
        batches: Arc<std::sync::Mutex<Vec<Vec<i64>>>>,
    }

    #[async_trait]
    impl Sink<i64> for RecordingSink {
        async fn write_batch(&mut self, records: Vec<i64>) -> Result<()> {
            self.batches.lock().unwrap().push(records);
            Ok(())
        }
    }

    fn pipeline(items: Vec<Result<i64>>, sink: RecordingSink) -> Pipeline<i64, i64> {
        Pipeline::new(
            "numbers",
            Box::new(VecSource(items)),
            Box::new(KeepEven),
            Box::new(sink),
        )
        .with_chunk_size(4)
    }

    #[tokio::test]
    async fn chunks_count_read_records_not_survivors() {
        let sink = RecordingSink::default();
        let items = (1..=10).map(Ok).collect();

        let summary = pipeline(items, sink.clone()).run().await.unwrap();

        assert_eq!(
            *sink.batches.lock().unwrap(),
            vec![vec![2, 4], vec![6, 8], vec![10]]
        );
        assert_eq!(summary.read_count, 10);
        assert_eq!(summary.filter_count, 5);
        assert_eq!(summary.write_count, 5);
        assert_eq!(summary.commit_count, 3);
    }

    #[tokio::test]
    async fn fully_filtered_chunk_still_commits() {
        let sink = RecordingSink::default();
        let items = vec![Ok(1), Ok(3)];

        let summary = pipeline(items, sink.clone()).run().await.unwrap();

        assert_eq!(*sink.batches.lock().unwrap(), vec![Vec::<i64>::new()]);
        assert_eq!(summary.write_count, 0);
    }

    #[tokio::test]
    async fn source_error_stops_the_run_and_drops_the_open_chunk() {
        let sink = RecordingSink::default();
        let items = vec![
            Ok(2),
            Ok(4),
            Ok(6),
            Ok(8),
            Ok(10),
            Err(PipelineError::Transform("boom".into())),
            Ok(12),
        ];

        let result = pipeline(items, sink.clone()).run().await;

        assert!(result.is_err());
        assert_eq!(*sink.batches.lock().unwrap(), vec![vec![2, 4, 6, 8]]);
    }

    #[tokio::test]
    async fn empty_source_writes_nothing() {
        let sink = RecordingSink::default();

        let summary = pipeline(vec![], sink.clone()).run().await.unwrap();

        assert!(sink.batches.lock().unwrap().is_empty());
        assert_eq!(summary, StepSummary::default());
    }
}
