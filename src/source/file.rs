use crate::core::{Person, PipelineError, RecordStream, Result, Source};
use anyhow::Context;
use async_trait::async_trait;
use futures::stream::StreamExt;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::LinesStream;
use tracing::debug;

const PERSON_COLUMNS: usize = 3;

/// Reads `id,name,email` lines from a delimited text file.
pub struct CsvSource {
    file_path: PathBuf,
    has_header: bool,
    delimiter: u8,
}

impl CsvSource {
    pub fn new<P: AsRef<Path>>(file_path: P) -> Self {
        Self {
            file_path: file_path.as_ref().to_path_buf(),
            has_header: true,
            delimiter: b',',
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }
}

fn parse_line(line: &str, line_number: usize, delimiter: u8) -> Result<Person> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(line.as_bytes());

    let record = match reader.records().next() {
        Some(record) => record?,
        None => {
            return Err(PipelineError::MalformedLine {
                line: line_number,
                reason: "empty line".to_string(),
            });
        }
    };

    if record.len() != PERSON_COLUMNS {
        return Err(PipelineError::MalformedLine {
            line: line_number,
            reason: format!("expected {} fields, found {}", PERSON_COLUMNS, record.len()),
        });
    }

    let id = record[0]
        .parse::<i64>()
        .map_err(|e| PipelineError::MalformedLine {
            line: line_number,
            reason: format!("invalid id '{}': {}", &record[0], e),
        })?;

    Ok(Person::new(Some(id), &record[1], &record[2]))
}

#[async_trait]
impl Source<Person> for CsvSource {
    async fn read(&self) -> Result<RecordStream<Person>> {
        let file = File::open(&self.file_path)
            .await
            .with_context(|| format!("cannot open {}", self.file_path.display()))?;
        let reader = BufReader::new(file);
        let lines = LinesStream::new(reader.lines());

        debug!(path = %self.file_path.display(), "opened CSV source");

        let has_header = self.has_header;
        let delimiter = self.delimiter;

        let stream = lines.enumerate().filter_map(move |(index, line_result)| async move {
            match line_result {
                Ok(line) => {
                    if has_header && index == 0 {
                        return None;
                    }
                    if line.trim().is_empty() {
                        return None;
                    }

                    Some(parse_line(&line, index + 1, delimiter))
                }
                Err(e) => Some(Err(PipelineError::Io(e))),
            }
        });

        Ok(Box::pin(stream))
    }
}
