//! In-memory map/reduce runner
//!
//! Map tasks run over input shards on the blocking pool, at most
//! `workers` at a time. Their output is grouped by key (the shuffle
//! barrier) and each group is folded by one reduce call. Groups are
//! reduced in key order and values reach the reducer in input order, so
//! a run over the same input always writes the same artifact.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use umls_core::{Result, UmlsError};

use crate::metrics::JobReport;

/// Buffer handed to map and reduce calls for their output and counters
#[derive(Debug)]
pub struct Collector<T> {
    items: Vec<T>,
    counters: BTreeMap<&'static str, u64>,
}

impl<T> Default for Collector<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            counters: BTreeMap::new(),
        }
    }
}

impl<T> Collector<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit an item
    pub fn emit(&mut self, item: T) {
        self.items.push(item);
    }

    /// Bump a named counter
    pub fn count(&mut self, label: &'static str) {
        *self.counters.entry(label).or_insert(0) += 1;
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn counter(&self, label: &str) -> u64 {
        self.counters.get(label).copied().unwrap_or(0)
    }

    pub fn into_parts(self) -> (Vec<T>, BTreeMap<&'static str, u64>) {
        (self.items, self.counters)
    }
}

/// A job expressed as a stateless map and a per-key reduce
pub trait MapReduceJob: Send + Sync + 'static {
    type Key: Ord + Send + 'static;
    type Value: Send + 'static;
    type Output: Send + 'static;

    /// Job name for logging and reports
    fn name(&self) -> &str;

    /// Map one input line to zero or more keyed values
    fn map(&self, line: &str, out: &mut Collector<(Self::Key, Self::Value)>);

    /// Fold all values of one key. Must not depend on value order.
    fn reduce(&self, key: &Self::Key, values: Vec<Self::Value>, out: &mut Collector<Self::Output>);
}

/// Result of a job run
#[derive(Debug)]
pub struct JobOutput<O> {
    pub records: Vec<O>,
    pub report: JobReport,
}

/// Runs jobs with bounded concurrency
#[derive(Debug, Clone)]
pub struct JobRunner {
    workers: usize,
}

impl JobRunner {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Run a job over a sequence of input shards.
    ///
    /// Shards are pulled on the blocking pool, since the iterator may read
    /// files, and handed to the map tasks through a channel of `workers`
    /// slots.
    pub async fn run<J, I, E>(&self, job: Arc<J>, shards: I) -> Result<JobOutput<J::Output>>
    where
        J: MapReduceJob,
        I: IntoIterator<Item = std::result::Result<Vec<String>, E>>,
        I::IntoIter: Send + 'static,
        E: Into<UmlsError> + Send + 'static,
    {
        let started = Instant::now();
        let mut report = JobReport::new(job.name());

        tracing::info!("Job {} started with {} workers", job.name(), self.workers);

        let (tx, rx) = tokio::sync::mpsc::channel::<Result<Vec<String>>>(self.workers);
        let shards = shards.into_iter();
        let producer = tokio::task::spawn_blocking(move || {
            for shard in shards {
                // Receiver gone: the map phase already failed
                if tx.blocking_send(shard.map_err(Into::into)).is_err() {
                    break;
                }
            }
        });
        let incoming = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|shard| (shard, rx))
        });

        // Map phase
        let mapped = incoming
            .map(|shard| {
                let job = Arc::clone(&job);
                async move {
                    let shard = shard?;
                    let lines = shard.len() as u64;
                    let out = blocking("map", move || {
                        let mut out = Collector::new();
                        for line in &shard {
                            job.map(line, &mut out);
                        }
                        Ok(out)
                    })
                    .await?;
                    Ok::<_, UmlsError>((lines, out))
                }
            })
            .buffered(self.workers);
        let mut mapped = Box::pin(mapped);

        // Shuffle: group by key, keeping arrival order within a key
        let mut groups: BTreeMap<J::Key, Vec<J::Value>> = BTreeMap::new();
        while let Some(result) = mapped.next().await {
            let (lines, out) = result?;
            report.lines_read += lines;

            let (pairs, counters) = out.into_parts();
            report.merge_counters(&counters);
            report.pairs_emitted += pairs.len() as u64;
            for (key, value) in pairs {
                groups.entry(key).or_default().push(value);
            }
        }
        drop(mapped);
        producer
            .await
            .map_err(|e| UmlsError::Other(anyhow::anyhow!("shard reader failed: {e}")))?;

        tracing::debug!(
            "Job {} map phase done: {} lines, {} keys",
            job.name(),
            report.lines_read,
            groups.len()
        );

        // Reduce phase
        report.keys_reduced = groups.len() as u64;
        let chunk_size = (groups.len() / (self.workers * 4)).max(1);
        let mut chunks: Vec<Vec<(J::Key, Vec<J::Value>)>> = Vec::new();
        let mut current = Vec::with_capacity(chunk_size);
        for entry in groups {
            current.push(entry);
            if current.len() == chunk_size {
                chunks.push(std::mem::replace(
                    &mut current,
                    Vec::with_capacity(chunk_size),
                ));
            }
        }
        if !current.is_empty() {
            chunks.push(current);
        }

        let mut reduced = stream::iter(chunks)
            .map(|chunk| {
                let job = Arc::clone(&job);
                blocking("reduce", move || {
                    let mut out = Collector::new();
                    for (key, values) in chunk {
                        job.reduce(&key, values, &mut out);
                    }
                    Ok(out)
                })
            })
            .buffered(self.workers);

        let mut records = Vec::new();
        while let Some(result) = reduced.next().await {
            let (items, counters) = result?.into_parts();
            report.merge_counters(&counters);
            records.extend(items);
        }

        report.records_emitted = records.len() as u64;
        report.elapsed_ms = started.elapsed().as_millis() as u64;
        report.log();

        Ok(JobOutput { records, report })
    }
}

/// Run blocking work (map and reduce calls, file IO) off the async workers
pub(crate) async fn blocking<T, F>(task: &'static str, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| UmlsError::Other(anyhow::anyhow!("{task} task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Word count, the canonical map/reduce job
    struct WordCount;

    impl MapReduceJob for WordCount {
        type Key = String;
        type Value = u64;
        type Output = (String, u64);

        fn name(&self) -> &str {
            "word_count"
        }

        fn map(&self, line: &str, out: &mut Collector<(String, u64)>) {
            for word in line.split_whitespace() {
                out.emit((word.to_lowercase(), 1));
            }
            if line.is_empty() {
                out.count("empty");
            }
        }

        fn reduce(&self, key: &String, values: Vec<u64>, out: &mut Collector<(String, u64)>) {
            out.emit((key.clone(), values.iter().sum()));
        }
    }

    fn shards(lines: &[&[&str]]) -> Vec<std::result::Result<Vec<String>, UmlsError>> {
        lines
            .iter()
            .map(|shard| Ok(shard.iter().map(|s| s.to_string()).collect()))
            .collect()
    }

    #[tokio::test]
    async fn test_word_count() {
        let runner = JobRunner::new(3);
        let input = shards(&[&["a b", "B c"], &["c c", ""], &["a"]]);

        let output = runner.run(Arc::new(WordCount), input).await.unwrap();

        assert_eq!(
            output.records,
            vec![
                ("a".to_string(), 2),
                ("b".to_string(), 2),
                ("c".to_string(), 3)
            ]
        );
        assert_eq!(output.report.lines_read, 5);
        assert_eq!(output.report.keys_reduced, 3);
        assert_eq!(output.report.records_emitted, 3);
        assert_eq!(output.report.counters.get("empty"), Some(&1));
    }

    #[tokio::test]
    async fn test_output_independent_of_sharding() {
        let lines = ["x y z", "y z", "z", "w"];
        let one = shards(&[&lines]);
        let many = shards(&[&lines[..1], &lines[1..2], &lines[2..]]);

        let a = JobRunner::new(1).run(Arc::new(WordCount), one).await.unwrap();
        let b = JobRunner::new(8).run(Arc::new(WordCount), many).await.unwrap();

        assert_eq!(a.records, b.records);
    }

    #[tokio::test]
    async fn test_shard_error_propagates() {
        let input: Vec<std::result::Result<Vec<String>, UmlsError>> =
            vec![Ok(vec!["a".to_string()]), Err(UmlsError::Parse("bad shard".to_string()))];

        let err = JobRunner::new(2)
            .run(Arc::new(WordCount), input)
            .await
            .unwrap_err();
        assert!(matches!(err, UmlsError::Parse(_)));
    }

    /// Shard source that blocks the calling thread, as file reads do
    struct BlockingShards {
        handle: tokio::runtime::Handle,
        remaining: Vec<&'static str>,
    }

    impl Iterator for BlockingShards {
        type Item = std::result::Result<Vec<String>, UmlsError>;

        fn next(&mut self) -> Option<Self::Item> {
            let line = self.remaining.pop()?;
            // Panics when called from an async worker thread
            let shard = self.handle.block_on(async move { vec![line.to_string()] });
            Some(Ok(shard))
        }
    }

    #[tokio::test]
    async fn test_shards_pulled_off_async_workers() {
        let input = BlockingShards {
            handle: tokio::runtime::Handle::current(),
            remaining: vec!["b a", "a"],
        };

        let output = JobRunner::new(2).run(Arc::new(WordCount), input).await.unwrap();

        assert_eq!(
            output.records,
            vec![("a".to_string(), 2), ("b".to_string(), 1)]
        );
        assert_eq!(output.report.lines_read, 2);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let output = JobRunner::new(2)
            .run(Arc::new(WordCount), shards(&[]))
            .await
            .unwrap();
        assert!(output.records.is_empty());
        assert_eq!(output.report.keys_reduced, 0);
    }

    #[test]
    fn test_collector_counters() {
        let mut out: Collector<u8> = Collector::new();
        out.count("a");
        out.count("a");
        out.emit(1);
        assert_eq!(out.counter("a"), 2);
        assert_eq!(out.counter("b"), 0);
        assert_eq!(out.items(), &[1]);
    }
}
