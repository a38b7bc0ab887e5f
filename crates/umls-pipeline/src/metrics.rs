//! Job metrics
//!
//! Counts what each job read, dropped and wrote. Dropped rows are never
//! errors, so these counters are the only place they show up.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary of one job run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    /// Job name
    pub job: String,

    /// When the job started
    pub started_at: DateTime<Utc>,

    /// Wall-clock duration in milliseconds
    pub elapsed_ms: u64,

    /// Input lines handed to mappers
    pub lines_read: u64,

    /// Key/value pairs emitted by mappers
    pub pairs_emitted: u64,

    /// Distinct keys reduced
    pub keys_reduced: u64,

    /// Output records written
    pub records_emitted: u64,

    /// Named counters (line formats, discard reasons, ...)
    pub counters: BTreeMap<String, u64>,
}

impl JobReport {
    pub fn new(job: impl Into<String>) -> Self {
        Self {
            job: job.into(),
            started_at: Utc::now(),
            elapsed_ms: 0,
            lines_read: 0,
            pairs_emitted: 0,
            keys_reduced: 0,
            records_emitted: 0,
            counters: BTreeMap::new(),
        }
    }

    /// Add a batch of counters
    pub fn merge_counters(&mut self, counters: &BTreeMap<&'static str, u64>) {
        for (label, n) in counters {
            *self.counters.entry((*label).to_string()).or_insert(0) += n;
        }
    }

    /// Value of a named counter
    pub fn counter(&self, label: &str) -> u64 {
        self.counters.get(label).copied().unwrap_or(0)
    }

    /// Fraction of input lines that produced at least one pair (approximate)
    pub fn yield_ratio(&self) -> f32 {
        if self.lines_read == 0 {
            0.0
        } else {
            (self.pairs_emitted as f32 / self.lines_read as f32).min(1.0)
        }
    }

    /// Log the report
    pub fn log(&self) {
        tracing::info!(
            job = %self.job,
            lines = self.lines_read,
            keys = self.keys_reduced,
            records = self.records_emitted,
            elapsed_ms = self.elapsed_ms,
            "Job {} finished",
            self.job
        );
        for (label, n) in &self.counters {
            tracing::debug!(job = %self.job, "{label}: {n}");
        }
    }
}
