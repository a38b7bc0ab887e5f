//! UMLS Pipeline - Concept and relation aggregation
//!
//! Two map/reduce jobs over the Metathesaurus extracts:
//! - [`ConceptAggregator`]: term and semantic-type rows to the concept table
//! - [`RelationAggregator`]: relation rows to the deduplicated relation table
//!
//! The relation job depends on the concept table written by the concept
//! job. Both jobs overwrite their artifact in full on every run.

use std::path::Path;
use std::sync::Arc;

use umls_core::{PipelineConfig, Result};
use umls_parser::ShardReader;

use crate::mapreduce::blocking;

pub mod concepts;
pub mod mapreduce;
pub mod metrics;
pub mod output;
pub mod relations;

pub use concepts::{ConceptAggregator, ConceptValue};
pub use mapreduce::{Collector, JobOutput, JobRunner, MapReduceJob};
pub use metrics::JobReport;
pub use output::write_table;
pub use relations::{ConceptLookup, PairKey, RelationAggregator, RELATION_SOURCES};

/// Aggregate term and semantic-type extracts into the concept table
pub async fn run_concepts<P: AsRef<Path>>(
    config: &PipelineConfig,
    inputs: &[P],
    output: impl AsRef<Path>,
) -> Result<JobReport> {
    let shards = ShardReader::open(inputs, config.shard_size)?;
    let job = Arc::new(ConceptAggregator::new(config));

    let JobOutput { records, report } = JobRunner::new(config.workers).run(job, shards).await?;
    let output = output.as_ref().to_path_buf();
    blocking("write", move || write_table(&output, &records)).await?;

    Ok(report)
}

/// Deduplicate a relation extract against an existing concept table.
///
/// Fails with [`umls_core::UmlsError::MissingConceptTable`] before reading
/// any relation row when the concept table is absent.
pub async fn run_relations<P: AsRef<Path>>(
    config: &PipelineConfig,
    inputs: &[P],
    concept_table: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> Result<JobReport> {
    let concept_table = concept_table.as_ref().to_path_buf();
    let lookup = Arc::new(blocking("lookup", move || ConceptLookup::load(&concept_table)).await?);
    let shards = ShardReader::open(inputs, config.shard_size)?;
    let job = Arc::new(RelationAggregator::new(lookup));

    let JobOutput { records, report } = JobRunner::new(config.workers).run(job, shards).await?;
    let output = output.as_ref().to_path_buf();
    blocking("write", move || write_table(&output, &records)).await?;

    Ok(report)
}
