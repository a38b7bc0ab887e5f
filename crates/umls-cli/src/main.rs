//! UMLS CLI - Command-line interface
//!
//! Usage:
//!   umls concepts <FILES>...
//!   umls relations <MRREL>...
//!   umls index
//!   umls graph [--dry-run]
//!
//! Author: hephaex@gmail.com

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use umls_core::{AppConfig, GraphSink, LoggingConfig};
use umls_graph::{GraphLoader, MemoryGraphStore, SurrealDbStore};
use umls_index::{BulkFileSink, IndexLoader};
use umls_pipeline::{run_concepts, run_relations, JobReport};

#[derive(Parser)]
#[command(name = "umls")]
#[command(about = "UMLS term aggregation and autocompletion loading")]
#[command(version)]
struct Cli {
    /// TOML configuration file (environment variables override it)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Concurrent map/reduce tasks
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Print job reports as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate term and semantic-type extracts into the concept table
    Concepts {
        /// MRCONSO, MRSTY and auxiliary term files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Concept table to write
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Deduplicate relation extracts into the relation table
    Relations {
        /// MRREL files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Concept table written by `umls concepts`
        #[arg(long)]
        concepts: Option<PathBuf>,

        /// Relation table to write
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Write the concept table as an Elasticsearch bulk file
    Index {
        /// Concept table written by `umls concepts`
        #[arg(long)]
        concepts: Option<PathBuf>,

        /// Bulk NDJSON file to write
        #[arg(long)]
        output: Option<PathBuf>,

        /// Target index name
        #[arg(long)]
        index: Option<String>,
    },
    /// Load the relation table into the graph database
    Graph {
        /// Relation table written by `umls relations`
        #[arg(long)]
        relations: Option<PathBuf>,

        /// Load into an in-memory store instead of SurrealDB
        #[arg(long)]
        dry_run: bool,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };

    if let Some(workers) = cli.workers {
        config.pipeline.workers = workers;
    }
    config.validate()?;

    Ok(config)
}

fn init_tracing(config: &LoggingConfig) {
    let level = &config.level;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "umls={level},umls_parser={level},umls_pipeline={level},umls_index={level},umls_graph={level}"
        ))
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_file(config.include_location)
        .with_line_number(config.include_location);

    if config.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn startup_summary(config: &AppConfig) -> String {
    format!(
        "umls {} starting: {} workers, languages {}, output in {}",
        env!("CARGO_PKG_VERSION"),
        config.pipeline.workers,
        config.pipeline.languages.join(","),
        config.pipeline.output_dir.display()
    )
}

fn print_report(report: &JobReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!(
            "{}: {} lines read, {} keys, {} records written in {} ms",
            report.job,
            report.lines_read,
            report.keys_reduced,
            report.records_emitted,
            report.elapsed_ms
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli).context("Invalid configuration")?;
    init_tracing(&config.logging);

    tracing::info!("{}", startup_summary(&config));

    match cli.command {
        Commands::Concepts { files, output } => {
            let output = output.unwrap_or_else(|| config.concept_table_path());
            let report = run_concepts(&config.pipeline, &files, &output).await?;
            print_report(&report, cli.json)?;
        }
        Commands::Relations {
            files,
            concepts,
            output,
        } => {
            let concepts = concepts.unwrap_or_else(|| config.concept_table_path());
            let output = output.unwrap_or_else(|| config.relation_table_path());
            let report = run_relations(&config.pipeline, &files, &concepts, &output).await?;
            print_report(&report, cli.json)?;
        }
        Commands::Index {
            concepts,
            output,
            index,
        } => {
            let index = index.unwrap_or_else(|| config.index.index_name.clone());
            let concepts = concepts.unwrap_or_else(|| config.concept_table_path());
            let output = output
                .unwrap_or_else(|| config.pipeline.output_dir.join(format!("{index}.ndjson")));

            let sink = BulkFileSink::create(&output, &index).await?;
            tracing::info!("Writing index {} to {}", index, output.display());
            let stats = IndexLoader::new(&config.index)
                .load_table(&sink, &concepts)
                .await?;

            println!(
                "{}: {} documents from {} concepts written to {}",
                index,
                stats.documents,
                stats.concepts,
                output.display()
            );
        }
        Commands::Graph { relations, dry_run } => {
            let relations = relations.unwrap_or_else(|| config.relation_table_path());

            let store: Box<dyn GraphSink> = if dry_run {
                Box::new(MemoryGraphStore::new())
            } else {
                let store = SurrealDbStore::new(&config.database).await?;
                store.init_schema().await?;
                Box::new(store)
            };
            tracing::info!("Loading {} into {} graph store", relations.display(), store.name());

            let stats = GraphLoader::new(&config.database)
                .load_table(store.as_ref(), &relations)
                .await?;

            println!(
                "{}: {} relations merged in {} batches",
                store.name(),
                stats.relations,
                stats.batches
            );
        }
    }

    Ok(())
}
