//! UMLS Parser - Line decoding for Metathesaurus extracts
//!
//! Supports decoding of:
//! - MRCONSO concept names (19 pipe-delimited fields)
//! - Auxiliary term files (4, 5 or 6 pipe-delimited fields)
//! - MRSTY semantic types (7 pipe-delimited fields)
//! - MRREL relations (17 pipe-delimited fields)
//! - The tab-delimited concept and relation tables written by the pipelines
//!
//! Layouts are told apart by field count only. A line with an unknown
//! field count decodes to an `Unrecognized` variant and is meant to be
//! skipped, not reported.

use std::path::PathBuf;
use thiserror::Error;

pub mod reader;
pub mod rrf;
pub mod table;

pub use reader::ShardReader;
pub use rrf::{decode_relation_line, decode_term_line, LineFormat, SemanticTypeRow, TermLine};
pub use table::{parse_concept_line, parse_relation_line};

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while reading extract files
#[derive(Error, Debug)]
pub enum ParserError {
    /// Input file does not exist
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// IO error while reading the file
    #[error("IO error reading file: {}", .path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ParserError>;

impl From<ParserError> for umls_core::UmlsError {
    fn from(err: ParserError) -> Self {
        match err {
            ParserError::FileNotFound(path) => umls_core::UmlsError::Io {
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
                path,
            },
            ParserError::IoError { path, source } => umls_core::UmlsError::Io { path, source },
        }
    }
}

/// Strip the line terminator, leaving inner whitespace intact
pub(crate) fn trim_line(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}
