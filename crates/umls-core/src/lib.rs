//! UMLS Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout the pipeline:
//! - Terminology rows (concept names, relations) as read from the extracts
//! - Aggregated concept records and canonical relations as emitted
//! - Common error types
//! - Sink traits for the downstream search index and graph store
//! - Configuration management

pub mod config;

pub use config::{
    AppConfig, ConfigError, DatabaseConfig, IndexConfig, LoggingConfig, PipelineConfig,
};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// English language code as used by the Metathesaurus
pub const ENGLISH: &str = "ENG";

/// Dutch language code as used by the Metathesaurus
pub const DUTCH: &str = "DUT";

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for pipeline operations
#[derive(Error, Debug)]
pub enum UmlsError {
    #[error("concept table not found at {}; run `umls concepts` first to generate it", .path.display())]
    MissingConceptTable { path: PathBuf },

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Sink error: {0}")]
    Sink(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ConfigError> for UmlsError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, UmlsError>;

// ============================================================================
// Term Rows
// ============================================================================

/// One term row from a concept-names extract, whatever its layout.
///
/// Auxiliary layouts carry no status flags; for those `status` is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTermRow {
    /// Concept identifier (CUI)
    pub cui: String,

    /// Language code (e.g. "ENG", "DUT")
    pub language: String,

    /// Source vocabulary abbreviation (e.g. "SNOMEDCT_US")
    pub source: String,

    /// Raw term string, untouched
    pub text: String,

    /// Term-type code (e.g. "PT", "OAP"); empty for auxiliary layouts
    pub term_type: String,

    /// Status flags, only present in the primary extract
    pub status: Option<TermStatus>,

    /// Whether this row designates the preferred term of its concept
    pub preferred: bool,
}

/// Status flags of a primary-extract term row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermStatus {
    /// Term status (`TS`), "P" for the preferred LUI of the concept
    pub term_status: String,

    /// String type (`STT`), "PF" for the preferred form
    pub string_type: String,

    /// Atom-level preference flag (`ISPREF`)
    pub is_preferred: bool,
}

impl TermStatus {
    /// Only source-preferred atoms in their preferred form are indexed
    pub fn is_preferred_form(&self) -> bool {
        self.is_preferred && self.string_type == "PF"
    }
}

/// Tag of a term that survived classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermTag {
    Preferred,
    Term,
}

/// A term that passed every discard predicate, already normalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedTerm {
    pub tag: TermTag,
    pub language: String,
    pub text: String,
    pub source: String,
}

impl ClassifiedTerm {
    pub fn is_preferred(&self) -> bool {
        self.tag == TermTag::Preferred
    }
}

// ============================================================================
// Aggregated Concepts
// ============================================================================

/// One record of the concept table, keyed by (cui, language, source)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedConcept {
    /// Concept identifier
    pub cui: String,

    /// Language code
    pub language: String,

    /// Source vocabulary
    pub source: String,

    /// Semantic type groups, sorted and unique
    pub type_groups: Vec<String>,

    /// Preferred term for this language
    pub preferred: String,

    /// Unique normalized terms, first-seen casing
    pub terms: Vec<String>,
}

impl AggregatedConcept {
    /// Check whether a type group is present
    pub fn has_group(&self, group: &str) -> bool {
        self.type_groups.iter().any(|g| g == group)
    }
}

/// Tab-delimited concept-table line:
/// `cui \t language \t source \t g1|g2 \t preferred \t t1|t2`
impl std::fmt::Display for AggregatedConcept {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.cui,
            self.language,
            self.source,
            self.type_groups.join("|"),
            self.preferred,
            self.terms.join("|")
        )
    }
}

// ============================================================================
// Relations
// ============================================================================

/// One row of the relation extract (MRREL layout)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRelationRow {
    pub cui1: String,
    pub aui1: String,
    pub stype1: String,
    /// Relation code (e.g. "CHD", "SIB", "RN")
    pub rel: String,
    pub cui2: String,
    pub aui2: String,
    pub stype2: String,
    /// Relation attribute (e.g. "isa")
    pub rela: String,
    pub rui: String,
    /// Source vocabulary asserting the relation
    pub source: String,
    pub suppress: String,
}

/// Kinds of hierarchical relation kept in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    Child,
    Sibling,
    Isa,
}

impl RelationKind {
    /// All kinds, in output order
    pub const ALL: [RelationKind; 3] = [Self::Child, Self::Sibling, Self::Isa];

    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Child => "child",
            Self::Sibling => "sibling",
            Self::Isa => "isa",
        }
    }

    /// Get from label
    pub fn from_label(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "child" => Some(Self::Child),
            "sibling" => Some(Self::Sibling),
            "isa" => Some(Self::Isa),
            _ => None,
        }
    }

    /// Map a relation code and attribute to a kind.
    ///
    /// Narrower relations only count when the attribute is exactly `isa`.
    pub fn from_rrf(rel: &str, rela: &str) -> Option<Self> {
        match rel {
            "CHD" => Some(Self::Child),
            "SIB" => Some(Self::Sibling),
            "RN" if rela == "isa" => Some(Self::Isa),
            _ => None,
        }
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A deduplicated relation, directionality as found in the extract
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanonicalRelation {
    pub source_cui: String,
    pub kind: RelationKind,
    pub target_cui: String,
}

impl CanonicalRelation {
    pub fn new(
        source_cui: impl Into<String>,
        kind: RelationKind,
        target_cui: impl Into<String>,
    ) -> Self {
        Self {
            source_cui: source_cui.into(),
            kind,
            target_cui: target_cui.into(),
        }
    }
}

/// Tab-delimited relation-table line: `cui_a \t kind \t cui_b`
impl std::fmt::Display for CanonicalRelation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\t{}\t{}", self.source_cui, self.kind, self.target_cui)
    }
}

// ============================================================================
// Search Index Documents
// ============================================================================

/// A document for the autocompletion index, one per unique term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDocument {
    /// Concept identifier
    pub cui: String,

    /// Preferred term of the concept
    pub pref: String,

    /// Normalized term, indexed for autocompletion
    pub str: String,

    /// Exact-match lookup key
    pub exact: String,

    /// Language code
    pub lang: String,

    /// Source vocabulary
    pub source: String,

    /// Semantic type groups
    pub types: Vec<String>,

    /// Relevance weight
    pub votes: u32,
}

// ============================================================================
// Traits
// ============================================================================

/// Trait for search index sinks
#[async_trait::async_trait]
pub trait IndexSink: Send + Sync {
    /// Index a batch of documents
    async fn index_batch(&self, documents: &[IndexDocument]) -> Result<()>;

    /// Flush buffered writes
    async fn flush(&self) -> Result<()>;

    /// Get sink name for logging
    fn name(&self) -> &str;
}

/// Trait for graph stores with merge (upsert) semantics.
///
/// Creating a node or edge that already exists is a no-op, never an error.
#[async_trait::async_trait]
pub trait GraphSink: Send + Sync {
    /// Merge concept nodes by identifier
    async fn merge_concepts(&self, cuis: &[String]) -> Result<()>;

    /// Merge directed edges keyed by (source, target, kind)
    async fn merge_relations(&self, relations: &[CanonicalRelation]) -> Result<()>;

    /// Get store name for logging
    fn name(&self) -> &str;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concept_line_format() {
        let concept = AggregatedConcept {
            cui: "C0001".to_string(),
            language: ENGLISH.to_string(),
            source: "SNOMEDCT_US".to_string(),
            type_groups: vec!["DISO".to_string()],
            preferred: "Headache".to_string(),
            terms: vec!["Headache".to_string()],
        };

        assert_eq!(
            concept.to_string(),
            "C0001\tENG\tSNOMEDCT_US\tDISO\tHeadache\tHeadache"
        );
        assert!(concept.has_group("DISO"));
        assert!(!concept.has_group("ANAT"));
    }

    #[test]
    fn test_relation_kind_from_rrf() {
        assert_eq!(RelationKind::from_rrf("CHD", ""), Some(RelationKind::Child));
        assert_eq!(RelationKind::from_rrf("SIB", "foo"), Some(RelationKind::Sibling));
        assert_eq!(RelationKind::from_rrf("RN", "isa"), Some(RelationKind::Isa));
        assert_eq!(RelationKind::from_rrf("RN", "mapped_to"), None);
        assert_eq!(RelationKind::from_rrf("PAR", ""), None);
    }

    #[test]
    fn test_relation_kind_labels() {
        for kind in RelationKind::ALL {
            assert_eq!(RelationKind::from_label(kind.as_str()), Some(kind));
        }
        assert_eq!(RelationKind::from_label("parent"), None);
    }

    #[test]
    fn test_relation_line_format() {
        let rel = CanonicalRelation::new("C0002", RelationKind::Isa, "C0001");
        assert_eq!(rel.to_string(), "C0002\tisa\tC0001");
    }

    #[test]
    fn test_preferred_form() {
        let status = TermStatus {
            term_status: "P".to_string(),
            string_type: "PF".to_string(),
            is_preferred: true,
        };
        assert!(status.is_preferred_form());

        let variant = TermStatus {
            string_type: "VO".to_string(),
            ..status.clone()
        };
        assert!(!variant.is_preferred_form());

        let not_pref = TermStatus {
            is_preferred: false,
            ..status
        };
        assert!(!not_pref.is_preferred_form());
    }

    #[test]
    fn test_missing_concept_table_message() {
        let err = UmlsError::MissingConceptTable {
            path: PathBuf::from("output/concepts.txt"),
        };
        let msg = err.to_string();
        assert!(msg.contains("output/concepts.txt"));
        assert!(msg.contains("umls concepts"));
    }

    #[test]
    fn test_index_document_fields() {
        let doc = IndexDocument {
            cui: "C0001".to_string(),
            pref: "Headache".to_string(),
            str: "Cephalgia".to_string(),
            exact: "cephalgia".to_string(),
            lang: ENGLISH.to_string(),
            source: "SNOMEDCT_US".to_string(),
            types: vec!["DISO".to_string()],
            votes: 10,
        };

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["str"], "Cephalgia");
        assert_eq!(json["exact"], "cephalgia");
        assert_eq!(json["votes"], 10);
        assert_eq!(json["types"][0], "DISO");
    }
}
