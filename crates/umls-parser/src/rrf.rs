//! Rich Release Format (RRF) line decoding
//!
//! Each Metathesaurus file row ends with a trailing `|`, so a row with
//! N columns splits into N + 1 fields. The auxiliary term files are
//! hand-built and carry no trailing delimiter.

use umls_core::{RawRelationRow, RawTermRow, TermStatus};

use crate::trim_line;

/// Input layouts, recognized by field count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineFormat {
    /// MRCONSO.RRF (19 fields)
    ConceptNames,
    /// `cui|str|lat|sab` (4 fields)
    SimpleTerms,
    /// `cui|str|lat|sab|pref` (5 fields)
    PreferenceTerms,
    /// `cui|str|lat|sab|pref|sty` (6 fields)
    TypedTerms,
    /// MRSTY.RRF (7 fields)
    SemanticTypes,
    /// Anything else
    Unrecognized,
}

impl LineFormat {
    pub fn from_field_count(count: usize) -> Self {
        match count {
            19 => Self::ConceptNames,
            4 => Self::SimpleTerms,
            5 => Self::PreferenceTerms,
            6 => Self::TypedTerms,
            7 => Self::SemanticTypes,
            _ => Self::Unrecognized,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConceptNames => "concept_names",
            Self::SimpleTerms => "simple_terms",
            Self::PreferenceTerms => "preference_terms",
            Self::TypedTerms => "typed_terms",
            Self::SemanticTypes => "semantic_types",
            Self::Unrecognized => "unrecognized",
        }
    }
}

/// One MRSTY row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticTypeRow {
    pub cui: String,
    /// Fine-grained type code (e.g. "T047")
    pub tui: String,
    /// Type tree number (e.g. "B2.2.1.2.1")
    pub tree_number: String,
    /// Type label (e.g. "Disease or Syndrome")
    pub label: String,
}

/// A decoded term-extract line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermLine {
    /// A term row from MRCONSO or a 4/5-field auxiliary file
    Term(RawTermRow),
    /// A term row from a 6-field auxiliary file, with its own type group
    TypedTerm {
        row: RawTermRow,
        type_group: Option<String>,
    },
    /// A semantic type assignment
    SemanticType(SemanticTypeRow),
    /// Unknown layout, or a missing or malformed key field
    Unrecognized,
}

impl TermLine {
    /// Concept identifier the line belongs to
    pub fn cui(&self) -> Option<&str> {
        match self {
            Self::Term(row) | Self::TypedTerm { row, .. } => Some(&row.cui),
            Self::SemanticType(sty) => Some(&sty.cui),
            Self::Unrecognized => None,
        }
    }
}

/// Decode one line of a term or semantic-type extract.
///
/// A line of a known layout whose key fields (identifier, language, source
/// or type code) are empty or carry control characters decodes to
/// [`TermLine::Unrecognized`].
pub fn decode_term_line(line: &str) -> (LineFormat, TermLine) {
    let fields: Vec<&str> = trim_line(line).split('|').collect();
    let format = LineFormat::from_field_count(fields.len());
    let decoded = decode_fields(format, &fields).unwrap_or(TermLine::Unrecognized);

    (format, decoded)
}

fn decode_fields(format: LineFormat, fields: &[&str]) -> Option<TermLine> {
    let decoded = match format {
        LineFormat::ConceptNames => TermLine::Term(RawTermRow {
            cui: key_field(fields[0])?,
            language: key_field(fields[1])?,
            source: key_field(fields[11])?,
            text: fields[14].to_string(),
            term_type: fields[12].to_string(),
            status: Some(TermStatus {
                term_status: fields[2].to_string(),
                string_type: fields[4].to_string(),
                is_preferred: fields[6] == "Y",
            }),
            preferred: fields[2] == "P",
        }),
        LineFormat::SimpleTerms => TermLine::Term(auxiliary_row(fields, false)?),
        LineFormat::PreferenceTerms => TermLine::Term(auxiliary_row(fields, fields[4] == "Y")?),
        LineFormat::TypedTerms => TermLine::TypedTerm {
            row: auxiliary_row(fields, fields[4] == "Y")?,
            type_group: key_field(fields[5]),
        },
        LineFormat::SemanticTypes => TermLine::SemanticType(SemanticTypeRow {
            cui: key_field(fields[0])?,
            tui: key_field(fields[1])?,
            tree_number: fields[2].to_string(),
            label: fields[3].to_string(),
        }),
        LineFormat::Unrecognized => return None,
    };

    Some(decoded)
}

/// Auxiliary layouts share the `cui|str|lat|sab` prefix
fn auxiliary_row(fields: &[&str], preferred: bool) -> Option<RawTermRow> {
    Some(RawTermRow {
        cui: key_field(fields[0])?,
        text: fields[1].to_string(),
        language: key_field(fields[2])?,
        source: key_field(fields[3])?,
        term_type: String::new(),
        status: None,
        preferred,
    })
}

/// Key fields end up as concept-table columns: trimmed, non-empty, no tabs
fn key_field(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value.contains(char::is_control) {
        return None;
    }
    Some(value.to_string())
}

/// Decode one MRREL line; any other field count yields `None`
pub fn decode_relation_line(line: &str) -> Option<RawRelationRow> {
    let fields: Vec<&str> = trim_line(line).split('|').collect();
    if fields.len() != 17 {
        return None;
    }

    Some(RawRelationRow {
        cui1: fields[0].to_string(),
        aui1: fields[1].to_string(),
        stype1: fields[2].to_string(),
        rel: fields[3].to_string(),
        cui2: fields[4].to_string(),
        aui2: fields[5].to_string(),
        stype2: fields[6].to_string(),
        rela: fields[7].to_string(),
        rui: fields[8].to_string(),
        source: fields[10].to_string(),
        suppress: fields[14].to_string(),
    })
}
