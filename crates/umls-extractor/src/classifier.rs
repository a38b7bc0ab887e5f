//! Term Classifier
//!
//! A row is discarded as soon as one predicate fires. Predicates are
//! independent of each other, so the order below (cheapest first) only
//! matters for speed.
//!
//! The body-part predicate needs the concept's semantic groups, which
//! are only known once all rows of a concept are together; it is applied
//! by the aggregator through [`TermClassifier::discards_body_part`].

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use umls_core::{ClassifiedTerm, PipelineConfig, RawTermRow, TermTag};

use crate::body_parts::is_body_part;
use crate::normalize::normalize;
use crate::semantic::ANATOMY_GROUP;

/// Obsolete, suppressed and deprecated-synonym term types
static OBSOLETE_TERM_TYPES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "N1", "PM", "OAS", "OAF", "OAM", "OAP", "OA", "OCD", "OET", "OF", "OLC", "OM", "ONP",
        "OOSN", "OPN", "OP", "LO", "IS", "MTH_LO", "MTH_IS", "MTH_OET",
    ]
    .into_iter()
    .collect()
});

/// Consumer-health, psychiatric-only, deprecated ICD and veterinary sources
static EXCLUDED_SOURCES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "CHV",
        "PSY",
        "ICD9",
        "ICD9CM",
        "NCI_FDA",
        "NCI_CTCAE",
        "NCI_CDISC",
        "ICPC2P",
        "SNOMEDCT_VET",
    ]
    .into_iter()
    .collect()
});

static NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").expect("valid regex"));

static ROMAN_NUMERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^M{0,4}(CM|CD|D?C{0,3})(XC|XL|L?X{0,3})(IX|IV|V?I{0,3})$")
        .expect("valid regex")
});

/// Why a row was discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscardReason {
    /// Raw string shorter or longer than the configured bounds
    Length,
    /// Auxiliary row starting with a comma
    LeadingComma,
    /// Primary row that is not the preferred form of a preferred atom
    NotPreferred,
    /// Language outside the supported set
    Language,
    /// Obsolete or suppressed term type
    ObsoleteTermType,
    /// Excluded source vocabulary
    ExcludedSource,
    /// "Not otherwise specified" placeholder
    NotOtherwiseSpecified,
    /// Digits only
    Numeric,
    /// Roman numeral only
    RomanNumeral,
    /// Three or more periods or colons
    CodedFragment,
    /// Both a period and a caret
    CaretCode,
    /// Bare body-part word on a non-anatomical concept
    BodyPart,
}

impl DiscardReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Length => "length",
            Self::LeadingComma => "leading_comma",
            Self::NotPreferred => "not_preferred",
            Self::Language => "language",
            Self::ObsoleteTermType => "obsolete_term_type",
            Self::ExcludedSource => "excluded_source",
            Self::NotOtherwiseSpecified => "not_otherwise_specified",
            Self::Numeric => "numeric",
            Self::RomanNumeral => "roman_numeral",
            Self::CodedFragment => "coded_fragment",
            Self::CaretCode => "caret_code",
            Self::BodyPart => "body_part",
        }
    }
}

impl std::fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Row-level discard predicates, configured once per run
#[derive(Debug, Clone)]
pub struct TermClassifier {
    min_length: usize,
    max_length: usize,
    languages: HashSet<String>,
}

impl Default for TermClassifier {
    fn default() -> Self {
        Self::new(&PipelineConfig::default())
    }
}

impl TermClassifier {
    /// Create a classifier from the pipeline configuration
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            min_length: config.min_term_length,
            max_length: config.max_term_length,
            languages: config.languages.iter().cloned().collect(),
        }
    }

    /// Classify a row, returning the normalized term or the first reason
    /// it was discarded
    pub fn classify(&self, row: &RawTermRow) -> Result<ClassifiedTerm, DiscardReason> {
        let text = row.text.trim();

        if !self.has_valid_length(text) {
            return Err(DiscardReason::Length);
        }
        // Spreadsheet-export artifact of the auxiliary term files
        if row.status.is_none() && text.starts_with(',') {
            return Err(DiscardReason::LeadingComma);
        }
        if let Some(status) = &row.status {
            if !status.is_preferred_form() {
                return Err(DiscardReason::NotPreferred);
            }
        }
        if !self.languages.contains(&row.language) {
            return Err(DiscardReason::Language);
        }
        if OBSOLETE_TERM_TYPES.contains(row.term_type.as_str()) {
            return Err(DiscardReason::ObsoleteTermType);
        }
        if EXCLUDED_SOURCES.contains(row.source.as_str()) {
            return Err(DiscardReason::ExcludedSource);
        }

        let normalized = normalize(text);
        check_normalized(&normalized)?;

        Ok(ClassifiedTerm {
            tag: if row.preferred {
                TermTag::Preferred
            } else {
                TermTag::Term
            },
            language: row.language.clone(),
            text: normalized,
            source: row.source.clone(),
        })
    }

    /// Length bound on the raw string, in characters
    pub fn has_valid_length(&self, text: &str) -> bool {
        let len = text.chars().count();
        len >= self.min_length && len <= self.max_length
    }

    /// Body-part predicate, skipped for anatomical concepts
    pub fn discards_body_part<S: AsRef<str>>(&self, term: &str, type_groups: &[S]) -> bool {
        if type_groups.iter().any(|g| g.as_ref() == ANATOMY_GROUP) {
            return false;
        }
        is_body_part(term)
    }
}

/// Predicates on the normalized string
fn check_normalized(normalized: &str) -> Result<(), DiscardReason> {
    if normalized.eq_ignore_ascii_case("nos") {
        return Err(DiscardReason::NotOtherwiseSpecified);
    }
    if NUMERIC.is_match(normalized) {
        return Err(DiscardReason::Numeric);
    }
    if ROMAN_NUMERAL.is_match(normalized) {
        return Err(DiscardReason::RomanNumeral);
    }
    if normalized.matches('.').count() >= 3 || normalized.matches(':').count() >= 3 {
        return Err(DiscardReason::CodedFragment);
    }
    if normalized.contains('.') && normalized.contains('^') {
        return Err(DiscardReason::CaretCode);
    }
    Ok(())
}
