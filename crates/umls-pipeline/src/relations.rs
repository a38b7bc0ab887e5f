//! Relation Aggregator
//!
//! Collapses the relation extract into one canonical edge per unordered
//! concept pair and relation kind. Both endpoints must be present in the
//! concept table, which is loaded into a [`ConceptLookup`] before any
//! mapper starts and shared read-only afterwards.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use umls_core::{AggregatedConcept, CanonicalRelation, RelationKind, Result, UmlsError};
use umls_parser::{decode_relation_line, parse_concept_line};

use crate::mapreduce::{Collector, MapReduceJob};

/// Source vocabularies whose hierarchies are kept
pub const RELATION_SOURCES: [&str; 2] = ["SNOMEDCT_US", "ICD10CM"];

/// Concept identifiers of the concept table with their lowercased
/// preferred terms
#[derive(Debug, Clone, Default)]
pub struct ConceptLookup {
    preferred: HashMap<String, Vec<String>>,
}

impl ConceptLookup {
    /// Load the lookup from a concept table.
    ///
    /// A missing table is fatal: without it every relation would be
    /// dropped and the run would silently produce nothing.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(UmlsError::MissingConceptTable {
                path: path.to_path_buf(),
            });
        }

        let file = File::open(path).map_err(|e| UmlsError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut lookup = Self::default();
        let mut skipped = 0usize;
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| UmlsError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;
            match parse_concept_line(&line) {
                Some(concept) => lookup.insert(&concept.cui, &concept.preferred),
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            tracing::warn!("Skipped {} malformed lines in {}", skipped, path.display());
        }
        tracing::info!(
            "Loaded {} concepts from {}",
            lookup.len(),
            path.display()
        );

        Ok(lookup)
    }

    /// Build the lookup from records already in memory
    pub fn from_concepts<'a>(concepts: impl IntoIterator<Item = &'a AggregatedConcept>) -> Self {
        let mut lookup = Self::default();
        for concept in concepts {
            lookup.insert(&concept.cui, &concept.preferred);
        }
        lookup
    }

    fn insert(&mut self, cui: &str, preferred: &str) {
        let terms = self.preferred.entry(cui.to_string()).or_default();
        let lower = preferred.to_lowercase();
        if !terms.contains(&lower) {
            terms.push(lower);
        }
    }

    pub fn contains(&self, cui: &str) -> bool {
        self.preferred.contains_key(cui)
    }

    pub fn len(&self) -> usize {
        self.preferred.len()
    }

    pub fn is_empty(&self) -> bool {
        self.preferred.is_empty()
    }

    /// Check whether `target` only extends the wording of `source`
    /// ("Metformin" -> "Metformin 500 MG Tablet")
    pub fn is_lexical_extension(&self, source: &str, target: &str) -> bool {
        let (Some(source_terms), Some(target_terms)) =
            (self.preferred.get(source), self.preferred.get(target))
        else {
            return false;
        };

        target_terms
            .iter()
            .any(|t| source_terms.iter().any(|s| t.contains(s.as_str())))
    }
}

/// Unordered concept pair, stored smaller identifier first
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PairKey(pub String, pub String);

impl PairKey {
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b {
            Self(a.to_string(), b.to_string())
        } else {
            Self(b.to_string(), a.to_string())
        }
    }
}

/// Relation deduplication job
#[derive(Debug, Clone)]
pub struct RelationAggregator {
    lookup: Arc<ConceptLookup>,
}

impl RelationAggregator {
    pub fn new(lookup: Arc<ConceptLookup>) -> Self {
        Self { lookup }
    }
}

impl MapReduceJob for RelationAggregator {
    type Key = PairKey;
    type Value = CanonicalRelation;
    type Output = CanonicalRelation;

    fn name(&self) -> &str {
        "relations"
    }

    fn map(&self, line: &str, out: &mut Collector<(PairKey, CanonicalRelation)>) {
        let Some(row) = decode_relation_line(line) else {
            out.count("unrecognized");
            return;
        };

        if row.cui1.is_empty() || row.cui2.is_empty() {
            out.count("empty_cui");
            return;
        }
        if row.cui1 == row.cui2 {
            out.count("self_relation");
            return;
        }
        if !RELATION_SOURCES.contains(&row.source.as_str()) {
            out.count("source");
            return;
        }
        if row.rel == "RN" && row.rela != "isa" {
            out.count("narrower_not_isa");
            return;
        }
        let Some(kind) = RelationKind::from_rrf(&row.rel, &row.rela) else {
            out.count("relation_kind");
            return;
        };
        if !self.lookup.contains(&row.cui1) || !self.lookup.contains(&row.cui2) {
            out.count("unknown_concept");
            return;
        }
        if self.lookup.is_lexical_extension(&row.cui1, &row.cui2) {
            out.count("lexical_extension");
            return;
        }

        out.emit((
            PairKey::new(&row.cui1, &row.cui2),
            CanonicalRelation::new(row.cui1, kind, row.cui2),
        ));
    }

    fn reduce(
        &self,
        _key: &PairKey,
        values: Vec<CanonicalRelation>,
        out: &mut Collector<CanonicalRelation>,
    ) {
        // Last row of a kind wins
        let mut by_kind: BTreeMap<RelationKind, CanonicalRelation> = BTreeMap::new();
        for relation in values {
            by_kind.insert(relation.kind, relation);
        }

        for relation in by_kind.into_values() {
            out.emit(relation);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mrrel(cui1: &str, rel: &str, cui2: &str, rela: &str, sab: &str) -> String {
        format!("{cui1}|A1|AUI|{rel}|{cui2}|A2|AUI|{rela}|R1||{sab}|{sab}||N|N||")
    }

    fn concept(cui: &str, preferred: &str) -> AggregatedConcept {
        AggregatedConcept {
            cui: cui.to_string(),
            language: "ENG".to_string(),
            source: "SNOMEDCT_US".to_string(),
            type_groups: vec!["CHEM".to_string()],
            preferred: preferred.to_string(),
            terms: vec![preferred.to_string()],
        }
    }

    fn job() -> RelationAggregator {
        let concepts = [
            concept("C1", "Diabetes mellitus"),
            concept("C2", "Type 2 diabetes"),
            concept("C3", "Metformin"),
            concept("C4", "Metformin 500 MG Tablet"),
            concept("C5", "Insulin"),
        ];
        RelationAggregator::new(Arc::new(ConceptLookup::from_concepts(&concepts)))
    }

    fn map_one(job: &RelationAggregator, line: &str) -> Collector<(PairKey, CanonicalRelation)> {
        let mut out = Collector::new();
        job.map(line, &mut out);
        out
    }

    #[test]
    fn test_pair_key_is_unordered() {
        assert_eq!(PairKey::new("C2", "C1"), PairKey::new("C1", "C2"));
        assert_eq!(PairKey::new("C2", "C1").0, "C1");
    }

    #[test]
    fn test_map_keeps_direction() {
        let job = job();
        let out = map_one(&job, &mrrel("C2", "CHD", "C1", "", "SNOMEDCT_US"));

        let (key, relation) = &out.items()[0];
        assert_eq!(key, &PairKey::new("C1", "C2"));
        assert_eq!(relation.to_string(), "C2\tchild\tC1");
    }

    #[test]
    fn test_map_filters() {
        let job = job();
        let cases = [
            (mrrel("", "CHD", "C1", "", "SNOMEDCT_US"), "empty_cui"),
            (mrrel("C1", "CHD", "C1", "", "SNOMEDCT_US"), "self_relation"),
            (mrrel("C1", "CHD", "C2", "", "MSH"), "source"),
            (mrrel("C1", "RN", "C2", "mapped_to", "SNOMEDCT_US"), "narrower_not_isa"),
            (mrrel("C1", "RO", "C2", "", "SNOMEDCT_US"), "relation_kind"),
            (mrrel("C1", "CHD", "C9", "", "SNOMEDCT_US"), "unknown_concept"),
            (mrrel("C3", "RN", "C4", "isa", "SNOMEDCT_US"), "lexical_extension"),
            ("C1|C2|child".to_string(), "unrecognized"),
        ];

        for (line, counter) in cases {
            let out = map_one(&job, &line);
            assert!(out.items().is_empty(), "{line} should be dropped");
            assert_eq!(out.counter(counter), 1, "{line} should count {counter}");
        }
    }

    #[test]
    fn test_map_isa() {
        let job = job();
        let out = map_one(&job, &mrrel("C5", "RN", "C2", "isa", "ICD10CM"));
        assert_eq!(out.items()[0].1.kind, RelationKind::Isa);
    }

    #[test]
    fn test_lexical_extension_is_directional() {
        let job = job();
        assert!(job.lookup.is_lexical_extension("C3", "C4"));
        assert!(!job.lookup.is_lexical_extension("C4", "C3"));
        assert!(!job.lookup.is_lexical_extension("C3", "C9"));

        // The reverse edge is allowed
        let out = map_one(&job, &mrrel("C4", "CHD", "C3", "", "SNOMEDCT_US"));
        assert_eq!(out.items().len(), 1);
    }

    #[test]
    fn test_reduce_one_per_kind() {
        let job = job();
        let key = PairKey::new("C1", "C2");
        let values = vec![
            CanonicalRelation::new("C1", RelationKind::Sibling, "C2"),
            CanonicalRelation::new("C2", RelationKind::Child, "C1"),
            CanonicalRelation::new("C2", RelationKind::Sibling, "C1"),
        ];

        let mut out = Collector::new();
        job.reduce(&key, values, &mut out);

        assert_eq!(
            out.items(),
            &[
                CanonicalRelation::new("C2", RelationKind::Child, "C1"),
                CanonicalRelation::new("C2", RelationKind::Sibling, "C1"),
            ]
        );
    }

    #[test]
    fn test_lookup_dedups_preferred() {
        let mut dutch = concept("C3", "METFORMIN");
        dutch.language = "DUT".to_string();
        let concepts = [concept("C3", "Metformin"), dutch];

        let lookup = ConceptLookup::from_concepts(&concepts);
        assert_eq!(lookup.len(), 1);
        assert_eq!(lookup.preferred["C3"], vec!["metformin"]);
    }
}
