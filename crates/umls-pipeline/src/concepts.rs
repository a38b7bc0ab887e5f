//! Concept Aggregator
//!
//! Groups term and semantic-type rows by concept identifier and emits one
//! [`AggregatedConcept`] per (concept, language, source).
//!
//! Map: decode the line by field count, classify term rows, map type
//! codes to groups. Reduce: drop concepts without terms, without types or
//! with a rejected group, then filter body-part terms, dedup
//! case-insensitively and resolve the preferred term.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use umls_core::{AggregatedConcept, ClassifiedTerm, PipelineConfig, RawTermRow, ENGLISH};
use umls_extractor::{
    dedup_key, is_rejected_group, is_skipped_category, semantic_group, DiscardReason,
    TermClassifier,
};
use umls_parser::{decode_term_line, LineFormat, TermLine};

use crate::mapreduce::{Collector, MapReduceJob};

/// Value emitted by the concept mapper
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConceptValue {
    /// A term that survived classification
    Term(ClassifiedTerm),
    /// A semantic type group
    Group(String),
}

/// Concept aggregation job
#[derive(Debug, Clone, Default)]
pub struct ConceptAggregator {
    classifier: TermClassifier,
}

impl ConceptAggregator {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            classifier: TermClassifier::new(config),
        }
    }

    fn emit_term(&self, row: &RawTermRow, out: &mut Collector<(String, ConceptValue)>) {
        match self.classifier.classify(row) {
            Ok(term) => out.emit((row.cui.clone(), ConceptValue::Term(term))),
            Err(reason) => out.count(reason.as_str()),
        }
    }
}

impl MapReduceJob for ConceptAggregator {
    type Key = String;
    type Value = ConceptValue;
    type Output = AggregatedConcept;

    fn name(&self) -> &str {
        "concepts"
    }

    fn map(&self, line: &str, out: &mut Collector<(String, ConceptValue)>) {
        let (format, decoded) = decode_term_line(line);
        out.count(format.as_str());

        match decoded {
            TermLine::Term(row) => self.emit_term(&row, out),
            TermLine::TypedTerm { row, type_group } => {
                self.emit_term(&row, out);
                if let Some(group) = type_group {
                    let group = semantic_group(&group).to_string();
                    out.emit((row.cui, ConceptValue::Group(group)));
                }
            }
            TermLine::SemanticType(sty) => {
                if is_skipped_category(&sty.label) {
                    out.count("skipped_category");
                    return;
                }
                let group = semantic_group(&sty.tui).to_string();
                out.emit((sty.cui, ConceptValue::Group(group)));
            }
            TermLine::Unrecognized if format != LineFormat::Unrecognized => {
                out.count("missing_field")
            }
            TermLine::Unrecognized => {}
        }
    }

    fn reduce(&self, cui: &String, values: Vec<ConceptValue>, out: &mut Collector<AggregatedConcept>) {
        let mut groups: BTreeSet<String> = BTreeSet::new();
        let mut terms: BTreeMap<String, BTreeMap<String, Vec<String>>> = BTreeMap::new();
        let mut preferred: HashMap<String, Vec<String>> = HashMap::new();

        for value in values {
            match value {
                ConceptValue::Group(group) => {
                    groups.insert(group);
                }
                ConceptValue::Term(term) => {
                    if term.is_preferred() {
                        preferred
                            .entry(term.language.clone())
                            .or_default()
                            .push(term.text.clone());
                    }
                    terms
                        .entry(term.language)
                        .or_default()
                        .entry(term.source)
                        .or_default()
                        .push(term.text);
                }
            }
        }

        if terms.is_empty() {
            out.count("no_terms");
            return;
        }
        if groups.is_empty() {
            out.count("no_types");
            return;
        }
        if groups.iter().any(|g| is_rejected_group(g)) {
            out.count("rejected_group");
            return;
        }

        let type_groups: Vec<String> = groups.into_iter().collect();

        for (language, by_source) in terms {
            for (source, candidates) in by_source {
                let mut seen = HashSet::new();
                let mut unique = Vec::new();
                for term in candidates {
                    if self.classifier.discards_body_part(&term, &type_groups) {
                        out.count(DiscardReason::BodyPart.as_str());
                        continue;
                    }
                    if seen.insert(dedup_key(&term)) {
                        unique.push(term);
                    }
                }

                if unique.is_empty() {
                    out.count("empty_group");
                    continue;
                }

                let pref = resolve_preferred(&preferred, &language, &unique);

                out.emit(AggregatedConcept {
                    cui: cui.clone(),
                    language: language.clone(),
                    source,
                    type_groups: type_groups.clone(),
                    preferred: pref,
                    terms: unique,
                });
            }
        }
    }
}

/// Preferred term of the language, else the English one, else the first term
fn resolve_preferred(
    preferred: &HashMap<String, Vec<String>>,
    language: &str,
    unique: &[String],
) -> String {
    preferred
        .get(language)
        .or_else(|| preferred.get(ENGLISH))
        .and_then(|p| p.first())
        .or_else(|| unique.first())
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mrconso(cui: &str, lang: &str, ts: &str, sab: &str, tty: &str, text: &str) -> String {
        format!("{cui}|{lang}|{ts}|L1|PF|S1|Y|A1|||1|{sab}|{tty}|1|{text}|0|N|256|")
    }

    fn mrsty(cui: &str, tui: &str, label: &str) -> String {
        format!("{cui}|{tui}|A1.2|{label}|AT1|256|")
    }

    fn run(lines: &[String]) -> (Vec<AggregatedConcept>, Collector<AggregatedConcept>) {
        let job = ConceptAggregator::default();
        let mut mapped = Collector::new();
        for line in lines {
            job.map(line, &mut mapped);
        }

        let mut groups: BTreeMap<String, Vec<ConceptValue>> = BTreeMap::new();
        let (pairs, _) = mapped.into_parts();
        for (key, value) in pairs {
            groups.entry(key).or_default().push(value);
        }

        let mut out = Collector::new();
        for (key, values) in groups {
            job.reduce(&key, values, &mut out);
        }
        (out.items().to_vec(), out)
    }

    #[test]
    fn test_map_emits_term_and_group() {
        let job = ConceptAggregator::default();
        let mut out = Collector::new();

        job.map(&mrconso("C0001", "ENG", "P", "SNOMEDCT_US", "PT", "Headache"), &mut out);
        job.map(&mrsty("C0001", "T184", "Sign or Symptom"), &mut out);

        let items = out.items();
        assert_eq!(items.len(), 2);
        assert!(matches!(&items[0].1, ConceptValue::Term(t) if t.text == "Headache" && t.is_preferred()));
        assert_eq!(items[1].1, ConceptValue::Group("DISO".to_string()));
        assert_eq!(out.counter("concept_names"), 1);
        assert_eq!(out.counter("semantic_types"), 1);
    }

    #[test]
    fn test_map_counts_discards() {
        let job = ConceptAggregator::default();
        let mut out = Collector::new();

        job.map(&mrconso("C0001", "FRE", "P", "MSHFRE", "PT", "Céphalée"), &mut out);
        job.map(&mrconso("C0001", "ENG", "P", "CHV", "PT", "head pain"), &mut out);
        job.map(&mrsty("C0001", "T086", "Nucleotide Sequence"), &mut out);
        job.map("not|a|known|layout|at|all|really|no", &mut out);

        assert!(out.items().is_empty());
        assert_eq!(out.counter("language"), 1);
        assert_eq!(out.counter("excluded_source"), 1);
        assert_eq!(out.counter("skipped_category"), 1);
        assert_eq!(out.counter("unrecognized"), 1);
    }

    #[test]
    fn test_typed_term_supplies_group() {
        let (records, _) = run(&["C0009|Hoofdpijn|DUT|CUSTOM|Y|DISO".to_string()]);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].type_groups, vec!["DISO"]);
        assert_eq!(records[0].preferred, "Hoofdpijn");
    }

    #[test]
    fn test_reduce_headache() {
        let (records, _) = run(&[
            mrconso("C0001", "ENG", "P", "SNOMEDCT_US", "PT", "Headache"),
            mrsty("C0001", "T184", "Sign or Symptom"),
        ]);

        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].to_string(),
            "C0001\tENG\tSNOMEDCT_US\tDISO\tHeadache\tHeadache"
        );
    }

    #[test]
    fn test_reduce_requires_types() {
        let (records, out) = run(&["C0002|Migraine|ENG|SNOMEDCT_US".to_string()]);
        assert!(records.is_empty());
        assert_eq!(out.counter("no_types"), 1);
    }

    #[test]
    fn test_empty_type_code_is_not_a_group() {
        let (records, out) = run(&[
            "C0002|Migraine|ENG|SNOMEDCT_US".to_string(),
            "C0002||A1|Label|AT1|256|".to_string(),
        ]);
        assert!(records.is_empty());
        assert_eq!(out.counter("no_types"), 1);
    }

    #[test]
    fn test_map_counts_malformed_key_fields() {
        let job = ConceptAggregator::default();
        let mut out = Collector::new();

        job.map("C0003|Migraine|ENG|SNO\tMED", &mut out);
        job.map("|Migraine|ENG|SNOMEDCT_US", &mut out);
        job.map(&mrsty("C0003", "", "Disease or Syndrome"), &mut out);

        assert!(out.items().is_empty());
        assert_eq!(out.counter("missing_field"), 3);
    }

    #[test]
    fn test_reduce_requires_terms() {
        let (records, out) = run(&[mrsty("C0003", "T047", "Disease or Syndrome")]);
        assert!(records.is_empty());
        assert_eq!(out.counter("no_terms"), 1);
    }

    #[test]
    fn test_reduce_rejected_group() {
        let (records, out) = run(&[
            mrconso("C0004", "ENG", "P", "SNOMEDCT_US", "PT", "Escherichia coli"),
            mrsty("C0004", "T007", "Bacterium"),
            mrsty("C0004", "T047", "Disease or Syndrome"),
        ]);
        assert!(records.is_empty());
        assert_eq!(out.counter("rejected_group"), 1);
    }

    #[test]
    fn test_reduce_dedups_case_insensitively() {
        let (records, _) = run(&[
            "C0005|Foo|ENG|SRC".to_string(),
            "C0005|foo|ENG|SRC".to_string(),
            "C0005|FOO|ENG|SRC".to_string(),
            mrsty("C0005", "T047", "Disease or Syndrome"),
        ]);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].terms, vec!["Foo"]);
        assert_eq!(records[0].preferred, "Foo");
    }

    #[test]
    fn test_reduce_preferred_falls_back_to_english() {
        let (records, _) = run(&[
            mrconso("C0006", "ENG", "P", "MSH", "MH", "Aspirin"),
            mrconso("C0006", "DUT", "S", "MSHDUT", "SY", "acetylsalicylzuur"),
            mrsty("C0006", "T121", "Pharmacologic Substance"),
        ]);

        let dutch = records.iter().find(|c| c.language == "DUT").unwrap();
        assert_eq!(dutch.preferred, "Aspirin");
        assert_eq!(dutch.terms, vec!["acetylsalicylzuur"]);
    }

    #[test]
    fn test_reduce_filters_body_parts() {
        let lines = [
            "C0007|Heart|ENG|SRC".to_string(),
            "C0007|Heart disease|ENG|SRC".to_string(),
            mrsty("C0007", "T047", "Disease or Syndrome"),
        ];
        let (records, out) = run(&lines);
        assert_eq!(records[0].terms, vec!["Heart disease"]);
        assert_eq!(out.counter("body_part"), 1);

        // Anatomical concepts keep their body-part words
        let lines = [
            "C0008|Heart|ENG|SRC".to_string(),
            mrsty("C0008", "T023", "Body Part, Organ, or Organ Component"),
        ];
        let (records, _) = run(&lines);
        assert_eq!(records[0].terms, vec!["Heart"]);
    }

    #[test]
    fn test_reduce_skips_group_emptied_by_filter() {
        let (records, out) = run(&[
            "C0010|Knee|ENG|SRC_A".to_string(),
            "C0010|Knee pain|ENG|SRC_B".to_string(),
            mrsty("C0010", "T184", "Sign or Symptom"),
        ]);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source, "SRC_B");
        assert_eq!(out.counter("empty_group"), 1);
    }
}
