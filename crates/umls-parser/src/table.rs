//! Output table decoding
//!
//! The concept and relation tables are the tab-delimited artifacts of
//! the two pipelines. The concept table is read back by the relation
//! pipeline and the index loader, the relation table by the graph loader.

use umls_core::{AggregatedConcept, CanonicalRelation, RelationKind};

use crate::trim_line;

/// Decode one concept-table line; any other field count yields `None`
pub fn parse_concept_line(line: &str) -> Option<AggregatedConcept> {
    let fields: Vec<&str> = trim_line(line).split('\t').collect();
    let [cui, language, source, groups, preferred, terms] = fields[..] else {
        return None;
    };

    if cui.is_empty() {
        return None;
    }

    Some(AggregatedConcept {
        cui: cui.to_string(),
        language: language.to_string(),
        source: source.to_string(),
        type_groups: split_list(groups),
        preferred: preferred.to_string(),
        terms: split_list(terms),
    })
}

/// Decode one relation-table line (`cui_a \t kind \t cui_b`)
pub fn parse_relation_line(line: &str) -> Option<CanonicalRelation> {
    let fields: Vec<&str> = trim_line(line).split('\t').collect();
    let [source, kind, target] = fields[..] else {
        return None;
    };

    if source.is_empty() || target.is_empty() {
        return None;
    }

    Some(CanonicalRelation::new(
        source,
        RelationKind::from_label(kind)?,
        target,
    ))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split('|')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
