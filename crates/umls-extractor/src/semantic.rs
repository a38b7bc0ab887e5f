//! Semantic Type Grouper
//!
//! Maps the fine-grained UMLS semantic types (TUIs) onto the coarse
//! semantic groups of the UMLS Semantic Network, and holds the two
//! exclusion lists applied around that mapping:
//! - skip categories, checked per semantic-type row before grouping
//! - rejected groups, checked per concept after grouping

use std::collections::HashSet;

use once_cell::sync::Lazy;

/// Group of anatomical concepts; exempts a concept from body-part filtering
pub const ANATOMY_GROUP: &str = "ANAT";

/// Groups whose concepts are never emitted
pub const REJECTED_GROUPS: [&str; 8] = [
    "LIVB", "CONC", "ACTI", "GEOG", "OBJC", "OCCU", "DEVI", "ORGA",
];

/// Semantic type labels whose rows never reach the aggregator
static SKIP_CATEGORIES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "Amino Acid Sequence",
        "Carbohydrate Sequence",
        "Nucleotide Sequence",
        "Molecular Sequence",
        "Experimental Model of Disease",
        "Molecular Biology Research Technique",
        "Research Activity",
        "Educational Activity",
        "Environmental Effect of Humans",
        "Human-caused Phenomenon or Process",
        "Natural Phenomenon or Process",
        "Research Device",
    ]
    .into_iter()
    .collect()
});

/// Look up the semantic group of a type code.
///
/// Codes outside the table are their own group, so a custom or future
/// type is kept rather than dropped.
pub fn semantic_group(code: &str) -> &str {
    match code {
        // Activities & Behaviors
        "T051" | "T052" | "T053" | "T054" | "T055" | "T056" | "T057" | "T064" | "T066" => "ACTI",

        // Anatomy
        "T017" | "T018" | "T021" | "T022" | "T023" | "T024" | "T025" | "T026" | "T029"
        | "T030" | "T031" => "ANAT",

        // Chemicals & Drugs
        "T103" | "T104" | "T109" | "T114" | "T116" | "T120" | "T121" | "T122" | "T123"
        | "T125" | "T126" | "T127" | "T129" | "T130" | "T131" | "T192" | "T195" | "T196"
        | "T197" | "T200" => "CHEM",

        // Concepts & Ideas
        "T077" | "T078" | "T079" | "T080" | "T081" | "T082" | "T089" | "T102" | "T169"
        | "T170" | "T171" | "T185" => "CONC",

        // Devices
        "T074" | "T075" | "T203" => "DEVI",

        // Disorders
        "T019" | "T020" | "T033" | "T037" | "T046" | "T047" | "T048" | "T049" | "T050"
        | "T184" | "T190" | "T191" => "DISO",

        // Genes & Molecular Sequences
        "T028" | "T085" | "T086" | "T087" | "T088" => "GENE",

        // Geographic Areas
        "T083" => "GEOG",

        // Living Beings
        "T001" | "T002" | "T004" | "T005" | "T007" | "T008" | "T010" | "T011" | "T012"
        | "T013" | "T014" | "T015" | "T016" | "T096" | "T097" | "T098" | "T099" | "T100"
        | "T101" | "T194" | "T204" => "LIVB",

        // Objects
        "T071" | "T072" | "T073" | "T167" | "T168" => "OBJC",

        // Occupations
        "T090" | "T091" => "OCCU",

        // Organizations
        "T092" | "T093" | "T094" | "T095" => "ORGA",

        // Phenomena
        "T034" | "T038" | "T067" | "T068" | "T069" | "T070" => "PHEN",

        // Physiology
        "T032" | "T039" | "T040" | "T041" | "T042" | "T043" | "T044" | "T045" | "T201" => {
            "PHYS"
        }

        // Procedures
        "T058" | "T059" | "T060" | "T061" | "T062" | "T063" | "T065" => "PROC",

        other => other,
    }
}

/// Check whether a semantic type label is skipped at row admission
pub fn is_skipped_category(label: &str) -> bool {
    SKIP_CATEGORIES.contains(label)
}

/// Check whether a group disqualifies its concept
pub fn is_rejected_group(group: &str) -> bool {
    REJECTED_GROUPS.contains(&group)
}
