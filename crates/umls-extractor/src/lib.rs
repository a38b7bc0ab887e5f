//! UMLS Extractor - Term selection rules
//!
//! Implements the rules that decide which Metathesaurus strings become
//! indexed synonyms:
//! - Normalization of term strings for dedup and display
//! - Discard predicates for noisy rows (obsolete, coded, numeric, ...)
//! - Semantic type to semantic group mapping
//! - Body-part lexicon for anatomy filtering

pub mod body_parts;
pub mod classifier;
pub mod normalize;
pub mod semantic;

pub use body_parts::is_body_part;
pub use classifier::{DiscardReason, TermClassifier};
pub use normalize::{dedup_key, normalize};
pub use semantic::{is_rejected_group, is_skipped_category, semantic_group, ANATOMY_GROUP};
