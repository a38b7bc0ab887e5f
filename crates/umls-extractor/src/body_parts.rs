//! Body-part lexicon
//!
//! Disorder and procedure concepts often carry a bare anatomical word as
//! one of their synonyms ("Heart" for a cardiac finding). Those strings
//! pollute autocompletion, so terms that are nothing but a body part are
//! dropped unless the concept itself is anatomical.

use std::collections::HashSet;

use once_cell::sync::Lazy;

/// Lowercase English and Dutch body-part words
static BODY_PARTS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // English
        "abdomen", "ankle", "ankles", "anus", "aorta", "appendix", "arm", "arms", "artery",
        "arteries", "back", "bladder", "blood", "bone", "bones", "brain", "breast", "breasts",
        "bronchus", "buttock", "buttocks", "calf", "cervix", "cheek", "chest", "chin", "colon",
        "ear", "ears", "elbow", "elbows", "esophagus", "eye", "eyes", "eyelid", "face",
        "finger", "fingers", "foot", "feet", "forearm", "forehead", "gallbladder", "groin",
        "gum", "gums", "hair", "hand", "hands", "head", "heart", "heel", "hip", "hips",
        "intestine", "jaw", "joint", "joints", "kidney", "kidneys", "knee", "knees", "leg",
        "legs", "lip", "lips", "liver", "lung", "lungs", "mouth", "muscle", "muscles", "nail",
        "nails", "neck", "nerve", "nerves", "nose", "ovary", "ovaries", "pancreas", "pelvis",
        "penis", "prostate", "rectum", "rib", "ribs", "scalp", "shoulder", "shoulders", "skin",
        "skull", "spine", "spleen", "stomach", "teeth", "testis", "thigh", "thorax", "throat",
        "thumb", "thyroid", "toe", "toes", "tongue", "tooth", "trachea", "uterus", "vagina",
        "vein", "veins", "wrist", "wrists",
        // Dutch
        "aderen", "arm", "armen", "bekken", "been", "benen", "blaas", "bloed", "borst",
        "borsten", "bot", "botten", "buik", "darm", "darmen", "duim", "elleboog", "enkel",
        "galblaas", "gewricht", "gezicht", "haar", "hals", "hand", "handen", "hart", "heup",
        "hersenen", "hoofd", "huid", "kaak", "keel", "knie", "knieen", "lever", "lies", "lip",
        "long", "longen", "maag", "milt", "mond", "nagel", "neus", "nier", "nieren", "oog",
        "ogen", "oor", "oren", "pols", "rib", "ribben", "rug", "schedel", "schildklier",
        "schouder", "slagader", "spier", "spieren", "teen", "tenen", "tand", "tanden", "tong",
        "vinger", "vingers", "voet", "voeten", "wervelkolom", "zenuw",
    ]
    .into_iter()
    .collect()
});

/// Laterality prefixes that do not change the anatomical reading
const LATERALITY: [&str; 6] = ["left ", "right ", "both ", "linker ", "rechter ", "beide "];

/// Check whether a term is a bare body-part word
pub fn is_body_part(term: &str) -> bool {
    let lower = term.trim().to_lowercase();
    let stem = LATERALITY
        .iter()
        .find_map(|prefix| lower.strip_prefix(prefix))
        .unwrap_or(&lower);

    BODY_PARTS.contains(stem.trim())
}
