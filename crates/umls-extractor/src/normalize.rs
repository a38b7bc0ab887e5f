//! Term normalization
//!
//! `normalize` maps differently formatted spellings of the same term to
//! one string: Latin diacritics are folded, typographic punctuation is
//! replaced by its ASCII form, invisible characters are dropped and
//! whitespace is collapsed. Letter case is kept so the emitted term reads
//! as in the source; `dedup_key` adds case folding on top.

/// Normalize a raw term string. Total and idempotent.
pub fn normalize(raw: &str) -> String {
    let mut folded = String::with_capacity(raw.len());
    for c in raw.chars() {
        fold_char(c, &mut folded);
    }

    let collapsed = folded.split_whitespace().collect::<Vec<_>>().join(" ");

    // Trailing separators are left over from "Term, NOS"-style exports
    collapsed
        .trim_end_matches(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .to_string()
}

/// Case-insensitive dedup key of a term
pub fn dedup_key(term: &str) -> String {
    normalize(term).to_lowercase()
}

fn fold_char(c: char, out: &mut String) {
    let replacement = match c {
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' | 'Ā' | 'Ă' | 'Ą' => "A",
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'Æ' => "AE",
        'æ' => "ae",
        'Ç' | 'Ć' | 'Č' => "C",
        'ç' | 'ć' | 'č' => "c",
        'Ď' | 'Ð' => "D",
        'ď' | 'ð' => "d",
        'È' | 'É' | 'Ê' | 'Ë' | 'Ē' | 'Ė' | 'Ę' | 'Ě' => "E",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
        'Ğ' => "G",
        'ğ' => "g",
        'Ì' | 'Í' | 'Î' | 'Ï' | 'Ī' | 'Į' | 'İ' => "I",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' | 'ı' => "i",
        'Ł' => "L",
        'ł' => "l",
        'Ñ' | 'Ń' | 'Ň' => "N",
        'ñ' | 'ń' | 'ň' => "n",
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' | 'Ō' | 'Ő' => "O",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'Œ' => "OE",
        'œ' => "oe",
        'Ř' => "R",
        'ř' => "r",
        'Ś' | 'Ş' | 'Š' => "S",
        'ś' | 'ş' | 'š' => "s",
        'ß' => "ss",
        'Ţ' | 'Ť' => "T",
        'ţ' | 'ť' => "t",
        'Þ' => "Th",
        'þ' => "th",
        'Ù' | 'Ú' | 'Û' | 'Ü' | 'Ū' | 'Ů' | 'Ű' => "U",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => "u",
        'Ý' | 'Ÿ' => "Y",
        'ý' | 'ÿ' => "y",
        'Ź' | 'Ż' | 'Ž' => "Z",
        'ź' | 'ż' | 'ž' => "z",

        // Quotes and apostrophes
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' | '\u{00B4}' | '`' => "'",
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' | '\u{00AB}' | '\u{00BB}' => "\"",

        // Hyphens and dashes
        '\u{2010}'..='\u{2015}' | '\u{2212}' | '\u{00AD}' => "-",

        '\u{2026}' => "...",

        // Invisible characters
        '\u{200B}'..='\u{200D}' | '\u{2060}' | '\u{FEFF}' => "",

        c if c.is_control() => " ",

        c => {
            out.push(c);
            return;
        }
    };

    out.push_str(replacement);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_whitespace_collapsed() {
        assert_eq!(normalize("  Heart   attack \t"), "Heart attack");
        assert_eq!(normalize("Heart\u{00A0}attack"), "Heart attack");
    }

    #[test]
    fn test_case_preserved() {
        assert_eq!(normalize("Headache"), "Headache");
        assert_eq!(normalize("HIV"), "HIV");
    }

    #[test]
    fn test_diacritics_folded() {
        assert_eq!(normalize("Ménière's disease"), "Meniere's disease");
        assert_eq!(normalize("coëfficiënt"), "coefficient");
        assert_eq!(normalize("Sjögren"), "Sjogren");
        assert_eq!(normalize("Straße"), "Strasse");
    }

    #[test]
    fn test_punctuation_canonicalized() {
        assert_eq!(normalize("Crohn\u{2019}s disease"), "Crohn's disease");
        assert_eq!(normalize("beta\u{2013}blocker"), "beta-blocker");
        assert_eq!(normalize("\u{201C}quoted\u{201D}"), "\"quoted\"");
    }

    #[test]
    fn test_invisible_dropped() {
        assert_eq!(normalize("Head\u{200B}ache"), "Headache");
        assert_eq!(normalize("\u{FEFF}Headache"), "Headache");
    }

    #[test]
    fn test_trailing_separators() {
        assert_eq!(normalize("Headache, "), "Headache");
        assert_eq!(normalize("Headache ;,"), "Headache");
        assert_eq!(normalize("Headache, tension"), "Headache, tension");
    }

    #[test]
    fn test_equivalent_spellings_share_key() {
        assert_eq!(dedup_key("Ménière  Disease"), dedup_key("meniere disease"));
        assert_eq!(dedup_key("FOO"), "foo");
    }

    #[test]
    fn test_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \t "), "");
    }

    proptest! {
        #[test]
        fn prop_normalize_idempotent(s in "\\PC*") {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn prop_normalize_idempotent_any(s in any::<String>()) {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn prop_no_double_spaces(s in any::<String>()) {
            let n = normalize(&s);
            prop_assert!(!n.contains("  "));
            prop_assert_eq!(n.trim(), n.as_str());
        }
    }
}
