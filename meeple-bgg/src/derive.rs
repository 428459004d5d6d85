//! Field derivation rules applied to raw catalog values.
//!
//! These are pure functions so the parsing in [`crate::xml`] and the match
//! selection in [`crate::client`] can be tested without any I/O.

use std::str::FromStr;

use meeple_catalog::CatalogEntry;
use quick_xml::escape::resolve_html5_entity;

/// Rank value the catalog uses for games without a rank.
pub const NOT_RANKED: &str = "Not Ranked";

/// Placeholder name for items that carry no primary name.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Remove everything between `<` and `>`, inclusive.
pub fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Decode HTML character references (`&amp;`, `&mdash;`, `&#10;`, `&#x27;`).
///
/// Unknown or unterminated references are kept verbatim.
pub fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp + 1..];

        // Entity names are short; anything longer is a stray ampersand.
        let resolved = candidate
            .char_indices()
            .take(32)
            .find(|&(_, c)| c == ';')
            .and_then(|(semi, _)| {
                resolve_reference(&candidate[..semi]).map(|s| (s, semi))
            });

        match resolved {
            Some((decoded, semi)) => {
                out.push_str(&decoded);
                rest = &candidate[semi + 1..];
            }
            None => {
                out.push('&');
                rest = candidate;
            }
        }
    }

    out.push_str(rest);
    out
}

fn resolve_reference(name: &str) -> Option<String> {
    if let Some(numeric) = name.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse::<u32>().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }
    resolve_html5_entity(name).map(str::to_string)
}

/// Plain-text description: markup stripped first, then entities decoded.
pub fn clean_description(raw: &str) -> String {
    decode_entities(&strip_tags(raw)).trim().to_string()
}

/// Parse a rank value, treating the "Not Ranked" sentinel as no rank.
pub fn parse_rank(value: &str) -> Option<u32> {
    let value = value.trim();
    if value.eq_ignore_ascii_case(NOT_RANKED) {
        return None;
    }
    value.parse().ok()
}

/// Parse a decimal with `.` as separator regardless of locale.
pub fn parse_decimal(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse an integer field, mapping anything unparsable to `None`.
pub fn parse_int<T: FromStr>(value: &str) -> Option<T> {
    value.trim().parse().ok()
}

/// Parse a publication year. The catalog writes `0` when the year is unknown;
/// negative years are real (ancient games).
pub fn parse_year(value: &str) -> Option<i32> {
    parse_int::<i32>(value).filter(|&y| y != 0)
}

/// Parse a player count. The catalog writes `0` when the count is unknown.
pub fn parse_player_count(value: &str) -> Option<u32> {
    parse_int::<u32>(value).filter(|&n| n > 0)
}

/// Best-effort expansion guess from description text.
///
/// Fires only when both "expands" and "expansion" appear. This is a guess,
/// never a source of a base game id.
pub fn looks_like_expansion(description: &str) -> bool {
    let lower = description.to_lowercase();
    lower.contains("expands") && lower.contains("expansion")
}

/// Pick the candidate that best matches `query`.
///
/// A case-insensitive exact name match wins outright. Otherwise the
/// candidate with the smallest Levenshtein distance to the query (both
/// lowercased) is chosen, earliest candidate first on ties.
pub fn best_match<'a>(query: &str, candidates: &'a [CatalogEntry]) -> Option<&'a CatalogEntry> {
    let query = query.trim().to_lowercase();
    candidates
        .iter()
        .find(|c| c.name.to_lowercase() == query)
        .or_else(|| {
            candidates
                .iter()
                .min_by_key(|c| strsim::levenshtein(&query, &c.name.to_lowercase()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<p>Build <b>roads</b>.</p>"), "Build roads.");
        assert_eq!(strip_tags("no markup"), "no markup");
        assert_eq!(strip_tags("a > b"), "a > b");
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("Tom &amp; Jerry"), "Tom & Jerry");
        assert_eq!(decode_entities("line&#10;break"), "line\nbreak");
        assert_eq!(decode_entities("it&#x27;s"), "it's");
        assert_eq!(decode_entities("a &mdash; b"), "a \u{2014} b");
        assert_eq!(decode_entities("&quot;quoted&quot;"), "\"quoted\"");
    }

    #[test]
    fn test_decode_entities_keeps_stray_ampersands() {
        assert_eq!(decode_entities("Salt & Pepper"), "Salt & Pepper");
        assert_eq!(decode_entities("&bogus; &"), "&bogus; &");
    }

    #[test]
    fn test_clean_description_strips_then_decodes() {
        // Encoded markup survives stripping and is decoded into text afterwards.
        let raw = "<i>Catan</i> &lt;classic&gt;&#10;&#10;Trade &amp; build.";
        assert_eq!(clean_description(raw), "Catan <classic>\n\nTrade & build.");
    }

    #[test]
    fn test_parse_rank() {
        assert_eq!(parse_rank("512"), Some(512));
        assert_eq!(parse_rank("Not Ranked"), None);
        assert_eq!(parse_rank(""), None);
        assert_eq!(parse_rank("12th"), None);
    }

    #[test]
    fn test_parse_decimal_is_locale_free() {
        assert_eq!(parse_decimal("7.12345"), Some(7.12345));
        assert_eq!(parse_decimal("2,5"), None);
        assert_eq!(parse_decimal("NaN"), None);
        assert_eq!(parse_decimal(""), None);
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int::<i32>("-2200"), Some(-2200));
        assert_eq!(parse_int::<u32>("4"), Some(4));
        assert_eq!(parse_int::<u32>("four"), None);
    }

    #[test]
    fn test_zero_means_unknown() {
        assert_eq!(parse_year("0"), None);
        assert_eq!(parse_year("-3000"), Some(-3000));
        assert_eq!(parse_player_count("0"), None);
        assert_eq!(parse_player_count("1"), Some(1));
    }

    #[test]
    fn test_looks_like_expansion_needs_both_words() {
        assert!(looks_like_expansion(
            "This expansion expands the base game with ships."
        ));
        assert!(!looks_like_expansion("An expansion for Catan."));
        assert!(!looks_like_expansion("The empire expands."));
    }

    fn entries(names: &[&str]) -> Vec<CatalogEntry> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| CatalogEntry::new(i as u32 + 1, *n))
            .collect()
    }

    #[test]
    fn test_best_match_prefers_exact_case_insensitive() {
        let candidates = entries(&["Catan: Junior", "CATAN", "Catan Dice"]);
        let best = best_match("catan", &candidates).unwrap();
        assert_eq!(best.external_id, 2);
    }

    #[test]
    fn test_best_match_falls_back_to_edit_distance() {
        let candidates = entries(&["Carcassonne", "Catan Histories", "Katan"]);
        let best = best_match("Catan", &candidates).unwrap();
        assert_eq!(best.name, "Katan");
    }

    #[test]
    fn test_best_match_ties_keep_search_order() {
        let candidates = entries(&["Axul", "Azu"]);
        let best = best_match("Azul", &candidates).unwrap();
        assert_eq!(best.name, "Axul");
    }

    #[test]
    fn test_best_match_empty() {
        assert!(best_match("Catan", &[]).is_none());
    }
}
