//! Best-effort recovery of a road id from a damage-point id.
//!
//! Only used when a result carries no explicit `road_id`. Point ids built as
//! `{road}-d-{suffix}` (or with `_` separators) yield `{road}`; a single trailing
//! `-123` / `_123` segment is then stripped. Anything else is taken verbatim.
//! Road ids that themselves end in a numeric segment (`osm-123`) collapse to
//! their prefix, so prefer explicit road ids wherever the caller has them.

use std::sync::LazyLock;

use regex::Regex;

static DAMAGE_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-_]d[-_]").expect("valid damage separator pattern"));

static TRAILING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)(?:[-_]\d+)?$").expect("valid trailing number pattern"));

/// Road id encoded in `point_id`, falling back to the whole id.
pub fn parse_road_id(point_id: &str) -> String {
    let head = DAMAGE_SEPARATOR
        .split(point_id)
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(point_id);

    TRAILING_NUMBER
        .captures(head)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(head)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_suffix_is_stripped() {
        assert_eq!(parse_road_id("way42-d-17"), "way42");
        assert_eq!(parse_road_id("way42_d_abc"), "way42");
        assert_eq!(parse_road_id("main-st-d-x-9"), "main-st");
    }

    #[test]
    fn test_trailing_number_is_stripped_once() {
        assert_eq!(parse_road_id("road-a-3"), "road-a");
        assert_eq!(parse_road_id("road_7_3"), "road_7");
    }

    #[test]
    fn test_numeric_road_id_collapses() {
        assert_eq!(parse_road_id("osm-123-d-4"), "osm");
    }

    #[test]
    fn test_fallback_to_raw_id() {
        assert_eq!(parse_road_id("roadA"), "roadA");
        assert_eq!(parse_road_id("12345"), "12345");
        assert_eq!(parse_road_id("-d-x"), "-d-x");
    }

    #[test]
    fn test_empty_id() {
        assert_eq!(parse_road_id(""), "");
    }
}
