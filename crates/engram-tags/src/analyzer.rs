//! Pure string analysis over tags: embedding normal form, version and
//! number extraction, `prefix:suffix` splitting. No I/O.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

static SEPARATOR_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-_]+").expect("separator regex"));
static WORD_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bversion\b").expect("version word regex"));
static WORD_VER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bver\b").expect("ver word regex"));
static V_BEFORE_DIGIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bv(\d)").expect("v-digit regex"));
static NUMBER_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d+(?:\.\d+)?\b").expect("number token regex"));

/// Version patterns, matched in order: `v1`, `v 2.0`, `version 2`,
/// `ver 3.0`, `api 2`.
static VERSION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\bv\s*(\d+(?:\.\d+)*)",
        r"\bversion\s+(\d+(?:\.\d+)*)",
        r"\bver\s+(\d+(?:\.\d+)*)",
        r"\bapi\s+(\d+(?:\.\d+)*)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("version pattern"))
    .collect()
});

/// Lowercase and replace runs of `-`/`_` with a single space. Shared first
/// step of every extraction.
fn space_normalized(tag: &str) -> String {
    SEPARATOR_RUNS
        .replace_all(&tag.to_lowercase(), " ")
        .into_owned()
}

/// Normalize a tag for embedding comparison:
/// lowercase, separators to spaces, `version`/`ver` tokens to `v`,
/// a space between `v` and an adjacent digit (`v2` -> `v 2`), collapsed
/// whitespace.
pub fn normalize_for_embedding(tag: &str) -> String {
    let t = space_normalized(tag);
    let t = WORD_VERSION.replace_all(&t, "v");
    let t = WORD_VER.replace_all(&t, "v");
    let t = V_BEFORE_DIGIT.replace_all(&t, "v $1");
    t.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract a version number from a tag, normalized by `normalize_version`.
/// Matches `v1`, `v2.0`, `v1.2.3`, `version 2`, `ver 3.0`, `api 2`.
pub fn extract_version(tag: &str) -> Option<String> {
    let t = space_normalized(tag);
    for pattern in VERSION_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(&t) {
            return Some(normalize_version(&caps[1]));
        }
    }
    None
}

/// Normalize a version string: `2` -> `2.0`, `2.0` -> `2.0`, `01` -> `1.0`.
/// Each part is re-rendered as an integer (dropping leading zeros); a
/// single part gains a `.0`.
pub fn normalize_version(version: &str) -> String {
    let mut parts: Vec<String> = version
        .split('.')
        .map(|p| match p.parse::<u64>() {
            Ok(n) => n.to_string(),
            // Overflowing digit runs: strip leading zeros by hand.
            Err(_) => {
                let stripped = p.trim_start_matches('0');
                if stripped.is_empty() {
                    "0".to_string()
                } else {
                    stripped.to_string()
                }
            }
        })
        .collect();
    if parts.len() == 1 {
        parts.push("0".to_string());
    }
    parts.join(".")
}

/// All numeric tokens (`12`, `3.4`) in the tag, normalized. Returned as a
/// set: the merge guard compares sets, not positions.
pub fn extract_numbers(tag: &str) -> BTreeSet<String> {
    let t = space_normalized(tag);
    NUMBER_TOKEN
        .find_iter(&t)
        .map(|m| normalize_version(m.as_str()))
        .collect()
}

/// Split a structured tag at the first colon into lowercased, trimmed
/// `(prefix, suffix)`. `None` when there is no colon.
pub fn split_colon(tag: &str) -> Option<(String, String)> {
    let idx = tag.find(':')?;
    let prefix = tag[..idx].trim().to_lowercase();
    let suffix = tag[idx + 1..].trim().to_lowercase();
    Some((prefix, suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_form_collapses_separators() {
        assert_eq!(normalize_for_embedding("API__Gateway--v2"), "api gateway v 2");
    }

    #[test]
    fn normal_form_rewrites_version_words() {
        assert_eq!(normalize_for_embedding("version 2"), "v 2");
        assert_eq!(normalize_for_embedding("ver_3"), "v 3");
        assert_eq!(normalize_for_embedding("v2"), "v 2");
    }

    #[test]
    fn normal_form_keeps_colons() {
        assert_eq!(normalize_for_embedding("Type:Bug"), "type:bug");
    }

    #[test]
    fn version_from_common_shapes() {
        assert_eq!(extract_version("api-v1").as_deref(), Some("1.0"));
        assert_eq!(extract_version("api v2.0").as_deref(), Some("2.0"));
        assert_eq!(extract_version("v1.2.3").as_deref(), Some("1.2.3"));
        assert_eq!(extract_version("version 2").as_deref(), Some("2.0"));
        assert_eq!(extract_version("ver 3.0").as_deref(), Some("3.0"));
        assert_eq!(extract_version("api 2").as_deref(), Some("2.0"));
    }

    #[test]
    fn no_version_in_plain_tags() {
        assert_eq!(extract_version("binary-search"), None);
        assert_eq!(extract_version("vector"), None);
        assert_eq!(extract_version("oauth2"), None);
    }

    #[test]
    fn version_parts_drop_leading_zeros() {
        assert_eq!(normalize_version("01"), "1.0");
        assert_eq!(normalize_version("2"), "2.0");
        assert_eq!(normalize_version("2.0"), "2.0");
        assert_eq!(normalize_version("1.02.3"), "1.2.3");
    }

    #[test]
    fn numbers_are_normalized_as_a_set() {
        let nums = extract_numbers("port-8080-and-443");
        assert!(nums.contains("8080.0"));
        assert!(nums.contains("443.0"));
        assert_eq!(nums.len(), 2);
        assert!(extract_numbers("no-digits-here").is_empty());
    }

    #[test]
    fn colon_split_trims_and_lowercases() {
        assert_eq!(
            split_colon("Type: Bug"),
            Some(("type".to_string(), "bug".to_string()))
        );
        assert_eq!(
            split_colon("a:b:c"),
            Some(("a".to_string(), "b:c".to_string()))
        );
        assert_eq!(split_colon("plain"), None);
    }
}
