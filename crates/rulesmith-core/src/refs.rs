//! Cross-rule reference markers.
//!
//! A rule references another rule by id with one of the markers in
//! [`REFERENCE_PATTERNS`]. References drive both the circular-reference check
//! and the build's dependency cascade.

use std::sync::LazyLock;

use regex::Regex;

use crate::markdown::lines_outside_code;

/// Reference marker table: `(name, pattern)`. Capture group 1 is the id.
pub const REFERENCE_PATTERNS: &[(&str, &str)] = &[
    ("at-marker", r"@rule:([A-Za-z0-9][A-Za-z0-9._/-]*[A-Za-z0-9_]|[A-Za-z0-9])"),
    ("wiki-marker", r"\[\[rule:\s*([A-Za-z0-9][A-Za-z0-9._/-]*)\s*\]\]"),
];

static COMPILED: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    REFERENCE_PATTERNS
        .iter()
        .map(|(_, p)| Regex::new(p).expect("reference pattern compiles"))
        .collect()
});

/// One reference marker found in a rule body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleReference {
    /// Referenced rule id.
    pub id: String,
    /// 0-based line index within the body.
    pub line_index: usize,
}

/// Extract all reference markers outside fenced code blocks, in order of
/// appearance.
pub fn extract_references(body: &str) -> Vec<RuleReference> {
    let mut refs = Vec::new();
    for (line_index, line) in lines_outside_code(body) {
        let mut found: Vec<(usize, String)> = COMPILED
            .iter()
            .flat_map(|re| re.captures_iter(line))
            .filter_map(|cap| cap.get(1).map(|m| (m.start(), m.as_str().to_owned())))
            .collect();
        found.sort_by_key(|(start, _)| *start);
        refs.extend(found.into_iter().map(|(_, id)| RuleReference { id, line_index }));
    }
    refs
}

/// Distinct referenced ids, in order of first appearance.
pub fn referenced_ids(body: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for r in extract_references(body) {
        if !ids.contains(&r.id) {
            ids.push(r.id);
        }
    }
    ids
}
