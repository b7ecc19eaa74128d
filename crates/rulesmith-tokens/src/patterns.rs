//! Lexical marker tables used for content classification.
//!
//! Each table is data: `(name, pattern)`. Counting walks the table and sums
//! matches, so adding a marker never touches control flow.

use std::sync::LazyLock;

use regex::Regex;

/// Code-like lexical markers.
pub const CODE_MARKERS: &[(&str, &str)] = &[
    (
        "declaration",
        r"\b(?:function|def|fn|func|class|struct|enum|interface|impl|trait)\s+[A-Za-z_]\w*",
    ),
    ("binding", r"\b(?:const|let|var|mut)\s+[A-Za-z_]\w*\s*[:=]"),
    (
        "import",
        r#"(?m)^\s*(?:(?:import|export)\s+\S|use\s+[\w:]+::|#include\s*[<"])"#,
    ),
    ("arrow", r"=>|->"),
    ("brace-line", r"(?m)^[ \t]*[{}()\[\];]+[ \t]*,?[ \t]*$"),
];

/// Markdown prose markers.
pub const PROSE_MARKERS: &[(&str, &str)] = &[
    ("header", r"(?m)^#{1,6}[ \t]+\S"),
    ("bullet", r"(?m)^[ \t]*(?:[-*+]|\d+\.)[ \t]+\S"),
    ("emphasis", r"\*\*[^*\n]+\*\*|__[^_\n]+__"),
];

/// Code-marker count at which text is classified as code.
pub const CODE_MARKER_THRESHOLD: usize = 3;

/// Prose-marker count at which text is classified as prose.
pub const PROSE_MARKER_THRESHOLD: usize = 3;

/// CJK share (in percent of characters) at which text is classified as CJK.
pub const CJK_DENSITY_PERCENT: usize = 30;

/// Unicode ranges counted as CJK ideographs or syllables.
pub const CJK_RANGES: &[(u32, u32)] = &[
    (0x4E00, 0x9FFF),   // CJK Unified Ideographs
    (0x3400, 0x4DBF),   // Extension A
    (0x20000, 0x2A6DF), // Extension B
    (0xF900, 0xFAFF),   // Compatibility Ideographs
    (0x3040, 0x309F),   // Hiragana
    (0x30A0, 0x30FF),   // Katakana
    (0xAC00, 0xD7AF),   // Hangul Syllables
    (0x1100, 0x11FF),   // Hangul Jamo
    (0x3130, 0x318F),   // Hangul Compatibility Jamo
];

static CODE_REGEXES: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(CODE_MARKERS));
static PROSE_REGEXES: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(PROSE_MARKERS));

fn compile(table: &[(&str, &str)]) -> Vec<Regex> {
    table
        .iter()
        .map(|(_, p)| Regex::new(p).expect("marker pattern compiles"))
        .collect()
}

/// Total code-marker matches in `text`.
pub fn count_code_markers(text: &str) -> usize {
    CODE_REGEXES.iter().map(|re| re.find_iter(text).count()).sum()
}

/// Total prose-marker matches in `text`.
pub fn count_prose_markers(text: &str) -> usize {
    PROSE_REGEXES.iter().map(|re| re.find_iter(text).count()).sum()
}

/// Whether `c` falls in one of [`CJK_RANGES`].
pub fn is_cjk(c: char) -> bool {
    let cp = u32::from(c);
    CJK_RANGES.iter().any(|&(lo, hi)| (lo..=hi).contains(&cp))
}
