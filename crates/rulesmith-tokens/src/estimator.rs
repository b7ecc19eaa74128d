//! Content classification and token estimation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::patterns::{
    CJK_DENSITY_PERCENT, CODE_MARKER_THRESHOLD, PROSE_MARKER_THRESHOLD, count_code_markers,
    count_prose_markers, is_cjk,
};

/// Detected content class of a text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// Markdown prose.
    Prose,
    /// Source code.
    Code,
    /// Neither clearly prose nor clearly code.
    Mixed,
    /// CJK-dense text.
    Cjk,
}

impl ContentType {
    /// Characters per token, in tenths (`35` means 3.5).
    pub const fn ratio_tenths(self) -> u64 {
        match self {
            Self::Prose => 35,
            Self::Code => 25,
            Self::Mixed => 30,
            Self::Cjk => 15,
        }
    }

    /// Characters per token.
    pub fn ratio(self) -> f64 {
        // tenths are small integers, exact in f64
        #[allow(clippy::cast_precision_loss)]
        let tenths = self.ratio_tenths() as f64;
        tenths / 10.0
    }

    /// Lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prose => "prose",
            Self::Code => "code",
            Self::Mixed => "mixed",
            Self::Cjk => "cjk",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Estimated token count with the class that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenEstimate {
    /// Estimated tokens.
    pub tokens: u64,
    /// Detected content class.
    pub content_type: ContentType,
}

/// Classify `text`.
///
/// Precedence: CJK density of at least 30% wins, then code (3+ code
/// markers), then prose (3+ prose markers), else mixed.
pub fn classify(text: &str) -> ContentType {
    let total = text.chars().count();
    if total == 0 {
        return ContentType::Mixed;
    }
    let cjk = text.chars().filter(|c| is_cjk(*c)).count();
    if cjk * 100 >= total * CJK_DENSITY_PERCENT {
        return ContentType::Cjk;
    }
    if count_code_markers(text) >= CODE_MARKER_THRESHOLD {
        return ContentType::Code;
    }
    if count_prose_markers(text) >= PROSE_MARKER_THRESHOLD {
        return ContentType::Prose;
    }
    ContentType::Mixed
}

/// Estimate tokens for `text`: `ceil(chars / ratio)` for its content class.
pub fn estimate(text: &str) -> TokenEstimate {
    let content_type = classify(text);
    let chars = text.chars().count() as u64;
    let tokens = (chars * 10).div_ceil(content_type.ratio_tenths());
    TokenEstimate {
        tokens,
        content_type,
    }
}

/// Shorthand for `estimate(text).tokens`.
pub fn estimate_tokens(text: &str) -> u64 {
    estimate(text).tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const RUST_SNIPPET: &str = "use std::io::Read;\n\nfn load() -> String {\n    let mut s = String::new();\n    s\n}\n";

    #[test]
    fn empty_text() {
        let e = estimate("");
        assert_eq!(e.tokens, 0);
        assert_eq!(e.content_type, ContentType::Mixed);
    }

    #[test]
    fn classifies_code() {
        assert_eq!(classify(RUST_SNIPPET), ContentType::Code);
    }

    #[test]
    fn classifies_prose() {
        let text = "# Errors\n\n- Always propagate with **care**.\n- Log once.\n";
        assert_eq!(classify(text), ContentType::Prose);
    }

    #[test]
    fn classifies_cjk() {
        assert_eq!(classify("エラー処理は必ず伝播させる。"), ContentType::Cjk);
        // 3 of 10 chars is exactly the threshold
        assert_eq!(classify("漢字漢abcdefg"), ContentType::Cjk);
        assert_eq!(classify("漢字abcdefgh"), ContentType::Mixed);
    }

    #[test]
    fn cjk_beats_code() {
        let text = "fn a() {}\nfn b() {}\nfn c() {}\n漢字漢字漢字漢字漢字漢字漢字漢字漢字漢字漢字漢字";
        assert_eq!(classify(text), ContentType::Cjk);
    }

    #[test]
    fn code_beats_prose() {
        let text = "# Title\n- a\n- b\n- c\nfn x() {}\nlet y = 1;\na => b";
        assert_eq!(classify(text), ContentType::Code);
    }

    #[test]
    fn plain_sentence_is_mixed() {
        assert_eq!(classify("Prefer small functions."), ContentType::Mixed);
    }

    #[test]
    fn ceil_division_per_class() {
        // mixed: 10 chars / 3.0 -> 4
        assert_eq!(estimate("abcdefghij").tokens, 4);
        // mixed: 9 chars / 3.0 -> 3
        assert_eq!(estimate("abcdefghi").tokens, 3);
        // cjk: 3 chars / 1.5 -> 2
        assert_eq!(estimate("漢字漢").tokens, 2);
    }

    #[test]
    fn counts_chars_not_bytes() {
        // 4 chars, 12 bytes
        let e = estimate("漢字漢字");
        assert_eq!(e.content_type, ContentType::Cjk);
        assert_eq!(e.tokens, 3);
    }

    #[test]
    fn display_and_serde_names() {
        assert_eq!(ContentType::Cjk.to_string(), "cjk");
        let json = serde_json::to_string(&estimate("")).unwrap();
        assert_eq!(json, r#"{"tokens":0,"contentType":"mixed"}"#);
    }

    #[test]
    fn ratios() {
        assert!((ContentType::Prose.ratio() - 3.5).abs() < f64::EPSILON);
        assert!((ContentType::Cjk.ratio() - 1.5).abs() < f64::EPSILON);
    }

    mod proptests {
        use super::*;

        proptest! {
            #[test]
            fn deterministic(s in ".{0,400}") {
                prop_assert_eq!(estimate(&s), estimate(&s));
            }

            #[test]
            fn bounded_by_class_ratio(s in ".{0,400}") {
                let e = estimate(&s);
                let chars = s.chars().count() as u64;
                let ratio = e.content_type.ratio_tenths();
                prop_assert!(e.tokens * ratio >= chars * 10);
                prop_assert!(e.tokens * ratio < chars * 10 + ratio);
            }

            #[test]
            fn nonempty_has_tokens(s in ".{1,200}") {
                prop_assert!(estimate(&s).tokens >= 1);
            }
        }
    }
}
