//! Markdown structure helpers.
//!
//! Structural detection is table-driven: the link pattern lives in one place
//! and the scanners below only iterate lines outside fenced code blocks.

use std::sync::LazyLock;

use regex::Regex;

/// Inline markdown link: `[text](target)` or `![alt](target)`.
///
/// Captures the raw target (without an optional `"title"`).
static LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"!?\[[^\]]*\]\(\s*<?([^)\s>]+)>?(?:\s+"[^"]*")?\s*\)"#)
        .expect("link pattern compiles")
});

/// Link target prefixes that never refer to project files.
const EXTERNAL_PREFIXES: &[&str] = &["http://", "https://", "mailto:", "tel:", "ftp://", "data:"];

/// A link target found in a markdown body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarkdownLink {
    /// Raw target as written.
    pub target: String,
    /// 0-based line index within the scanned text.
    pub line_index: usize,
}

impl MarkdownLink {
    /// External URL, mail link, or pure anchor.
    pub fn is_external_or_anchor(&self) -> bool {
        let lower = self.target.to_ascii_lowercase();
        self.target.starts_with('#') || EXTERNAL_PREFIXES.iter().any(|p| lower.starts_with(p))
    }

    /// Target with any `#fragment` or `?query` suffix removed.
    pub fn path_part(&self) -> &str {
        let end = self
            .target
            .find(['#', '?'])
            .unwrap_or(self.target.len());
        &self.target[..end]
    }
}

/// Iterate `(line_index, line)` pairs that are outside fenced code blocks.
pub fn lines_outside_code(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut in_fence = false;
    text.lines().enumerate().filter(move |(_, line)| {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            return false;
        }
        !in_fence
    })
}

/// Extract every link target outside fenced code blocks.
pub fn extract_links(text: &str) -> Vec<MarkdownLink> {
    let mut links = Vec::new();
    for (line_index, line) in lines_outside_code(text) {
        for cap in LINK_PATTERN.captures_iter(line) {
            if let Some(target) = cap.get(1) {
                links.push(MarkdownLink {
                    target: target.as_str().to_owned(),
                    line_index,
                });
            }
        }
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_relative_link() {
        let links = extract_links("See [the guide](docs/guide.md) for details.");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].target, "docs/guide.md");
        assert_eq!(links[0].line_index, 0);
    }

    #[test]
    fn extracts_multiple_links_with_lines() {
        let text = "intro\n[a](a.md) and [b](b.md)\n\n![img](img/x.png \"title\")";
        let links = extract_links(text);
        let targets: Vec<_> = links.iter().map(|l| (l.target.as_str(), l.line_index)).collect();
        assert_eq!(targets, vec![("a.md", 1), ("b.md", 1), ("img/x.png", 3)]);
    }

    #[test]
    fn skips_fenced_code() {
        let text = "```md\n[x](missing.md)\n```\n[y](real.md)";
        let links = extract_links(text);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].target, "real.md");
        assert_eq!(links[0].line_index, 3);
    }

    #[test]
    fn classifies_external_targets() {
        for target in ["https://x.dev", "HTTP://x", "mailto:a@b.c", "#section"] {
            let link = MarkdownLink {
                target: target.into(),
                line_index: 0,
            };
            assert!(link.is_external_or_anchor(), "{target}");
        }
        let local = MarkdownLink {
            target: "docs/a.md".into(),
            line_index: 0,
        };
        assert!(!local.is_external_or_anchor());
    }

    #[test]
    fn path_part_strips_fragment_and_query() {
        let link = MarkdownLink {
            target: "docs/a.md#usage".into(),
            line_index: 0,
        };
        assert_eq!(link.path_part(), "docs/a.md");
        let link = MarkdownLink {
            target: "b.md?raw=1".into(),
            line_index: 0,
        };
        assert_eq!(link.path_part(), "b.md");
    }
}
