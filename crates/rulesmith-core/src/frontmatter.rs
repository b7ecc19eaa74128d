//! Rule document parser.
//!
//! Rule documents are markdown files with YAML frontmatter delimited by
//! `---`. A hand-written YAML subset parser (no external YAML dependency)
//! supports key-value pairs, booleans, quoted strings, and inline or block
//! lists.
//!
//! Parsing is two-staged: the text is first read into an untyped
//! [`RawFrontmatter`] (every value still a string), then
//! [`RawFrontmatter::into_rule`] checks required fields, ranges, and defaults
//! and returns either a typed [`Rule`] or a [`ParseError`]. Partial rules are
//! never produced.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::constants::{DEFAULT_PRIORITY, MAX_PRIORITY};
use crate::errors::ParseError;
use crate::rule::Rule;

/// Accepted rule id shape.
static ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._/-]*$").expect("id pattern compiles"));

/// A frontmatter value together with the line it was declared on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Located<T> {
    /// The value.
    pub value: T,
    /// 1-based line in the source document.
    pub line: usize,
}

/// Untyped frontmatter, exactly as written.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawFrontmatter {
    /// `id`
    pub id: Option<Located<String>>,
    /// `description`
    pub description: Option<Located<String>>,
    /// `domain`
    pub domain: Option<Located<String>>,
    /// `priority`
    pub priority: Option<Located<String>>,
    /// `tags`
    pub tags: Option<Located<Vec<String>>>,
    /// `alwaysApply` / `always_apply`
    pub always_apply: Option<Located<String>>,
    /// `globs`
    pub globs: Option<Located<Vec<String>>>,
}

/// A document split into frontmatter and body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitDocument {
    /// Frontmatter text (without delimiters), if present.
    pub yaml: Option<String>,
    /// Markdown body after the closing delimiter.
    pub body: String,
    /// 1-based line of the first frontmatter line.
    pub yaml_line: usize,
    /// 1-based line where the body starts.
    pub body_line: usize,
}

/// Parse a rule document into a [`Rule`].
///
/// `source_path` is the document's path relative to the rules dir and is
/// used both as the rule's `source_path` and in error messages.
pub fn parse_rule(source_path: &str, raw: &str) -> Result<Rule, ParseError> {
    let doc = split_frontmatter(source_path, raw)?;
    let frontmatter = match &doc.yaml {
        Some(yaml) => parse_simple_yaml(yaml, doc.yaml_line),
        None => RawFrontmatter::default(),
    };
    frontmatter.into_rule(source_path, doc.body, doc.body_line)
}

/// Split `---` delimited frontmatter from the body.
///
/// A document that opens a frontmatter block but never closes it is an
/// error rather than being silently treated as body text.
pub fn split_frontmatter(source_path: &str, content: &str) -> Result<SplitDocument, ParseError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.split_inclusive('\n');

    let Some(first) = lines.next() else {
        return Ok(SplitDocument {
            yaml: None,
            body: String::new(),
            yaml_line: 1,
            body_line: 1,
        });
    };
    if first.trim_end() != "---" {
        return Ok(SplitDocument {
            yaml: None,
            body: content.to_owned(),
            yaml_line: 1,
            body_line: 1,
        });
    }

    let mut yaml = String::new();
    let mut consumed = first.len();
    let mut line_no = 1;
    for line in lines {
        consumed += line.len();
        line_no += 1;
        if line.trim_end() == "---" {
            return Ok(SplitDocument {
                yaml: Some(yaml),
                body: content[consumed..].to_owned(),
                yaml_line: 2,
                body_line: line_no + 1,
            });
        }
        yaml.push_str(line);
    }

    Err(ParseError::new(source_path, "frontmatter block is not closed with '---'").at_line(1))
}

/// Parse a simple YAML string into [`RawFrontmatter`].
///
/// Supports:
/// - Simple key-value pairs: `id: value`
/// - Quoted strings: `description: "Error handling"`
/// - Inline arrays: `tags: [rust, errors]`
/// - Multi-line arrays: `globs:\n  - src/**\n  - lib/**`
///
/// Unknown keys and comment lines are ignored.
pub fn parse_simple_yaml(yaml: &str, first_line: usize) -> RawFrontmatter {
    let mut fm = RawFrontmatter::default();
    let lines: Vec<&str> = yaml.lines().collect();
    let mut i = 0;

    while i < lines.len() {
        let line_no = first_line + i;
        let line = lines[i].trim();
        i += 1;

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };

        let key = key.trim();
        let value = strip_comment(value.trim());
        let scalar = |v: &str| Some(Located { value: unquote(v), line: line_no });

        match key {
            "id" => fm.id = scalar(value),
            "description" => fm.description = scalar(value),
            "domain" => fm.domain = scalar(value),
            "priority" => fm.priority = scalar(value),
            "alwaysApply" | "always_apply" => fm.always_apply = scalar(value),
            "tags" => {
                fm.tags = Some(Located {
                    value: parse_array_value(value, &lines, &mut i),
                    line: line_no,
                });
            }
            "globs" => {
                fm.globs = Some(Located {
                    value: parse_array_value(value, &lines, &mut i),
                    line: line_no,
                });
            }
            _ => {}
        }
    }

    fm
}

impl RawFrontmatter {
    /// Validate fields and build the typed rule.
    pub fn into_rule(self, source_path: &str, body: String, body_line: usize) -> Result<Rule, ParseError> {
        let id = match self.id {
            Some(Located { value, line }) => {
                if value.is_empty() {
                    return Err(ParseError::new(source_path, "field 'id' must not be empty").at_line(line));
                }
                if !ID_PATTERN.is_match(&value) {
                    return Err(ParseError::new(
                        source_path,
                        format!("invalid id '{value}': use letters, digits, '.', '_', '-', '/'"),
                    )
                    .at_line(line));
                }
                value
            }
            None => return Err(ParseError::new(source_path, "missing required field 'id'")),
        };

        let priority = match self.priority {
            Some(Located { value, line }) => parse_priority(&value)
                .map_err(|msg| ParseError::new(source_path, msg).at_line(line))?,
            None => DEFAULT_PRIORITY,
        };

        let always_apply = match self.always_apply {
            Some(Located { value, line }) => parse_bool(&value).ok_or_else(|| {
                ParseError::new(
                    source_path,
                    format!("alwaysApply must be true or false, got '{value}'"),
                )
                .at_line(line)
            })?,
            None => false,
        };

        let tags: BTreeSet<String> = self
            .tags
            .map(|t| t.value.into_iter().filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();

        let globs: Vec<String> = self
            .globs
            .map(|g| g.value.into_iter().filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();

        Ok(Rule {
            id,
            description: self.description.map(|d| d.value).filter(|d| !d.is_empty()),
            domain: self.domain.map(|d| d.value).filter(|d| !d.is_empty()),
            priority,
            tags,
            always_apply,
            globs,
            body,
            source_path: source_path.to_owned(),
            body_line,
        })
    }
}

fn parse_priority(value: &str) -> Result<u8, String> {
    let n: i64 = value
        .parse()
        .map_err(|_| format!("priority must be an integer, got '{value}'"))?;
    if !(0..=i64::from(MAX_PRIORITY)).contains(&n) {
        return Err(format!("priority must be between 0 and {MAX_PRIORITY}, got {n}"));
    }
    u8::try_from(n).map_err(|_| format!("priority out of range: {n}"))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" => Some(true),
        "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse an array value, either inline `[a, b]` or multi-line `- item`.
fn parse_array_value(value: &str, lines: &[&str], i: &mut usize) -> Vec<String> {
    if value.starts_with('[') {
        return parse_inline_array(value);
    }

    if !value.is_empty() {
        // A comma-separated scalar is accepted as a list.
        return value.split(',').map(unquote).filter(|s| !s.is_empty()).collect();
    }

    let mut items = Vec::new();
    while *i < lines.len() {
        let trimmed = lines[*i].trim();
        if let Some(item) = trimmed.strip_prefix('-') {
            items.push(unquote(strip_comment(item.trim())));
            *i += 1;
        } else if trimmed.is_empty() {
            *i += 1;
        } else {
            break;
        }
    }
    items
}

/// Parse an inline array like `[item1, "item 2", item3]`.
fn parse_inline_array(value: &str) -> Vec<String> {
    let inner = value.trim_start_matches('[').trim_end_matches(']').trim();
    if inner.is_empty() {
        return Vec::new();
    }
    inner.split(',').map(unquote).collect()
}

/// Remove surrounding quotes from a string value.
fn unquote(s: &str) -> String {
    let trimmed = s.trim();
    if trimmed.len() >= 2
        && ((trimmed.starts_with('"') && trimmed.ends_with('"'))
            || (trimmed.starts_with('\'') && trimmed.ends_with('\'')))
    {
        trimmed[1..trimmed.len() - 1].to_string()
    } else {
        trimmed.to_string()
    }
}

/// Drop a trailing ` # comment` from an unquoted value.
fn strip_comment(value: &str) -> &str {
    if value.starts_with('"') || value.starts_with('\'') {
        return value;
    }
    match value.find(" #") {
        Some(idx) => value[..idx].trim_end(),
        None => value,
    }
}
