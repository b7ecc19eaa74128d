//! Markdown building blocks shared by the built-in compilers.

use rulesmith_build::{CompileInput, OutputFile};
use rulesmith_core::{ContextDocument, Rule};
use rulesmith_select::SelectionResult;
use rulesmith_tokens::estimate_tokens;
use tracing::warn;

/// First line of every generated file.
pub const GENERATED_NOTICE: &str =
    "<!-- Generated by rulesmith. Edit the rule sources instead of this file. -->";

/// Heading text for a rule: its description, else its id.
pub fn rule_title(rule: &Rule) -> &str {
    rule.description.as_deref().unwrap_or(&rule.id)
}

/// Append `text` followed by exactly one blank line.
pub fn push_block(out: &mut String, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    out.push_str(text);
    out.push_str("\n\n");
}

/// Append every global context document, in path order.
pub fn push_context(out: &mut String, docs: &[ContextDocument]) {
    for doc in docs {
        push_block(out, &doc.content);
    }
}

/// Append one rule as a section at heading `level`.
pub fn push_rule(out: &mut String, rule: &Rule, level: usize) {
    let hashes = "#".repeat(level.clamp(1, 6));
    out.push_str(&format!("{hashes} {}\n\n", rule_title(rule)));
    push_block(out, &rule.body);
}

/// Trim trailing blank lines down to a single newline.
pub fn finish(mut out: String) -> String {
    let trimmed = out.trim_end().len();
    out.truncate(trimmed);
    out.push('\n');
    out
}

/// Every source behind a selection: included rules, then context documents.
pub fn selection_sources(input: &CompileInput<'_>, selection: &SelectionResult<'_>) -> Vec<String> {
    selection
        .included
        .iter()
        .map(|r| input.source_of(r))
        .chain(input.context_sources())
        .collect()
}

/// A single-file output with the standard layout: notice, title, global
/// context, then every selected rule as a second-level section.
pub fn single_file(input: &CompileInput<'_>, default_path: &str, title: &str) -> OutputFile {
    let selection = input.select();
    let mut out = String::new();
    push_block(&mut out, GENERATED_NOTICE);
    push_block(&mut out, &format!("# {title}"));
    push_context(&mut out, input.context_documents);
    for rule in &selection.included {
        push_rule(&mut out, rule, 2);
    }
    let content = finish(out);
    check_rendered_size(input, &content);
    OutputFile::new(input.output_path(default_path), content)
        .with_sources(selection_sources(input, &selection))
}

/// Warn when formatting overhead pushed the rendered file past the budget.
pub fn check_rendered_size(input: &CompileInput<'_>, content: &str) {
    let Some(budget) = input.settings.token_budget else {
        return;
    };
    let tokens = estimate_tokens(content);
    if i64::try_from(tokens).is_ok_and(|t| t > budget) {
        warn!(
            target = input.target,
            tokens,
            budget,
            "rendered output exceeds its token budget"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_prefers_description() {
        let mut rule = Rule::new("api-errors", "api/errors.md", "");
        assert_eq!(rule_title(&rule), "api-errors");
        rule.description = Some("API error handling".into());
        assert_eq!(rule_title(&rule), "API error handling");
    }

    #[test]
    fn blocks_are_separated_by_one_blank_line() {
        let mut out = String::new();
        push_block(&mut out, "\n\nfirst\n\n\n");
        push_block(&mut out, "   ");
        push_block(&mut out, "second");
        assert_eq!(finish(out), "first\n\nsecond\n");
    }

    #[test]
    fn rule_sections() {
        let mut out = String::new();
        push_rule(&mut out, &Rule::new("a", "a.md", "Body.\n"), 2);
        assert_eq!(out, "## a\n\nBody.\n\n");
    }
}
