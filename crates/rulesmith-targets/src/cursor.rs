//! `.cursor/rules/<id>.mdc`: one file per selected rule.
//!
//! ```text
//! ---
//! description: API error handling
//! globs: src/api/**
//! alwaysApply: false
//! ---
//!
//! <body>
//! ```
//!
//! Global context documents become `_context.mdc` with `alwaysApply: true`.

use rulesmith_build::{CompileError, CompileInput, OutputFile, TargetCompiler};
use rulesmith_core::Rule;

use crate::render::{finish, push_block, push_context, rule_title};

/// Default output directory.
pub const CURSOR_DIR: &str = ".cursor/rules";

/// File stem used for the global context.
const CONTEXT_STEM: &str = "_context";

/// Compiler for the `cursor` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct CursorCompiler;

/// File stem for a rule id; `/` becomes `-`.
pub fn file_stem(id: &str) -> String {
    id.replace('/', "-")
}

fn frontmatter(description: &str, globs: &[String], always_apply: bool) -> String {
    let mut out = String::from("---\n");
    out.push_str(&format!("description: {description}\n"));
    if !globs.is_empty() {
        out.push_str(&format!("globs: {}\n", globs.join(", ")));
    }
    out.push_str(&format!("alwaysApply: {always_apply}\n---\n\n"));
    out
}

fn render_rule(rule: &Rule) -> String {
    let globs = if rule.always_apply {
        Vec::new()
    } else {
        rule.effective_globs()
    };
    let mut out = frontmatter(rule_title(rule), &globs, rule.always_apply);
    push_block(&mut out, &rule.body);
    finish(out)
}

impl TargetCompiler for CursorCompiler {
    fn name(&self) -> &str {
        "cursor"
    }

    fn compile(&self, input: &CompileInput<'_>) -> Result<Vec<OutputFile>, CompileError> {
        let dir = input.output_path(CURSOR_DIR);
        let dir = dir.trim_end_matches('/');
        let selection = input.select();

        let mut outputs = Vec::with_capacity(selection.included.len() + 1);
        if !input.context_documents.is_empty() {
            let mut content = frontmatter("Project context", &[], true);
            push_context(&mut content, input.context_documents);
            outputs.push(
                OutputFile::new(format!("{dir}/{CONTEXT_STEM}.mdc"), finish(content))
                    .with_sources(input.context_sources()),
            );
        }
        for rule in &selection.included {
            let stem = file_stem(&rule.id);
            if stem == CONTEXT_STEM {
                return Err(CompileError::Render {
                    target: input.target.to_owned(),
                    message: format!("rule id {} collides with the context file", rule.id),
                });
            }
            outputs.push(
                OutputFile::new(format!("{dir}/{stem}.mdc"), render_rule(rule))
                    .with_sources([input.source_of(rule)]),
            );
        }
        Ok(outputs)
    }
}
