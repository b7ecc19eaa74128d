//! `CLAUDE.md`: one file, priority-ordered.

use rulesmith_build::{CompileError, CompileInput, OutputFile, TargetCompiler};

use crate::render::single_file;

/// Default output path.
pub const CLAUDE_OUTPUT: &str = "CLAUDE.md";

/// Compiler for the `claude` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClaudeCompiler;

impl TargetCompiler for ClaudeCompiler {
    fn name(&self) -> &str {
        "claude"
    }

    fn compile(&self, input: &CompileInput<'_>) -> Result<Vec<OutputFile>, CompileError> {
        Ok(vec![single_file(input, CLAUDE_OUTPUT, "Project Rules")])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{input, rules};
    use rulesmith_core::Strategy;
    use rulesmith_settings::TargetSettings;

    #[test]
    fn renders_priority_order_with_context() {
        let settings = TargetSettings::with_strategy(Strategy::Priority, Some(8000));
        let rules = rules();
        let docs = [rulesmith_core::ContextDocument {
            path: ".rules/_global/project.md".into(),
            content: "This is a Rust workspace.\n".into(),
        }];
        let out = ClaudeCompiler
            .compile(&input("claude", &settings, &rules, &docs))
            .unwrap();
        assert_eq!(out.len(), 1);
        let file = &out[0];
        assert_eq!(file.path, "CLAUDE.md");
        let text = &file.content;
        let context = text.find("This is a Rust workspace.").unwrap();
        let high = text.find("## Error handling").unwrap();
        let low = text.find("## style").unwrap();
        assert!(context < high && high < low);
        assert!(file.sources.contains(&".rules/_global/project.md".to_string()));
    }

    #[test]
    fn budget_drops_low_priority_rules() {
        let settings = TargetSettings::with_strategy(Strategy::Priority, Some(12));
        let rules = rules();
        let out = ClaudeCompiler
            .compile(&input("claude", &settings, &rules, &[]))
            .unwrap();
        assert!(!out[0].content.contains("## style"));
        assert!(!out[0].sources.contains(&".rules/style.md".to_string()));
    }
}
