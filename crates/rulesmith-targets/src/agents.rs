//! `AGENTS.md`: every selected rule, grouped by domain.

use std::collections::BTreeMap;

use rulesmith_build::{CompileError, CompileInput, OutputFile, TargetCompiler};
use rulesmith_core::Rule;

use crate::render::{
    GENERATED_NOTICE, check_rendered_size, finish, push_block, push_context, push_rule,
    selection_sources,
};

/// Default output path.
pub const AGENTS_OUTPUT: &str = "AGENTS.md";

/// Section for rules without a domain.
const GENERAL_DOMAIN: &str = "General";

/// Compiler for the `agents` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct AgentsCompiler;

impl TargetCompiler for AgentsCompiler {
    fn name(&self) -> &str {
        "agents"
    }

    fn compile(&self, input: &CompileInput<'_>) -> Result<Vec<OutputFile>, CompileError> {
        let selection = input.select();

        // Domains appear in the order of their highest-ranked rule.
        let mut order: Vec<&str> = Vec::new();
        let mut groups: BTreeMap<&str, Vec<&Rule>> = BTreeMap::new();
        for rule in &selection.included {
            let domain = rule.domain.as_deref().unwrap_or(GENERAL_DOMAIN);
            if !order.contains(&domain) {
                order.push(domain);
            }
            groups.entry(domain).or_default().push(rule);
        }

        let mut out = String::new();
        push_block(&mut out, GENERATED_NOTICE);
        push_block(&mut out, "# AGENTS.md");
        push_context(&mut out, input.context_documents);
        for domain in order {
            push_block(&mut out, &format!("## {domain}"));
            for rule in groups.remove(domain).unwrap_or_default() {
                push_rule(&mut out, rule, 3);
            }
        }
        let content = finish(out);
        check_rendered_size(input, &content);
        Ok(vec![
            OutputFile::new(input.output_path(AGENTS_OUTPUT), content)
                .with_sources(selection_sources(input, &selection)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{input, rules};
    use rulesmith_settings::TargetSettings;

    #[test]
    fn groups_by_domain() {
        let settings = TargetSettings::default();
        let rules = rules();
        let out = AgentsCompiler
            .compile(&input("agents", &settings, &rules, &[]))
            .unwrap();
        let text = &out[0].content;
        assert!(text.starts_with(GENERATED_NOTICE));
        let backend = text.find("## backend").unwrap();
        let general = text.find("## General").unwrap();
        assert!(backend < general);
        assert!(text.contains("### Error handling"));
        assert_eq!(out[0].sources.len(), 3);
    }
}
