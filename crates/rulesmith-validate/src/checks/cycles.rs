//! Circular reference detection.
//!
//! References form a directed graph over rule ids. A three-colour DFS from
//! each rule, in id order, reports every back edge once: the chain runs from
//! the repeated node along the current stack and back to it. Traversal stops
//! at the first repeat, so cycles never loop.

use std::collections::{BTreeMap, HashMap};

use rulesmith_core::Rule;
use rulesmith_core::refs::extract_references;

use crate::checks::document_line;
use crate::issue::{IssueKind, ValidationIssue};

/// Chain separator used in messages.
pub const CHAIN_ARROW: &str = "→";

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    OnStack,
    Done,
}

struct Graph<'a> {
    /// id → first rule defining it.
    rules: BTreeMap<&'a str, &'a Rule>,
    /// id → (referenced id, 0-based body line) for known targets.
    edges: HashMap<&'a str, Vec<(String, usize)>>,
}

impl<'a> Graph<'a> {
    fn build(rules: &'a [Rule]) -> Self {
        let mut by_id: BTreeMap<&str, &Rule> = BTreeMap::new();
        for rule in rules {
            let _ = by_id.entry(rule.id.as_str()).or_insert(rule);
        }
        let mut edges: HashMap<&str, Vec<(String, usize)>> = HashMap::new();
        for (id, rule) in &by_id {
            let mut out: Vec<(String, usize)> = Vec::new();
            for r in extract_references(&rule.body) {
                if by_id.contains_key(r.id.as_str()) && !out.iter().any(|(t, _)| *t == r.id) {
                    out.push((r.id, r.line_index));
                }
            }
            let _ = edges.insert(*id, out);
        }
        Self { rules: by_id, edges }
    }
}

/// Find all reference cycles, one error per back edge.
pub fn find_cycles(rules: &[Rule]) -> Vec<Vec<String>> {
    let graph = Graph::build(rules);
    let mut marks: HashMap<&str, Mark> = HashMap::new();
    let mut stack: Vec<&str> = Vec::new();
    let mut cycles = Vec::new();
    for id in graph.rules.keys() {
        if !marks.contains_key(id) {
            visit(&graph, id, &mut marks, &mut stack, &mut cycles);
        }
    }
    cycles
}

fn visit<'a>(
    graph: &'a Graph<'a>,
    id: &'a str,
    marks: &mut HashMap<&'a str, Mark>,
    stack: &mut Vec<&'a str>,
    cycles: &mut Vec<Vec<String>>,
) {
    let _ = marks.insert(id, Mark::OnStack);
    stack.push(id);

    if let Some(out) = graph.edges.get(id) {
        for (target, _) in out {
            let target = target.as_str();
            match marks.get(target) {
                Some(Mark::OnStack) => {
                    let start = stack.iter().position(|s| *s == target).unwrap_or(0);
                    let mut chain: Vec<String> =
                        stack[start..].iter().map(|s| (*s).to_owned()).collect();
                    chain.push(target.to_owned());
                    cycles.push(chain);
                }
                Some(Mark::Done) => {}
                None => visit(graph, target, marks, stack, cycles),
            }
        }
    }

    let _ = stack.pop();
    let _ = marks.insert(id, Mark::Done);
}

/// One error per detected cycle, reported on the rule that starts the chain.
pub fn check_circular_references(rules: &[Rule]) -> Vec<ValidationIssue> {
    let graph = Graph::build(rules);
    find_cycles(rules)
        .into_iter()
        .filter_map(|chain| {
            let head = graph.rules.get(chain[0].as_str())?;
            let line = graph
                .edges
                .get(chain[0].as_str())
                .and_then(|out| out.iter().find(|(t, _)| *t == chain[1]))
                .map(|(_, idx)| document_line(head, *idx));
            let issue = ValidationIssue::new(
                IssueKind::CircularReference,
                &head.source_path,
                format!("circular reference: {}", chain.join(CHAIN_ARROW)),
            );
            Some(match line {
                Some(l) => issue.at_line(l),
                None => issue,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: &str, body: &str) -> Rule {
        Rule::new(id, format!("{id}.md"), body)
    }

    #[test]
    fn three_node_cycle_reported_once() {
        let rules = vec![
            rule("c", "back to @rule:a"),
            rule("a", "see @rule:b"),
            rule("b", "then [[rule:c]]"),
        ];
        let issues = check_circular_references(&rules);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.ends_with("a→b→c→a"), "{}", issues[0].message);
        assert_eq!(issues[0].source_path, "a.md");
        assert_eq!(issues[0].line, Some(1));
    }

    #[test]
    fn self_reference_reported_once() {
        let rules = vec![rule("a", "recursion: @rule:a, again @rule:a")];
        let cycles = find_cycles(&rules);
        assert_eq!(cycles, vec![vec!["a".to_string(), "a".to_string()]]);
    }

    #[test]
    fn acyclic_graph_is_clean() {
        let rules = vec![
            rule("a", "@rule:b @rule:c"),
            rule("b", "@rule:c"),
            rule("c", ""),
        ];
        assert!(find_cycles(&rules).is_empty());
    }

    #[test]
    fn unknown_references_are_not_edges() {
        let rules = vec![rule("a", "@rule:missing")];
        assert!(find_cycles(&rules).is_empty());
    }

    #[test]
    fn two_disjoint_cycles() {
        let rules = vec![
            rule("a", "@rule:b"),
            rule("b", "@rule:a"),
            rule("x", "@rule:y"),
            rule("y", "@rule:x"),
        ];
        let cycles = find_cycles(&rules);
        assert_eq!(cycles.len(), 2);
        assert_eq!(cycles[0], vec!["a", "b", "a"]);
        assert_eq!(cycles[1], vec!["x", "y", "x"]);
    }

    #[test]
    fn cycle_reached_from_outside_starts_at_repeat() {
        let rules = vec![
            rule("a", "@rule:b"),
            rule("b", "@rule:c"),
            rule("c", "@rule:b"),
        ];
        let cycles = find_cycles(&rules);
        assert_eq!(cycles, vec![vec!["b", "c", "b"]]);
    }
}
