//! Source dependency graph and the invalidation cascade.
//!
//! Edges point from a dependency to its dependents:
//!
//! ```text
//! .rules/config.json          → every rule
//! .rules/_global/project.md   → every rule
//! .rules/api/errors.md        → rules whose body references `@rule:api-errors`
//! ```

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use rulesmith_core::constants::CONFIG_PATH;
use rulesmith_core::loader::classify;
use rulesmith_core::refs::referenced_ids;
use rulesmith_core::{LoadedRuleSet, SourceKind};

/// Reverse dependency edges between tracked sources.
#[derive(Clone, Debug, Default)]
pub struct DependencyGraph {
    dependents: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    /// Build the graph for `set`.
    pub fn build(set: &LoadedRuleSet) -> Self {
        let mut graph = Self::default();

        let mut paths_by_id: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for rule in &set.rules {
            paths_by_id
                .entry(rule.id.as_str())
                .or_default()
                .push(rule.project_path(&set.rules_dir));
        }

        let shared: Vec<&str> = set
            .sources
            .iter()
            .filter(|s| s.kind != SourceKind::Rule)
            .map(|s| s.path.as_str())
            .collect();

        for rule in &set.rules {
            let dependent = rule.project_path(&set.rules_dir);
            for dep in &shared {
                graph.add_edge(dep, &dependent);
            }
            for id in referenced_ids(&rule.body) {
                for dep in paths_by_id.get(id.as_str()).into_iter().flatten() {
                    if *dep != dependent {
                        graph.add_edge(dep, &dependent);
                    }
                }
            }
        }
        graph
    }

    fn add_edge(&mut self, dependency: &str, dependent: &str) {
        let _ = self
            .dependents
            .entry(dependency.to_owned())
            .or_default()
            .insert(dependent.to_owned());
    }

    /// Direct dependents of `path`.
    pub fn dependents_of(&self, path: &str) -> impl Iterator<Item = &str> {
        self.dependents
            .get(path)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// `roots` plus everything that transitively depends on them.
    pub fn invalidate<'a, I>(&self, roots: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen: BTreeSet<String> = BTreeSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        for root in roots {
            if seen.insert(root.to_owned()) {
                queue.push_back(root);
            }
        }
        while let Some(node) = queue.pop_front() {
            for dependent in self.dependents_of(node) {
                if seen.insert(dependent.to_owned()) {
                    queue.push_back(dependent);
                }
            }
        }
        seen
    }
}

/// Role of a project-relative path, judged by its location alone.
///
/// Used for deleted sources, which are no longer in the loaded set.
pub fn kind_of_path(path: &str, rules_dir: &str) -> Option<SourceKind> {
    if path == CONFIG_PATH {
        return Some(SourceKind::Config);
    }
    let rules_dir = rules_dir.trim_end_matches('/');
    let rel = if rules_dir.is_empty() {
        path
    } else {
        path.strip_prefix(rules_dir)?.strip_prefix('/')?
    };
    classify(rel).filter(|k| *k != SourceKind::Config)
}

/// Whether `path` is the config document or a global context document.
pub fn is_shared_source(path: &str, rules_dir: &str) -> bool {
    matches!(
        kind_of_path(path, rules_dir),
        Some(SourceKind::Config | SourceKind::GlobalContext)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulesmith_core::{Rule, TrackedSource};

    fn source(path: &str, kind: SourceKind) -> TrackedSource {
        TrackedSource {
            path: path.into(),
            abs_path: format!("/p/{path}").into(),
            kind,
        }
    }

    fn rule_set(rules: Vec<Rule>, shared: &[(&str, SourceKind)]) -> LoadedRuleSet {
        let mut sources: Vec<TrackedSource> = rules
            .iter()
            .map(|r| source(&r.project_path(".rules"), SourceKind::Rule))
            .collect();
        sources.extend(shared.iter().map(|(p, k)| source(p, *k)));
        LoadedRuleSet {
            rules,
            sources,
            rules_dir: ".rules".into(),
            ..Default::default()
        }
    }

    #[test]
    fn reference_cascade_is_transitive() {
        // c references b, b references a
        let set = rule_set(
            vec![
                Rule::new("a", "a.md", "base"),
                Rule::new("b", "b.md", "see @rule:a"),
                Rule::new("c", "c.md", "see [[rule:b]]"),
                Rule::new("d", "d.md", "alone"),
            ],
            &[],
        );
        let graph = DependencyGraph::build(&set);
        let hit = graph.invalidate([".rules/a.md"]);
        assert_eq!(
            hit.into_iter().collect::<Vec<_>>(),
            vec![".rules/a.md", ".rules/b.md", ".rules/c.md"]
        );
    }

    #[test]
    fn shared_sources_reach_every_rule() {
        let set = rule_set(
            vec![Rule::new("a", "a.md", ""), Rule::new("b", "x/b.md", "")],
            &[
                (".rules/config.json", SourceKind::Config),
                (".rules/_global/project.md", SourceKind::GlobalContext),
            ],
        );
        let graph = DependencyGraph::build(&set);
        assert_eq!(graph.invalidate([".rules/config.json"]).len(), 3);
        assert_eq!(graph.dependents_of(".rules/_global/project.md").count(), 2);
    }

    #[test]
    fn cycles_terminate() {
        let set = rule_set(
            vec![
                Rule::new("a", "a.md", "@rule:b"),
                Rule::new("b", "b.md", "@rule:a @rule:b"),
            ],
            &[],
        );
        let graph = DependencyGraph::build(&set);
        assert_eq!(graph.invalidate([".rules/b.md"]).len(), 2);
    }

    #[test]
    fn classify_deleted_paths() {
        assert_eq!(kind_of_path(".rules/config.json", ".rules"), Some(SourceKind::Config));
        assert_eq!(
            kind_of_path(".rules/_global/x.md", ".rules/"),
            Some(SourceKind::GlobalContext)
        );
        assert_eq!(kind_of_path(".rules/a.md", ".rules"), Some(SourceKind::Rule));
        assert_eq!(kind_of_path("other/a.md", ".rules"), None);
        // the config document stays put when the rules dir moves
        assert_eq!(kind_of_path(".rules/config.json", "docs/rules"), Some(SourceKind::Config));
        assert_eq!(kind_of_path("docs/rules/config.json", "docs/rules"), None);
        assert!(is_shared_source(".rules/config.json", "docs/rules"));
        assert!(is_shared_source(".rules/_global/x.md", ".rules"));
        assert!(!is_shared_source(".rules/a.md", ".rules"));
    }
}
