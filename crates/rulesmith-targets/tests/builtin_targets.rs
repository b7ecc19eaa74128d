#![allow(missing_docs, unused_results)]

use std::path::Path;

use rulesmith_build::{BuildOrchestrator, BuildRequest};
use rulesmith_settings::RulesmithSettings;
use rulesmith_targets::registry_for;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let full = root.join(rel);
    std::fs::create_dir_all(full.parent().unwrap()).unwrap();
    std::fs::write(full, content).unwrap();
}

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "src/api/handlers.rs", "pub fn handle() {}\n");
    write(root, ".rules/_global/project.md", "# Acme\n\nA Rust service.\n");
    write(
        root,
        ".rules/src/api/errors.md",
        "---\nid: api-errors\ndescription: API error handling\npriority: 90\ndomain: backend\n---\nReturn typed errors; see [style](../../style.md).\n",
    );
    write(
        root,
        ".rules/style.md",
        "---\nid: style\npriority: 40\n---\nFormat with rustfmt.\n",
    );
    dir
}

#[tokio::test]
async fn default_targets_compile_end_to_end() {
    let dir = project();
    let root = dir.path();
    let settings = RulesmithSettings::default();
    let registry = registry_for(&settings);
    let orch = BuildOrchestrator::new(root, settings, registry);

    let report = orch.build(&BuildRequest::default()).await.unwrap();
    assert!(report.is_success(), "{report}");
    assert_eq!(report.compiled, vec!["agents", "claude", "copilot", "cursor"]);

    let claude = std::fs::read_to_string(root.join("CLAUDE.md")).unwrap();
    assert!(claude.contains("A Rust service."));
    assert!(claude.find("## API error handling").unwrap() < claude.find("## style").unwrap());

    let agents = std::fs::read_to_string(root.join("AGENTS.md")).unwrap();
    assert!(agents.contains("## backend"));

    assert!(root.join(".github/copilot-instructions.md").exists());
    let mdc = std::fs::read_to_string(root.join(".cursor/rules/api-errors.mdc")).unwrap();
    assert!(mdc.contains("globs: src/api/**"));
    assert!(root.join(".cursor/rules/_context.mdc").exists());

    let again = orch.build(&BuildRequest::default()).await.unwrap();
    assert!(again.compiled.is_empty());
    assert!(again.written.is_empty());
}

#[tokio::test]
async fn selecting_one_target_leaves_the_rest_alone() {
    let dir = project();
    let root = dir.path();
    let settings = RulesmithSettings::default();
    let registry = registry_for(&settings);
    let orch = BuildOrchestrator::new(root, settings, registry);

    let report = orch
        .build(&BuildRequest {
            targets: vec!["claude".into()],
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(report.compiled, vec!["claude"]);
    assert!(root.join("CLAUDE.md").exists());
    assert!(!root.join("AGENTS.md").exists());

    // agents has never been built, so it is new on the next full run
    let full = orch.build(&BuildRequest::default()).await.unwrap();
    assert!(full.compiled.contains(&"agents".to_string()));
    assert!(!full.compiled.contains(&"claude".to_string()));
}
