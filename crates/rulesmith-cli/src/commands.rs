//! Command execution.
//!
//! Each command returns the exit code to use; errors that escape are
//! mapped by `main`.

use std::path::Path;

use anyhow::{Context, Result};
use rulesmith_build::{
    BuildError, BuildOrchestrator, BuildRequest, EXIT_FAILURE, EXIT_SUCCESS,
};
use rulesmith_settings::load_settings;
use rulesmith_targets::registry_for;
use rulesmith_tokens::{effective_budget, estimate};
use rulesmith_validate::ValidationReport;
use tracing::info;

use crate::cli::Command;

/// Dispatch one parsed command.
pub async fn run(command: Command) -> Result<u8> {
    match command {
        Command::Build {
            project,
            targets,
            force,
            context_files,
            json,
        } => {
            let request = BuildRequest {
                targets,
                force,
                context_files,
            };
            build(&project.project, &request, json).await
        }
        Command::Validate { project, json } => validate(&project.project, json),
        Command::Status {
            project,
            targets,
            context_files,
            json,
        } => {
            let request = BuildRequest {
                targets,
                context_files,
                ..BuildRequest::default()
            };
            status(&project.project, &request, json).await
        }
        Command::Estimate {
            file,
            budget,
            margin,
        } => estimate_file(&file, budget, margin),
        Command::Unlock { project } => unlock(&project.project).await,
    }
}

fn orchestrator(project: &Path) -> Result<BuildOrchestrator> {
    let settings = load_settings(project).map_err(BuildError::from)?;
    let compilers = registry_for(&settings);
    info!(project = %project.display(), targets = compilers.len(), "loaded settings");
    Ok(BuildOrchestrator::new(project, settings, compilers))
}

async fn build(project: &Path, request: &BuildRequest, json: bool) -> Result<u8> {
    let orchestrator = orchestrator(project)?;
    match orchestrator.build(request).await {
        Ok(report) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{report}");
            }
            Ok(report.exit_code())
        }
        Err(BuildError::Validation(report)) => {
            print_issues(&report, json)?;
            eprintln!("error: validation failed with {} error(s); nothing written", report.errors.len());
            Ok(EXIT_FAILURE)
        }
        Err(err) => Err(err.into()),
    }
}

fn validate(project: &Path, json: bool) -> Result<u8> {
    let orchestrator = orchestrator(project)?;
    let (set, mut report) = orchestrator.validate()?;
    report.sort();
    print_issues(&report, json)?;
    if !json {
        println!(
            "{} rule(s), {} error(s), {} warning(s)",
            set.rules.len(),
            report.errors.len(),
            report.warnings.len()
        );
    }
    Ok(if report.is_valid() { EXIT_SUCCESS } else { EXIT_FAILURE })
}

fn print_issues(report: &ValidationReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        for issue in report.issues() {
            println!("{issue}");
        }
    }
    Ok(())
}

async fn status(project: &Path, request: &BuildRequest, json: bool) -> Result<u8> {
    let orchestrator = orchestrator(project)?;
    let report = orchestrator.status(request).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{report}");
    }
    Ok(EXIT_SUCCESS)
}

fn estimate_file(file: &Path, budget: Option<i64>, margin: u8) -> Result<u8> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let result = estimate(&text);
    println!("{} tokens ({})", result.tokens, result.content_type);

    let Some(budget) = budget else {
        return Ok(EXIT_SUCCESS);
    };
    let effective = effective_budget(budget, margin);
    println!("budget {budget}, effective {effective} after {margin}% margin");
    if result.tokens > effective {
        eprintln!("error: over budget by {} tokens", result.tokens - effective);
        return Ok(EXIT_FAILURE);
    }
    Ok(EXIT_SUCCESS)
}

async fn unlock(project: &Path) -> Result<u8> {
    let orchestrator = orchestrator(project)?;
    match orchestrator.unlock().await? {
        Some(holder) => println!(
            "removed lock held by pid {} on {} since {}",
            holder.pid, holder.host, holder.acquired_at
        ),
        None => println!("no build lock"),
    }
    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ProjectArgs;
    use rulesmith_build::EXIT_RUNTIME;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let full = root.join(rel);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, content).unwrap();
    }

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            ".rules/style.md",
            "---\nid: style\npriority: 40\n---\nFormat with rustfmt.\n",
        );
        dir
    }

    fn project_args(dir: &TempDir) -> ProjectArgs {
        ProjectArgs {
            project: dir.path().to_path_buf(),
        }
    }

    #[tokio::test]
    async fn build_then_status_is_clean() {
        let dir = project();
        let code = run(Command::Build {
            project: project_args(&dir),
            targets: vec!["claude".into()],
            force: false,
            context_files: vec![],
            json: false,
        })
        .await
        .unwrap();
        assert_eq!(code, EXIT_SUCCESS);
        assert!(dir.path().join("CLAUDE.md").exists());

        let orch = orchestrator(dir.path()).unwrap();
        let status = orch
            .status(&BuildRequest {
                targets: vec!["claude".into()],
                ..BuildRequest::default()
            })
            .await
            .unwrap();
        assert!(status.is_up_to_date());
    }

    #[tokio::test]
    async fn validation_errors_exit_one_without_writing() {
        let dir = project();
        write(
            dir.path(),
            ".rules/dup.md",
            "---\nid: style\npriority: 10\n---\nDuplicate.\n",
        );
        assert_eq!(validate(dir.path(), false).unwrap(), EXIT_FAILURE);

        let code = run(Command::Build {
            project: project_args(&dir),
            targets: vec![],
            force: false,
            context_files: vec![],
            json: true,
        })
        .await
        .unwrap();
        assert_eq!(code, EXIT_FAILURE);
        assert!(!dir.path().join("CLAUDE.md").exists());
    }

    #[tokio::test]
    async fn unknown_target_is_a_structural_error() {
        let dir = project();
        let err = run(Command::Status {
            project: project_args(&dir),
            targets: vec!["zed".into()],
            context_files: vec![],
            json: false,
        })
        .await
        .unwrap_err();
        assert_eq!(crate::exit_code_for(&err), EXIT_FAILURE);
    }

    #[tokio::test]
    async fn unlock_without_lock_succeeds() {
        let dir = project();
        let code = run(Command::Unlock {
            project: project_args(&dir),
        })
        .await
        .unwrap();
        assert_eq!(code, EXIT_SUCCESS);
    }

    #[test]
    fn estimate_checks_budget() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("notes.txt");
        // 30 chars of mixed text, 10 tokens
        std::fs::write(&file, "abcdefghijabcdefghijabcdefghij").unwrap();
        assert_eq!(estimate_file(&file, None, 5).unwrap(), EXIT_SUCCESS);
        assert_eq!(estimate_file(&file, Some(100), 5).unwrap(), EXIT_SUCCESS);
        assert_eq!(estimate_file(&file, Some(10), 5).unwrap(), EXIT_FAILURE);
    }

    #[test]
    fn estimate_missing_file_is_runtime_error() {
        let dir = TempDir::new().unwrap();
        let err = estimate_file(&dir.path().join("absent.md"), None, 5).unwrap_err();
        assert_eq!(crate::exit_code_for(&err), EXIT_RUNTIME);
    }
}
