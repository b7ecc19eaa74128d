//! Argument definitions.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use rulesmith_tokens::DEFAULT_MARGIN_PERCENT;

/// Compile a rules directory into per-tool instruction files.
#[derive(Parser, Debug)]
#[command(name = "rulesmith", version, about = "Compile project rules into AI tool instruction files")]
pub struct Cli {
    /// More log output (repeat for debug/trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Project root selection shared by project-scoped commands.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ProjectArgs {
    /// Project root containing the rules directory.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub project: PathBuf,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate, then incrementally compile the selected targets.
    Build {
        #[command(flatten)]
        project: ProjectArgs,

        /// Target to build (repeatable; default: every enabled target).
        #[arg(long = "target", value_name = "NAME")]
        targets: Vec<String>,

        /// Recompile every target regardless of recorded state.
        #[arg(long)]
        force: bool,

        /// Project-relative file for glob-scoped selection (repeatable).
        #[arg(long = "context-file", value_name = "PATH")]
        context_files: Vec<String>,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Check the rule set for structural defects.
    Validate {
        #[command(flatten)]
        project: ProjectArgs,

        /// Print issues as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show pending changes and which targets a build would compile.
    Status {
        #[command(flatten)]
        project: ProjectArgs,

        /// Restrict to a target (repeatable).
        #[arg(long = "target", value_name = "NAME")]
        targets: Vec<String>,

        /// Context file a build would use (repeatable).
        #[arg(long = "context-file", value_name = "PATH")]
        context_files: Vec<String>,

        /// Print the status as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Estimate the token cost of a file.
    Estimate {
        /// File to estimate.
        file: PathBuf,

        /// Compare against this nominal budget.
        #[arg(long)]
        budget: Option<i64>,

        /// Margin in percent subtracted from the budget.
        #[arg(long, default_value_t = DEFAULT_MARGIN_PERCENT)]
        margin: u8,
    },

    /// Remove a leftover build lock.
    Unlock {
        #[command(flatten)]
        project: ProjectArgs,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("rulesmith").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn build_flags() {
        let cli = parse(&[
            "build", "--project", "/p", "--target", "claude", "--target", "cursor", "--force",
            "--context-file", "src/lib.rs",
        ]);
        let Command::Build { project, targets, force, context_files, json } = cli.command else {
            panic!("expected build");
        };
        assert_eq!(project.project, PathBuf::from("/p"));
        assert_eq!(targets, vec!["claude", "cursor"]);
        assert!(force);
        assert_eq!(context_files, vec!["src/lib.rs"]);
        assert!(!json);
    }

    #[test]
    fn project_defaults_to_cwd() {
        let cli = parse(&["validate"]);
        let Command::Validate { project, .. } = cli.command else {
            panic!("expected validate");
        };
        assert_eq!(project.project, PathBuf::from("."));
    }

    #[test]
    fn verbosity_is_global() {
        let cli = parse(&["status", "-vv"]);
        assert_eq!(cli.verbose, 2);
        let cli = parse(&["-q", "unlock"]);
        assert!(cli.quiet);
    }

    #[test]
    fn estimate_defaults() {
        let cli = parse(&["estimate", "CLAUDE.md"]);
        let Command::Estimate { file, budget, margin } = cli.command else {
            panic!("expected estimate");
        };
        assert_eq!(file, PathBuf::from("CLAUDE.md"));
        assert_eq!(budget, None);
        assert_eq!(margin, DEFAULT_MARGIN_PERCENT);
    }

    #[test]
    fn estimate_requires_file() {
        assert!(Cli::try_parse_from(["rulesmith", "estimate"]).is_err());
    }
}
