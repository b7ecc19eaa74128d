//! Which targets a build must recompile.
//!
//! Planning is pure: the orchestrator gathers the inputs (change set,
//! invalidation closure, missing outputs) and this module only decides.

use std::collections::BTreeSet;
use std::fmt;

use rulesmith_core::paths::is_within;
use rulesmith_core::{LoadedRuleSet, Strategy};
use rulesmith_settings::TargetSettings;
use serde::Serialize;

use crate::changes::ChangeSet;
use crate::graph::is_shared_source;
use crate::manifest::{Manifest, context_key};

/// Why every target is rebuilt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "reason", content = "path")]
pub enum FullRebuild {
    /// Requested by the caller.
    Forced,
    /// No usable manifest.
    NoManifest,
    /// The config or a global context document changed.
    SharedSource(String),
}

impl fmt::Display for FullRebuild {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forced => f.write_str("forced"),
            Self::NoManifest => f.write_str("no manifest"),
            Self::SharedSource(path) => write!(f, "{path} changed"),
        }
    }
}

/// Why a target is (or is not) recompiled.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "reason", content = "path")]
pub enum Dirtiness {
    /// Part of a full rebuild.
    FullRebuild,
    /// Never compiled before.
    NewTarget,
    /// A recorded output is missing on disk.
    OutputMissing(String),
    /// An invalidated source feeds this target.
    Invalidated(String),
    /// A glob target is requested with different context files than it
    /// was last compiled against.
    ContextChanged,
    /// Nothing relevant changed.
    Clean,
}

impl Dirtiness {
    /// Whether the target must be compiled.
    pub fn is_dirty(&self) -> bool {
        !matches!(self, Self::Clean)
    }
}

/// Decision for one target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TargetPlan {
    /// Target name.
    pub name: String,
    /// Verdict.
    pub dirtiness: Dirtiness,
}

/// Decisions for every requested target.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildPlan {
    /// Set when every target is rebuilt.
    pub full_rebuild: Option<FullRebuild>,
    /// One entry per requested target, in request order.
    pub targets: Vec<TargetPlan>,
}

impl BuildPlan {
    /// Names of the targets to compile.
    pub fn dirty_targets(&self) -> impl Iterator<Item = &str> {
        self.targets
            .iter()
            .filter(|t| t.dirtiness.is_dirty())
            .map(|t| t.name.as_str())
    }

    /// Whether nothing needs compiling.
    pub fn is_noop(&self) -> bool {
        self.dirty_targets().next().is_none()
    }
}

/// Everything planning looks at.
pub struct PlanInput<'a> {
    /// Freshly loaded rule set.
    pub set: &'a LoadedRuleSet,
    /// Previous manifest, if usable.
    pub manifest: Option<&'a Manifest>,
    /// Source changes since that manifest.
    pub changes: &'a ChangeSet,
    /// Change roots expanded through the dependency graph.
    pub invalidated: &'a BTreeSet<String>,
    /// Requested targets and their settings.
    pub targets: &'a [(&'a str, &'a TargetSettings)],
    /// Recorded outputs that no longer exist on disk.
    pub missing_outputs: &'a BTreeSet<String>,
    /// Rebuild everything regardless of state.
    pub force: bool,
    /// Context files of this request, for glob-strategy targets.
    pub context_files: &'a [String],
}

/// Decide whether a full rebuild is required at all.
pub fn full_rebuild_reason(input: &PlanInput<'_>) -> Option<FullRebuild> {
    if input.force {
        return Some(FullRebuild::Forced);
    }
    if input.manifest.is_none() {
        return Some(FullRebuild::NoManifest);
    }
    input
        .changes
        .roots()
        .find(|path| is_shared_source(path, &input.set.rules_dir))
        .map(|path| FullRebuild::SharedSource(path.to_owned()))
}

/// Plan every requested target.
pub fn plan_build(input: &PlanInput<'_>) -> BuildPlan {
    let full_rebuild = full_rebuild_reason(input);
    let targets = input
        .targets
        .iter()
        .map(|(name, settings)| TargetPlan {
            name: (*name).to_owned(),
            dirtiness: if full_rebuild.is_some() {
                Dirtiness::FullRebuild
            } else {
                target_dirtiness(input, name, settings)
            },
        })
        .collect();
    BuildPlan {
        full_rebuild,
        targets,
    }
}

fn target_dirtiness(input: &PlanInput<'_>, name: &str, settings: &TargetSettings) -> Dirtiness {
    let Some(manifest) = input.manifest else {
        return Dirtiness::FullRebuild;
    };
    let Some(outputs) = manifest.targets.get(name) else {
        return Dirtiness::NewTarget;
    };
    if let Some(missing) = outputs.iter().find(|o| input.missing_outputs.contains(*o)) {
        return Dirtiness::OutputMissing(missing.clone());
    }
    if settings.strategy == Strategy::Glob
        && manifest.target_context(name) != Some(context_key(input.context_files).as_slice())
    {
        return Dirtiness::ContextChanged;
    }

    let hit = input.invalidated.iter().find(|path| match settings.strategy {
        Strategy::Directory => feeds_directory_target(input, manifest, outputs, settings, path),
        Strategy::Glob | Strategy::Tag | Strategy::Priority | Strategy::All => true,
    });
    match hit {
        Some(path) => Dirtiness::Invalidated(path.clone()),
        None => Dirtiness::Clean,
    }
}

/// A directory target only cares about sources it can select or did select.
fn feeds_directory_target(
    input: &PlanInput<'_>,
    manifest: &Manifest,
    target_outputs: &[String],
    settings: &TargetSettings,
    path: &str,
) -> bool {
    let contributed = manifest
        .files
        .get(path)
        .is_some_and(|entry| entry.outputs.iter().any(|o| target_outputs.contains(o)));
    if contributed {
        return true;
    }
    input.set.rule_at(path).is_some_and(|rule| {
        rule.always_apply
            || settings.always_include.contains(&rule.id)
            || settings
                .include_dirs
                .iter()
                .any(|dir| is_within(rule.source_dir(), dir))
    })
}
