//! The build state machine.
//!
//! ```text
//! AcquireLock → LoadManifest → DetectChanges → Compile → WriteTransaction
//!             → PersistManifest → ReleaseLock
//! ```
//!
//! Validation errors and every failure before the write transaction leave
//! outputs and manifest untouched. The lock is released on every path out
//! of [`BuildOrchestrator::build`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rulesmith_core::paths::parent_dir;
use rulesmith_core::{LoadedRuleSet, ProjectTree, Strategy, load_rule_set};
use rulesmith_settings::{RulesmithSettings, TargetSettings};
use rulesmith_tokens::BudgetMargin;
use rulesmith_validate::{ValidationContext, ValidationReport, validate_rule_set};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::changes::{ChangeSet, detect_changes};
use crate::compiler::{CompileError, CompileInput, CompilerRegistry, OutputFile, checked_output_path};
use crate::errors::{BuildError, Result};
use crate::fs::{FileSystemOps, RealFileSystem};
use crate::graph::DependencyGraph;
use crate::lock::{FileLockStore, LockRecord, LockStore};
use crate::manifest::{Manifest, ManifestEntry, context_key};
use crate::plan::{BuildPlan, PlanInput, plan_build};
use crate::report::{BuildReport, Phase, TargetFailure};
use crate::store::{FileManifestStore, ManifestStore};
use crate::transaction::{WriteTransaction, cleanup_stale_temps};

/// One build invocation's parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildRequest {
    /// Targets to build. Empty means every enabled target.
    pub targets: Vec<String>,
    /// Rebuild every target regardless of recorded state.
    pub force: bool,
    /// Project-relative files for the glob strategy.
    pub context_files: Vec<String>,
}

/// Read-only view of pending work.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    /// When the manifest was last written.
    pub last_build: Option<DateTime<Utc>>,
    /// Current lock holder, if any.
    pub lock: Option<LockRecord>,
    /// Sources new since the last build.
    pub added: Vec<String>,
    /// Sources whose content changed.
    pub changed: Vec<String>,
    /// Sources that disappeared.
    pub deleted: Vec<String>,
    /// Sources touched without edits.
    pub mtime_only: Vec<String>,
    /// What a build would do now.
    pub plan: BuildPlan,
}

impl StatusReport {
    /// Whether a build would compile nothing.
    pub fn is_up_to_date(&self) -> bool {
        self.plan.is_noop()
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.last_build {
            Some(at) => writeln!(f, "last build: {at}")?,
            None => writeln!(f, "last build: never")?,
        }
        if let Some(lock) = &self.lock {
            writeln!(f, "locked by pid {} on {} since {}", lock.pid, lock.host, lock.acquired_at)?;
        }
        for (label, paths) in [
            ("added", &self.added),
            ("changed", &self.changed),
            ("deleted", &self.deleted),
            ("touched", &self.mtime_only),
        ] {
            for path in paths {
                writeln!(f, "  {label:<8} {path}")?;
            }
        }
        if self.is_up_to_date() {
            writeln!(f, "up to date")
        } else {
            let dirty: Vec<&str> = self.plan.dirty_targets().collect();
            writeln!(f, "would compile: {}", dirty.join(", "))
        }
    }
}

/// Compiled outputs of one target.
struct CompiledTarget {
    name: String,
    outputs: Vec<OutputFile>,
    /// Context files a glob-strategy target was compiled against.
    context: Option<Vec<String>>,
}

/// Runs builds for one project.
pub struct BuildOrchestrator {
    project_root: PathBuf,
    settings: RulesmithSettings,
    fs: Arc<dyn FileSystemOps>,
    manifests: Arc<dyn ManifestStore>,
    locks: Arc<dyn LockStore>,
    compilers: CompilerRegistry,
}

impl BuildOrchestrator {
    /// Orchestrator on the real filesystem with file-backed manifest and lock.
    pub fn new(project_root: impl Into<PathBuf>, settings: RulesmithSettings, compilers: CompilerRegistry) -> Self {
        let project_root = project_root.into();
        let fs: Arc<dyn FileSystemOps> = Arc::new(RealFileSystem);
        let state_dir = project_root.join(&settings.state_dir);
        let manifests = Arc::new(FileManifestStore::new(&state_dir, Arc::clone(&fs)));
        let locks = Arc::new(FileLockStore::new(&state_dir, Arc::clone(&fs)));
        Self::with_stores(project_root, settings, compilers, fs, manifests, locks)
    }

    /// Orchestrator with injected filesystem and stores.
    pub fn with_stores(
        project_root: impl Into<PathBuf>,
        settings: RulesmithSettings,
        compilers: CompilerRegistry,
        fs: Arc<dyn FileSystemOps>,
        manifests: Arc<dyn ManifestStore>,
        locks: Arc<dyn LockStore>,
    ) -> Self {
        Self {
            project_root: project_root.into(),
            settings,
            fs,
            manifests,
            locks,
            compilers,
        }
    }

    /// Project root.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Effective settings.
    pub fn settings(&self) -> &RulesmithSettings {
        &self.settings
    }

    /// Absolute state dir.
    pub fn state_dir(&self) -> PathBuf {
        self.project_root.join(&self.settings.state_dir)
    }

    fn stale_after(&self) -> Duration {
        Duration::from_secs(self.settings.lock_stale_seconds)
    }

    fn margin(&self) -> BudgetMargin {
        BudgetMargin::new(self.settings.budget_margin_percent)
    }

    /// Requested targets with their settings. Empty means all enabled.
    fn resolve_targets(&self, requested: &[String]) -> Result<Vec<(&str, &TargetSettings)>> {
        if requested.is_empty() {
            return Ok(self
                .settings
                .targets
                .iter()
                .filter(|(_, t)| t.enabled)
                .map(|(name, t)| (name.as_str(), t))
                .collect());
        }
        let mut out: Vec<(&str, &TargetSettings)> = Vec::with_capacity(requested.len());
        for name in requested {
            let (key, settings) = self
                .settings
                .targets
                .get_key_value(name)
                .ok_or_else(|| BuildError::UnknownTarget(name.clone()))?;
            if !out.iter().any(|(n, _)| *n == key.as_str()) {
                out.push((key.as_str(), settings));
            }
        }
        Ok(out)
    }

    /// Load the rule set and run the validator.
    pub fn validate(&self) -> Result<(LoadedRuleSet, ValidationReport)> {
        let set = load_rule_set(&self.project_root, &self.settings.rules_dir)?;
        let tree = ProjectTree::scan(&self.project_root, &self.settings.scan_excludes())?;
        let mut ctx = ValidationContext::new(&set.rules_dir, tree)
            .with_warning_ratio(self.settings.token_warning_ratio);
        for (name, target) in &self.settings.targets {
            if let (true, Some(budget)) = (target.enabled, target.token_budget) {
                ctx = ctx.with_budget(name.clone(), budget);
            }
        }
        let report = validate_rule_set(&set, &ctx);
        Ok((set, report))
    }

    /// Run one build.
    pub async fn build(&self, request: &BuildRequest) -> Result<BuildReport> {
        let targets = self.resolve_targets(&request.targets)?;

        info!(phase = %Phase::AcquireLock, "build started");
        let owner = LockRecord::current();
        let acquisition = self.locks.acquire(&owner, self.stale_after()).await?;

        let result = self.build_locked(request, &targets).await;

        info!(phase = %Phase::ReleaseLock, "releasing build lock");
        let released = self.locks.release(&owner).await;
        match (result, released) {
            (Ok(mut report), Ok(_)) => {
                report.reclaimed_lock = acquisition.reclaimed.is_some();
                info!(
                    compiled = report.compiled.len(),
                    written = report.written.len(),
                    failed = report.failed.len(),
                    "build finished"
                );
                Ok(report)
            }
            (Ok(_), Err(e)) => Err(e),
            (Err(e), released) => {
                if let Err(release_err) = released {
                    warn!(error = %release_err, "failed to release build lock");
                }
                warn!(error = %e, "build rolled back");
                Err(e)
            }
        }
    }

    async fn build_locked(
        &self,
        request: &BuildRequest,
        targets: &[(&str, &TargetSettings)],
    ) -> Result<BuildReport> {
        let (set, validation) = self.validate()?;
        if !validation.is_valid() {
            return Err(BuildError::Validation(Box::new(validation)));
        }
        let mut report = BuildReport {
            warnings: validation.warnings,
            ..Default::default()
        };

        info!(phase = %Phase::LoadManifest, "loading manifest");
        let previous = self.manifests.load().await?;

        info!(phase = %Phase::DetectChanges, sources = set.sources.len(), "detecting changes");
        let changes = detect_changes(self.fs.as_ref(), &set.sources, previous.as_ref()).await?;
        let invalidated = DependencyGraph::build(&set).invalidate(changes.roots());
        let missing_outputs = self.missing_outputs(previous.as_ref()).await?;
        let plan = plan_build(&PlanInput {
            set: &set,
            manifest: previous.as_ref(),
            changes: &changes,
            invalidated: &invalidated,
            targets,
            missing_outputs: &missing_outputs,
            force: request.force,
            context_files: &request.context_files,
        });
        if let Some(reason) = &plan.full_rebuild {
            info!(reason = %reason, "full rebuild");
        }
        report.full_rebuild = plan.full_rebuild.clone();
        report.added = changes.added.clone();
        report.changed = changes.changed.clone();
        report.deleted = changes.deleted.clone();
        report.mtime_only = changes.mtime_only.clone();
        report.invalidated = invalidated.iter().cloned().collect();

        info!(phase = %Phase::Compile, targets = plan.dirty_targets().count(), "compiling");
        let compiled = self.compile_targets(&set, &plan, targets, request, &mut report);

        info!(phase = %Phase::WriteTransaction, "writing outputs");
        let mut temp_dirs: BTreeSet<PathBuf> = BTreeSet::from([self.state_dir()]);
        let recorded = previous.as_ref().map(Manifest::all_outputs).unwrap_or_default();
        let produced = compiled.iter().flat_map(|t| t.outputs.iter().map(|o| o.path.as_str()));
        for path in recorded.iter().copied().chain(produced) {
            let _ = temp_dirs.insert(self.project_root.join(parent_dir(path)));
        }
        let cleaned = cleanup_stale_temps(self.fs.as_ref(), temp_dirs.iter().map(PathBuf::as_path)).await?;
        report.cleaned_temps = cleaned.iter().map(|p| self.display_path(p)).collect();

        let mut pending = Vec::new();
        for output in compiled.iter().flat_map(|t| &t.outputs) {
            let dest = self.project_root.join(&output.path);
            if self.same_bytes(&dest, output.content.as_bytes()).await? {
                debug!(path = %output.path, "output unchanged");
                report.unchanged.push(output.path.clone());
            } else {
                pending.push((dest, output));
            }
        }
        let mut tx = WriteTransaction::new(Arc::clone(&self.fs));
        for (dest, output) in &pending {
            tx.stage(dest, output.content.as_bytes()).await?;
        }
        let _ = tx.commit().await?;
        report.written = pending.iter().map(|(_, o)| o.path.clone()).collect();

        let next = next_manifest(previous.as_ref(), &changes, &compiled, !report.failed.is_empty());

        for stale in stale_outputs(previous.as_ref(), &next) {
            let path = self.project_root.join(&stale);
            match self.fs.remove_file(&path).await {
                Ok(()) => {
                    info!(path = %stale, "removed stale output");
                    report.removed.push(stale);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(BuildError::io(&path, e)),
            }
        }

        info!(phase = %Phase::PersistManifest, "persisting manifest");
        if previous.as_ref().is_some_and(|p| p.same_state(&next)) {
            debug!("manifest unchanged, not rewritten");
        } else {
            let mut next = next;
            next.last_build = Some(Utc::now());
            self.manifests.save(&next).await?;
            report.manifest_saved = true;
        }
        Ok(report)
    }

    /// Run the compiler of every dirty target. Failures are recorded and
    /// the remaining targets still compile.
    fn compile_targets(
        &self,
        set: &LoadedRuleSet,
        plan: &BuildPlan,
        targets: &[(&str, &TargetSettings)],
        request: &BuildRequest,
        report: &mut BuildReport,
    ) -> Vec<CompiledTarget> {
        let dirty: BTreeSet<&str> = plan.dirty_targets().collect();
        let mut claimed: BTreeMap<String, String> = BTreeMap::new();
        let mut compiled = Vec::new();

        for (name, settings) in targets {
            if !dirty.contains(name) {
                report.skipped.push((*name).to_owned());
                continue;
            }
            let input = CompileInput {
                target: name,
                settings,
                rules: &set.rules,
                context_documents: &set.context_documents,
                rules_dir: &set.rules_dir,
                margin: self.margin(),
                context_files: &request.context_files,
            };
            match self.compile_one(&input, &claimed) {
                Ok(outputs) => {
                    for output in &outputs {
                        let _ = claimed.insert(output.path.clone(), (*name).to_owned());
                    }
                    debug!(target = name, outputs = outputs.len(), "target compiled");
                    report.compiled.push((*name).to_owned());
                    compiled.push(CompiledTarget {
                        name: (*name).to_owned(),
                        outputs,
                        context: (settings.strategy == Strategy::Glob)
                            .then(|| context_key(&request.context_files)),
                    });
                }
                Err(e) => {
                    warn!(target = name, error = %e, "target failed to compile");
                    report.failed.push(TargetFailure {
                        target: (*name).to_owned(),
                        error: e.to_string(),
                    });
                }
            }
        }
        compiled
    }

    fn compile_one(
        &self,
        input: &CompileInput<'_>,
        claimed: &BTreeMap<String, String>,
    ) -> std::result::Result<Vec<OutputFile>, CompileError> {
        let compiler = self
            .compilers
            .get(input.target)
            .ok_or_else(|| CompileError::NoCompiler(input.target.to_owned()))?;
        let mut outputs = compiler.compile(input)?;
        let mut seen = BTreeSet::new();
        for output in &mut outputs {
            output.path = checked_output_path(input.target, &output.path)?;
            let clash = claimed.get(&output.path).map(String::as_str);
            if let Some(owner) = clash.or_else(|| (!seen.insert(output.path.clone())).then_some(input.target)) {
                return Err(CompileError::Render {
                    target: input.target.to_owned(),
                    message: format!("output {} is also produced by target {owner}", output.path),
                });
            }
            output.sources.sort();
            output.sources.dedup();
        }
        Ok(outputs)
    }

    /// Recorded outputs that are gone from disk.
    async fn missing_outputs(&self, manifest: Option<&Manifest>) -> Result<BTreeSet<String>> {
        let mut missing = BTreeSet::new();
        let Some(manifest) = manifest else {
            return Ok(missing);
        };
        for output in manifest.all_outputs() {
            let path = self.project_root.join(output);
            let stat = self.fs.stat(&path).await.map_err(|e| BuildError::io(&path, e))?;
            if stat.is_none() {
                debug!(path = output, "recorded output missing");
                let _ = missing.insert(output.to_owned());
            }
        }
        Ok(missing)
    }

    async fn same_bytes(&self, path: &Path, content: &[u8]) -> Result<bool> {
        match self.fs.stat(path).await.map_err(|e| BuildError::io(path, e))? {
            Some(stat) if stat.len == content.len() as u64 => {
                let existing = self.fs.read_file(path).await.map_err(|e| BuildError::io(path, e))?;
                Ok(existing == content)
            }
            _ => Ok(false),
        }
    }

    fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.project_root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }

    /// Pending work, without taking the lock or writing anything.
    pub async fn status(&self, request: &BuildRequest) -> Result<StatusReport> {
        let targets = self.resolve_targets(&request.targets)?;
        let set = load_rule_set(&self.project_root, &self.settings.rules_dir)?;
        let previous = self.manifests.load().await?;
        let changes = detect_changes(self.fs.as_ref(), &set.sources, previous.as_ref()).await?;
        let invalidated = DependencyGraph::build(&set).invalidate(changes.roots());
        let missing_outputs = self.missing_outputs(previous.as_ref()).await?;
        let plan = plan_build(&PlanInput {
            set: &set,
            manifest: previous.as_ref(),
            changes: &changes,
            invalidated: &invalidated,
            targets: &targets,
            missing_outputs: &missing_outputs,
            force: request.force,
            context_files: &request.context_files,
        });
        Ok(StatusReport {
            last_build: previous.as_ref().and_then(|m| m.last_build),
            lock: self.locks.holder().await?,
            added: changes.added,
            changed: changes.changed,
            deleted: changes.deleted,
            mtime_only: changes.mtime_only,
            plan,
        })
    }

    /// Remove the build lock regardless of holder. Returns the removed holder.
    pub async fn unlock(&self) -> Result<Option<LockRecord>> {
        let holder = self.locks.force_unlock().await?;
        match &holder {
            Some(record) => info!(pid = record.pid, host = %record.host, "unlocked"),
            None => info!("no build lock to remove"),
        }
        Ok(holder)
    }
}

/// The manifest describing the state after this build.
///
/// Targets that compiled get their new outputs (and glob targets their
/// context files); every other target keeps what it had. When any target failed, modified sources keep their old
/// entry (or get none) so the next build sees them as changed again.
fn next_manifest(
    previous: Option<&Manifest>,
    changes: &ChangeSet,
    compiled: &[CompiledTarget],
    any_failed: bool,
) -> Manifest {
    let mut next = Manifest::default();
    let compiled_names: BTreeSet<&str> = compiled.iter().map(|t| t.name.as_str()).collect();

    if let Some(previous) = previous {
        for (name, outputs) in &previous.targets {
            if !compiled_names.contains(name.as_str()) {
                let _ = next.targets.insert(name.clone(), outputs.clone());
            }
        }
        for (name, files) in &previous.contexts {
            if !compiled_names.contains(name.as_str()) {
                let _ = next.contexts.insert(name.clone(), files.clone());
            }
        }
    }
    let mut contributions: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();
    for target in compiled {
        let mut outputs: Vec<String> = target.outputs.iter().map(|o| o.path.clone()).collect();
        outputs.sort();
        let _ = next.targets.insert(target.name.clone(), outputs);
        if let Some(context) = &target.context {
            let _ = next.contexts.insert(target.name.clone(), context.clone());
        }
        for output in &target.outputs {
            for source in &output.sources {
                let _ = contributions
                    .entry(source.as_str())
                    .or_default()
                    .insert(output.path.clone());
            }
        }
    }

    let retained: BTreeSet<&str> = next
        .targets
        .iter()
        .filter(|(name, _)| !compiled_names.contains(name.as_str()))
        .flat_map(|(_, outputs)| outputs.iter().map(String::as_str))
        .collect();

    for (path, state) in &changes.current {
        let old = previous.and_then(|m| m.files.get(path));
        let mut outputs: BTreeSet<String> = contributions.remove(path.as_str()).unwrap_or_default();
        if let Some(old) = old {
            outputs.extend(old.outputs.iter().filter(|o| retained.contains(o.as_str())).cloned());
        }
        let outputs: Vec<String> = outputs.into_iter().collect();

        let entry = if any_failed && changes.is_modified(path) {
            match old {
                Some(old) => ManifestEntry {
                    outputs,
                    ..old.clone()
                },
                None => continue,
            }
        } else {
            ManifestEntry {
                hash: state.hash.clone(),
                mtime_ms: state.mtime_ms,
                outputs,
            }
        };
        let _ = next.files.insert(path.clone(), entry);
    }
    next
}

/// Outputs the previous build recorded that the next manifest no longer
/// mentions.
fn stale_outputs(previous: Option<&Manifest>, next: &Manifest) -> Vec<String> {
    let Some(previous) = previous else {
        return Vec::new();
    };
    let keep = next.all_outputs();
    previous
        .all_outputs()
        .into_iter()
        .filter(|o| !keep.contains(o))
        .map(str::to_owned)
        .collect()
}
