//! # rulesmith-build
//!
//! Incremental, transactional compilation of a rule set into target files.
//!
//! - [`fs::FileSystemOps`]: async filesystem seam
//! - [`manifest::Manifest`] and [`store::ManifestStore`]: source state kept between builds
//! - [`changes::detect_changes`]: mtime fast path, then content hash
//! - [`graph::DependencyGraph`]: invalidation cascade through references and shared sources
//! - [`plan::plan_build`]: which targets are dirty
//! - [`transaction::WriteTransaction`]: staged multi-file writes (all-or-nothing up to the rename phase)
//! - [`lock::LockStore`]: cooperative cross-process lock with stale reclaim
//! - [`orchestrator::BuildOrchestrator`]: the state machine tying it together
//!
//! Compilers for individual targets implement [`compiler::TargetCompiler`].

#![deny(unsafe_code)]

pub mod changes;
pub mod compiler;
pub mod errors;
pub mod fs;
pub mod graph;
pub mod hash;
pub mod lock;
pub mod manifest;
pub mod orchestrator;
pub mod plan;
pub mod report;
pub mod store;
pub mod transaction;

pub use changes::{Change, ChangeSet, SourceState, detect_changes};
pub use compiler::{CompileError, CompileInput, CompilerRegistry, OutputFile, TargetCompiler};
pub use errors::{BuildError, ErrorCategory, EXIT_FAILURE, EXIT_RUNTIME, EXIT_SUCCESS, Result};
pub use fs::{FileStat, FileSystemOps, RealFileSystem};
pub use lock::{FileLockStore, LockAcquisition, LockRecord, LockStore, MemoryLockStore};
pub use manifest::{MANIFEST_VERSION, Manifest, ManifestEntry, context_key};
pub use orchestrator::{BuildOrchestrator, BuildRequest, StatusReport};
pub use plan::{BuildPlan, Dirtiness, FullRebuild};
pub use report::{BuildReport, BuildState, Phase, TargetFailure};
pub use store::{FileManifestStore, ManifestStore, MemoryManifestStore};
pub use transaction::{WriteTransaction, cleanup_stale_temps, write_atomic};
