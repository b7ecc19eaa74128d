//! # rulesmith-core
//!
//! Foundation types shared by every rulesmith crate.
//!
//! - [`rule::Rule`]: one parsed unit of guidance
//! - [`frontmatter`]: the single validation entry point from raw markdown to [`rule::Rule`]
//! - [`loader`]: discovers rule documents, global context documents, and the config document
//! - [`tree::ProjectTree`]: snapshot of the project's file tree for glob and link checks
//! - [`strategy::Strategy`]: selection strategy names
//! - [`refs`] and [`markdown`]: pattern tables for cross-rule references and links
//! - [`logging`]: `tracing` subscriber setup

#![deny(unsafe_code)]

pub mod constants;
pub mod errors;
pub mod frontmatter;
pub mod globs;
pub mod loader;
pub mod logging;
pub mod markdown;
pub mod paths;
pub mod refs;
pub mod rule;
pub mod strategy;
pub mod tree;

pub use errors::{CoreError, ParseError, Result};
pub use frontmatter::parse_rule;
pub use globs::GlobMatcher;
pub use loader::{ContextDocument, LoadedRuleSet, SourceKind, TrackedSource, load_rule_set};
pub use rule::Rule;
pub use strategy::Strategy;
pub use tree::ProjectTree;
