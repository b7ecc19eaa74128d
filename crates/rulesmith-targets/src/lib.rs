//! # rulesmith-targets
//!
//! Built-in [`TargetCompiler`](rulesmith_build::TargetCompiler)s.
//!
//! | Target | Output | Layout |
//! |---|---|---|
//! | `claude` | `CLAUDE.md` | single file, priority order |
//! | `agents` | `AGENTS.md` | single file, grouped by domain |
//! | `copilot` | `.github/copilot-instructions.md` | single file |
//! | `cursor` | `.cursor/rules/<id>.mdc` | one file per rule |
//!
//! Any other target with an `output` path uses [`SingleFileCompiler`].
//! Every compiler prepends the global context documents and selects rules
//! through `rulesmith-select` with the target's own strategy and budget.

#![deny(unsafe_code)]

pub mod agents;
pub mod claude;
pub mod copilot;
pub mod cursor;
pub mod generic;
pub mod registry;
pub mod render;

pub use agents::AgentsCompiler;
pub use claude::ClaudeCompiler;
pub use copilot::CopilotCompiler;
pub use cursor::CursorCompiler;
pub use generic::SingleFileCompiler;
pub use registry::{builtin_compilers, registry_for};
