//! Registry construction from settings.

use std::sync::Arc;

use rulesmith_build::{CompilerRegistry, TargetCompiler};
use rulesmith_settings::RulesmithSettings;
use tracing::warn;

use crate::agents::AgentsCompiler;
use crate::claude::ClaudeCompiler;
use crate::copilot::CopilotCompiler;
use crate::cursor::CursorCompiler;
use crate::generic::SingleFileCompiler;

/// The four built-in compilers.
pub fn builtin_compilers() -> Vec<Arc<dyn TargetCompiler>> {
    vec![
        Arc::new(ClaudeCompiler),
        Arc::new(AgentsCompiler),
        Arc::new(CopilotCompiler),
        Arc::new(CursorCompiler),
    ]
}

/// Built-ins plus a [`SingleFileCompiler`] for every other configured target
/// that names an `output`.
pub fn registry_for(settings: &RulesmithSettings) -> CompilerRegistry {
    let mut registry = CompilerRegistry::new();
    for compiler in builtin_compilers() {
        registry.register(compiler);
    }
    for (name, target) in &settings.targets {
        if registry.contains(name) {
            continue;
        }
        match &target.output {
            Some(output) => registry.register(Arc::new(SingleFileCompiler::new(name.clone(), output.clone()))),
            None => warn!(target = %name, "target has no built-in compiler and no output path"),
        }
    }
    registry
}
