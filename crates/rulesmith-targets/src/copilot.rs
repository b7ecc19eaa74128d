//! `.github/copilot-instructions.md`: a compact, budgeted single file.

use rulesmith_build::{CompileError, CompileInput, OutputFile, TargetCompiler};

use crate::render::single_file;

/// Default output path.
pub const COPILOT_OUTPUT: &str = ".github/copilot-instructions.md";

/// Compiler for the `copilot` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct CopilotCompiler;

impl TargetCompiler for CopilotCompiler {
    fn name(&self) -> &str {
        "copilot"
    }

    fn compile(&self, input: &CompileInput<'_>) -> Result<Vec<OutputFile>, CompileError> {
        Ok(vec![single_file(input, COPILOT_OUTPUT, "Copilot Instructions")])
    }
}
