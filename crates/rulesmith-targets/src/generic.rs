//! Single-file compiler for configured targets without a built-in layout.

use rulesmith_build::{CompileError, CompileInput, OutputFile, TargetCompiler};

use crate::render::single_file;

/// Renders the standard single-file layout to the target's `output` path.
#[derive(Clone, Debug)]
pub struct SingleFileCompiler {
    name: String,
    output: String,
}

impl SingleFileCompiler {
    /// Compiler for target `name` writing to `output`.
    pub fn new(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            output: output.into(),
        }
    }
}

impl TargetCompiler for SingleFileCompiler {
    fn name(&self) -> &str {
        &self.name
    }

    fn compile(&self, input: &CompileInput<'_>) -> Result<Vec<OutputFile>, CompileError> {
        let title = format!("{} Rules", self.name);
        Ok(vec![single_file(input, &self.output, &title)])
    }
}
