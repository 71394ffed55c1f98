//! Per-call compile options.

use std::fmt;

/// Output language of the code generation backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CodeGenTarget {
    #[default]
    Glsl,
    Hlsl,
    SpirV,
}

impl CodeGenTarget {
    pub const ALL: [CodeGenTarget; 3] = [
        CodeGenTarget::Glsl,
        CodeGenTarget::Hlsl,
        CodeGenTarget::SpirV,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CodeGenTarget::Glsl => "glsl",
            CodeGenTarget::Hlsl => "hlsl",
            CodeGenTarget::SpirV => "spirv",
        }
    }
}

impl fmt::Display for CodeGenTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a compile call produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompilerMode {
    /// Generate target source for every requested shader.
    #[default]
    ProduceShader,
    /// Export the choices still open in each shader, for tooling.
    GenerateChoice,
    /// Compile functions and structs only. Not handled by `compile`.
    ProduceLibrary,
}

impl CompilerMode {
    pub fn as_str(self) -> &'static str {
        match self {
            CompilerMode::ProduceShader => "produce-shader",
            CompilerMode::GenerateChoice => "generate-choice",
            CompilerMode::ProduceLibrary => "produce-library",
        }
    }
}

impl fmt::Display for CompilerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for one [`Compiler::compile`](crate::Compiler::compile) call.
///
/// ```
/// use spire::{CodeGenTarget, CompileOptions, CompilerMode};
///
/// let options = CompileOptions::new()
///     .target(CodeGenTarget::Hlsl)
///     .mode(CompilerMode::GenerateChoice)
///     .schedule("lighting = fs:phong;", "lit.choice")
///     .symbol("LitForward");
/// assert_eq!(options.symbol_to_compile.as_deref(), Some("LitForward"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOptions {
    pub target: CodeGenTarget,
    pub mode: CompilerMode,
    /// Schedule text; empty means no schedule.
    pub schedule_source: String,
    /// Name diagnostics use for the schedule.
    pub schedule_file_name: String,
    /// Only emit this shader. `None` emits every shader declared in the
    /// compiled units.
    pub symbol_to_compile: Option<String>,
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(mut self, target: CodeGenTarget) -> Self {
        self.target = target;
        self
    }

    pub fn mode(mut self, mode: CompilerMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn schedule(mut self, source: impl Into<String>, file_name: impl Into<String>) -> Self {
        self.schedule_source = source.into();
        self.schedule_file_name = file_name.into();
        self
    }

    pub fn symbol(mut self, name: impl Into<String>) -> Self {
        self.symbol_to_compile = Some(name.into());
        self
    }

    pub fn has_schedule(&self) -> bool {
        !self.schedule_source.trim().is_empty()
    }
}
