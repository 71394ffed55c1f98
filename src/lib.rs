//! Spire shader compiler
//!
//! Resolves abstract, multi-world Spire shaders into one concrete variant
//! per shader and hands it to a target backend, or exports the choices that
//! are still open so tooling can write a schedule.
//!
//! ## Example
//!
//! ```ignore
//! use spire::{
//!     BackendRegistry, CodeGenTarget, CompilationContext, CompileOptions, Compiler, IlGenerator,
//! };
//! use spire::registry::Builtins;
//!
//! let backends = BackendRegistry::new().with_backend(CodeGenTarget::Glsl, MyGlsl);
//! let compiler = Compiler::new(MyFrontend, IlGenerator, backends);
//! let builtins = Builtins::standard();
//! let mut ctx = CompilationContext::new();
//!
//! let options = CompileOptions::new().schedule("lighting = fs:phong;", "lit.choice");
//! let result = compiler.compile(&builtins, &mut ctx, &units, &options)?;
//! println!("{}", result.source("Lit").unwrap_or_default());
//! ```
//!
//! ## Modules
//!
//! - [`compiler`]: the orchestrator and its symbol filter
//! - [`options`]: targets, modes and per-call options
//! - [`context`]: state reused across calls; closures resolve once per
//!   context until [`CompilationContext::invalidate_closures`]
//! - [`program`]: parsed compile units
//! - [`frontend`], [`codegen`], [`backend`]: collaborator seams

pub mod backend;
pub mod codegen;
pub mod compiler;
pub mod context;
pub mod frontend;
pub mod options;
pub mod program;

pub use backend::{BackendRegistry, CodeGenBackend};
pub use codegen::{
    CodeGenerator, CompiledDefinition, CompiledFunction, CompiledImport, CompiledProgram,
    CompiledShader, CompiledStruct, CompiledWorld, IlGenerator,
};
pub use compiler::{CompileResult, Compiler, SymbolFilter};
pub use context::CompilationContext;
pub use frontend::Frontend;
pub use options::{CodeGenTarget, CompileOptions, CompilerMode};
pub use program::{CompileUnit, FunctionDecl, Program, ShaderDecl, StructDecl};

pub use spire_compiler as variant;
pub use spire_core::{CompileError, Diagnostic, DiagnosticKind, Diagnostics, Severity, Span};
pub use spire_registry as registry;
pub use spire_schedule as schedule;
