//! Mutable state of a compile session.

use indexmap::IndexMap;
use spire_compiler::ShaderClosure;
use spire_registry::SymbolTable;

use crate::codegen::CompiledProgram;

/// State threaded through compile calls.
///
/// Closures, and the IR cached on them, are built once and reused by every
/// later call with the same context, so a later schedule has no effect on a
/// shader that already resolved. Call [`Self::invalidate_closures`] to
/// resolve again. The compiled program accumulates.
#[derive(Debug, Default)]
pub struct CompilationContext {
    pub symbols: SymbolTable,
    /// Closures of concrete shaders, keyed by shader name.
    pub closures: IndexMap<String, ShaderClosure>,
    pub program: Option<CompiledProgram>,
}

impl CompilationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn closure(&self, name: &str) -> Option<&ShaderClosure> {
        self.closures.get(name)
    }

    /// Drop cached closures and their IR, keeping symbols and program.
    pub fn invalidate_closures(&mut self) {
        self.closures.clear();
    }
}
