//! Semantic analysis seam.

use spire_compiler::ShaderClosure;
use spire_core::{CompileError, Diagnostics};
use spire_registry::{Builtins, ShaderSymbol, SymbolTable};

use crate::program::Program;

/// Builds the symbol table and shader closures from a merged program.
pub trait Frontend {
    /// Type check `program` and register its symbols.
    ///
    /// Problems in the source go to `diagnostics`; `Err` is for failures
    /// the frontend cannot report as a diagnostic.
    fn analyze(
        &self,
        program: &Program,
        builtins: &Builtins,
        symbols: &mut SymbolTable,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), CompileError>;

    /// Flatten a concrete shader with the components it inherits.
    fn build_closure(
        &self,
        symbols: &SymbolTable,
        shader: &ShaderSymbol,
        diagnostics: &mut Diagnostics,
    ) -> Result<Option<ShaderClosure>, CompileError> {
        Ok(ShaderClosure::flatten(symbols, shader, diagnostics))
    }
}
