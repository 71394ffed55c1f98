//! The compilation orchestrator.
//!
//! ## Stages
//!
//! 1. Merge the parsed units into one program
//! 2. Semantic analysis (frontend)
//! 3. Closure construction for concrete shaders not cached yet (frontend)
//! 4. Attribute resolution over all closures
//! 5. Backend selection for the requested target
//! 6. Schedule parsing, then variant resolution for closures without IR
//! 7. Mode dispatch: lower and emit source, or export choices
//!
//! Stages report into the result's diagnostics and the error count is
//! checked between them. A stage that has already reported stops the call
//! with [`CompileError::Aborted`], which [`Compiler::compile`] swallows.

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use spire_compiler::{AttributeResolutionPass, ChoiceCatalog, VariantPass};
use spire_core::{CompileError, DiagnosticKind, Diagnostics, Span};
use spire_registry::Builtins;
use spire_schedule::Schedule;

use crate::backend::{BackendRegistry, CodeGenBackend};
use crate::codegen::{CodeGenerator, CompiledProgram};
use crate::context::CompilationContext;
use crate::frontend::Frontend;
use crate::options::{CompileOptions, CompilerMode};
use crate::program::{CompileUnit, Program, merge_units};

/// Output of one compile call.
#[derive(Debug, Default)]
pub struct CompileResult {
    /// Generated source, keyed by shader name.
    pub sources: IndexMap<String, String>,
    /// Open choices, filled in `GenerateChoice` mode.
    pub choices: ChoiceCatalog,
    pub program: CompiledProgram,
    pub diagnostics: Diagnostics,
}

impl CompileResult {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }

    pub fn source(&self, shader: &str) -> Option<&str> {
        self.sources.get(shader).map(String::as_str)
    }
}

/// Compiles shader programs into target source or choice catalogs.
///
/// A compiler holds only its collaborators and can serve any number of
/// calls; all per-call state lives in the [`CompilationContext`].
pub struct Compiler {
    frontend: Box<dyn Frontend>,
    codegen: Box<dyn CodeGenerator>,
    backends: BackendRegistry,
}

impl Compiler {
    pub fn new(
        frontend: impl Frontend + 'static,
        codegen: impl CodeGenerator + 'static,
        backends: BackendRegistry,
    ) -> Self {
        Self {
            frontend: Box::new(frontend),
            codegen: Box::new(codegen),
            backends,
        }
    }

    pub fn backends(&self) -> &BackendRegistry {
        &self.backends
    }

    /// Run one compile call.
    ///
    /// Problems in the input end up in [`CompileResult::diagnostics`].
    /// `Err` is only returned for collaborator failures.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile(
        &self,
        builtins: &Builtins,
        ctx: &mut CompilationContext,
        units: &[CompileUnit],
        options: &CompileOptions,
    ) -> Result<CompileResult, CompileError> {
        let mut result = CompileResult::default();

        match self.run(builtins, ctx, units, options, &mut result) {
            Ok(()) => {}
            Err(CompileError::Aborted) => {
                tracing::debug!(errors = result.diagnostics.error_count(), "compile aborted");
            }
            Err(error) => return Err(error),
        }
        Ok(result)
    }

    fn run(
        &self,
        builtins: &Builtins,
        ctx: &mut CompilationContext,
        units: &[CompileUnit],
        options: &CompileOptions,
        result: &mut CompileResult,
    ) -> Result<(), CompileError> {
        let program = merge_units(units);
        tracing::debug!(
            units = units.len(),
            shaders = program.shaders.len(),
            mode = %options.mode,
            target = %options.target,
            "compiling"
        );

        self.frontend.analyze(
            &program,
            builtins,
            &mut ctx.symbols,
            &mut result.diagnostics,
        )?;
        check(&result.diagnostics)?;

        self.build_closures(ctx, &mut result.diagnostics)?;

        AttributeResolutionPass::new(&ctx.symbols, &mut ctx.closures).run();
        check(&result.diagnostics)?;

        let Some(backend) = self.backends.get(options.target) else {
            tracing::debug!(
                requested = %options.target,
                registered = ?self.backends.targets().collect::<Vec<_>>(),
                "no backend for target"
            );
            result.diagnostics.error(
                Span::default(),
                DiagnosticKind::UnsupportedTarget {
                    target: options.target.to_string(),
                },
            );
            return Err(CompileError::Aborted);
        };

        let schedule = if options.has_schedule() {
            spire_schedule::parse(
                &options.schedule_source,
                &options.schedule_file_name,
                &mut result.diagnostics,
            )
        } else {
            Schedule::new()
        };

        for closure in ctx.closures.values_mut() {
            if closure.ir.is_none() {
                let ir = VariantPass::new(closure, &schedule, &mut result.diagnostics).run();
                closure.ir = ir;
            }
        }

        match options.mode {
            CompilerMode::ProduceShader => {
                self.produce_shaders(backend, ctx, units, &program, options, result)?;
                ctx.program = Some(result.program.clone());
            }
            CompilerMode::GenerateChoice => {
                let symbol = options.symbol_to_compile.as_deref();
                result.choices = ChoiceCatalog::collect(ctx.closures.values(), symbol);
                tracing::debug!(choices = result.choices.len(), "choices exported");
            }
            mode => {
                result.diagnostics.error(
                    Span::default(),
                    DiagnosticKind::UnsupportedCompilerMode {
                        mode: mode.to_string(),
                    },
                );
                return Err(CompileError::Aborted);
            }
        }

        Ok(())
    }

    fn build_closures(
        &self,
        ctx: &mut CompilationContext,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), CompileError> {
        for shader in ctx.symbols.shader_dependence_order() {
            if shader.is_module || ctx.closures.contains_key(&shader.name) {
                continue;
            }
            if let Some(closure) = self.frontend.build_closure(&ctx.symbols, shader, diagnostics)? {
                tracing::trace!(
                    shader = %shader.name,
                    components = closure.components.len(),
                    "closure built"
                );
                ctx.closures.insert(shader.name.clone(), closure);
            }
        }
        Ok(())
    }

    fn produce_shaders(
        &self,
        backend: &dyn CodeGenBackend,
        ctx: &mut CompilationContext,
        units: &[CompileUnit],
        program: &Program,
        options: &CompileOptions,
        result: &mut CompileResult,
    ) -> Result<(), CompileError> {
        check(&result.diagnostics)?;

        if let Some(previous) = &ctx.program {
            result.program = previous.clone();
        }

        let diagnostics = &mut result.diagnostics;
        for decl in &program.structs {
            self.codegen.process_struct(decl, &mut result.program, diagnostics)?;
        }
        for decl in &program.functions {
            self.codegen
                .process_function(decl, &ctx.symbols, &mut result.program, diagnostics)?;
        }
        for closure in ctx.closures.values_mut() {
            if let Some(ir) = closure.ir.as_mut() {
                self.codegen.insert_import_operators(ir, diagnostics)?;
            }
        }
        check(diagnostics)?;

        for closure in ctx.closures.values() {
            if let Some(ir) = closure.ir.as_ref() {
                self.codegen.process_shader(ir, &mut result.program, diagnostics)?;
            }
        }
        check(diagnostics)?;

        let requested = SymbolFilter::new(units, options.symbol_to_compile.as_deref());
        for shader in &result.program.shaders {
            if !requested.matches(&shader.name) {
                continue;
            }
            let source = backend.generate_shader(&ctx.symbols, shader, diagnostics)?;
            tracing::debug!(shader = %shader.name, bytes = source.len(), "shader generated");
            result.sources.insert(shader.name.clone(), source);
        }

        Ok(())
    }
}

impl std::fmt::Debug for Compiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compiler")
            .field("backends", &self.backends)
            .finish_non_exhaustive()
    }
}

fn check(diagnostics: &Diagnostics) -> Result<(), CompileError> {
    if diagnostics.has_errors() {
        Err(CompileError::Aborted)
    } else {
        Ok(())
    }
}

/// Which compiled shaders get source generated.
///
/// An explicit symbol must match exactly. Otherwise a shader is emitted when
/// its name equals or starts with a concrete shader or function declared in
/// the units of this call.
#[derive(Debug)]
pub struct SymbolFilter<'a> {
    explicit: Option<&'a str>,
    declared: FxHashSet<&'a str>,
}

impl<'a> SymbolFilter<'a> {
    pub fn new(units: &'a [CompileUnit], explicit: Option<&'a str>) -> Self {
        let declared = units
            .iter()
            .flat_map(|unit| {
                let shaders = unit
                    .program
                    .shaders
                    .iter()
                    .filter(|s| !s.is_module)
                    .map(|s| s.name.as_str());
                let functions = unit.program.functions.iter().map(|f| f.name.as_str());
                shaders.chain(functions)
            })
            .collect();
        Self { explicit, declared }
    }

    pub fn matches(&self, name: &str) -> bool {
        match self.explicit {
            Some(symbol) => symbol == name,
            None => {
                self.declared.contains(name)
                    || self.declared.iter().any(|symbol| name.starts_with(symbol))
            }
        }
    }
}
