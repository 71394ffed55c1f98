//! Shared fixtures for the compiler integration tests.
//!
//! The frontend and backend are stand-ins: the frontend hands out a
//! prebuilt symbol table, and the backend prints the lowered layout so tests
//! can assert on which definitions survived.

#![allow(dead_code)]

use std::cell::Cell;
use std::fmt::Write;
use std::rc::Rc;

use spire::registry::{
    Builtins, ComponentSymbol, Expr, ImplementationSymbol, Pipeline, ShaderSymbol, SymbolTable,
    World,
};
use spire::{
    BackendRegistry, CodeGenBackend, CodeGenTarget, CompileError, CompileUnit, CompiledShader,
    Compiler, DiagnosticKind, Diagnostics, Frontend, IlGenerator, Program, ShaderDecl, Span,
};

/// Install a test subscriber once; `RUST_LOG` selects the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Frontend that installs a fixed symbol table.
#[derive(Clone, Default)]
pub struct MockFrontend {
    pub symbols: SymbolTable,
    /// Report this message as a semantic error.
    pub error: Option<String>,
    pub analyze_calls: Rc<Cell<usize>>,
}

impl MockFrontend {
    pub fn new(symbols: SymbolTable) -> Self {
        Self {
            symbols,
            ..Self::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            ..Self::default()
        }
    }
}

impl Frontend for MockFrontend {
    fn analyze(
        &self,
        _program: &Program,
        builtins: &Builtins,
        symbols: &mut SymbolTable,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), CompileError> {
        self.analyze_calls.set(self.analyze_calls.get() + 1);
        assert!(builtins.contains("vec4"));

        if let Some(message) = &self.error {
            diagnostics.error_in(
                "mock.spire",
                Span::new(1, 1, 1),
                DiagnosticKind::Other {
                    message: message.clone(),
                },
            );
            return Ok(());
        }
        *symbols = self.symbols.clone();
        Ok(())
    }
}

/// Backend that prints each world's definitions.
pub struct LayoutBackend(pub CodeGenTarget);

impl CodeGenBackend for LayoutBackend {
    fn generate_shader(
        &self,
        _symbols: &SymbolTable,
        shader: &CompiledShader,
        _diagnostics: &mut Diagnostics,
    ) -> Result<String, CompileError> {
        let mut out = String::new();
        let _ = writeln!(out, "// {} {}", self.0, shader.name);
        for world in &shader.worlds {
            let _ = writeln!(out, "world {}:", world.name);
            for definition in &world.definitions {
                let _ = write!(out, "  {}", definition.component);
                if let Some(alternate) = &definition.alternate {
                    let _ = write!(out, ":{alternate}");
                }
                if definition.is_output {
                    out.push_str(" out");
                }
                out.push('\n');
            }
        }
        Ok(out)
    }
}

/// Backend whose every call fails outside the diagnostic taxonomy.
pub struct BrokenBackend;

impl CodeGenBackend for BrokenBackend {
    fn generate_shader(
        &self,
        _symbols: &SymbolTable,
        _shader: &CompiledShader,
        _diagnostics: &mut Diagnostics,
    ) -> Result<String, CompileError> {
        Err(CompileError::collaborator(
            "backend",
            std::io::Error::other("device lost"),
        ))
    }
}

pub fn compiler(symbols: SymbolTable) -> Compiler {
    Compiler::new(
        MockFrontend::new(symbols),
        IlGenerator,
        BackendRegistry::new()
            .with_backend(CodeGenTarget::Glsl, LayoutBackend(CodeGenTarget::Glsl))
            .with_backend(CodeGenTarget::Hlsl, LayoutBackend(CodeGenTarget::Hlsl)),
    )
}

/// One unit declaring the given concrete shaders.
pub fn units(shaders: &[&str]) -> Vec<CompileUnit> {
    let program = shaders
        .iter()
        .fold(Program::new().with_shader(ShaderDecl::module("Surface")), |program, name| {
            program.with_shader(ShaderDecl::new(*name))
        });
    vec![CompileUnit::new("lit.spire", program)]
}

/// vs -> fs, with fs abstract.
pub fn forward_pipeline() -> Pipeline {
    let mut pipeline = Pipeline::new("Forward");
    pipeline.add_world(World::new("vs")).unwrap();
    pipeline.add_world(World::abstract_world("fs")).unwrap();
    pipeline.add_import("vertexOutput", "vs", "fs").unwrap();
    pipeline
}

fn value(v: &str) -> ImplementationSymbol {
    ImplementationSymbol::new(Expr::literal(v))
}

/// A named fs lighting alternate with its quality attribute.
fn lighting(v: &str, alternate: &str, quality: &str) -> ImplementationSymbol {
    value(v)
        .in_world("fs")
        .alternate(alternate)
        .with_attribute("quality", quality)
}

/// Surface module plus the concrete shaders named in `shaders`.
///
/// Every concrete shader outputs `color = albedo * light` in fs. `albedo`
/// can run in vs or fs; `light` has a phong and a blinn variant in fs.
pub fn lit_symbols(shaders: &[&str]) -> SymbolTable {
    let mut table = SymbolTable::new();
    table.add_pipeline(forward_pipeline());

    table.add_shader(
        ShaderSymbol::module("Surface", "Forward").component(
            ComponentSymbol::new("albedo", "vec4")
                .implementation(value("1").in_world("vs"))
                .implementation(value("0.5").in_world("fs").alternate("textured"))
                .choice("albedo"),
        ),
    );

    for name in shaders {
        table.add_shader(
            ShaderSymbol::new(*name, "Forward")
                .using("Surface")
                .component(
                    ComponentSymbol::new("color", "vec4").implementation(
                        ImplementationSymbol::new(Expr::binary(
                            spire::registry::BinaryOp::Mul,
                            Expr::name("albedo"),
                            Expr::name("light"),
                        ))
                        .exported_in("fs")
                        .with_attribute("Quality", "%light.quality"),
                    ),
                )
                .component(
                    ComponentSymbol::new("light", "vec4")
                        .implementation(lighting("1", "phong", "high"))
                        .implementation(lighting("2", "blinn", "low"))
                        .choice("lightingModel"),
                )
                .component(
                    ComponentSymbol::new("time", "float")
                        .implementation(value("0").in_world("vs"))
                        .param()
                        .choice("time"),
                ),
        );
    }

    table
}

/// A shader whose two components read each other in fs.
pub fn circular_symbols() -> SymbolTable {
    let mut table = SymbolTable::new();
    table.add_pipeline(forward_pipeline());
    table.add_shader(
        ShaderSymbol::new("Loop", "Forward")
            .component(
                ComponentSymbol::new("a", "float")
                    .implementation(ImplementationSymbol::new(Expr::name("b")).exported_in("fs")),
            )
            .component(
                ComponentSymbol::new("b", "float")
                    .implementation(ImplementationSymbol::new(Expr::name("a")).in_world("fs")),
            ),
    );
    table
}
