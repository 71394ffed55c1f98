//! Intermediate code handed to backends.
//!
//! The [`CodeGenerator`] lowers structs, functions and resolved shaders into
//! a [`CompiledProgram`]. [`IlGenerator`] is the stock lowering; hosts with
//! their own IL implement the trait themselves.

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use spire_compiler::{DefinitionId, ShaderIr};
use spire_core::{CompileError, Diagnostics};
use spire_registry::{ComponentBody, SymbolTable};

use crate::program::{FunctionDecl, StructDecl};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledStruct {
    pub name: String,
    pub fields: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledFunction {
    pub name: String,
}

/// A value read from another world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledImport {
    pub component: String,
    pub world: String,
    /// Import operator of a direct pipeline edge, if there is one.
    pub operator: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledDefinition {
    pub component: String,
    pub alternate: Option<String>,
    pub data_type: String,
    /// The world must output this value.
    pub is_output: bool,
    pub imports: Vec<CompiledImport>,
    pub body: ComponentBody,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledWorld {
    pub name: String,
    /// Definitions in dependency order.
    pub definitions: Vec<CompiledDefinition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledShader {
    pub name: String,
    pub pipeline: String,
    /// Worlds with at least one definition, in pipeline order.
    pub worlds: Vec<CompiledWorld>,
}

impl CompiledShader {
    /// Lay out a resolved shader world by world.
    pub fn from_ir(ir: &ShaderIr) -> Self {
        let order = dependency_order(ir);
        let pipeline = &ir.pipeline;

        let mut worlds: IndexMap<&str, Vec<CompiledDefinition>> = pipeline
            .topological_order()
            .iter()
            .map(|w| (w.as_str(), Vec::new()))
            .collect();

        for id in order {
            let Some(definition) = ir.definition(id) else {
                continue;
            };
            let imports = definition
                .dependencies
                .iter()
                .filter_map(|dep| ir.definition(*dep))
                .filter(|dep| dep.world != definition.world)
                .map(|dep| CompiledImport {
                    component: dep.component.clone(),
                    world: dep.world.clone(),
                    operator: pipeline
                        .imports_between(&dep.world, &definition.world)
                        .first()
                        .map(|op| op.to_string()),
                })
                .collect();

            worlds
                .entry(definition.world.as_str())
                .or_default()
                .push(CompiledDefinition {
                    component: definition.component.clone(),
                    alternate: definition.alternate_name.clone(),
                    data_type: definition.data_type.clone(),
                    is_output: definition.is_entry_point,
                    imports,
                    body: definition.body.clone(),
                });
        }

        Self {
            name: ir.shader.clone(),
            pipeline: pipeline.name().to_string(),
            worlds: worlds
                .into_iter()
                .filter(|(_, definitions)| !definitions.is_empty())
                .map(|(name, definitions)| CompiledWorld {
                    name: name.to_string(),
                    definitions,
                })
                .collect(),
        }
    }

    pub fn world(&self, name: &str) -> Option<&CompiledWorld> {
        self.worlds.iter().find(|w| w.name == name)
    }
}

/// Post-order over dependencies, so every definition follows what it reads.
fn dependency_order(ir: &ShaderIr) -> Vec<DefinitionId> {
    fn visit(
        ir: &ShaderIr,
        id: DefinitionId,
        visited: &mut FxHashSet<DefinitionId>,
        order: &mut Vec<DefinitionId>,
    ) {
        if !visited.insert(id) {
            return;
        }
        if let Some(definition) = ir.definition(id) {
            for dep in &definition.dependencies {
                visit(ir, *dep, visited, order);
            }
        }
        order.push(id);
    }

    let mut visited = FxHashSet::default();
    let mut order = Vec::with_capacity(ir.len());
    for definition in ir.definitions() {
        visit(ir, definition.id, &mut visited, &mut order);
    }
    order
}

/// Everything lowered so far. Carried across calls through the context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledProgram {
    pub structs: Vec<CompiledStruct>,
    pub functions: Vec<CompiledFunction>,
    pub shaders: Vec<CompiledShader>,
}

impl CompiledProgram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a shader, replacing an earlier one of the same name.
    pub fn add_shader(&mut self, shader: CompiledShader) {
        match self.shaders.iter_mut().find(|s| s.name == shader.name) {
            Some(existing) => *existing = shader,
            None => self.shaders.push(shader),
        }
    }

    pub fn shader(&self, name: &str) -> Option<&CompiledShader> {
        self.shaders.iter().find(|s| s.name == name)
    }
}

/// Lowers declarations and resolved shaders into a [`CompiledProgram`].
pub trait CodeGenerator {
    fn process_struct(
        &self,
        decl: &StructDecl,
        program: &mut CompiledProgram,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), CompileError>;

    fn process_function(
        &self,
        decl: &FunctionDecl,
        symbols: &SymbolTable,
        program: &mut CompiledProgram,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), CompileError>;

    /// Insert the conversions needed where a definition reads a value
    /// produced in another world.
    fn insert_import_operators(
        &self,
        ir: &mut ShaderIr,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), CompileError>;

    fn process_shader(
        &self,
        ir: &ShaderIr,
        program: &mut CompiledProgram,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), CompileError>;
}

/// Stock lowering into [`CompiledShader`] layouts.
#[derive(Debug, Default, Clone, Copy)]
pub struct IlGenerator;

impl CodeGenerator for IlGenerator {
    fn process_struct(
        &self,
        decl: &StructDecl,
        program: &mut CompiledProgram,
        _diagnostics: &mut Diagnostics,
    ) -> Result<(), CompileError> {
        program.structs.retain(|s| s.name != decl.name);
        program.structs.push(CompiledStruct {
            name: decl.name.clone(),
            fields: decl.fields.clone(),
        });
        Ok(())
    }

    fn process_function(
        &self,
        decl: &FunctionDecl,
        _symbols: &SymbolTable,
        program: &mut CompiledProgram,
        _diagnostics: &mut Diagnostics,
    ) -> Result<(), CompileError> {
        if !program.functions.iter().any(|f| f.name == decl.name) {
            program.functions.push(CompiledFunction {
                name: decl.name.clone(),
            });
        }
        Ok(())
    }

    // Imports are recorded per definition by `CompiledShader::from_ir`.
    fn insert_import_operators(
        &self,
        ir: &mut ShaderIr,
        _diagnostics: &mut Diagnostics,
    ) -> Result<(), CompileError> {
        tracing::trace!(shader = %ir.shader, "import operators derived at lowering");
        Ok(())
    }

    fn process_shader(
        &self,
        ir: &ShaderIr,
        program: &mut CompiledProgram,
        _diagnostics: &mut Diagnostics,
    ) -> Result<(), CompileError> {
        program.add_shader(CompiledShader::from_ir(ir));
        Ok(())
    }
}
