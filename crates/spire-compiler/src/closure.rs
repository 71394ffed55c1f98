//! Shader closures: a concrete shader with every inherited component.

use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use spire_core::{DiagnosticKind, Diagnostics, Span};
use spire_registry::{ComponentSymbol, Pipeline, ShaderSymbol, SymbolTable};

use crate::ir::ShaderIr;

/// A shader flattened with the components of the modules it uses.
///
/// The closure owns its component symbols, so the resolver can pin worlds
/// and rewrite attributes without touching the symbol table. The resolved
/// IR is cached here and built at most once per compile context.
#[derive(Debug, Clone)]
pub struct ShaderClosure {
    pub name: String,
    pub pipeline: Arc<Pipeline>,
    /// Every component, in dependency order (used modules first).
    pub components: IndexMap<String, ComponentSymbol>,
    pub ir: Option<ShaderIr>,
    pub span: Span,
}

impl ShaderClosure {
    pub fn new(name: impl Into<String>, pipeline: Arc<Pipeline>) -> Self {
        Self {
            name: name.into(),
            pipeline,
            components: IndexMap::new(),
            ir: None,
            span: Span::default(),
        }
    }

    /// Add or replace a component. A replaced component keeps its position.
    pub fn add_component(&mut self, component: ComponentSymbol) {
        self.components.insert(component.name.clone(), component);
    }

    pub fn with_component(mut self, component: ComponentSymbol) -> Self {
        self.add_component(component);
        self
    }

    pub fn component(&self, name: &str) -> Option<&ComponentSymbol> {
        self.components.get(name)
    }

    /// Build the closure of `shader` from the symbol table.
    ///
    /// Used modules are flattened depth-first before the shader's own
    /// components; a component declared again further down replaces the
    /// inherited one. Reports and returns `None` when the pipeline is unknown.
    pub fn flatten(
        symbols: &SymbolTable,
        shader: &ShaderSymbol,
        diagnostics: &mut Diagnostics,
    ) -> Option<Self> {
        let Some(pipeline) = symbols.pipeline(&shader.pipeline) else {
            diagnostics.error_in(
                shader.name.as_str(),
                shader.span,
                DiagnosticKind::Other {
                    message: format!("unknown pipeline '{}'", shader.pipeline),
                },
            );
            return None;
        };

        let mut closure = ShaderClosure::new(shader.name.as_str(), Arc::clone(pipeline));
        closure.span = shader.span;

        let mut visited = FxHashSet::default();
        closure.collect(symbols, shader, &mut visited);
        Some(closure)
    }

    fn collect<'a>(
        &mut self,
        symbols: &'a SymbolTable,
        shader: &'a ShaderSymbol,
        visited: &mut FxHashSet<&'a str>,
    ) {
        if !visited.insert(shader.name.as_str()) {
            return;
        }
        for used in &shader.uses {
            if let Some(module) = symbols.shader(used) {
                self.collect(symbols, module, visited);
            }
        }
        for component in shader.components.values() {
            self.add_component(component.clone());
        }
    }
}
