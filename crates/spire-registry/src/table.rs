//! The symbol table produced by semantic analysis.

use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashSet;

use crate::pipeline::Pipeline;
use crate::symbols::ShaderSymbol;

/// Pipelines and shaders of one compile call.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    pipelines: IndexMap<String, Arc<Pipeline>>,
    shaders: IndexMap<String, ShaderSymbol>,
    /// Top-level function names, used to select what to emit.
    functions: Vec<String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pipeline(&mut self, pipeline: Pipeline) -> Arc<Pipeline> {
        let pipeline = Arc::new(pipeline);
        self.pipelines
            .insert(pipeline.name().to_string(), Arc::clone(&pipeline));
        pipeline
    }

    pub fn add_shader(&mut self, shader: ShaderSymbol) {
        self.shaders.insert(shader.name.clone(), shader);
    }

    pub fn add_function(&mut self, name: impl Into<String>) {
        self.functions.push(name.into());
    }

    pub fn pipeline(&self, name: &str) -> Option<&Arc<Pipeline>> {
        self.pipelines.get(name)
    }

    pub fn shader(&self, name: &str) -> Option<&ShaderSymbol> {
        self.shaders.get(name)
    }

    pub fn shader_mut(&mut self, name: &str) -> Option<&mut ShaderSymbol> {
        self.shaders.get_mut(name)
    }

    /// Shaders in declaration order.
    pub fn shaders(&self) -> impl Iterator<Item = &ShaderSymbol> {
        self.shaders.values()
    }

    pub fn functions(&self) -> &[String] {
        &self.functions
    }

    /// Shaders ordered so every used module comes before its users.
    ///
    /// Declaration order is kept wherever `using` does not force otherwise.
    /// Unknown module names are skipped; a `using` cycle is broken at the
    /// point it is found.
    pub fn shader_dependence_order(&self) -> Vec<&ShaderSymbol> {
        let mut visited = FxHashSet::default();
        let mut order = Vec::with_capacity(self.shaders.len());

        for shader in self.shaders.values() {
            self.visit(shader, &mut visited, &mut order);
        }

        order
    }

    fn visit<'a>(
        &'a self,
        shader: &'a ShaderSymbol,
        visited: &mut FxHashSet<&'a str>,
        order: &mut Vec<&'a ShaderSymbol>,
    ) {
        if !visited.insert(shader.name.as_str()) {
            return;
        }
        for used in &shader.uses {
            if let Some(module) = self.shaders.get(used) {
                self.visit(module, visited, order);
            }
        }
        order.push(shader);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::World;

    fn names<'a>(shaders: &[&'a ShaderSymbol]) -> Vec<&'a str> {
        shaders.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn modules_come_before_users() {
        let mut table = SymbolTable::new();
        table.add_shader(ShaderSymbol::new("Lit", "Forward").using("Surface"));
        table.add_shader(ShaderSymbol::module("Surface", "Forward").using("Common"));
        table.add_shader(ShaderSymbol::module("Common", "Forward"));
        table.add_shader(ShaderSymbol::new("Unlit", "Forward"));

        assert_eq!(
            names(&table.shader_dependence_order()),
            vec!["Common", "Surface", "Lit", "Unlit"]
        );
    }

    #[test]
    fn using_cycles_terminate() {
        let mut table = SymbolTable::new();
        table.add_shader(ShaderSymbol::module("A", "P").using("B"));
        table.add_shader(ShaderSymbol::module("B", "P").using("A"));
        assert_eq!(names(&table.shader_dependence_order()), vec!["B", "A"]);
    }

    #[test]
    fn pipelines_are_shared() {
        let mut table = SymbolTable::new();
        let mut pipeline = Pipeline::new("Forward");
        pipeline.add_world(World::new("vs")).unwrap();
        let shared = table.add_pipeline(pipeline);
        assert!(Arc::ptr_eq(&shared, table.pipeline("Forward").unwrap()));
    }
}
