//! The resolved, per-world representation of one shader variant.
//!
//! A [`ShaderIr`] owns every [`Definition`] materialized for a shader and an
//! index from `(component, world)` to the single definition that survived
//! the tie-break. Definitions form a dependency graph keyed by
//! [`DefinitionId`]; the resolver alternates between resolving references
//! ([`ShaderIr::resolve_component_references`]) and removing definitions no
//! entry point needs ([`ShaderIr::eliminate_dead_code`]), and checks the
//! graph with [`ShaderIr::find_cycle`] after every round.

use std::fmt;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHashMap;
use spire_core::Span;
use spire_registry::{Attributes, ComponentBody, Pipeline};

/// Stable identity of a definition within one [`ShaderIr`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefinitionId(u32);

impl DefinitionId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DefinitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One `(component, world)` materialization.
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub id: DefinitionId,
    pub component: String,
    pub world: String,
    pub alternate_name: Option<String>,
    pub data_type: String,
    pub attributes: Attributes,
    pub body: ComponentBody,
    /// The backend must produce this value.
    pub is_entry_point: bool,
    /// Definitions this one reads, in first-use order.
    pub dependencies: IndexSet<DefinitionId>,
    pub span: Span,
}

/// A component name in a definition body with no definition to bind to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    pub definition: DefinitionId,
    pub reference: String,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ShaderIr {
    pub shader: String,
    pub pipeline: Arc<Pipeline>,
    definitions: IndexMap<DefinitionId, Definition>,
    /// component -> world -> surviving definition.
    definitions_by_component: IndexMap<String, IndexMap<String, DefinitionId>>,
    next_id: u32,
}

impl ShaderIr {
    pub fn new(shader: impl Into<String>, pipeline: Arc<Pipeline>) -> Self {
        Self {
            shader: shader.into(),
            pipeline,
            definitions: IndexMap::new(),
            definitions_by_component: IndexMap::new(),
            next_id: 0,
        }
    }

    /// Store a definition and assign its id. It does not survive any slot
    /// until [`Self::install`] is called for it.
    pub fn add_definition(&mut self, mut definition: Definition) -> DefinitionId {
        let id = DefinitionId(self.next_id);
        self.next_id += 1;
        definition.id = id;
        self.definitions.insert(id, definition);
        id
    }

    /// Make `id` the survivor of its `(component, world)` slot.
    pub fn install(&mut self, id: DefinitionId) {
        if let Some(definition) = self.definitions.get(&id) {
            self.definitions_by_component
                .entry(definition.component.clone())
                .or_default()
                .insert(definition.world.clone(), id);
        }
    }

    pub fn definition(&self, id: DefinitionId) -> Option<&Definition> {
        self.definitions.get(&id)
    }

    pub fn definition_mut(&mut self, id: DefinitionId) -> Option<&mut Definition> {
        self.definitions.get_mut(&id)
    }

    /// All remaining definitions, in materialization order.
    pub fn definitions(&self) -> impl Iterator<Item = &Definition> {
        self.definitions.values()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn definitions_by_component(&self) -> &IndexMap<String, IndexMap<String, DefinitionId>> {
        &self.definitions_by_component
    }

    /// Surviving definition of `component` in `world`.
    pub fn survivor(&self, component: &str, world: &str) -> Option<&Definition> {
        self.definitions_by_component
            .get(component)
            .and_then(|worlds| worlds.get(world))
            .and_then(|id| self.definitions.get(id))
    }

    pub fn entry_points(&self) -> impl Iterator<Item = &Definition> {
        self.definitions.values().filter(|d| d.is_entry_point)
    }

    /// Surviving definitions of one world, in materialization order.
    pub fn definitions_in_world<'a>(
        &'a self,
        world: &'a str,
    ) -> impl Iterator<Item = &'a Definition> {
        self.definitions
            .values()
            .filter(move |d| d.world == world && self.is_survivor(d))
    }

    fn is_survivor(&self, definition: &Definition) -> bool {
        self.definitions_by_component
            .get(&definition.component)
            .and_then(|worlds| worlds.get(&definition.world))
            == Some(&definition.id)
    }

    /// The survivor a reference from `world` to `component` binds to.
    ///
    /// Prefers the same world. Otherwise takes the nearest upstream world:
    /// the one latest in topological order among the worlds that can reach
    /// `world` through the pipeline.
    pub fn lookup_reference(&self, component: &str, world: &str) -> Option<DefinitionId> {
        let worlds = self.definitions_by_component.get(component)?;
        if let Some(&id) = worlds.get(world) {
            return Some(id);
        }

        worlds
            .iter()
            .filter(|(source, _)| self.pipeline.is_world_reachable(source, world))
            .filter_map(|(source, &id)| self.pipeline.topology_rank(source).map(|rank| (rank, id)))
            .max_by_key(|(rank, _)| *rank)
            .map(|(_, id)| id)
    }

    /// Rebuild the dependency set of every surviving definition.
    ///
    /// `is_component` tells which free names of a body are components.
    /// Returns whether any dependency set changed, plus every reference
    /// that could not be bound.
    pub fn resolve_component_references(
        &mut self,
        is_component: impl Fn(&str) -> bool,
    ) -> (bool, Vec<UnresolvedReference>) {
        let mut updates = Vec::new();
        let mut unresolved = Vec::new();

        for definition in self.definitions.values() {
            if !self.is_survivor(definition) {
                continue;
            }

            let mut dependencies = IndexSet::new();
            for (name, span) in definition.body.free_names() {
                if !is_component(name) {
                    continue;
                }
                match self.lookup_reference(name, &definition.world) {
                    Some(target) => {
                        dependencies.insert(target);
                    }
                    None => unresolved.push(UnresolvedReference {
                        definition: definition.id,
                        reference: name.to_string(),
                        span,
                    }),
                }
            }

            if dependencies != definition.dependencies {
                updates.push((definition.id, dependencies));
            }
        }

        let changed = !updates.is_empty();
        for (id, dependencies) in updates {
            if let Some(definition) = self.definitions.get_mut(&id) {
                definition.dependencies = dependencies;
            }
        }
        (changed, unresolved)
    }

    /// Remove every definition not reachable from a surviving entry point.
    ///
    /// Returns whether anything was removed.
    pub fn eliminate_dead_code(&mut self) -> bool {
        let mut live: IndexSet<DefinitionId> = self
            .definitions
            .values()
            .filter(|d| d.is_entry_point && self.is_survivor(d))
            .map(|d| d.id)
            .collect();

        let mut cursor = 0;
        while let Some(&id) = live.get_index(cursor) {
            cursor += 1;
            if let Some(definition) = self.definitions.get(&id) {
                live.extend(definition.dependencies.iter().copied());
            }
        }

        let before = self.definitions.len();
        self.remove_definitions(|d| !live.contains(&d.id));
        self.definitions.len() != before
    }

    /// Remove definitions matching `predicate`, and their index entries.
    pub fn remove_definitions(&mut self, predicate: impl Fn(&Definition) -> bool) {
        self.definitions.retain(|_, d| !predicate(d));

        let definitions = &self.definitions;
        for worlds in self.definitions_by_component.values_mut() {
            worlds.retain(|_, id| definitions.contains_key(id));
        }
        self.definitions_by_component
            .retain(|_, worlds| !worlds.is_empty());
    }

    /// Find a dependency cycle among the remaining definitions.
    ///
    /// Depth-first search with visiting/visited marks. Returns the
    /// definition a back edge points to, which lies on the cycle.
    pub fn find_cycle(&self) -> Option<DefinitionId> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Visited,
        }

        let mut marks: FxHashMap<DefinitionId, Mark> = FxHashMap::default();

        for &root in self.definitions.keys() {
            if marks.contains_key(&root) {
                continue;
            }

            // (definition, index of the next dependency to explore)
            let mut stack = vec![(root, 0usize)];
            marks.insert(root, Mark::Visiting);

            while let Some((id, next)) = stack.last_mut() {
                let dependency = self
                    .definitions
                    .get(id)
                    .and_then(|d| d.dependencies.get_index(*next))
                    .copied();

                match dependency {
                    Some(dependency) => {
                        *next += 1;
                        if !self.definitions.contains_key(&dependency) {
                            continue;
                        }
                        match marks.get(&dependency) {
                            Some(Mark::Visiting) => return Some(dependency),
                            Some(Mark::Visited) => {}
                            None => {
                                marks.insert(dependency, Mark::Visiting);
                                stack.push((dependency, 0));
                            }
                        }
                    }
                    None => {
                        marks.insert(*id, Mark::Visited);
                        stack.pop();
                    }
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spire_registry::{Expr, World};

    fn pipeline() -> Arc<Pipeline> {
        let mut pipeline = Pipeline::new("P");
        for world in ["vs", "ps", "fs"] {
            pipeline.add_world(World::new(world)).unwrap();
        }
        pipeline.add_import("a", "vs", "ps").unwrap();
        pipeline.add_import("b", "ps", "fs").unwrap();
        Arc::new(pipeline)
    }

    fn definition(component: &str, world: &str, body: Expr, entry: bool) -> Definition {
        Definition {
            id: DefinitionId(0),
            component: component.into(),
            world: world.into(),
            alternate_name: None,
            data_type: "float".into(),
            attributes: Attributes::new(),
            body: body.into(),
            is_entry_point: entry,
            dependencies: IndexSet::new(),
            span: Span::default(),
        }
    }

    fn add(
        ir: &mut ShaderIr,
        component: &str,
        world: &str,
        body: Expr,
        entry: bool,
    ) -> DefinitionId {
        let id = ir.add_definition(definition(component, world, body, entry));
        ir.install(id);
        id
    }

    fn is_component(name: &str) -> bool {
        matches!(name, "a" | "b" | "c")
    }

    #[test]
    fn same_world_reference_wins() {
        let mut ir = ShaderIr::new("S", pipeline());
        let a_fs = add(&mut ir, "a", "fs", Expr::name("b"), true);
        let _b_vs = add(&mut ir, "b", "vs", Expr::literal("1"), false);
        let b_fs = add(&mut ir, "b", "fs", Expr::literal("2"), false);

        let (changed, unresolved) = ir.resolve_component_references(is_component);
        assert!(changed);
        assert!(unresolved.is_empty());
        let dependencies = &ir.definition(a_fs).unwrap().dependencies;
        assert_eq!(dependencies.iter().copied().collect::<Vec<_>>(), vec![b_fs]);
    }

    #[test]
    fn falls_back_to_nearest_upstream_world() {
        let mut ir = ShaderIr::new("S", pipeline());
        let a_fs = add(&mut ir, "a", "fs", Expr::name("b"), true);
        let _b_vs = add(&mut ir, "b", "vs", Expr::literal("1"), false);
        let b_ps = add(&mut ir, "b", "ps", Expr::literal("2"), false);

        ir.resolve_component_references(is_component);
        assert!(ir.definition(a_fs).unwrap().dependencies.contains(&b_ps));
    }

    #[test]
    fn downstream_definitions_are_not_visible() {
        let mut ir = ShaderIr::new("S", pipeline());
        let a_vs = add(&mut ir, "a", "vs", Expr::name("b"), true);
        add(&mut ir, "b", "fs", Expr::literal("2"), false);

        let (_, unresolved) = ir.resolve_component_references(is_component);
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0].definition, a_vs);
        assert_eq!(unresolved[0].reference, "b");
    }

    #[test]
    fn dead_code_is_removed_and_index_pruned() {
        let mut ir = ShaderIr::new("S", pipeline());
        let a = add(&mut ir, "a", "fs", Expr::name("b"), true);
        let b = add(&mut ir, "b", "fs", Expr::literal("1"), false);
        let c = add(&mut ir, "c", "fs", Expr::literal("3"), false);

        ir.resolve_component_references(is_component);
        assert!(ir.eliminate_dead_code());
        assert!(ir.definition(a).is_some());
        assert!(ir.definition(b).is_some());
        assert!(ir.definition(c).is_none());
        assert!(!ir.definitions_by_component().contains_key("c"));
        assert!(!ir.eliminate_dead_code());
    }

    #[test]
    fn non_survivors_are_never_roots() {
        let mut ir = ShaderIr::new("S", pipeline());
        let displaced = ir.add_definition(definition("a", "fs", Expr::literal("0"), true));
        let survivor = add(&mut ir, "a", "fs", Expr::literal("1"), true);

        ir.eliminate_dead_code();
        assert!(ir.definition(displaced).is_none());
        assert_eq!(ir.survivor("a", "fs").map(|d| d.id), Some(survivor));
    }

    #[test]
    fn finds_multi_node_cycle() {
        let mut ir = ShaderIr::new("S", pipeline());
        add(&mut ir, "a", "fs", Expr::name("b"), true);
        add(&mut ir, "b", "fs", Expr::name("c"), false);
        add(&mut ir, "c", "fs", Expr::name("a"), false);

        ir.resolve_component_references(is_component);
        let on_cycle = ir.find_cycle().expect("cycle");
        assert!(ir.definition(on_cycle).is_some());
    }

    #[test]
    fn acyclic_graph_has_no_cycle() {
        let mut ir = ShaderIr::new("S", pipeline());
        let sum = Expr::binary(
            spire_registry::BinaryOp::Add,
            Expr::name("b"),
            Expr::name("c"),
        );
        add(&mut ir, "a", "fs", sum, true);
        add(&mut ir, "b", "fs", Expr::name("c"), false);
        add(&mut ir, "c", "fs", Expr::literal("1"), false);

        ir.resolve_component_references(is_component);
        assert_eq!(ir.find_cycle(), None);
    }
}
