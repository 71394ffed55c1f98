//! Variant Pass - resolve one shader closure into a per-world IR.
//!
//! ## Algorithm
//!
//! 1. Pin marking: worlds fixed by the declaration itself (source pinned,
//!    exported, inline or input implementations) are added to the
//!    component's pinned set
//! 2. Choice indexing: every choice alias maps to its component
//! 3. Choice application: each schedule choice replaces its component's
//!    pinned set with the selected worlds and marks the selected
//!    implementations as schedule pinned
//! 4. Attribute overrides from the schedule are merged into every
//!    implementation of the chosen component
//! 5. Materialization: one definition per (implementation, world). The
//!    survivor of each (component, world) slot is the last one in
//!    declaration order, unless a schedule pinned one was installed first
//! 6. Fixed point: resolve references, drop dead definitions, check for
//!    cycles; repeat until nothing changes
//!
//! Declaration order decides the tie-break, so every container walked here
//! is an ordered one.

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use spire_core::{DiagnosticKind, Diagnostics};
use spire_registry::{ImplementationSymbol, PINNED_ATTRIBUTE, World};
use spire_schedule::Schedule;

use crate::closure::ShaderClosure;
use crate::ir::{Definition, DefinitionId, ShaderIr};

/// An implementation, by its component name and declaration index.
type ImplKey = (String, usize);

pub struct VariantPass<'a> {
    closure: &'a mut ShaderClosure,
    schedule: &'a Schedule,
    diagnostics: &'a mut Diagnostics,
}

impl<'a> VariantPass<'a> {
    pub fn new(
        closure: &'a mut ShaderClosure,
        schedule: &'a Schedule,
        diagnostics: &'a mut Diagnostics,
    ) -> Self {
        Self {
            closure,
            schedule,
            diagnostics,
        }
    }

    /// Build the IR. Returns `None` after diagnosing a circular or
    /// unresolvable definition.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(mut self) -> Option<ShaderIr> {
        tracing::debug!(shader = %self.closure.name, "generating shader variant");

        self.mark_pinned_worlds();
        let choices = self.choice_index();
        let pinned = self.apply_choices(&choices);
        self.apply_attribute_overrides(&choices);

        let ir = self.materialize(&pinned);
        self.resolve(ir)
    }

    fn mark_pinned_worlds(&mut self) {
        for component in self.closure.components.values_mut() {
            let fixed: Vec<String> = component
                .implementations
                .iter()
                .flat_map(|imp| imp.worlds.iter().filter(move |w| imp.fixes_world(w)))
                .filter(|w| component.constrained_worlds.contains(*w))
                .cloned()
                .collect();
            component.pinned_worlds.extend(fixed);
        }
    }

    /// Choice alias -> component name. A later alias of the same spelling
    /// takes over.
    fn choice_index(&self) -> IndexMap<String, String> {
        let mut index = IndexMap::new();
        for component in self.closure.components.values() {
            for alias in &component.choice_names {
                index.insert(alias.clone(), component.name.clone());
            }
        }
        index
    }

    fn apply_choices(&mut self, choices: &IndexMap<String, String>) -> FxHashSet<ImplKey> {
        let mut pinned = FxHashSet::default();

        for (choice, selections) in &self.schedule.choices {
            let component = match choices.get(choice) {
                Some(name) => self.closure.components.get_mut(name),
                None => None,
            };
            let Some(component) = component else {
                tracing::debug!(
                    shader = %self.closure.name,
                    choice = %choice,
                    "schedule choice not used by shader"
                );
                continue;
            };

            component.pinned_worlds.clear();
            for selection in selections {
                if !component.constrained_worlds.contains(&selection.world) {
                    self.diagnostics.error_in(
                        self.closure.name.as_str(),
                        selection.span,
                        DiagnosticKind::InvalidChoiceForKey {
                            world: selection.world.clone(),
                            choice: choice.clone(),
                        },
                    );
                    continue;
                }

                component.pinned_worlds.insert(selection.world.clone());
                for (index, imp) in component.implementations.iter().enumerate() {
                    if imp.alternate_str() == selection.alternate_name()
                        && imp.worlds.contains(&selection.world)
                    {
                        pinned.insert((component.name.clone(), index));
                    }
                }
            }
        }

        pinned
    }

    fn apply_attribute_overrides(&mut self, choices: &IndexMap<String, String>) {
        for (choice, overrides) in &self.schedule.attributes {
            let component = match choices.get(choice) {
                Some(name) => self.closure.components.get_mut(name),
                None => None,
            };
            let Some(component) = component else {
                tracing::debug!(
                    shader = %self.closure.name,
                    choice = %choice,
                    "schedule attributes not used by shader"
                );
                continue;
            };

            for imp in &mut component.implementations {
                for (key, value) in overrides {
                    imp.attributes.insert(key.clone(), value.clone());
                }
            }
        }
    }

    fn materialize(&self, pinned: &FxHashSet<ImplKey>) -> ShaderIr {
        let pipeline = &self.closure.pipeline;
        let mut ir = ShaderIr::new(self.closure.name.as_str(), pipeline.clone());

        for component in self.closure.components.values() {
            // world -> (survivor, schedule pinned, any candidate is an entry point)
            let mut slots: IndexMap<&str, (DefinitionId, bool, bool)> = IndexMap::new();

            for (index, imp) in component.implementations.iter().enumerate() {
                let is_pinned = pinned.contains(&(component.name.clone(), index));

                for world in &imp.worlds {
                    let is_entry_point = self.is_entry_point(imp, world);
                    let id = ir.add_definition(Definition {
                        id: DefinitionId::default(),
                        component: component.name.clone(),
                        world: world.clone(),
                        alternate_name: imp.alternate_name.clone(),
                        data_type: component.data_type.clone(),
                        attributes: imp.attributes.clone(),
                        body: imp.body.clone(),
                        is_entry_point,
                        dependencies: Default::default(),
                        span: imp.span,
                    });

                    match slots.get_mut(world.as_str()) {
                        Some((_, true, entry)) => *entry |= is_entry_point,
                        Some(slot) => *slot = (id, is_pinned, slot.2 | is_entry_point),
                        None => {
                            slots.insert(world.as_str(), (id, is_pinned, is_entry_point));
                        }
                    }
                }
            }

            for (world, (id, _, is_entry_point)) in slots {
                ir.install(id);
                if is_entry_point {
                    if let Some(survivor) = ir.definition_mut(id) {
                        survivor.is_entry_point = true;
                    }
                }
                tracing::trace!(
                    component = %component.name,
                    world,
                    definition = %id,
                    "installed survivor"
                );
            }
        }

        ir
    }

    fn is_entry_point(&self, imp: &ImplementationSymbol, world: &str) -> bool {
        let pipeline = &self.closure.pipeline;
        imp.export_worlds.contains(world)
            || (pipeline.is_abstract_world(world)
                && (imp.attributes.contains_key(PINNED_ATTRIBUTE)
                    || pipeline.world(world).is_some_and(World::is_pinned)))
    }

    fn resolve(&mut self, mut ir: ShaderIr) -> Option<ShaderIr> {
        let components = &self.closure.components;
        let is_component = |name: &str| components.contains_key(name);

        let mut iteration = 0;
        loop {
            iteration += 1;
            let (relinked, _) = ir.resolve_component_references(is_component);
            let removed = ir.eliminate_dead_code();

            if let Some(id) = ir.find_cycle() {
                if let Some(definition) = ir.definition(id) {
                    self.diagnostics.error_in(
                        self.closure.name.as_str(),
                        definition.span,
                        DiagnosticKind::ComponentDefinitionCircularity {
                            component: definition.component.clone(),
                        },
                    );
                }
                return None;
            }

            tracing::trace!(
                iteration,
                relinked,
                removed,
                remaining = ir.len(),
                "fixed point iteration"
            );
            if !relinked && !removed {
                break;
            }
        }

        let (_, unresolved) = ir.resolve_component_references(is_component);
        if !unresolved.is_empty() {
            for reference in unresolved {
                let Some(definition) = ir.definition(reference.definition) else {
                    continue;
                };
                self.diagnostics.error_in(
                    self.closure.name.as_str(),
                    reference.span,
                    DiagnosticKind::UnresolvedComponentReference {
                        component: definition.component.clone(),
                        reference: reference.reference,
                        world: definition.world.clone(),
                    },
                );
            }
            return None;
        }

        tracing::debug!(
            shader = %self.closure.name,
            definitions = ir.len(),
            iterations = iteration,
            "shader variant resolved"
        );
        Some(ir)
    }
}
