//! Choice Catalog Pass - list the decisions a schedule can still make.
//!
//! Tooling asks the compiler which placements are open for each shader,
//! lets the user pick, and writes the result back as a schedule file.
//!
//! ## Algorithm
//!
//! For every choosable component (it has a choice alias and is not a
//! pipeline parameter):
//!
//! 1. The entry is named after the first alias
//! 2. Options are the (world, alternate) pairs of its implementations,
//!    limited to the component's legal worlds
//! 3. The default is the world holding a resolved definition that is latest
//!    in pipeline topological order; the first one wins on a tie

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use spire_schedule::{Schedule, Selection};

use crate::closure::ShaderClosure;

/// One placement a schedule can select.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChoiceOption {
    pub world: String,
    pub alternate: Option<String>,
}

impl ChoiceOption {
    pub fn new(world: impl Into<String>, alternate: Option<String>) -> Self {
        Self {
            world: world.into(),
            alternate,
        }
    }

    pub fn to_selection(&self) -> Selection {
        Selection::new(self.world.as_str(), self.alternate.clone())
    }
}

impl fmt::Display for ChoiceOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alternate {
            Some(alternate) => write!(f, "{}:{}", self.world, alternate),
            None => f.write_str(&self.world),
        }
    }
}

/// An open decision of one shader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderChoice {
    /// Canonical choice alias of the component.
    pub name: String,
    pub options: Vec<ChoiceOption>,
    /// World the resolver settled on; `None` when the shader did not resolve.
    pub default: Option<String>,
}

pub struct ChoiceCatalogPass<'a> {
    closure: &'a ShaderClosure,
}

impl<'a> ChoiceCatalogPass<'a> {
    pub fn new(closure: &'a ShaderClosure) -> Self {
        Self { closure }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(self) -> Vec<ShaderChoice> {
        let closure = self.closure;
        let mut choices = Vec::new();

        for component in closure.components.values() {
            if !component.is_choosable() {
                continue;
            }
            let Some(name) = component.choice_names.first() else {
                continue;
            };

            let options: IndexSet<ChoiceOption> = component
                .implementations
                .iter()
                .flat_map(|imp| {
                    imp.worlds
                        .iter()
                        .filter(|w| component.constrained_worlds.contains(*w))
                        .map(move |w| ChoiceOption::new(w.as_str(), imp.alternate_name.clone()))
                })
                .collect();

            choices.push(ShaderChoice {
                name: name.clone(),
                options: options.into_iter().collect(),
                default: self.default_world(&component.name),
            });
        }

        tracing::debug!(shader = %closure.name, choices = choices.len(), "choice catalog built");
        choices
    }

    fn default_world(&self, component: &str) -> Option<String> {
        let ir = self.closure.ir.as_ref()?;
        let worlds = ir.definitions_by_component().get(component)?;
        let pipeline = &self.closure.pipeline;

        let mut latest: isize = -1;
        let mut default = None;
        for world in worlds.keys() {
            let rank = pipeline.topology_rank(world).map_or(-1, |r| r as isize);
            if latest < rank {
                latest = rank;
                default = Some(world.clone());
            }
        }
        default
    }
}

/// Open choices of every requested shader, keyed by shader name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChoiceCatalog {
    pub shaders: IndexMap<String, Vec<ShaderChoice>>,
}

impl ChoiceCatalog {
    /// Build entries for every closure, or only for `symbol` when given.
    pub fn collect<'c>(
        closures: impl IntoIterator<Item = &'c ShaderClosure>,
        symbol: Option<&str>,
    ) -> Self {
        let shaders = closures
            .into_iter()
            .filter(|closure| symbol.is_none_or(|s| s == closure.name))
            .map(|closure| (closure.name.clone(), ChoiceCatalogPass::new(closure).run()))
            .collect();
        Self { shaders }
    }

    /// All entries, shader by shader.
    pub fn choices(&self) -> impl Iterator<Item = &ShaderChoice> {
        self.shaders.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.shaders.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A schedule selecting every option of every entry.
    pub fn to_schedule(&self) -> Schedule {
        let mut schedule = Schedule::new();
        for choice in self.choices() {
            for option in &choice.options {
                schedule.add_selection(choice.name.as_str(), option.to_selection());
            }
        }
        schedule
    }

    /// A schedule selecting each entry's default world, with the unnamed
    /// alternate. Entries without a default are left out.
    pub fn to_default_schedule(&self) -> Schedule {
        let mut schedule = Schedule::new();
        for choice in self.choices() {
            if let Some(world) = &choice.default {
                schedule.add_selection(choice.name.as_str(), Selection::new(world.as_str(), None));
            }
        }
        schedule
    }
}
