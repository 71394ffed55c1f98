//! Shader, component and implementation symbols.
//!
//! Semantic analysis builds these; the variant resolver mutates the pinned
//! worlds and attributes of the copies held by a shader closure.

use bitflags::bitflags;
use indexmap::IndexMap;
use spire_core::Span;

use crate::ast::ComponentBody;
use crate::{Attributes, WorldSet};

bitflags! {
    /// Declaration modifiers of an implementation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ImplFlags: u8 {
        /// Expanded at every use; never competes for a world.
        const INLINE = 1 << 0;
        /// Supplied by the pipeline or the host application.
        const INPUT = 1 << 1;
    }
}

/// One concrete definition of a component.
#[derive(Debug, Clone, PartialEq)]
pub struct ImplementationSymbol {
    /// Tag used by schedules to pick this implementation.
    pub alternate_name: Option<String>,
    /// Worlds this implementation may occupy.
    pub worlds: WorldSet,
    /// Worlds where the source code fixed this implementation.
    pub src_pinned_worlds: WorldSet,
    /// Worlds where the value must be materialized as an output.
    pub export_worlds: WorldSet,
    pub flags: ImplFlags,
    pub attributes: Attributes,
    pub body: ComponentBody,
    pub span: Span,
}

impl ImplementationSymbol {
    pub fn new(body: impl Into<ComponentBody>) -> Self {
        Self {
            alternate_name: None,
            worlds: WorldSet::new(),
            src_pinned_worlds: WorldSet::new(),
            export_worlds: WorldSet::new(),
            flags: ImplFlags::empty(),
            attributes: Attributes::new(),
            body: body.into(),
            span: Span::default(),
        }
    }

    pub fn in_world(mut self, world: impl Into<String>) -> Self {
        self.worlds.insert(world.into());
        self
    }

    /// Occupy `world` and pin it in source.
    pub fn pinned_in(mut self, world: impl Into<String>) -> Self {
        let world = world.into();
        self.worlds.insert(world.clone());
        self.src_pinned_worlds.insert(world);
        self
    }

    /// Occupy `world` and export it.
    pub fn exported_in(mut self, world: impl Into<String>) -> Self {
        let world = world.into();
        self.worlds.insert(world.clone());
        self.export_worlds.insert(world);
        self
    }

    pub fn alternate(mut self, name: impl Into<String>) -> Self {
        self.alternate_name = Some(name.into());
        self
    }

    pub fn with_flags(mut self, flags: ImplFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn is_inline(&self) -> bool {
        self.flags.contains(ImplFlags::INLINE)
    }

    pub fn is_input(&self) -> bool {
        self.flags.contains(ImplFlags::INPUT)
    }

    /// The alternate name, with the unnamed implementation as `""`.
    pub fn alternate_str(&self) -> &str {
        self.alternate_name.as_deref().unwrap_or("")
    }

    /// Whether the choice for `world` is already fixed by this declaration.
    pub fn fixes_world(&self, world: &str) -> bool {
        self.src_pinned_worlds.contains(world)
            || self.is_inline()
            || self.export_worlds.contains(world)
            || self.is_input()
    }
}

/// A named, typed computation slot of a shader.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentSymbol {
    pub name: String,
    pub data_type: String,
    /// Schedule names for this component, first one is canonical.
    pub choice_names: Vec<String>,
    pub implementations: Vec<ImplementationSymbol>,
    /// Worlds the component may legally be placed in.
    pub constrained_worlds: WorldSet,
    /// Worlds whose implementation is already decided. Always a subset of
    /// `constrained_worlds`.
    pub pinned_worlds: WorldSet,
    /// Pipeline input parameter; never offered as a choice.
    pub is_param: bool,
    pub span: Span,
}

impl ComponentSymbol {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            choice_names: Vec::new(),
            implementations: Vec::new(),
            constrained_worlds: WorldSet::new(),
            pinned_worlds: WorldSet::new(),
            is_param: false,
            span: Span::default(),
        }
    }

    /// Add an implementation; its worlds become legal placements.
    pub fn implementation(mut self, implementation: ImplementationSymbol) -> Self {
        self.constrained_worlds
            .extend(implementation.worlds.iter().cloned());
        self.implementations.push(implementation);
        self
    }

    /// Replace the legal placements. Call after adding implementations.
    pub fn constrained_to<I, S>(mut self, worlds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constrained_worlds = worlds.into_iter().map(Into::into).collect();
        self.pinned_worlds
            .retain(|w| self.constrained_worlds.contains(w));
        self
    }

    pub fn choice(mut self, name: impl Into<String>) -> Self {
        self.choice_names.push(name.into());
        self
    }

    pub fn param(mut self) -> Self {
        self.is_param = true;
        self
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Users can pick this component's placement through a schedule.
    pub fn is_choosable(&self) -> bool {
        !self.choice_names.is_empty() && !self.is_param
    }
}

/// A named shader: a pipeline reference plus its components.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderSymbol {
    pub name: String,
    pub pipeline: String,
    /// Modules are abstract shaders; they are only used by other shaders.
    pub is_module: bool,
    /// Modules whose components this shader inherits, in `using` order.
    pub uses: Vec<String>,
    /// Directly declared components.
    pub components: IndexMap<String, ComponentSymbol>,
    pub span: Span,
}

impl ShaderSymbol {
    pub fn new(name: impl Into<String>, pipeline: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pipeline: pipeline.into(),
            is_module: false,
            uses: Vec::new(),
            components: IndexMap::new(),
            span: Span::default(),
        }
    }

    pub fn module(name: impl Into<String>, pipeline: impl Into<String>) -> Self {
        Self {
            is_module: true,
            ..Self::new(name, pipeline)
        }
    }

    pub fn using(mut self, module: impl Into<String>) -> Self {
        self.uses.push(module.into());
        self
    }

    pub fn component(mut self, component: ComponentSymbol) -> Self {
        self.components.insert(component.name.clone(), component);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expr;

    #[test]
    fn implementation_world_sets() {
        let imp = ImplementationSymbol::new(Expr::literal("1.0"))
            .in_world("vs")
            .pinned_in("ps")
            .exported_in("fs");
        assert_eq!(
            imp.worlds.iter().collect::<Vec<_>>(),
            vec!["vs", "ps", "fs"]
        );
        assert!(!imp.fixes_world("vs"));
        assert!(imp.fixes_world("ps"));
        assert!(imp.fixes_world("fs"));
    }

    #[test]
    fn inline_and_input_fix_every_world() {
        let inline = ImplementationSymbol::new(Expr::literal("0"))
            .in_world("vs")
            .with_flags(ImplFlags::INLINE);
        let input = ImplementationSymbol::new(Expr::literal("0"))
            .in_world("vs")
            .with_flags(ImplFlags::INPUT);
        assert!(inline.fixes_world("vs"));
        assert!(input.fixes_world("vs"));
    }

    #[test]
    fn component_constraints_follow_implementations() {
        let component = ComponentSymbol::new("albedo", "vec3")
            .implementation(ImplementationSymbol::new(Expr::literal("0")).in_world("vs"))
            .implementation(ImplementationSymbol::new(Expr::literal("1")).in_world("fs"))
            .choice("albedo");
        assert_eq!(component.constrained_worlds.len(), 2);
        assert!(component.is_choosable());

        let narrowed = component.constrained_to(["fs"]);
        assert_eq!(narrowed.constrained_worlds.len(), 1);
        assert!(!narrowed.clone().param().is_choosable());
    }
}
