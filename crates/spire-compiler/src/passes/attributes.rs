//! Attribute Resolution Pass - substitute cross-component attribute references.
//!
//! An implementation attribute whose value starts with `%` names an attribute
//! of another component of the same shader:
//!
//! ```text
//! component shadowMap { [Size: "%shadowConfig.size"] ... }
//! component shadowConfig { [size: "2048"] ... }
//!
//! After resolution shadowMap's Size is "2048".
//! ```
//!
//! ## Algorithm
//!
//! 1. Visit closures in symbol-table dependency order (modules first)
//! 2. Within a closure, visit components and implementations in
//!    declaration order
//! 3. For each `%component.attribute` value, every implementation of the
//!    referenced component that defines the attribute overwrites the value,
//!    so the last one in declaration order wins
//!
//! Resolution is best effort: a malformed reference, an unknown component or
//! a missing attribute leaves the value as written. Updates happen in place
//! and a substituted value is not scanned again, so indirection is single hop.

use indexmap::IndexMap;
use spire_registry::SymbolTable;

use crate::closure::ShaderClosure;

/// Prefix marking an attribute value as a reference.
pub const INDIRECTION_MARKER: char = '%';

/// Output of the attribute resolution pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AttributeOutput {
    /// Values that were replaced.
    pub resolved: usize,
    /// References left as written.
    pub unresolved: usize,
}

/// Location of one attribute inside a closure.
struct AttributeSlot {
    component: usize,
    implementation: usize,
    key: String,
}

pub struct AttributeResolutionPass<'a> {
    symbols: &'a SymbolTable,
    closures: &'a mut IndexMap<String, ShaderClosure>,
}

impl<'a> AttributeResolutionPass<'a> {
    pub fn new(
        symbols: &'a SymbolTable,
        closures: &'a mut IndexMap<String, ShaderClosure>,
    ) -> Self {
        Self { symbols, closures }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(self) -> AttributeOutput {
        let mut output = AttributeOutput::default();

        for shader in self.symbols.shader_dependence_order() {
            if let Some(closure) = self.closures.get_mut(&shader.name) {
                resolve_closure(closure, &mut output);
            }
        }

        tracing::debug!(
            resolved = output.resolved,
            unresolved = output.unresolved,
            "attribute references resolved"
        );
        output
    }
}

fn resolve_closure(closure: &mut ShaderClosure, output: &mut AttributeOutput) {
    let slots: Vec<AttributeSlot> = closure
        .components
        .values()
        .enumerate()
        .flat_map(|(component, symbol)| {
            symbol
                .implementations
                .iter()
                .enumerate()
                .flat_map(move |(implementation, imp)| {
                    imp.attributes
                        .iter()
                        .filter(|(_, value)| value.starts_with(INDIRECTION_MARKER))
                        .map(move |(key, _)| AttributeSlot {
                            component,
                            implementation,
                            key: key.clone(),
                        })
                })
        })
        .collect();

    for slot in slots {
        // Read the current value; an earlier slot may already have replaced it.
        let Some(value) = closure
            .components
            .get_index(slot.component)
            .and_then(|(_, c)| c.implementations.get(slot.implementation))
            .and_then(|imp| imp.attributes.get(&slot.key))
            .cloned()
        else {
            continue;
        };

        let Some((component, attribute)) = parse_indirection(&value) else {
            tracing::trace!(
                shader = %closure.name,
                value = %value,
                "malformed attribute reference"
            );
            output.unresolved += 1;
            continue;
        };

        let replacement = closure.component(component).and_then(|referenced| {
            referenced
                .implementations
                .iter()
                .filter_map(|imp| imp.attributes.get(attribute))
                .next_back()
                .cloned()
        });

        match replacement {
            Some(replacement) => {
                if let Some(target) = closure
                    .components
                    .get_index_mut(slot.component)
                    .and_then(|(_, c)| c.implementations.get_mut(slot.implementation))
                    .and_then(|imp| imp.attributes.get_mut(&slot.key))
                {
                    *target = replacement;
                    output.resolved += 1;
                }
            }
            None => {
                tracing::trace!(
                    shader = %closure.name,
                    value = %value,
                    "attribute reference not found"
                );
                output.unresolved += 1;
            }
        }
    }
}

/// Split `%component.attribute` into its two identifiers.
///
/// The whole value must be the reference. Whitespace around either word is
/// dropped, but any other text (`%B.size.x`, `%B.size px`) makes the value
/// an ordinary attribute that is left as written.
pub fn parse_indirection(value: &str) -> Option<(&str, &str)> {
    let (component, attribute) = value.strip_prefix(INDIRECTION_MARKER)?.split_once('.')?;
    let component = component.trim();
    let attribute = attribute.trim();
    (is_identifier(component) && is_identifier(attribute)).then_some((component, attribute))
}

fn is_identifier(word: &str) -> bool {
    let mut chars = word.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use spire_registry::{
        ComponentSymbol, Expr, ImplementationSymbol, Pipeline, ShaderSymbol, World,
    };
    use std::sync::Arc;

    fn imp() -> ImplementationSymbol {
        ImplementationSymbol::new(Expr::literal("0")).in_world("fs")
    }

    /// A component with one implementation carrying `key = value`.
    fn with(name: &str, key: &str, value: &str) -> ComponentSymbol {
        ComponentSymbol::new(name, "float").implementation(imp().with_attribute(key, value))
    }

    fn run(closure: ShaderClosure) -> (ShaderClosure, AttributeOutput) {
        let mut symbols = SymbolTable::new();
        symbols.add_shader(ShaderSymbol::new(closure.name.as_str(), "P"));
        let mut closures = IndexMap::new();
        let name = closure.name.clone();
        closures.insert(name.clone(), closure);
        let output = AttributeResolutionPass::new(&symbols, &mut closures).run();
        (closures.swap_remove(&name).unwrap(), output)
    }

    fn closure() -> ShaderClosure {
        let mut pipeline = Pipeline::new("P");
        pipeline.add_world(World::new("fs")).unwrap();
        ShaderClosure::new("S", Arc::new(pipeline))
    }

    fn attribute<'c>(closure: &'c ShaderClosure, component: &str, key: &str) -> &'c str {
        let component = closure.component(component).unwrap();
        component.implementations[0].attributes[key].as_str()
    }

    #[test]
    fn parses_references() {
        assert_eq!(parse_indirection("%B.size"), Some(("B", "size")));
        assert_eq!(parse_indirection("B.size"), None);
        assert_eq!(parse_indirection("%B"), None);
        assert_eq!(parse_indirection("%.size"), None);
        assert_eq!(parse_indirection("%B.si ze"), None);
    }

    #[test]
    fn reference_must_be_the_whole_value() {
        assert_eq!(parse_indirection("% B . size "), Some(("B", "size")));
        assert_eq!(parse_indirection("%B.size.x"), None);
        assert_eq!(parse_indirection("%B.size px"), None);
    }

    #[test]
    fn substitutes_referenced_attribute() {
        let closure = closure()
            .with_component(with("A", "Size", "%B.size"))
            .with_component(with("B", "size", "4"));

        let (closure, output) = run(closure);
        assert_eq!(attribute(&closure, "A", "Size"), "4");
        assert_eq!(output.resolved, 1);
    }

    #[test]
    fn missing_attribute_is_left_as_written() {
        let closure = closure()
            .with_component(with("A", "Size", "%B.size"))
            .with_component(ComponentSymbol::new("B", "float").implementation(imp()));

        let (closure, output) = run(closure);
        assert_eq!(attribute(&closure, "A", "Size"), "%B.size");
        assert_eq!(output.unresolved, 1);
    }

    #[test]
    fn last_defining_implementation_wins() {
        let closure = closure()
            .with_component(with("A", "Size", "%B.size"))
            .with_component(
                ComponentSymbol::new("B", "float")
                    .implementation(imp().with_attribute("size", "4"))
                    .implementation(imp())
                    .implementation(imp().with_attribute("size", "8")),
            );

        let (closure, _) = run(closure);
        assert_eq!(attribute(&closure, "A", "Size"), "8");
    }

    #[test]
    fn indirection_is_single_hop() {
        // B is resolved after A, so A sees B's unresolved reference.
        let closure = closure()
            .with_component(with("A", "Size", "%B.size"))
            .with_component(with("B", "size", "%C.size"))
            .with_component(with("C", "size", "16"));

        let (closure, _) = run(closure);
        assert_eq!(attribute(&closure, "A", "Size"), "%C.size");
        assert_eq!(attribute(&closure, "B", "size"), "16");
    }
}
