//! Spire variant compiler
//!
//! Turns a flattened shader into the single concrete variant a backend can
//! emit, or into the list of choices tooling can still make.
//!
//! ## Architecture
//!
//! - **Attribute resolution**: propagate `%component.attribute` indirections
//! - **Variant resolution**: pin, apply the schedule, materialize one
//!   definition per (component, world), then iterate reference resolution
//!   and dead-code elimination to a fixed point
//! - **Choice export**: derive open choices and defaults from resolved IR
//!
//! ## Modules
//!
//! - [`closure`]: a shader with every inherited component
//! - [`ir`]: resolved definitions and their dependency graph
//! - [`passes`]: the three passes above

pub mod closure;
pub mod ir;
pub mod passes;

pub use closure::ShaderClosure;
pub use ir::{Definition, DefinitionId, ShaderIr, UnresolvedReference};
pub use passes::{
    AttributeOutput, AttributeResolutionPass, ChoiceCatalog, ChoiceCatalogPass, ChoiceOption,
    ShaderChoice, VariantPass,
};
