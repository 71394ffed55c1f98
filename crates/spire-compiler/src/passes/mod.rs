//! Compiler passes, in the order the orchestrator runs them.
//!
//! - [`attributes`]: substitute `%component.attribute` references
//! - [`variant`]: resolve one shader closure into a [`ShaderIr`](crate::ShaderIr)
//! - [`choices`]: list the choices still open in resolved shaders

pub mod attributes;
pub mod choices;
pub mod variant;

pub use attributes::{AttributeOutput, AttributeResolutionPass};
pub use choices::{ChoiceCatalog, ChoiceCatalogPass, ChoiceOption, ShaderChoice};
pub use variant::VariantPass;
