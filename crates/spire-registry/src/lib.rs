//! Symbol model consumed by the Spire compiler.
//!
//! These types are what semantic analysis hands to the variant resolver:
//!
//! - [`Pipeline`]: the world DAG a shader is compiled against
//! - [`ShaderSymbol`], [`ComponentSymbol`], [`ImplementationSymbol`]
//! - [`SymbolTable`]: all shaders in dependency order
//! - [`Builtins`]: the built-in type table shared by every compile call
//! - [`ast`]: the component body syntax cloned into resolved definitions

pub mod ast;
pub mod builtins;
pub mod pipeline;
pub mod symbols;
pub mod table;

pub use ast::{BinaryOp, ComponentBody, Expr, Stmt, UnaryOp};
pub use builtins::{BuiltinKind, BuiltinType, Builtins, ScalarKind};
pub use pipeline::{Pipeline, World};
pub use symbols::{ComponentSymbol, ImplFlags, ImplementationSymbol, ShaderSymbol};
pub use table::SymbolTable;

/// Attribute maps keep declaration order.
pub type Attributes = indexmap::IndexMap<String, String>;

/// Ordered set of world names.
pub type WorldSet = indexmap::IndexSet<String>;

/// Attribute that asks for an abstract world's output to be materialized.
pub const PINNED_ATTRIBUTE: &str = "Pinned";
