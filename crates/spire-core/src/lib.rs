//! Core types shared by every Spire crate.
//!
//! - [`span`]: source positions
//! - [`diagnostics`]: the error sink consulted between compiler stages
//! - [`error`]: `Result`-style errors for parsing, registration and compilation

pub mod diagnostics;
pub mod error;
pub mod span;

pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use error::{CompileError, PipelineError, ScheduleError, ScheduleErrorKind};
pub use span::{Location, Span};
