//! Schedule (choice file) support.
//!
//! A schedule tells the variant resolver which implementation of a
//! component should occupy which world, and adds attribute overrides.
//!
//! ```text
//! // choose the phong implementation in the fragment world
//! lightingModel = fs:phong;
//! attrib shadow(samples = "16");
//! ```
//!
//! [`parse`] reports problems into a [`Diagnostics`] sink; the `Display`
//! impl of [`Schedule`] writes text that parses back to the same schedule.

pub mod lexer;
pub mod parser;
pub mod schedule;

pub use parser::ScheduleParser;
pub use schedule::{Schedule, Selection};

use spire_core::{DiagnosticKind, Diagnostics};

/// Parse schedule text, reporting syntax errors against `file_name`.
///
/// Entries that fail to parse are skipped; everything else is returned.
pub fn parse(source: &str, file_name: &str, diagnostics: &mut Diagnostics) -> Schedule {
    let (schedule, errors) = ScheduleParser::new(source).parse();

    for error in errors {
        diagnostics.error_in(
            file_name,
            error.span,
            DiagnosticKind::ScheduleSyntax {
                message: format!("{}: {}", error.kind, error.message),
            },
        );
    }

    tracing::debug!(
        file = file_name,
        choices = schedule.choices.len(),
        attributes = schedule.attributes.len(),
        "parsed schedule"
    );
    schedule
}
