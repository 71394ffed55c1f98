//! The diagnostic sink.
//!
//! Every stage of the compiler reports problems here instead of returning
//! errors. The orchestrator only looks at [`Diagnostics::error_count`] to
//! decide whether to run the next stage.

use std::collections::VecDeque;
use std::fmt;

use thiserror::Error;

use crate::span::{Location, Span};

/// What went wrong, with the arguments the message needs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiagnosticKind {
    /// The schedule text could not be parsed.
    #[error("schedule syntax error: {message}")]
    ScheduleSyntax { message: String },

    /// A schedule selected a world outside the component's legal set.
    #[error("'{world}' is not a valid choice for '{choice}'")]
    InvalidChoiceForKey { world: String, choice: String },

    /// Component definitions depend on each other in a loop.
    #[error("component definition circularity in '{component}'")]
    ComponentDefinitionCircularity { component: String },

    /// A definition references a component that has no usable definition.
    #[error("'{component}' in world '{world}' references unavailable '{reference}'")]
    UnresolvedComponentReference {
        component: String,
        reference: String,
        world: String,
    },

    /// The compile mode is not handled by `compile`.
    #[error("unsupported compiler mode '{mode}'")]
    UnsupportedCompilerMode { mode: String },

    /// No backend is registered for the output target.
    #[error("no code generation backend registered for target '{target}'")]
    UnsupportedTarget { target: String },

    /// Reported by an external collaborator (frontend, code generator, backend).
    #[error("{message}")]
    Other { message: String },
}

impl DiagnosticKind {
    /// Stable identifier for this kind, independent of its arguments.
    pub fn name(&self) -> &'static str {
        match self {
            DiagnosticKind::ScheduleSyntax { .. } => "schedule-syntax",
            DiagnosticKind::InvalidChoiceForKey { .. } => "invalid-choice-for-key",
            DiagnosticKind::ComponentDefinitionCircularity { .. } => {
                "component-definition-circularity"
            }
            DiagnosticKind::UnresolvedComponentReference { .. } => {
                "unresolved-component-reference"
            }
            DiagnosticKind::UnsupportedCompilerMode { .. } => "unsupported-compiler-mode",
            DiagnosticKind::UnsupportedTarget { .. } => "unsupported-target",
            DiagnosticKind::Other { .. } => "other",
        }
    }
}

/// The severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Counts towards [`Diagnostics::error_count`] and stops later stages.
    Error,
    /// Reported but never blocks progression.
    Warning,
    /// Informational.
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A single diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    /// Shader or file the diagnostic belongs to, if any.
    pub section: Option<String>,
    pub span: Span,
}

impl Diagnostic {
    pub fn location(&self) -> Location<'_> {
        Location::new(self.section.as_deref(), self.span)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.location(), self.severity, self.kind)
    }
}

/// A collection of diagnostics accumulated during one compile call.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    diagnostics: VecDeque<Diagnostic>,
    error_count: usize,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a diagnostic to the collection.
    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity == Severity::Error {
            self.error_count += 1;
        }
        self.diagnostics.push_back(diagnostic);
    }

    /// Report an error with no section.
    pub fn error(&mut self, span: Span, kind: DiagnosticKind) {
        self.add_diagnostic(Diagnostic {
            severity: Severity::Error,
            kind,
            section: None,
            span,
        });
    }

    /// Report an error scoped to a shader or file.
    pub fn error_in(&mut self, section: impl Into<String>, span: Span, kind: DiagnosticKind) {
        self.add_diagnostic(Diagnostic {
            severity: Severity::Error,
            kind,
            section: Some(section.into()),
            span,
        });
    }

    /// Report a warning scoped to a shader or file.
    pub fn warning_in(&mut self, section: impl Into<String>, span: Span, kind: DiagnosticKind) {
        self.add_diagnostic(Diagnostic {
            severity: Severity::Warning,
            kind,
            section: Some(section.into()),
            span,
        });
    }

    /// Number of error diagnostics reported so far.
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Removes all diagnostics and resets the error count.
    pub fn clear(&mut self) {
        self.diagnostics.clear();
        self.error_count = 0;
    }

    /// All diagnostics, in the order they were reported.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    /// Diagnostics whose kind has the given [`DiagnosticKind::name`].
    pub fn of_kind<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.diagnostics
            .iter()
            .filter(move |d| d.kind.name() == name)
    }

    /// Move every diagnostic of `other` into `self`.
    pub fn append(&mut self, other: &mut Diagnostics) {
        self.error_count += other.error_count;
        self.diagnostics.append(&mut other.diagnostics);
        other.error_count = 0;
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for diagnostic in &self.diagnostics {
            writeln!(f, "{}", diagnostic)?;
        }
        Ok(())
    }
}
