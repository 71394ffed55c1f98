//! Error types for Spire.
//!
//! ```text
//! ScheduleError  - schedule (choice file) lexing/parsing errors
//! PipelineError  - malformed world graphs while registering a pipeline
//! CompileError   - failures that end a compile call
//! ```
//!
//! Most problems are reported through [`crate::Diagnostics`] instead. The
//! types here cover what cannot be expressed as a diagnostic: parse errors
//! before they are recorded, registration mistakes made by the frontend,
//! and collaborator failures that must reach the caller.

use thiserror::Error;

use crate::Span;

// ============================================================================
// Schedule Errors
// ============================================================================

/// Categories of schedule parse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScheduleErrorKind {
    /// An unexpected character was encountered.
    UnexpectedChar,
    /// A string literal was not terminated.
    UnterminatedString,
    /// A block comment was not terminated.
    UnterminatedComment,
    /// A specific token was expected but not found.
    ExpectedToken,
    /// Unexpected end of input.
    UnexpectedEof,
}

impl ScheduleErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleErrorKind::UnexpectedChar => "unexpected character",
            ScheduleErrorKind::UnterminatedString => "unterminated string",
            ScheduleErrorKind::UnterminatedComment => "unterminated comment",
            ScheduleErrorKind::ExpectedToken => "expected token",
            ScheduleErrorKind::UnexpectedEof => "unexpected end of file",
        }
    }
}

impl std::fmt::Display for ScheduleErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A schedule parse error with location and context.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} at {span}: {message}")]
pub struct ScheduleError {
    pub kind: ScheduleErrorKind,
    pub span: Span,
    pub message: String,
}

impl ScheduleError {
    pub fn new(kind: ScheduleErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    /// Create an "expected token" error.
    pub fn expected_token(span: Span, expected: &str, found: &str) -> Self {
        Self::new(
            ScheduleErrorKind::ExpectedToken,
            span,
            format!("expected {expected}, found {found}"),
        )
    }

    /// Create an "unexpected EOF" error.
    pub fn unexpected_eof(span: Span, expected: &str) -> Self {
        Self::new(
            ScheduleErrorKind::UnexpectedEof,
            span,
            format!("expected {expected}, found end of file"),
        )
    }
}

// ============================================================================
// Pipeline Errors
// ============================================================================

/// Errors raised while a frontend assembles a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// A world with this name already exists in the pipeline.
    #[error("world '{world}' is declared twice in pipeline '{pipeline}'")]
    DuplicateWorld { pipeline: String, world: String },

    /// An import edge names a world the pipeline does not declare.
    #[error("pipeline '{pipeline}' has no world '{world}'")]
    UnknownWorld { pipeline: String, world: String },

    /// An import edge would make the world graph cyclic.
    #[error("import from '{from}' to '{to}' makes pipeline '{pipeline}' cyclic")]
    CyclicImport {
        pipeline: String,
        from: String,
        to: String,
    },
}

// ============================================================================
// Compile Errors
// ============================================================================

/// Failure that ends a compile call.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The problem has been reported as a diagnostic; stop this call.
    ///
    /// `Compiler::compile` swallows this variant.
    #[error("compilation aborted after reporting diagnostics")]
    Aborted,

    /// An external collaborator failed outside the diagnostic taxonomy.
    #[error("{stage} failed: {source}")]
    Collaborator {
        stage: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl CompileError {
    /// Wrap a collaborator error for the named stage.
    pub fn collaborator(
        stage: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        CompileError::Collaborator {
            stage,
            source: source.into(),
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, CompileError::Aborted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_error_display() {
        let err = ScheduleError::expected_token(Span::new(4, 2, 1), "';'", "'='");
        assert_eq!(
            err.to_string(),
            "expected token at 4:2: expected ';', found '='"
        );
    }

    #[test]
    fn collaborator_error_keeps_source() {
        let err = CompileError::collaborator("semantic analysis", "symbol table exploded");
        assert!(!err.is_aborted());
        assert_eq!(
            err.to_string(),
            "semantic analysis failed: symbol table exploded"
        );
        assert!(std::error::Error::source(&err).is_some());
    }
}
