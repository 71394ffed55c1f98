//! Token types for the schedule lexer.

use spire_core::Span;
use std::fmt;

/// A token from schedule source.
#[derive(Clone, Copy, PartialEq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    /// The raw source text of this token.
    pub lexeme: &'src str,
    pub span: Span,
}

impl<'src> Token<'src> {
    #[inline]
    pub fn new(kind: TokenKind, lexeme: &'src str, span: Span) -> Self {
        Self { kind, lexeme, span }
    }

    /// Short description used in "found ..." messages.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof => "end of file".to_string(),
            TokenKind::Error => "invalid input".to_string(),
            _ => format!("'{}'", self.lexeme),
        }
    }
}

impl fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?} @ {:?})", self.kind, self.lexeme, self.span)
    }
}

/// All token types of the schedule language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `lightingModel`, `fs`
    Identifier,
    /// `"16"` (lexeme keeps the quotes and escapes)
    StringLiteral,
    /// `attrib`
    Attrib,
    /// `=`
    Equal,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// `:`
    Colon,
    /// `.`
    Dot,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// Malformed input; the lexer has recorded an error.
    Error,
    Eof,
}

/// Look up a keyword.
pub fn lookup_keyword(ident: &str) -> Option<TokenKind> {
    match ident {
        "attrib" => Some(TokenKind::Attrib),
        _ => None,
    }
}
