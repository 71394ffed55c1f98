//! Schedule lexer.
//!
//! The [`Lexer`] converts schedule text into a stream of [`Token`]s,
//! dispatching on the first character of each token. Comments and
//! whitespace are skipped; malformed input becomes a [`TokenKind::Error`]
//! token and a recorded [`ScheduleError`].

use std::collections::VecDeque;

use spire_core::{ScheduleError, ScheduleErrorKind};

use super::cursor::{Cursor, Mark};
use super::token::{Token, TokenKind, lookup_keyword};

/// Lexer for schedule source text with arbitrary lookahead.
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    lookahead: VecDeque<Token<'src>>,
    errors: Vec<ScheduleError>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            lookahead: VecDeque::with_capacity(2),
            errors: Vec::new(),
        }
    }

    /// Take accumulated errors, leaving an empty vec.
    pub fn take_errors(&mut self) -> Vec<ScheduleError> {
        std::mem::take(&mut self.errors)
    }

    /// Consume and return the next token.
    pub fn next_token(&mut self) -> Token<'src> {
        if let Some(token) = self.lookahead.pop_front() {
            return token;
        }
        self.scan_token()
    }

    /// Peek at the next token without consuming it.
    pub fn peek(&mut self) -> Token<'src> {
        self.peek_nth(0)
    }

    /// Peek `n` tokens ahead (0 = next).
    pub fn peek_nth(&mut self, n: usize) -> Token<'src> {
        while self.lookahead.len() <= n {
            let token = self.scan_token();
            self.lookahead.push_back(token);
        }
        self.lookahead[n]
    }

    // =========================================
    // Internal: Token scanning
    // =========================================

    fn scan_token(&mut self) -> Token<'src> {
        if let Some(error) = self.skip_trivia() {
            return self.make_error(error);
        }

        let start = self.cursor.mark();
        let Some(c) = self.cursor.first() else {
            return Token::new(TokenKind::Eof, "", self.cursor.span_since(start));
        };

        match c {
            '"' => self.scan_string(start),
            c if is_word_start(c) => {
                self.cursor.bump_while(is_word_char);
                let kind = lookup_keyword(self.cursor.text_since(start))
                    .unwrap_or(TokenKind::Identifier);
                self.make_token(kind, start)
            }
            _ => self.scan_punct(start),
        }
    }

    /// Skip whitespace and comments.
    ///
    /// Returns an error for an unterminated block comment.
    fn skip_trivia(&mut self) -> Option<ScheduleError> {
        loop {
            self.cursor.bump_while(char::is_whitespace);

            if self.cursor.first() != Some('/') {
                return None;
            }

            match self.cursor.second() {
                Some('/') => self.cursor.bump_while(|c| c != '\n'),
                Some('*') => {
                    let start = self.cursor.mark();
                    self.cursor.bump();
                    self.cursor.bump();
                    let opener = self.cursor.span_since(start);
                    loop {
                        match self.cursor.bump() {
                            None => {
                                return Some(ScheduleError::new(
                                    ScheduleErrorKind::UnterminatedComment,
                                    opener,
                                    "block comment is never closed",
                                ));
                            }
                            Some('*') if self.cursor.bump_if('/') => break,
                            Some(_) => {}
                        }
                    }
                }
                _ => return None,
            }
        }
    }

    fn scan_string(&mut self, start: Mark) -> Token<'src> {
        self.cursor.bump(); // opening quote

        loop {
            match self.cursor.bump() {
                None | Some('\n') => {
                    return self.make_error(ScheduleError::new(
                        ScheduleErrorKind::UnterminatedString,
                        self.cursor.span_since(start),
                        "string literal is never closed",
                    ));
                }
                Some('\\') => {
                    self.cursor.bump();
                }
                Some('"') => break,
                Some(_) => {}
            }
        }

        self.make_token(TokenKind::StringLiteral, start)
    }

    fn scan_punct(&mut self, start: Mark) -> Token<'src> {
        let kind = match self.cursor.bump() {
            Some('=') => TokenKind::Equal,
            Some(',') => TokenKind::Comma,
            Some(';') => TokenKind::Semicolon,
            Some(':') => TokenKind::Colon,
            Some('.') => TokenKind::Dot,
            Some('(') => TokenKind::LeftParen,
            Some(')') => TokenKind::RightParen,
            other => {
                return self.make_error(ScheduleError::new(
                    ScheduleErrorKind::UnexpectedChar,
                    self.cursor.span_since(start),
                    format!("unexpected character '{}'", other.unwrap_or('\0')),
                ));
            }
        };
        self.make_token(kind, start)
    }

    fn make_token(&self, kind: TokenKind, start: Mark) -> Token<'src> {
        let lexeme = self.cursor.text_since(start);
        Token::new(kind, lexeme, self.cursor.span_since(start))
    }

    fn make_error(&mut self, error: ScheduleError) -> Token<'src> {
        let span = error.span;
        self.errors.push(error);
        Token::new(TokenKind::Error, "", span)
    }
}

fn is_word_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Decode the escapes of a string literal lexeme (quotes included).
pub fn unescape(lexeme: &str) -> String {
    let inner = lexeme
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(lexeme);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use spire_core::Span;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(source);
        let mut kinds = Vec::new();
        loop {
            let token = lexer.next_token();
            kinds.push(token.kind);
            if token.kind == TokenKind::Eof {
                break;
            }
        }
        kinds
    }

    #[test]
    fn lexes_choice_line() {
        use TokenKind::*;
        assert_eq!(
            kinds("light.model = fs:phong, vs;"),
            vec![
                Identifier, Dot, Identifier, Equal, Identifier, Colon, Identifier, Comma,
                Identifier, Semicolon, Eof
            ]
        );
    }

    #[test]
    fn skips_comments() {
        use TokenKind::*;
        assert_eq!(
            kinds("// header\n/* block\n comment */ attrib"),
            vec![Attrib, Eof]
        );
    }

    #[test]
    fn string_spans_and_escapes() {
        let mut lexer = Lexer::new("  \"a\\\"b\"");
        let token = lexer.next_token();
        assert_eq!(token.kind, TokenKind::StringLiteral);
        assert_eq!(token.span, Span::new(1, 3, 6));
        assert_eq!(unescape(token.lexeme), "a\"b");
    }

    #[test]
    fn reports_unexpected_char() {
        let mut lexer = Lexer::new("a # b");
        assert_eq!(lexer.next_token().kind, TokenKind::Identifier);
        assert_eq!(lexer.next_token().kind, TokenKind::Error);
        assert_eq!(lexer.next_token().kind, TokenKind::Identifier);
        let errors = lexer.take_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ScheduleErrorKind::UnexpectedChar);
        assert_eq!(errors[0].span, Span::new(1, 3, 1));
    }

    #[test]
    fn reports_unterminated_string() {
        let mut lexer = Lexer::new("\"open");
        assert_eq!(lexer.next_token().kind, TokenKind::Error);
        assert_eq!(
            lexer.take_errors()[0].kind,
            ScheduleErrorKind::UnterminatedString
        );
    }
}
