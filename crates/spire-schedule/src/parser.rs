//! Recursive-descent parser for schedule files.
//!
//! ```text
//! schedule  := entry*
//! entry     := choice '=' selection (',' selection)* ';'
//!            | 'attrib' choice '(' (attr (',' attr)*)? ')' ';'
//! choice    := IDENT ('.' IDENT)*
//! selection := IDENT (':' IDENT)?
//! attr      := IDENT '=' STRING
//! ```
//!
//! An entry is only added to the [`Schedule`] once it parsed completely.
//! After an error the parser skips to the next `;` and continues.

use spire_core::{ScheduleError, Span};

use crate::lexer::{Lexer, Token, TokenKind, unescape};
use crate::schedule::{Schedule, Selection};

pub struct ScheduleParser<'src> {
    lexer: Lexer<'src>,
    errors: Vec<ScheduleError>,
    /// The failing token was an error token the lexer already reported.
    lexer_reported: bool,
}

enum Entry {
    Choice(String, Vec<Selection>),
    Attrib(String, Vec<(String, String)>),
}

impl<'src> ScheduleParser<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            lexer: Lexer::new(source),
            errors: Vec::new(),
            lexer_reported: false,
        }
    }

    /// Parse the whole input, returning the schedule and every error found.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn parse(mut self) -> (Schedule, Vec<ScheduleError>) {
        let mut schedule = Schedule::new();

        while self.lexer.peek().kind != TokenKind::Eof {
            match self.parse_entry() {
                Ok(Entry::Choice(name, selections)) => {
                    for selection in selections {
                        schedule.add_selection(name.clone(), selection);
                    }
                }
                Ok(Entry::Attrib(name, attributes)) => {
                    let overrides = schedule.attributes.entry(name).or_default();
                    for (key, value) in attributes {
                        overrides.insert(key, value);
                    }
                }
                Err(error) => {
                    if !std::mem::take(&mut self.lexer_reported) {
                        self.errors.push(error);
                    }
                    self.recover();
                }
            }
        }

        let mut errors = self.lexer.take_errors();
        errors.append(&mut self.errors);
        errors.sort_by_key(|e| (e.span.line, e.span.col));
        (schedule, errors)
    }

    fn parse_entry(&mut self) -> Result<Entry, ScheduleError> {
        // `attrib` followed by `=` or `.` is a choice that happens to be named `attrib`.
        if self.lexer.peek().kind == TokenKind::Attrib
            && !matches!(self.lexer.peek_nth(1).kind, TokenKind::Equal | TokenKind::Dot)
        {
            self.lexer.next_token();
            return self.parse_attrib();
        }

        let (name, _) = self.parse_choice_name()?;
        self.expect(TokenKind::Equal, "'='")?;

        let mut selections = vec![self.parse_selection()?];
        while self.lexer.peek().kind == TokenKind::Comma {
            self.lexer.next_token();
            selections.push(self.parse_selection()?);
        }
        self.expect(TokenKind::Semicolon, "';'")?;

        Ok(Entry::Choice(name, selections))
    }

    fn parse_attrib(&mut self) -> Result<Entry, ScheduleError> {
        let (name, _) = self.parse_choice_name()?;
        self.expect(TokenKind::LeftParen, "'('")?;

        let mut attributes = Vec::new();
        if self.lexer.peek().kind != TokenKind::RightParen {
            loop {
                let key = self.expect_name("attribute name")?;
                self.expect(TokenKind::Equal, "'='")?;
                let value = self.expect(TokenKind::StringLiteral, "string value")?;
                attributes.push((key.lexeme.to_string(), unescape(value.lexeme)));

                if self.lexer.peek().kind != TokenKind::Comma {
                    break;
                }
                self.lexer.next_token();
            }
        }

        self.expect(TokenKind::RightParen, "')'")?;
        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(Entry::Attrib(name, attributes))
    }

    fn parse_choice_name(&mut self) -> Result<(String, Span), ScheduleError> {
        let first = self.expect_name("choice name")?;
        let mut name = first.lexeme.to_string();
        let mut span = first.span;

        while self.lexer.peek().kind == TokenKind::Dot {
            self.lexer.next_token();
            let segment = self.expect_name("identifier after '.'")?;
            name.push('.');
            name.push_str(segment.lexeme);
            span = span.through(segment.span);
        }

        Ok((name, span))
    }

    fn parse_selection(&mut self) -> Result<Selection, ScheduleError> {
        let world = self.expect_name("world name")?;
        let mut span = world.span;
        let mut alternate = None;

        if self.lexer.peek().kind == TokenKind::Colon {
            self.lexer.next_token();
            let alt = self.expect_name("alternate name")?;
            span = span.through(alt.span);
            alternate = Some(alt.lexeme.to_string());
        }

        Ok(Selection {
            world: world.lexeme.to_string(),
            alternate,
            span,
        })
    }

    /// An identifier. The `attrib` keyword is only reserved at the start of
    /// an entry, so it is a valid name everywhere else.
    fn expect_name(&mut self, what: &str) -> Result<Token<'src>, ScheduleError> {
        if self.lexer.peek().kind == TokenKind::Attrib {
            return Ok(self.lexer.next_token());
        }
        self.expect(TokenKind::Identifier, what)
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token<'src>, ScheduleError> {
        let token = self.lexer.peek();
        if token.kind == kind {
            return Ok(self.lexer.next_token());
        }
        if token.kind == TokenKind::Error {
            self.lexer_reported = true;
        }
        Err(match token.kind {
            TokenKind::Eof => ScheduleError::unexpected_eof(token.span, what),
            _ => ScheduleError::expected_token(token.span, what, &token.describe()),
        })
    }

    /// Skip past the next `;` (or to end of input).
    fn recover(&mut self) {
        loop {
            match self.lexer.next_token().kind {
                TokenKind::Semicolon | TokenKind::Eof => return,
                _ => {}
            }
        }
    }
}
