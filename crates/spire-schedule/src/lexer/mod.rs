//! Lexical analysis for schedule files.

mod cursor;
mod lexer;
mod token;

pub use lexer::{Lexer, unescape};
pub use token::{Token, TokenKind};
