//! Protobuf Lexer
//!
//! Two-stage lexer: a logos-derived raw tokenizer (whitespace and comments
//! are tokens, not skipped) followed by a cooking pass that builds the
//! semantic token stream and the trivia table consumed by the parser and
//! formatter.
//!
//! Lexing never fails: unexpected characters, unterminated strings, and
//! unterminated block comments are reported as [`LexError`]s while the
//! stream continues best-effort, so live-editor buffers always produce a
//! usable token stream.

mod cook;
mod raw;

use pb_ast::TokenId;
use thiserror::Error;

pub use cook::{decode_string, lex, parse_float, parse_uint, LexOutput};

/// Kind of a cooked semantic token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    IntLit,
    FloatLit,
    StrLit,
    /// Any punctuation rune (`;`, `=`, `{`, …).
    Rune(char),
    /// End-of-file sentinel; owns the file's trailing trivia.
    Eof,
}

/// A cooked token: its kind plus the id of its trivia-table entry.
#[derive(Clone, Copy, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub id: TokenId,
}

/// Lexical diagnostic. Lines and columns are 1-based for display.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("{line}:{col}: unexpected character {ch:?}")]
    UnexpectedChar { ch: char, line: u32, col: u32 },
    #[error("{line}:{col}: unterminated string literal")]
    UnterminatedString { line: u32, col: u32 },
    #[error("{line}:{col}: unterminated block comment")]
    UnterminatedComment { line: u32, col: u32 },
}
