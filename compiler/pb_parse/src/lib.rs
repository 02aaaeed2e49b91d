//! Protobuf CST Parser
//!
//! Tolerant recursive descent over the cooked token stream. The parse
//! never fails: unexpected tokens are skipped with a recorded diagnostic,
//! and missing punctuation is covered by virtual nodes so downstream
//! consumers (the formatter in particular) see a complete tree even for
//! half-typed editor buffers.

mod parser;

use pb_ast::FileNode;
use thiserror::Error;

pub use pb_lexer::LexError;

/// A parse diagnostic. Lines and columns are 1-based for display.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{line}:{col}: {message}")]
pub struct ParseError {
    pub message: String,
    pub line: u32,
    pub col: u32,
}

/// Result of parsing one source file. The tree is always present.
#[derive(Debug)]
pub struct ParseOutput {
    pub file: FileNode,
    pub errors: Vec<ParseError>,
    pub lex_errors: Vec<LexError>,
}

impl ParseOutput {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty() || !self.lex_errors.is_empty()
    }

    /// All diagnostics rendered as display strings, lex first.
    pub fn messages(&self) -> Vec<String> {
        self.lex_errors
            .iter()
            .map(ToString::to_string)
            .chain(self.errors.iter().map(ToString::to_string))
            .collect()
    }
}

/// Parse a `.proto` source into its CST.
pub fn parse(source: &str) -> ParseOutput {
    let lexed = pb_lexer::lex(source);
    let mut parser = parser::Parser::new(&lexed.tokens, &lexed.info);
    let (syntax, edition, decls) = parser.run();
    let errors = parser.take_errors();
    let eof = lexed.eof_id();
    ParseOutput {
        file: FileNode::new(syntax, edition, decls, eof, lexed.info),
        errors,
        lex_errors: lexed.errors,
    }
}
