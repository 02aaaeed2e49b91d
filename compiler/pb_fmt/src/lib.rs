//! Protobuf Formatter
//!
//! Canonical, comment-preserving rendering of a `.proto` CST.
//!
//! # Quick Start
//!
//! ```ignore
//! let parsed = pb_parse::parse(source);
//! let result = pb_fmt::format_file(&parsed.file);
//! print!("{}", result.text);
//! ```
//!
//! # Architecture
//!
//! A single-threaded streaming emitter driven by a recursive walk of the
//! CST, in dependency order:
//!
//! 1. **Token writer** ([`context`]): pending-space and deferred-indent
//!    state machine over an [`Emitter`] sink.
//! 2. **Comment engine** ([`comments`]): multiline / inline /
//!    trailing-end placement, `//` ↔ `/* */` re-delimiting, block-comment
//!    re-indentation.
//! 3. **Node writers** ([`declarations`], [`literals`]): one writer per
//!    CST variant, choosing single-line vs multi-line and compact vs
//!    expanded layout.
//! 4. **Column aligner** ([`columns`]): field-like sibling runs padded
//!    into columns, split by comment boundaries and a gofmt-inherited
//!    size heuristic.
//! 5. **Header orderer** ([`header`]): sorted imports (deduplicated) and
//!    file options.
//!
//! The formatter is total over partial CSTs from live editing: missing
//! separators and delimiters are synthesized on the way out, never by
//! mutating the tree. Any accumulated error indicates a bug or a failing
//! sink; the partial output is still safe to render.

pub mod columns;
pub mod comments;
pub mod context;
pub mod declarations;
pub mod emitter;
pub mod error;
pub mod formatter;
pub mod header;
pub mod literals;

use std::io;

use pb_ast::FileNode;

pub use context::FormatContext;
pub use emitter::{Emitter, StringEmitter, WriteEmitter};
pub use error::FormatError;
pub use formatter::Formatter;

/// Output of one formatting run. `text` is always usable; `error`
/// reports accumulated internal or sink failures, any of which indicates
/// a defect rather than bad input.
#[derive(Debug)]
pub struct FormatResult {
    pub text: String,
    pub error: Option<FormatError>,
}

impl FormatResult {
    /// Treat accumulated errors as fatal.
    pub fn into_result(self) -> Result<String, FormatError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.text),
        }
    }
}

/// Format a parsed file to a string.
pub fn format_file(file: &FileNode) -> FormatResult {
    let mut formatter = Formatter::new(file, StringEmitter::new());
    formatter.run();
    let (emitter, error) = formatter.finish();
    FormatResult {
        text: emitter.output(),
        error,
    }
}

/// Format a parsed file into a byte sink. Output already written stays
/// written when an error is reported.
pub fn format_to_writer<W: io::Write>(file: &FileNode, writer: W) -> Result<(), FormatError> {
    let mut formatter = Formatter::new(file, WriteEmitter::new(writer));
    formatter.run();
    let (_, error) = formatter.finish();
    match error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
