//! Token Writer
//!
//! The stateful sink every node writer emits through. A requested space is
//! *pending* until the next fragment arrives, at which point one cohesive
//! decision is made against the suppression sets; this is what keeps
//! dangling and doubled spaces out of the output without per-writer
//! bookkeeping. Indentation changes are likewise deferred: brace runes
//! adjust `pending_indent`, which is applied when the current line ends.

use crate::emitter::{Emitter, StringEmitter};
use crate::error::FormatError;

/// NUL sentinel: nothing has been written yet.
const NOTHING_WRITTEN: char = '\0';

/// Mutable emission state threaded through one file's formatting run.
#[derive(Debug)]
pub struct FormatContext<E: Emitter> {
    emitter: E,
    /// Current indentation level (two spaces per level).
    indent: usize,
    /// Last character emitted.
    last_written: char,
    /// A space will be emitted before the next fragment unless suppressed.
    pending_space: bool,
    /// Net open/close scopes on the current line; applied at line end.
    pending_indent: i32,
    /// Inside an inline composite; widens the suppression sets.
    pub(crate) inline: bool,
    /// Inside a `[ ... ]` option list.
    pub(crate) in_compact_options: bool,
    errors: Vec<FormatError>,
}

impl<E: Emitter> FormatContext<E> {
    pub fn new(emitter: E) -> Self {
        Self {
            emitter,
            indent: 0,
            last_written: NOTHING_WRITTEN,
            pending_space: false,
            pending_indent: 0,
            inline: false,
            in_compact_options: false,
            errors: Vec::new(),
        }
    }

    pub fn last_written(&self) -> char {
        self.last_written
    }

    pub fn wrote_anything(&self) -> bool {
        self.last_written != NOTHING_WRITTEN
    }

    /// Request a space before the next fragment.
    pub fn space(&mut self) {
        self.pending_space = true;
    }

    pub(crate) fn clear_pending_space(&mut self) {
        self.pending_space = false;
    }

    pub fn indent_in(&mut self) {
        self.indent += 1;
    }

    pub fn indent_out(&mut self) {
        if self.indent == 0 {
            // Unreachable when writers are balanced.
            self.errors.push(FormatError::Internal(
                "attempted to decrement indentation at zero".into(),
            ));
            return;
        }
        self.indent -= 1;
    }

    pub fn indent_level(&self) -> usize {
        self.indent
    }

    pub(crate) fn bump_pending_indent(&mut self, delta: i32) {
        self.pending_indent += delta;
    }

    /// Write a fragment, resolving any pending space against the
    /// suppression sets first.
    pub fn write_str(&mut self, text: &str) {
        if self.pending_space {
            self.pending_space = false;
            let first = text.chars().next().unwrap_or('\u{fffd}');
            let (prev_block, next_block) = if self.inline {
                ("\0 \t\n<[{(", "\n;,)]}>")
            } else {
                ("\0 \t\n", "\n;,")
            };
            if !prev_block.contains(self.last_written) && !next_block.contains(first) {
                self.emit(" ");
            }
        }
        if text.is_empty() {
            return;
        }
        self.last_written = text.chars().next_back().unwrap_or(NOTHING_WRITTEN);
        self.emit(text);
    }

    /// Emit `text` as a line: indentation (unless `text` is blank), the
    /// text, a newline, then apply the deferred indent delta.
    pub fn p(&mut self, text: &str) {
        if !text.trim().is_empty() {
            self.do_indent(None);
            self.write_str(text);
        }
        self.write_str("\n");

        if self.pending_indent > 0 {
            self.indent_in();
        } else if self.pending_indent < 0 {
            self.indent_out();
        }
        self.pending_indent = 0;
    }

    /// Emit indentation at line start. When the next rune closes a scope,
    /// it sits one level left of the body.
    pub fn do_indent(&mut self, next_rune: Option<char>) {
        if self.last_written != '\n' {
            return;
        }
        let mut indent = self.indent;
        if let Some(c) = next_rune {
            if indent > 0 && "}])>".contains(c) {
                indent -= 1;
            }
        }
        self.write_str(&"  ".repeat(indent));
    }

    fn emit(&mut self, text: &str) {
        if let Err(e) = self.emitter.emit(text) {
            self.errors.push(FormatError::Sink(e));
        }
    }

    pub(crate) fn push_error(&mut self, error: FormatError) {
        self.errors.push(error);
    }

    pub(crate) fn take_errors(&mut self) -> Vec<FormatError> {
        std::mem::take(&mut self.errors)
    }

    pub(crate) fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Snapshot the scalar state onto a fresh context over `emitter`.
    /// Used for speculative rendering; accumulated errors stay behind.
    pub fn save(&self, emitter: StringEmitter) -> FormatContext<StringEmitter> {
        FormatContext {
            emitter,
            indent: self.indent,
            last_written: self.last_written,
            pending_space: self.pending_space,
            pending_indent: self.pending_indent,
            inline: self.inline,
            in_compact_options: self.in_compact_options,
            errors: Vec::new(),
        }
    }

    /// Adopt the scalar state of a speculative context and append its
    /// rendered buffer (already space-resolved) to this sink.
    pub fn merge(&mut self, mut other: FormatContext<StringEmitter>) {
        let errors = other.take_errors();
        let buffer = other.emitter.output();
        self.emit(&buffer);
        self.indent = other.indent;
        self.last_written = other.last_written;
        self.pending_space = other.pending_space;
        self.pending_indent = other.pending_indent;
        self.inline = other.inline;
        self.in_compact_options = other.in_compact_options;
        self.errors.extend(errors);
    }

    pub(crate) fn into_parts(self) -> (E, Vec<FormatError>) {
        (self.emitter, self.errors)
    }
}

impl FormatContext<StringEmitter> {
    /// Drain the buffered output, keeping all state. The column aligner
    /// uses this to slice one speculative rendering into cells.
    pub(crate) fn take_buffer(&mut self) -> String {
        self.emitter.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> FormatContext<StringEmitter> {
        FormatContext::new(StringEmitter::new())
    }

    fn output(ctx: FormatContext<StringEmitter>) -> String {
        ctx.into_parts().0.output()
    }

    #[test]
    fn pending_space_resolves_once() {
        let mut c = ctx();
        c.write_str("a");
        c.space();
        c.space();
        c.write_str("b");
        assert_eq!(output(c), "a b");
    }

    #[test]
    fn space_suppressed_before_punctuation() {
        let mut c = ctx();
        c.write_str("a");
        c.space();
        c.write_str(";");
        c.space();
        c.write_str("\n");
        assert_eq!(output(c), "a;\n");
    }

    #[test]
    fn space_suppressed_after_line_start() {
        let mut c = ctx();
        c.write_str("a");
        c.write_str("\n");
        c.space();
        c.write_str("b");
        assert_eq!(output(c), "a\nb");
    }

    #[test]
    fn inline_widens_suppression_sets() {
        let mut c = ctx();
        c.inline = true;
        c.write_str("(");
        c.space();
        c.write_str("x");
        c.space();
        c.write_str(")");
        assert_eq!(output(c), "(x)");
    }

    #[test]
    fn line_applies_pending_indent() {
        let mut c = ctx();
        c.write_str("{");
        c.bump_pending_indent(1);
        c.p("");
        assert_eq!(c.indent_level(), 1);
        c.do_indent(None);
        c.write_str("x");
        c.write_str("\n");
        c.bump_pending_indent(-1);
        c.p("");
        assert_eq!(c.indent_level(), 0);
        assert_eq!(output(c), "{\n  x\n\n");
    }

    #[test]
    fn closing_rune_dedents_its_own_line() {
        let mut c = ctx();
        c.indent_in();
        c.write_str("x");
        c.write_str("\n");
        c.do_indent(Some('}'));
        c.write_str("}");
        assert_eq!(output(c), "x\n}");
    }

    #[test]
    fn indent_underflow_is_an_internal_error() {
        let mut c = ctx();
        c.indent_out();
        assert!(c.has_errors());
    }

    #[test]
    fn blank_line_has_no_indentation() {
        let mut c = ctx();
        c.indent_in();
        c.write_str("x");
        c.write_str("\n");
        c.p("");
        assert_eq!(output(c), "x\n\n");
    }

    #[test]
    fn save_merge_round_trip() {
        let mut c = ctx();
        c.write_str("a");
        c.space();
        let mut sub = c.save(StringEmitter::new());
        sub.write_str("b");
        sub.indent_in();
        c.merge(sub);
        assert_eq!(c.indent_level(), 1);
        assert_eq!(c.last_written(), 'b');
        assert_eq!(output(c), "a b");
    }
}
