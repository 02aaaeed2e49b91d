//! Comment Engine
//!
//! Strategies for placing comments around nodes: multiline blocks above a
//! line start, inline (with `//` rewritten to `/* ... */`), and
//! trailing-end (style preserved, possibly broken onto the next line).
//! Block comments spanning lines are re-indented: shared leading indent is
//! stripped, a common single-character prefix on the middle lines is
//! detected, and an asterisk prefix aligns the closing `*/`.

use pb_ast::{newline_count, Comment};

use crate::emitter::Emitter;
use crate::formatter::{Formatter, PreviousNode};

impl<E: Emitter> Formatter<'_, E> {
    /// Write comments as a newline-delimited block at the current indent,
    /// preserving one blank line wherever the source had a gap.
    pub(crate) fn write_multiline_comments(&mut self, comments: &[Comment]) {
        self.write_multiline_comments_maybe_compact(comments, false);
    }

    pub(crate) fn write_multiline_comments_maybe_compact(
        &mut self,
        comments: &[Comment],
        force_compact: bool,
    ) {
        let mut compact = force_compact || self.previous == PreviousNode::OpenBrace;
        for comment in comments {
            if !compact && newline_count(&comment.leading_ws) > 1 {
                // Blank lines between comment blocks are meaningful.
                self.ctx.p("");
            }
            compact = false;
            self.write_comment(&comment.raw);
            self.ctx.write_str("\n");
        }
    }

    /// Write comments on the current line. Line comments are re-delimited
    /// to block style; block comments spanning lines collapse to one line.
    pub(crate) fn write_inline_comments(&mut self, comments: &[Comment]) {
        for (i, comment) in comments.iter().enumerate() {
            if comment.is_virtual {
                continue;
            }
            if i > 0
                || !comment.leading_ws.is_empty()
                || self.ctx.last_written() == ';'
                || self.ctx.last_written() == '}'
            {
                self.ctx.space();
            }
            let text = if let Some(rest) = comment.raw.strip_prefix("//") {
                format!("/* {} */", rest.trim())
            } else {
                comment
                    .raw
                    .split('\n')
                    .map(str::trim)
                    .collect::<Vec<_>>()
                    .join(" ")
            };
            self.ctx.write_str(&text);
        }
    }

    /// Write comments at the end of a line, preserving their style. A
    /// newline in a comment's leading whitespace breaks first and places
    /// it under the line at the current indent. Always concludes the line.
    pub(crate) fn write_trailing_end_comments(&mut self, comments: &[Comment]) {
        for comment in comments {
            let lws = &comment.leading_ws;
            if !lws.is_empty() {
                if lws.contains('\n') {
                    self.ctx.p("");
                } else {
                    self.ctx.space();
                }
            }
            self.write_comment(&comment.raw);
        }
        self.ctx.p("");
    }

    /// Write one comment, re-indenting multi-line block comments.
    pub(crate) fn write_comment(&mut self, comment: &str) {
        if !(comment.starts_with("/*") && newline_count(comment) > 0) {
            self.ctx.do_indent(None);
            self.ctx.write_str(comment.trim());
            return;
        }

        let lines: Vec<&str> = comment.split('\n').collect();

        // Shared minimum indent of the middle lines, and the common
        // single-character prefix if every middle line carries one.
        let mut min_indent: Option<usize> = None;
        let mut prefix = String::new();
        for (i, line) in lines.iter().enumerate().skip(1) {
            if let Some(indent) = compute_indent(line) {
                min_indent = Some(min_indent.map_or(indent, |m| m.min(indent)));
            }
            if i > 1 && prefix.is_empty() {
                continue;
            }
            let trimmed = line.trim();
            if trimmed == "*/" {
                continue;
            }
            let line_prefix = match trimmed.chars().next() {
                Some(c) if is_comment_prefix(c) => trimmed[..c.len_utf8()].to_string(),
                _ => String::new(),
            };
            if i == 1 {
                prefix = line_prefix;
            } else if line_prefix != prefix {
                prefix.clear();
            }
        }
        let min_indent = min_indent.unwrap_or(0);

        for (i, raw_line) in lines.iter().enumerate() {
            let trimmed = raw_line.trim();
            let mut line = if trimmed.is_empty() || trimmed == "*/" || !prefix.is_empty() {
                trimmed.to_string()
            } else {
                unindent(raw_line, min_indent).trim_end().to_string()
            };

            // Middle lines sit under the opening `/*`: three spaces when
            // there is no prefix, one when the prefix column carries it.
            if i > 0 && line != "*/" {
                if prefix.is_empty() {
                    line = format!("   {line}");
                } else {
                    line = format!(" {line}");
                }
            }
            if line == "*/" && prefix == "*" {
                // Align the comment end with the other asterisks.
                line = format!(" {line}");
            }

            if i != lines.len() - 1 {
                self.ctx.p(&line);
            } else {
                // No trailing newline on the last line; the caller decides
                // how the line concludes.
                self.ctx.do_indent(None);
                self.ctx.write_str(&line);
            }
        }
    }
}

/// A plausible per-line comment prefix: any non-alphanumeric character.
fn is_comment_prefix(c: char) -> bool {
    !c.is_alphabetic() && !c.is_numeric()
}

/// Column width of a line's leading whitespace; `None` for blank lines
/// and the closing `*/` line. Tabs jump to the next 8-column stop.
fn compute_indent(line: &str) -> Option<usize> {
    if line.trim() == "*/" {
        return None;
    }
    let mut indent = 0;
    for c in line.chars() {
        match c {
            ' ' => indent += 1,
            '\t' => indent += 8 - (indent % 8),
            _ => return Some(indent),
        }
    }
    None
}

/// Strip `amount` columns of leading whitespace, padding back when a tab
/// stop overshoots.
fn unindent(line: &str, amount: usize) -> String {
    let mut pos = 0;
    for (i, c) in line.char_indices() {
        if pos == amount {
            return line[i..].to_string();
        }
        if pos > amount {
            // Removing a tab unindented too far; compensate with spaces.
            return format!("{}{}", " ".repeat(pos - amount), &line[i..]);
        }
        match c {
            ' ' => pos += 1,
            '\t' => pos += 8 - (pos % 8),
            _ => return line[i..].to_string(),
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compute_indent_handles_tabs() {
        assert_eq!(compute_indent("    x"), Some(4));
        assert_eq!(compute_indent("\tx"), Some(8));
        assert_eq!(compute_indent("  \tx"), Some(8));
        assert_eq!(compute_indent("   "), None);
        assert_eq!(compute_indent("  */"), None);
    }

    #[test]
    fn unindent_strips_columns() {
        assert_eq!(unindent("    x", 4), "x");
        assert_eq!(unindent("    x", 2), "  x");
        assert_eq!(unindent("\tx", 4), "    x");
        assert_eq!(unindent("x", 4), "x");
    }

    #[test]
    fn comment_prefix_detection() {
        assert!(is_comment_prefix('*'));
        assert!(is_comment_prefix('|'));
        assert!(!is_comment_prefix('a'));
        assert!(!is_comment_prefix('7'));
    }
}
