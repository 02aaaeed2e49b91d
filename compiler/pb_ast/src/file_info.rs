//! Token and Trivia Index
//!
//! The CST keeps every token's surrounding trivia (whitespace runs and
//! comments) in a side table rather than on the nodes themselves. Nodes
//! store [`TokenId`]s; [`FileInfo::node_info`] resolves a node to its
//! leading comments, trailing comments, leading whitespace, and raw text.

use std::fmt;

/// Index of a token in a file's [`FileInfo`] table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenId(pub u32);

impl TokenId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Comment delimiter style.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommentStyle {
    /// `// ...` to end of line.
    Line,
    /// `/* ... */`, possibly spanning lines.
    Block,
}

/// A single source comment with the whitespace that preceded it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Comment {
    /// Exact source text including delimiters.
    pub raw: String,
    /// Whitespace run immediately before the comment, verbatim.
    pub leading_ws: String,
    /// Synthesized during error recovery; never printed inline.
    pub is_virtual: bool,
}

impl Comment {
    pub fn new(raw: impl Into<String>, leading_ws: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            leading_ws: leading_ws.into(),
            is_virtual: false,
        }
    }

    pub fn style(&self) -> CommentStyle {
        if self.raw.starts_with("//") {
            CommentStyle::Line
        } else {
            CommentStyle::Block
        }
    }
}

/// Everything recorded about one semantic token.
#[derive(Clone, Debug, Default)]
pub struct TokenInfo {
    /// Exact source slice for the token.
    pub raw: String,
    /// Whitespace between the previous comment (or token) and this token.
    pub leading_ws: String,
    /// Comments attributed to this token as leading.
    pub leading: Vec<Comment>,
    /// Comments attributed to this token as trailing (same line, after).
    pub trailing: Vec<Comment>,
    /// Byte offset of the token start in the source.
    pub offset: usize,
    /// 0-based line of the token start.
    pub line: u32,
    /// 0-based column of the token start.
    pub col: u32,
}

/// Borrowed view of a node's trivia, resolved positionally.
#[derive(Clone, Copy, Debug)]
pub struct NodeInfo<'a> {
    pub leading_comments: &'a [Comment],
    pub trailing_comments: &'a [Comment],
    pub leading_ws: &'a str,
    pub raw: &'a str,
}

impl NodeInfo<'_> {
    /// Info for a virtual node: no trivia, no text.
    pub const EMPTY: NodeInfo<'static> = NodeInfo {
        leading_comments: &[],
        trailing_comments: &[],
        leading_ws: "",
        raw: "",
    };

    pub fn has_comments(&self) -> bool {
        !self.leading_comments.is_empty() || !self.trailing_comments.is_empty()
    }
}

/// Per-file token and trivia table.
///
/// Built by the lexer's cooking pass; read-only afterwards. Outlives any
/// formatting run over the same file.
#[derive(Debug, Default)]
pub struct FileInfo {
    tokens: Vec<TokenInfo>,
}

impl FileInfo {
    pub fn new(tokens: Vec<TokenInfo>) -> Self {
        Self { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn token(&self, id: TokenId) -> &TokenInfo {
        &self.tokens[id.index()]
    }

    /// Trivia view spanning from `start`'s leading edge to `end`'s trailing
    /// edge. Raw text is the start token's slice (only meaningful for
    /// single-token nodes, which is the only place the formatter reads it).
    pub fn span_info(&self, start: TokenId, end: TokenId) -> NodeInfo<'_> {
        let first = self.token(start);
        let last = self.token(end);
        NodeInfo {
            leading_comments: &first.leading,
            trailing_comments: &last.trailing,
            leading_ws: &first.leading_ws,
            raw: &first.raw,
        }
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_style_detection() {
        assert_eq!(Comment::new("// x", " ").style(), CommentStyle::Line);
        assert_eq!(Comment::new("/* x */", "").style(), CommentStyle::Block);
    }

    #[test]
    fn span_info_resolves_edges() {
        let mut a = TokenInfo {
            raw: "message".into(),
            leading_ws: "\n\n".into(),
            ..Default::default()
        };
        a.leading.push(Comment::new("// doc", ""));
        let mut b = TokenInfo {
            raw: ";".into(),
            ..Default::default()
        };
        b.trailing.push(Comment::new("// after", " "));

        let info = FileInfo::new(vec![a, b]);
        let span = info.span_info(TokenId(0), TokenId(1));
        assert_eq!(span.leading_comments.len(), 1);
        assert_eq!(span.trailing_comments.len(), 1);
        assert_eq!(span.leading_ws, "\n\n");
        assert_eq!(span.raw, "message");
    }

    #[test]
    fn empty_info_is_blank() {
        let info = NodeInfo::EMPTY;
        assert!(!info.has_comments());
        assert_eq!(info.raw, "");
    }
}
