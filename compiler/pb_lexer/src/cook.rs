//! Cooking Pass
//!
//! Converts the raw logos stream into semantic tokens plus the per-file
//! trivia table. Whitespace runs and comments are folded into the
//! following token's leading trivia, then a second pass re-attributes
//! same-line comment runs to the preceding token as trailing comments.

use logos::Logos;
use pb_ast::{Comment, FileInfo, TokenId, TokenInfo};

use crate::raw::RawToken;
use crate::{LexError, Token, TokenKind};

/// Result of lexing one source file.
#[derive(Debug)]
pub struct LexOutput {
    /// Semantic tokens in order; the last entry is always [`TokenKind::Eof`].
    pub tokens: Vec<Token>,
    /// Trivia table parallel to `tokens`.
    pub info: FileInfo,
    /// Best-effort diagnostics; lexing never fails outright.
    pub errors: Vec<LexError>,
}

impl LexOutput {
    pub fn eof_id(&self) -> TokenId {
        self.tokens
            .last()
            .map(|t| t.id)
            .unwrap_or(TokenId(0))
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Lex a source file into semantic tokens and trivia.
pub fn lex(source: &str) -> LexOutput {
    let mut lexer = RawToken::lexer(source);
    let mut infos: Vec<TokenInfo> = Vec::new();
    let mut tokens: Vec<Token> = Vec::new();
    let mut errors: Vec<LexError> = Vec::new();

    let mut pending_ws = String::new();
    let mut pending_comments: Vec<Comment> = Vec::new();
    let mut line: u32 = 0;
    let mut col: u32 = 0;

    while let Some(result) = lexer.next() {
        let text = lexer.slice();
        let offset = lexer.span().start;
        let (tok_line, tok_col) = (line, col);
        advance_position(text, &mut line, &mut col);

        let raw = match result {
            Ok(raw) => raw,
            Err(()) => {
                let ch = text.chars().next().unwrap_or('\u{fffd}');
                errors.push(LexError::UnexpectedChar {
                    ch,
                    line: tok_line + 1,
                    col: tok_col + 1,
                });
                continue;
            }
        };

        match raw {
            RawToken::Whitespace => pending_ws.push_str(text),
            RawToken::LineComment | RawToken::BlockComment => {
                if raw == RawToken::BlockComment && !text.ends_with("*/") {
                    errors.push(LexError::UnterminatedComment {
                        line: tok_line + 1,
                        col: tok_col + 1,
                    });
                }
                pending_comments.push(Comment::new(text, std::mem::take(&mut pending_ws)));
            }
            RawToken::UnterminatedStrLit => {
                errors.push(LexError::UnterminatedString {
                    line: tok_line + 1,
                    col: tok_col + 1,
                });
                push_token(
                    &mut tokens,
                    &mut infos,
                    TokenKind::StrLit,
                    text,
                    std::mem::take(&mut pending_ws),
                    std::mem::take(&mut pending_comments),
                    offset,
                    tok_line,
                    tok_col,
                );
            }
            RawToken::Ident
            | RawToken::IntLit
            | RawToken::FloatLit
            | RawToken::StrLit
            | RawToken::Punct => {
                let kind = match raw {
                    RawToken::Ident => TokenKind::Ident,
                    RawToken::IntLit => TokenKind::IntLit,
                    RawToken::FloatLit => TokenKind::FloatLit,
                    RawToken::StrLit => TokenKind::StrLit,
                    RawToken::Punct => TokenKind::Rune(text.chars().next().unwrap_or('?')),
                    _ => unreachable!(),
                };
                push_token(
                    &mut tokens,
                    &mut infos,
                    kind,
                    text,
                    std::mem::take(&mut pending_ws),
                    std::mem::take(&mut pending_comments),
                    offset,
                    tok_line,
                    tok_col,
                );
            }
        }
    }

    // EOF sentinel owns the file's trailing trivia.
    push_token(
        &mut tokens,
        &mut infos,
        TokenKind::Eof,
        "",
        pending_ws,
        pending_comments,
        source.len(),
        line,
        col,
    );

    attribute_trailing_comments(&tokens, &mut infos);

    LexOutput {
        tokens,
        info: FileInfo::new(infos),
        errors,
    }
}

#[allow(clippy::too_many_arguments)]
fn push_token(
    tokens: &mut Vec<Token>,
    infos: &mut Vec<TokenInfo>,
    kind: TokenKind,
    raw: &str,
    leading_ws: String,
    leading: Vec<Comment>,
    offset: usize,
    line: u32,
    col: u32,
) {
    let id = TokenId(infos.len() as u32);
    infos.push(TokenInfo {
        raw: raw.to_string(),
        leading_ws,
        leading,
        trailing: Vec::new(),
        offset,
        line,
        col,
    });
    tokens.push(Token { kind, id });
}

fn advance_position(text: &str, line: &mut u32, col: &mut u32) {
    for ch in text.chars() {
        if ch == '\n' {
            *line += 1;
            *col = 0;
        } else {
            *col += 1;
        }
    }
}

/// Move same-line comment runs onto the previous token as trailing
/// comments.
///
/// A comment run at the head of token `U`'s leading list is re-attributed
/// to the previous token `T` when it starts on `T`'s line (no newline in
/// the first comment's leading whitespace), unless the entire run and `U`
/// itself sit on that same line — those stay leading of `U` and render
/// inline. The EOF sentinel never keeps a same-line run; `} // done` at
/// the end of a file trails the `}`.
fn attribute_trailing_comments(tokens: &[Token], infos: &mut [TokenInfo]) {
    for i in 1..infos.len() {
        let count = infos[i].leading.len();
        if count == 0 {
            continue;
        }
        let same_line = infos[i].leading[..count]
            .iter()
            .take_while(|c| !c.leading_ws.contains('\n'))
            .count();
        if same_line == 0 {
            continue;
        }
        let fully_inline = same_line == count
            && !infos[i].leading_ws.contains('\n')
            && tokens[i].kind != TokenKind::Eof;
        if fully_inline {
            continue;
        }
        let moved: Vec<Comment> = infos[i].leading.drain(..same_line).collect();
        infos[i - 1].trailing.extend(moved);
    }
}

/// Decode a Protobuf string literal's contents (quotes stripped, escapes
/// resolved). Tolerant of unterminated literals.
pub fn decode_string(raw: &str) -> String {
    let body = strip_quotes(raw);
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('a') => out.push('\u{7}'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('v') => out.push('\u{b}'),
            Some('?') => out.push('?'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('x') | Some('X') => {
                let mut value = 0u32;
                let mut any = false;
                while let Some(c) = chars.peek().copied() {
                    if let Some(d) = c.to_digit(16) {
                        if any && value >= 0x10 {
                            break;
                        }
                        value = value * 16 + d;
                        any = true;
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push(char::from_u32(value).unwrap_or('\u{fffd}'));
            }
            Some('u') => push_unicode(&mut chars, 4, &mut out),
            Some('U') => push_unicode(&mut chars, 8, &mut out),
            Some(c @ '0'..='7') => {
                let mut value = c.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(d) => {
                            value = value * 8 + d;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(value).unwrap_or('\u{fffd}'));
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn strip_quotes(raw: &str) -> &str {
    let bytes = raw.as_bytes();
    if bytes.is_empty() {
        return raw;
    }
    let quote = bytes[0];
    if quote != b'"' && quote != b'\'' {
        return raw;
    }
    if bytes.len() >= 2 && bytes[bytes.len() - 1] == quote {
        &raw[1..raw.len() - 1]
    } else {
        &raw[1..]
    }
}

fn push_unicode(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, digits: usize, out: &mut String) {
    let mut value = 0u32;
    for _ in 0..digits {
        match chars.peek().and_then(|c| c.to_digit(16)) {
            Some(d) => {
                value = value * 16 + d;
                chars.next();
            }
            None => break,
        }
    }
    out.push(char::from_u32(value).unwrap_or('\u{fffd}'));
}

/// Parse an integer literal in any proto base (decimal, 0-octal, 0x-hex).
pub fn parse_uint(raw: &str) -> Option<u64> {
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else if raw.len() > 1 && raw.starts_with('0') {
        u64::from_str_radix(&raw[1..], 8).ok()
    } else {
        raw.parse().ok()
    }
}

/// Parse a float literal; returns 0.0 when unparseable (raw text is what
/// the formatter prints, so the value is informational only).
pub fn parse_float(raw: &str) -> f64 {
    raw.parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trivia_attaches_to_following_token() {
        let out = lex("// doc\nmessage Foo {}");
        assert!(!out.has_errors());
        let first = out.info.token(out.tokens[0].id);
        assert_eq!(first.raw, "message");
        assert_eq!(first.leading.len(), 1);
        assert_eq!(first.leading[0].raw, "// doc");
    }

    #[test]
    fn same_line_comment_trails_previous_token() {
        let out = lex("int32 a = 1; // trailing\nint32 b = 2;");
        let semi = out
            .tokens
            .iter()
            .find(|t| t.kind == TokenKind::Rune(';'))
            .unwrap();
        let info = out.info.token(semi.id);
        assert_eq!(info.trailing.len(), 1);
        assert_eq!(info.trailing[0].raw, "// trailing");
        // and the next declaration has no stolen comments
        let b_ty = out
            .tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Ident)
            .nth(2)
            .unwrap();
        assert_eq!(out.info.token(b_ty.id).raw, "int32");
        assert!(out.info.token(b_ty.id).leading.is_empty());
    }

    #[test]
    fn inline_comment_run_stays_leading() {
        // Entirely on one line: the comment renders inline before `bar`.
        let out = lex("foo /* note */ bar");
        let bar = out.tokens[1];
        let info = out.info.token(bar.id);
        assert_eq!(info.leading.len(), 1);
        assert_eq!(info.leading[0].raw, "/* note */");
    }

    #[test]
    fn mid_compound_comment_trails_the_dot() {
        let out = lex(".google. // note\n  protobuf");
        let second_dot = out
            .tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Rune('.'))
            .nth(1)
            .unwrap();
        let info = out.info.token(second_dot.id);
        assert_eq!(info.trailing.len(), 1);
    }

    #[test]
    fn eof_owns_file_trailing_comments() {
        let out = lex("message Foo {}\n// the end\n");
        let eof = out.info.token(out.eof_id());
        assert_eq!(eof.leading.len(), 1);
        assert_eq!(eof.leading[0].raw, "// the end");
    }

    #[test]
    fn eof_takes_final_same_line_comment_as_trailing_of_last_token() {
        let out = lex("message Foo {} // done");
        let close = out
            .tokens
            .iter()
            .find(|t| t.kind == TokenKind::Rune('}'))
            .unwrap();
        assert_eq!(out.info.token(close.id).trailing.len(), 1);
    }

    #[test]
    fn blank_lines_survive_in_leading_whitespace() {
        let out = lex("int32 a = 1;\n\nint32 b = 2;");
        let b_ty = out
            .tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Ident)
            .nth(2)
            .unwrap();
        assert_eq!(out.info.token(b_ty.id).leading_ws, "\n\n");
    }

    #[test]
    fn decode_string_handles_escapes() {
        assert_eq!(decode_string(r#""a\nb""#), "a\nb");
        assert_eq!(decode_string(r#"'quote\''"#), "quote'");
        assert_eq!(decode_string(r#""\x41""#), "A");
        assert_eq!(decode_string(r#""\101""#), "A");
        assert_eq!(decode_string(r#""plain""#), "plain");
    }

    #[test]
    fn parse_uint_bases() {
        assert_eq!(parse_uint("42"), Some(42));
        assert_eq!(parse_uint("0x2A"), Some(42));
        assert_eq!(parse_uint("052"), Some(42));
        assert_eq!(parse_uint("0"), Some(0));
    }

    #[test]
    fn unexpected_char_is_reported_and_skipped() {
        let out = lex("int32 @ x");
        assert!(out.has_errors());
        assert_eq!(
            out.tokens.iter().filter(|t| t.kind == TokenKind::Ident).count(),
            2
        );
    }

    #[test]
    fn positions_are_tracked() {
        let out = lex("a\n  b");
        let b = out.tokens[1];
        let info = out.info.token(b.id);
        assert_eq!(info.line, 1);
        assert_eq!(info.col, 2);
    }
}
