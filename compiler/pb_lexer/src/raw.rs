//! Raw Tokenizer
//!
//! The logos-derived first pass. Whitespace and comments are real tokens
//! here (not skipped) so the cooking pass can preserve them as trivia.

use logos::{Lexer, Logos};

fn lex_block_comment(lex: &mut Lexer<RawToken>) -> bool {
    let remainder = lex.remainder();
    match remainder.find("*/") {
        Some(end) => lex.bump(end + 2),
        // Unterminated; consume to EOF and let the cooker diagnose it.
        None => lex.bump(remainder.len()),
    }
    true
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RawToken {
    #[regex(r"[ \t\r\n\x0b\x0c]+")]
    Whitespace,

    #[regex(r"//[^\n]*")]
    LineComment,

    #[token("/*", lex_block_comment)]
    BlockComment,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    #[regex(r"0[xX][0-9a-fA-F]+")]
    #[regex(r"[0-9]+")]
    IntLit,

    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?")]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?")]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+")]
    FloatLit,

    #[regex(r#""([^"\\\n]|\\[^\n])*""#)]
    #[regex(r"'([^'\\\n]|\\[^\n])*'")]
    StrLit,

    #[regex(r#""([^"\\\n]|\\[^\n])*"#)]
    #[regex(r"'([^'\\\n]|\\[^\n])*")]
    UnterminatedStrLit,

    #[regex(r"[;,={}\[\]()<>.\-+/:]")]
    Punct,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<RawToken> {
        RawToken::lexer(source).map(|t| t.unwrap()).collect()
    }

    #[test]
    fn lexes_simple_field() {
        assert_eq!(
            kinds("int32 x = 1;"),
            vec![
                RawToken::Ident,
                RawToken::Whitespace,
                RawToken::Ident,
                RawToken::Whitespace,
                RawToken::Punct,
                RawToken::Whitespace,
                RawToken::IntLit,
                RawToken::Punct,
            ]
        );
    }

    #[test]
    fn float_wins_over_dot() {
        assert_eq!(kinds(".5"), vec![RawToken::FloatLit]);
        assert_eq!(kinds("."), vec![RawToken::Punct]);
    }

    #[test]
    fn comments_win_over_slash() {
        assert_eq!(kinds("// x"), vec![RawToken::LineComment]);
        assert_eq!(kinds("/* x */"), vec![RawToken::BlockComment]);
        assert_eq!(kinds("/"), vec![RawToken::Punct]);
    }

    #[test]
    fn block_comment_spans_lines() {
        let mut lex = RawToken::lexer("/* a\n b */ x");
        assert_eq!(lex.next(), Some(Ok(RawToken::BlockComment)));
        assert_eq!(lex.slice(), "/* a\n b */");
    }

    #[test]
    fn unterminated_string_still_tokenizes() {
        assert_eq!(kinds("\"abc"), vec![RawToken::UnterminatedStrLit]);
        assert_eq!(kinds("\"abc\""), vec![RawToken::StrLit]);
    }

    #[test]
    fn hex_and_octal_ints() {
        assert_eq!(kinds("0xFF"), vec![RawToken::IntLit]);
        assert_eq!(kinds("0755"), vec![RawToken::IntLit]);
    }
}
