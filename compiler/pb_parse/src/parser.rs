//! Grammar
//!
//! Hand-written recursive descent. Each `parse_*` function either consumes
//! tokens and returns a node, or returns `None` without progress and lets
//! the enclosing block-loop skip one token with a diagnostic. Missing
//! punctuation becomes a virtual [`RuneNode`]; missing names abort the
//! enclosing declaration instead of fabricating identifiers.

use pb_ast::*;
use pb_lexer::{decode_string, parse_float, parse_uint, Token, TokenKind};

use crate::ParseError;

const LABELS: &[&str] = &["optional", "required", "repeated"];

pub(crate) struct Parser<'a> {
    tokens: &'a [Token],
    info: &'a FileInfo,
    pos: usize,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(tokens: &'a [Token], info: &'a FileInfo) -> Self {
        Self {
            tokens,
            info,
            pos: 0,
            errors: Vec::new(),
        }
    }

    pub(crate) fn take_errors(&mut self) -> Vec<ParseError> {
        std::mem::take(&mut self.errors)
    }

    // -- cursor --

    fn peek_at(&self, n: usize) -> Token {
        let idx = (self.pos + n).min(self.tokens.len().saturating_sub(1));
        self.tokens[idx]
    }

    fn peek(&self) -> Token {
        self.peek_at(0)
    }

    fn at_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn text_of(&self, tok: Token) -> &'a str {
        &self.info.token(tok.id).raw
    }

    fn cur_text(&self) -> &'a str {
        self.text_of(self.peek())
    }

    fn bump(&mut self) -> Token {
        let tok = self.peek();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn at_rune(&self, c: char) -> bool {
        self.peek().kind == TokenKind::Rune(c)
    }

    fn at_ident(&self) -> bool {
        self.peek().kind == TokenKind::Ident
    }

    fn at_keyword(&self, kw: &str) -> bool {
        self.at_ident() && self.cur_text() == kw
    }

    fn bump_rune(&mut self) -> RuneNode {
        let tok = self.bump();
        match tok.kind {
            TokenKind::Rune(c) => RuneNode::new(c, tok.id),
            _ => RuneNode::synthetic('?'),
        }
    }

    fn take_rune(&mut self, c: char) -> Option<RuneNode> {
        if self.at_rune(c) {
            Some(self.bump_rune())
        } else {
            None
        }
    }

    /// Take `c` or synthesize it silently (live-editor recovery policy).
    fn rune_or_virtual(&mut self, c: char) -> RuneNode {
        self.take_rune(c).unwrap_or_else(|| RuneNode::synthetic(c))
    }

    /// Take `c` or synthesize it with a diagnostic.
    fn expect_rune(&mut self, c: char) -> RuneNode {
        match self.take_rune(c) {
            Some(r) => r,
            None => {
                self.error_here(format!("expected `{c}`"));
                RuneNode::synthetic(c)
            }
        }
    }

    fn take_ident(&mut self) -> Option<IdentNode> {
        if !self.at_ident() {
            return None;
        }
        let tok = self.bump();
        Some(IdentNode {
            value: self.text_of(tok).to_string(),
            token: tok.id,
        })
    }

    fn expect_ident(&mut self, what: &str) -> Option<IdentNode> {
        let ident = self.take_ident();
        if ident.is_none() {
            self.error_here(format!("expected {what}"));
        }
        ident
    }

    fn error_here(&mut self, message: impl Into<String>) {
        let info = self.info.token(self.peek().id);
        self.errors.push(ParseError {
            message: message.into(),
            line: info.line + 1,
            col: info.col + 1,
        });
    }

    fn skip_token(&mut self, context: &str) {
        let text = self.cur_text().to_string();
        let shown = if text.is_empty() { "<eof>" } else { &text };
        self.error_here(format!("unexpected `{shown}` in {context}"));
        self.bump();
    }

    // -- file --

    pub(crate) fn run(
        &mut self,
    ) -> (Option<SyntaxNode>, Option<EditionNode>, Vec<FileElement>) {
        let mut syntax = None;
        let mut edition = None;
        let mut decls = Vec::new();

        while !self.at_eof() {
            if self.at_rune(';') {
                decls.push(FileElement::Empty(self.bump_rune()));
                continue;
            }
            if !self.at_ident() {
                self.skip_token("file");
                continue;
            }
            match self.cur_text() {
                "syntax" if syntax.is_none() && self.peek_at(1).kind == TokenKind::Rune('=') => {
                    syntax = Some(self.parse_syntax());
                }
                "edition" if edition.is_none() && self.peek_at(1).kind == TokenKind::Rune('=') => {
                    edition = Some(self.parse_edition());
                }
                "package" => {
                    let node = self.parse_package();
                    decls.push(FileElement::Package(node));
                }
                "import" => match self.parse_import() {
                    Some(node) => decls.push(FileElement::Import(node)),
                    None => continue,
                },
                "option" => decls.push(FileElement::Option(self.parse_option_decl())),
                "message" => match self.parse_message() {
                    Some(node) => decls.push(FileElement::Message(node)),
                    None => continue,
                },
                "enum" => match self.parse_enum() {
                    Some(node) => decls.push(FileElement::Enum(node)),
                    None => continue,
                },
                "extend" => decls.push(FileElement::Extend(self.parse_extend())),
                "service" => match self.parse_service() {
                    Some(node) => decls.push(FileElement::Service(node)),
                    None => continue,
                },
                _ => self.skip_token("file"),
            }
        }

        (syntax, edition, decls)
    }

    fn parse_syntax(&mut self) -> SyntaxNode {
        let keyword = self.take_ident().expect("checked");
        let equals = self.expect_rune('=');
        let value = self.string_value();
        if value.is_none() {
            self.error_here("expected syntax string");
        }
        let semicolon = Some(self.rune_or_virtual(';'));
        SyntaxNode {
            keyword,
            equals,
            value,
            semicolon,
        }
    }

    fn parse_edition(&mut self) -> EditionNode {
        let keyword = self.take_ident().expect("checked");
        let equals = self.expect_rune('=');
        let value = self.string_value();
        if value.is_none() {
            self.error_here("expected edition string");
        }
        let semicolon = Some(self.rune_or_virtual(';'));
        EditionNode {
            keyword,
            equals,
            value,
            semicolon,
        }
    }

    fn parse_package(&mut self) -> PackageNode {
        let keyword = self.take_ident().expect("checked");
        let name = if self.at_ident() || self.at_rune('.') {
            self.identifier()
        } else {
            self.error_here("expected package name");
            None
        };
        let semicolon = Some(self.rune_or_virtual(';'));
        PackageNode {
            keyword,
            name,
            semicolon,
        }
    }

    fn parse_import(&mut self) -> Option<ImportNode> {
        let keyword = self.take_ident().expect("checked");
        let modifier = if (self.at_keyword("public") || self.at_keyword("weak"))
            && self.peek_at(1).kind == TokenKind::StrLit
        {
            let kind = if self.cur_text() == "public" {
                ImportModifier::Public
            } else {
                ImportModifier::Weak
            };
            self.take_ident().map(|keyword| ImportModifierNode { kind, keyword })
        } else {
            None
        };
        let Some(name) = self.string_value() else {
            self.error_here("expected import path string");
            return None;
        };
        let semicolon = Some(self.rune_or_virtual(';'));
        Some(ImportNode {
            keyword,
            modifier,
            name,
            semicolon,
        })
    }

    // -- idents and values --

    /// A plain or dotted identifier, optionally with a leading dot.
    fn identifier(&mut self) -> Option<IdentifierNode> {
        let mut parts: Vec<CompoundIdentPart> = Vec::new();
        if self.at_rune('.') {
            parts.push(CompoundIdentPart::Dot(self.bump_rune()));
        }
        loop {
            match self.take_ident() {
                Some(ident) => parts.push(CompoundIdentPart::Ident(ident)),
                None => break,
            }
            if self.at_rune('.') {
                parts.push(CompoundIdentPart::Dot(self.bump_rune()));
            } else {
                break;
            }
        }
        match parts.len() {
            0 => None,
            1 => match parts.pop().expect("len checked") {
                CompoundIdentPart::Ident(i) => Some(IdentifierNode::Ident(i)),
                dot @ CompoundIdentPart::Dot(_) => Some(IdentifierNode::Compound(
                    CompoundIdentNode {
                        components: vec![dot],
                    },
                )),
            },
            _ => Some(IdentifierNode::Compound(CompoundIdentNode {
                components: parts,
            })),
        }
    }

    fn string_value(&mut self) -> Option<StringValueNode> {
        if self.peek().kind != TokenKind::StrLit {
            return None;
        }
        let mut elements = Vec::new();
        while self.peek().kind == TokenKind::StrLit {
            let tok = self.bump();
            elements.push(StringLiteralNode {
                value: decode_string(self.text_of(tok)),
                token: tok.id,
            });
        }
        if elements.len() == 1 {
            Some(StringValueNode::Single(elements.pop().expect("len checked")))
        } else {
            Some(StringValueNode::Compound(CompoundStringLiteralNode {
                elements,
            }))
        }
    }

    fn parse_value(&mut self) -> Option<ValueNode> {
        match self.peek().kind {
            TokenKind::StrLit => Some(match self.string_value().expect("checked") {
                StringValueNode::Single(s) => ValueNode::String(s),
                StringValueNode::Compound(c) => ValueNode::CompoundString(c),
            }),
            TokenKind::IntLit => {
                let tok = self.bump();
                Some(ValueNode::Uint(self.uint_literal(tok)))
            }
            TokenKind::FloatLit => {
                let tok = self.bump();
                Some(ValueNode::Float(self.float_literal(tok)))
            }
            TokenKind::Rune(c @ ('-' | '+')) => {
                let sign = RuneNode::new(c, self.bump().id);
                match self.peek().kind {
                    TokenKind::IntLit => {
                        let tok = self.bump();
                        Some(ValueNode::NegativeInt(NegativeIntLiteralNode {
                            minus: sign,
                            uint: self.uint_literal(tok),
                        }))
                    }
                    TokenKind::FloatLit => {
                        let tok = self.bump();
                        Some(ValueNode::SignedFloat(SignedFloatLiteralNode {
                            sign,
                            float: FloatValueNode::Float(self.float_literal(tok)),
                        }))
                    }
                    TokenKind::Ident if matches!(self.cur_text(), "inf" | "nan") => {
                        let keyword = self.take_ident().expect("checked");
                        Some(ValueNode::SignedFloat(SignedFloatLiteralNode {
                            sign,
                            float: FloatValueNode::Special(SpecialFloatLiteralNode { keyword }),
                        }))
                    }
                    _ => {
                        self.error_here("expected number after sign");
                        None
                    }
                }
            }
            TokenKind::Ident => match self.identifier() {
                Some(IdentifierNode::Ident(i)) => Some(ValueNode::Ident(i)),
                Some(IdentifierNode::Compound(c)) => Some(ValueNode::CompoundIdent(c)),
                None => None,
            },
            TokenKind::Rune('{') => Some(ValueNode::Message(self.parse_message_literal('}'))),
            TokenKind::Rune('<') => Some(ValueNode::Message(self.parse_message_literal('>'))),
            TokenKind::Rune('[') => Some(ValueNode::Array(self.parse_array_literal())),
            _ => None,
        }
    }

    fn uint_literal(&self, tok: Token) -> UintLiteralNode {
        UintLiteralNode {
            value: parse_uint(self.text_of(tok)).unwrap_or(0),
            token: tok.id,
        }
    }

    fn float_literal(&self, tok: Token) -> FloatLiteralNode {
        FloatLiteralNode {
            value: parse_float(self.text_of(tok)),
            token: tok.id,
        }
    }

    fn parse_array_literal(&mut self) -> ArrayLiteralNode {
        let open_bracket = self.bump_rune();
        let mut elements = Vec::new();
        let close_bracket;
        loop {
            if self.at_rune(']') {
                close_bracket = self.bump_rune();
                break;
            }
            if self.at_eof() {
                self.error_here("unterminated array literal");
                close_bracket = RuneNode::synthetic(']');
                break;
            }
            if self.at_rune(',') {
                elements.push(ArrayElement::Comma(self.bump_rune()));
                continue;
            }
            match self.parse_value() {
                Some(v) => elements.push(ArrayElement::Value(v)),
                None => self.skip_token("array literal"),
            }
        }
        ArrayLiteralNode {
            open_bracket,
            elements,
            close_bracket,
            semicolon: None,
        }
    }

    fn parse_message_literal(&mut self, close: char) -> MessageLiteralNode {
        let open = self.bump_rune();
        let mut elements = Vec::new();
        let close_rune;
        loop {
            if self.at_rune(close) {
                close_rune = self.bump_rune();
                break;
            }
            if self.at_eof() {
                self.error_here("unterminated message literal");
                close_rune = RuneNode::synthetic(close);
                break;
            }
            match self.parse_message_literal_field() {
                Some(field) => elements.push(field),
                None => self.skip_token("message literal"),
            }
        }
        MessageLiteralNode {
            open,
            elements,
            close: close_rune,
            semicolon: None,
        }
    }

    fn parse_message_literal_field(&mut self) -> Option<MessageFieldNode> {
        let name = if self.at_rune('[') {
            let open = Some(self.bump_rune());
            let first = self.identifier()?;
            let (url_prefix, slash, name) = if self.at_rune('/') {
                let slash = Some(self.bump_rune());
                let name = self.identifier()?;
                (Some(first), slash, name)
            } else {
                (None, None, first)
            };
            let close = self.take_rune(']');
            FieldReferenceNode {
                open,
                url_prefix,
                slash,
                name,
                close,
            }
        } else if self.at_ident() {
            FieldReferenceNode {
                open: None,
                url_prefix: None,
                slash: None,
                name: IdentifierNode::Ident(self.take_ident().expect("checked")),
                close: None,
            }
        } else {
            return None;
        };
        let sep = self.take_rune(':');
        let value = self.parse_value()?;
        let semicolon = self.take_rune(',').or_else(|| self.take_rune(';'));
        Some(MessageFieldNode {
            name,
            sep,
            value,
            semicolon,
        })
    }

    // -- options --

    fn parse_option_decl(&mut self) -> OptionNode {
        let keyword = self.take_ident();
        let name = self.option_name();
        if name.is_none() {
            self.error_here("expected option name");
        }
        let equals = match self.take_rune('=') {
            Some(eq) => Some(eq),
            None => {
                self.error_here("expected `=`");
                Some(RuneNode::synthetic('='))
            }
        };
        let value = self.parse_value();
        if value.is_none() {
            self.error_here("expected option value");
        }
        let semicolon = Some(self.rune_or_virtual(';'));
        OptionNode {
            keyword,
            name,
            equals,
            value,
            semicolon,
        }
    }

    fn option_name(&mut self) -> Option<OptionNameNode> {
        let mut parts: Vec<OptionNamePart> = Vec::new();
        loop {
            if self.at_rune('(') {
                let open = Some(self.bump_rune());
                let Some(name) = self.identifier() else {
                    self.error_here("expected extension name");
                    break;
                };
                let close = self.take_rune(')');
                parts.push(OptionNamePart::FieldRef(FieldReferenceNode {
                    open,
                    url_prefix: None,
                    slash: None,
                    name,
                    close,
                }));
            } else if self.at_ident() {
                parts.push(OptionNamePart::FieldRef(FieldReferenceNode {
                    open: None,
                    url_prefix: None,
                    slash: None,
                    name: IdentifierNode::Ident(self.take_ident().expect("checked")),
                    close: None,
                }));
            } else {
                break;
            }
            if self.at_rune('.') {
                parts.push(OptionNamePart::Dot(self.bump_rune()));
            } else {
                break;
            }
        }
        if parts.is_empty() {
            None
        } else {
            Some(OptionNameNode { parts })
        }
    }

    fn parse_compact_options(&mut self) -> CompactOptionsNode {
        let open_bracket = self.bump_rune();
        let mut options = Vec::new();
        let close_bracket;
        loop {
            if self.at_rune(']') {
                close_bracket = self.bump_rune();
                break;
            }
            if self.at_eof() {
                self.error_here("unterminated compact options");
                close_bracket = RuneNode::synthetic(']');
                break;
            }
            if self.at_rune(',') {
                // Stray separator; keep it as a degenerate entry so the
                // writer can drop it.
                options.push(OptionNode {
                    keyword: None,
                    name: None,
                    equals: None,
                    value: None,
                    semicolon: Some(self.bump_rune()),
                });
                continue;
            }
            let before = self.pos;
            let name = self.option_name();
            let equals = self.take_rune('=');
            let value = self.parse_value();
            if self.pos == before {
                self.skip_token("compact options");
                continue;
            }
            let semicolon = self.take_rune(',').or_else(|| self.take_rune(';'));
            options.push(OptionNode {
                keyword: None,
                name,
                equals,
                value,
                semicolon,
            });
        }
        CompactOptionsNode {
            open_bracket,
            options,
            close_bracket,
            semicolon: None,
        }
    }

    // -- message bodies --

    fn parse_block<T>(
        &mut self,
        context: &str,
        mut elem: impl FnMut(&mut Self) -> Option<T>,
    ) -> (RuneNode, Vec<T>, RuneNode) {
        let open = self.expect_rune('{');
        let mut decls = Vec::new();
        let close;
        loop {
            if self.at_rune('}') {
                close = self.bump_rune();
                break;
            }
            if self.at_eof() {
                self.error_here(format!("unterminated {context}"));
                close = RuneNode::synthetic('}');
                break;
            }
            let before = self.pos;
            if let Some(d) = elem(self) {
                decls.push(d);
            }
            if self.pos == before {
                self.skip_token(context);
            }
        }
        (open, decls, close)
    }

    fn parse_message(&mut self) -> Option<MessageNode> {
        let keyword = self.take_ident().expect("checked");
        let name = self.expect_ident("message name")?;
        let (open_brace, decls, close_brace) =
            self.parse_block("message", |p| p.parse_message_element());
        let semicolon = self.take_rune(';');
        Some(MessageNode {
            keyword,
            name,
            open_brace,
            decls,
            close_brace,
            semicolon,
        })
    }

    fn parse_message_element(&mut self) -> Option<MessageElement> {
        if self.at_rune(';') {
            return Some(MessageElement::Empty(self.bump_rune()));
        }
        if self.at_rune('.') {
            return self.parse_field(None).map(MessageElement::Field);
        }
        if !self.at_ident() {
            return None;
        }
        match self.cur_text() {
            "option" => Some(MessageElement::Option(self.parse_option_decl())),
            "oneof" if self.peek_at(1).kind == TokenKind::Ident => {
                self.parse_oneof().map(MessageElement::Oneof)
            }
            "map" if self.peek_at(1).kind == TokenKind::Rune('<') => {
                self.parse_map_field().map(MessageElement::MapField)
            }
            "message" if self.peek_at(1).kind == TokenKind::Ident => {
                self.parse_message().map(MessageElement::Message)
            }
            "enum" if self.peek_at(1).kind == TokenKind::Ident => {
                self.parse_enum().map(MessageElement::Enum)
            }
            "extend" => Some(MessageElement::Extend(self.parse_extend())),
            "extensions" => Some(MessageElement::ExtensionRange(self.parse_extensions())),
            "reserved" => Some(MessageElement::Reserved(self.parse_reserved())),
            "group" if self.peek_at(1).kind == TokenKind::Ident => {
                self.parse_group(None).map(MessageElement::Group)
            }
            label if LABELS.contains(&label) && self.text_of(self.peek_at(1)) == "group" => {
                let label = self.take_ident();
                self.parse_group(label).map(MessageElement::Group)
            }
            _ => self.parse_field(None).map(MessageElement::Field),
        }
    }

    /// A scalar/message field, optionally with a pre-consumed label.
    fn parse_field(&mut self, label: Option<IdentNode>) -> Option<FieldNode> {
        let label = label.or_else(|| self.take_label());
        let field_type = match self.identifier() {
            Some(ty) => ty,
            None => {
                self.error_here("expected field type");
                return None;
            }
        };
        let name = self.take_ident();
        let equals = self.take_rune('=');
        let tag = if self.peek().kind == TokenKind::IntLit {
            let tok = self.bump();
            Some(self.uint_literal(tok))
        } else {
            None
        };
        let options = if self.at_rune('[') {
            Some(self.parse_compact_options())
        } else {
            None
        };
        let semicolon = self.take_rune(';');
        Some(FieldNode {
            label,
            field_type,
            name,
            equals,
            tag,
            options,
            semicolon,
        })
    }

    /// Consume a label keyword when it really is a label: followed by a
    /// type, and not itself the type of a `label = tag` shaped field.
    fn take_label(&mut self) -> Option<IdentNode> {
        if !self.at_ident() || !LABELS.contains(&self.cur_text()) {
            return None;
        }
        let next = self.peek_at(1);
        let type_follows = next.kind == TokenKind::Rune('.')
            || (next.kind == TokenKind::Ident
                && self.peek_at(2).kind != TokenKind::Rune('='));
        if type_follows {
            self.take_ident()
        } else {
            None
        }
    }

    fn parse_map_field(&mut self) -> Option<MapFieldNode> {
        let keyword = self.take_ident().expect("checked");
        let open_angle = self.expect_rune('<');
        let key_type = self.expect_ident("map key type")?;
        let comma = self.expect_rune(',');
        let value_type = match self.identifier() {
            Some(ty) => ty,
            None => {
                self.error_here("expected map value type");
                return None;
            }
        };
        let close_angle = self.expect_rune('>');
        let map_type = MapTypeNode {
            keyword,
            open_angle,
            key_type,
            comma,
            value_type,
            close_angle,
            semicolon: None,
        };
        let name = self.take_ident();
        let equals = self.take_rune('=');
        let tag = if self.peek().kind == TokenKind::IntLit {
            let tok = self.bump();
            Some(self.uint_literal(tok))
        } else {
            None
        };
        let options = if self.at_rune('[') {
            Some(self.parse_compact_options())
        } else {
            None
        };
        let semicolon = self.take_rune(';');
        Some(MapFieldNode {
            map_type,
            name,
            equals,
            tag,
            options,
            semicolon,
        })
    }

    fn parse_group(&mut self, label: Option<IdentNode>) -> Option<GroupNode> {
        let keyword = self.take_ident().expect("checked");
        let name = self.expect_ident("group name")?;
        let equals = self.take_rune('=');
        let tag = if self.peek().kind == TokenKind::IntLit {
            let tok = self.bump();
            Some(self.uint_literal(tok))
        } else {
            None
        };
        let options = if self.at_rune('[') {
            Some(self.parse_compact_options())
        } else {
            None
        };
        let (open_brace, decls, close_brace) =
            self.parse_block("group", |p| p.parse_message_element());
        let semicolon = self.take_rune(';');
        Some(GroupNode {
            label,
            keyword,
            name,
            equals,
            tag,
            options,
            open_brace,
            decls,
            close_brace,
            semicolon,
        })
    }

    fn parse_oneof(&mut self) -> Option<OneofNode> {
        let keyword = self.take_ident().expect("checked");
        let name = self.expect_ident("oneof name")?;
        let (open_brace, decls, close_brace) = self.parse_block("oneof", |p| {
            if p.at_rune(';') {
                return Some(OneofElement::Empty(p.bump_rune()));
            }
            if p.at_keyword("option") {
                return Some(OneofElement::Option(p.parse_option_decl()));
            }
            if p.at_keyword("group") && p.peek_at(1).kind == TokenKind::Ident {
                return p.parse_group(None).map(OneofElement::Group);
            }
            if p.at_ident() || p.at_rune('.') {
                return p.parse_field(None).map(OneofElement::Field);
            }
            None
        });
        let semicolon = self.take_rune(';');
        Some(OneofNode {
            keyword,
            name,
            open_brace,
            decls,
            close_brace,
            semicolon,
        })
    }

    // -- enums --

    fn parse_enum(&mut self) -> Option<EnumNode> {
        let keyword = self.take_ident().expect("checked");
        let name = self.expect_ident("enum name")?;
        let (open_brace, decls, close_brace) = self.parse_block("enum", |p| {
            if p.at_rune(';') {
                return Some(EnumElement::Empty(p.bump_rune()));
            }
            if p.at_keyword("option") {
                return Some(EnumElement::Option(p.parse_option_decl()));
            }
            if p.at_keyword("reserved") {
                return Some(EnumElement::Reserved(p.parse_reserved()));
            }
            if p.at_ident() {
                return Some(EnumElement::Value(p.parse_enum_value()));
            }
            None
        });
        let semicolon = self.take_rune(';');
        Some(EnumNode {
            keyword,
            name,
            open_brace,
            decls,
            close_brace,
            semicolon,
        })
    }

    fn parse_enum_value(&mut self) -> EnumValueNode {
        let name = self.take_ident().expect("checked");
        let equals = self.take_rune('=');
        let number = self.int_value();
        if equals.is_some() && number.is_none() {
            self.error_here("expected enum value number");
        }
        let options = if self.at_rune('[') {
            Some(self.parse_compact_options())
        } else {
            None
        };
        // The source separator may be a `,`; the writer normalizes to `;`.
        let semicolon = self.take_rune(';').or_else(|| self.take_rune(','));
        EnumValueNode {
            name,
            equals,
            number,
            options,
            semicolon,
        }
    }

    fn int_value(&mut self) -> Option<IntValueNode> {
        match self.peek().kind {
            TokenKind::IntLit => {
                let tok = self.bump();
                Some(IntValueNode::Uint(self.uint_literal(tok)))
            }
            TokenKind::Rune('-') if self.peek_at(1).kind == TokenKind::IntLit => {
                let minus = self.bump_rune();
                let tok = self.bump();
                Some(IntValueNode::Negative(NegativeIntLiteralNode {
                    minus,
                    uint: self.uint_literal(tok),
                }))
            }
            _ => None,
        }
    }

    // -- reserved / extensions / extend --

    fn parse_reserved(&mut self) -> ReservedNode {
        let keyword = self.take_ident().expect("checked");
        let mut elements = Vec::new();
        loop {
            match self.peek().kind {
                TokenKind::Rune(',') => elements.push(ReservedElement::Comma(self.bump_rune())),
                TokenKind::IntLit | TokenKind::Rune('-') => match self.range() {
                    Some(range) => elements.push(ReservedElement::Range(range)),
                    None => break,
                },
                TokenKind::StrLit => {
                    let tok = self.bump();
                    elements.push(ReservedElement::Name(StringLiteralNode {
                        value: decode_string(self.text_of(tok)),
                        token: tok.id,
                    }));
                }
                TokenKind::Ident => {
                    elements.push(ReservedElement::Ident(
                        self.take_ident().expect("checked"),
                    ));
                }
                _ => break,
            }
        }
        let semicolon = Some(self.rune_or_virtual(';'));
        ReservedNode {
            keyword,
            elements,
            semicolon,
        }
    }

    fn parse_extensions(&mut self) -> ExtensionRangeNode {
        let keyword = self.take_ident().expect("checked");
        let mut elements = Vec::new();
        loop {
            match self.peek().kind {
                TokenKind::Rune(',') => elements.push(RangeElement::Comma(self.bump_rune())),
                TokenKind::IntLit | TokenKind::Rune('-') => match self.range() {
                    Some(range) => elements.push(RangeElement::Range(range)),
                    None => break,
                },
                _ => break,
            }
        }
        let options = if self.at_rune('[') {
            Some(self.parse_compact_options())
        } else {
            None
        };
        let semicolon = Some(self.rune_or_virtual(';'));
        ExtensionRangeNode {
            keyword,
            elements,
            options,
            semicolon,
        }
    }

    fn range(&mut self) -> Option<RangeNode> {
        let start = self.int_value()?;
        let (to, end, max) = if self.at_keyword("to") {
            let to = self.take_ident();
            if self.at_keyword("max") {
                (to, None, self.take_ident())
            } else {
                let end = self.int_value();
                if end.is_none() {
                    self.error_here("expected range end");
                }
                (to, end, None)
            }
        } else {
            (None, None, None)
        };
        Some(RangeNode {
            start,
            to,
            end,
            max,
        })
    }

    fn parse_extend(&mut self) -> ExtendNode {
        let keyword = self.take_ident().expect("checked");
        let extendee = self.identifier();
        if extendee.is_none() {
            self.error_here("expected extendee type");
        }
        let (open_brace, decls, close_brace) = self.parse_block("extend", |p| {
            if p.at_rune(';') {
                return Some(ExtendElement::Empty(p.bump_rune()));
            }
            if p.at_keyword("group") && p.peek_at(1).kind == TokenKind::Ident {
                return p.parse_group(None).map(ExtendElement::Group);
            }
            if p.at_ident() && LABELS.contains(&p.cur_text()) && p.text_of(p.peek_at(1)) == "group"
            {
                let label = p.take_ident();
                return p.parse_group(label).map(ExtendElement::Group);
            }
            if p.at_ident() || p.at_rune('.') {
                return p.parse_field(None).map(ExtendElement::Field);
            }
            None
        });
        let semicolon = self.take_rune(';');
        ExtendNode {
            keyword,
            extendee,
            open_brace,
            decls,
            close_brace,
            semicolon,
        }
    }

    // -- services --

    fn parse_service(&mut self) -> Option<ServiceNode> {
        let keyword = self.take_ident().expect("checked");
        let name = self.expect_ident("service name")?;
        let (open_brace, decls, close_brace) = self.parse_block("service", |p| {
            if p.at_rune(';') {
                return Some(ServiceElement::Empty(p.bump_rune()));
            }
            if p.at_keyword("option") {
                return Some(ServiceElement::Option(p.parse_option_decl()));
            }
            if p.at_keyword("rpc") {
                return p.parse_rpc().map(ServiceElement::Rpc);
            }
            None
        });
        let semicolon = self.take_rune(';');
        Some(ServiceNode {
            keyword,
            name,
            open_brace,
            decls,
            close_brace,
            semicolon,
        })
    }

    fn parse_rpc(&mut self) -> Option<RpcNode> {
        let keyword = self.take_ident().expect("checked");
        let name = self.expect_ident("rpc name")?;
        let input = self.parse_rpc_type()?;
        let returns = self.take_ident();
        if returns.is_none() {
            self.error_here("expected `returns`");
        }
        let output = self.parse_rpc_type()?;
        if !self.at_rune('{') {
            // `;` form; a missing terminator is covered silently.
            return Some(RpcNode {
                keyword,
                name,
                input,
                returns,
                output,
                open_brace: None,
                decls: Vec::new(),
                close_brace: None,
                semicolon: Some(self.rune_or_virtual(';')),
            });
        }
        let (open_brace, decls, close_brace) = self.parse_block("rpc", |p| {
            if p.at_rune(';') {
                return Some(RpcElement::Empty(p.bump_rune()));
            }
            if p.at_keyword("option") {
                return Some(RpcElement::Option(p.parse_option_decl()));
            }
            None
        });
        let semicolon = self.take_rune(';');
        Some(RpcNode {
            keyword,
            name,
            input,
            returns,
            output,
            open_brace: Some(open_brace),
            decls,
            close_brace: Some(close_brace),
            semicolon,
        })
    }

    fn parse_rpc_type(&mut self) -> Option<RpcTypeNode> {
        let open_paren = self.expect_rune('(');
        let stream = if self.at_keyword("stream")
            && matches!(
                self.peek_at(1).kind,
                TokenKind::Ident | TokenKind::Rune('.')
            ) {
            self.take_ident()
        } else {
            None
        };
        let message_type = match self.identifier() {
            Some(ty) => ty,
            None => {
                self.error_here("expected rpc message type");
                return None;
            }
        };
        let close_paren = self.expect_rune(')');
        Some(RpcTypeNode {
            open_paren,
            stream,
            message_type,
            close_paren,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    #[test]
    fn parses_file_header_and_message() {
        let out = parse(
            "syntax = \"proto3\";\npackage acme.v1;\nimport \"a.proto\";\nmessage Foo {\n  string name = 1;\n}\n",
        );
        assert!(!out.has_errors(), "{:?}", out.messages());
        assert!(out.file.syntax().is_some());
        assert_eq!(out.file.decls().len(), 3);
        let message = out
            .file
            .decls()
            .iter()
            .find_map(|d| match d {
                FileElement::Message(m) => Some(m),
                _ => None,
            })
            .expect("message");
        assert_eq!(message.name.value, "Foo");
        assert_eq!(message.decls.len(), 1);
    }

    #[test]
    fn field_without_semicolon_recovers() {
        let out = parse("message M {\n  int32 a = 1\n}\n");
        let FileElement::Message(m) = &out.file.decls()[0] else {
            panic!("expected message");
        };
        let MessageElement::Field(f) = &m.decls[0] else {
            panic!("expected field");
        };
        assert!(f.semicolon.is_none());
        assert_eq!(f.name.as_ref().unwrap().value, "a");
    }

    #[test]
    fn option_name_with_missing_close_paren() {
        let out = parse("option (foo.bar = 1;\n");
        let FileElement::Option(o) = &out.file.decls()[0] else {
            panic!("expected option");
        };
        let name = o.name.as_ref().unwrap();
        let OptionNamePart::FieldRef(fr) = &name.parts[0] else {
            panic!("expected field ref");
        };
        assert!(fr.open.is_some());
        assert!(fr.close.is_none());
    }

    #[test]
    fn enum_with_comma_separators() {
        let out = parse("enum E {\n  A = 0,\n  B = 1,\n}\n");
        let FileElement::Enum(e) = &out.file.decls()[0] else {
            panic!("expected enum");
        };
        let EnumElement::Value(v) = &e.decls[0] else {
            panic!("expected value");
        };
        assert_eq!(v.semicolon.as_ref().unwrap().rune, ',');
    }

    #[test]
    fn message_literal_missing_colon() {
        let out = parse("option (x) = { foo 1 };\n");
        let FileElement::Option(o) = &out.file.decls()[0] else {
            panic!("expected option");
        };
        let Some(ValueNode::Message(lit)) = &o.value else {
            panic!("expected message literal");
        };
        assert_eq!(lit.elements.len(), 1);
        assert!(lit.elements[0].sep.is_none());
    }

    #[test]
    fn rpc_forms() {
        let out = parse(
            "service S {\n  rpc Ping(PingRequest) returns (PingResponse);\n  rpc Watch(Req) returns (stream Resp) {\n    option deprecated = true;\n  }\n}\n",
        );
        assert!(!out.has_errors(), "{:?}", out.messages());
        let FileElement::Service(s) = &out.file.decls()[0] else {
            panic!("expected service");
        };
        let rpcs: Vec<_> = s
            .decls
            .iter()
            .filter_map(|d| match d {
                ServiceElement::Rpc(r) => Some(r),
                _ => None,
            })
            .collect();
        assert_eq!(rpcs.len(), 2);
        assert!(rpcs[0].open_brace.is_none());
        assert!(rpcs[1].output.stream.is_some());
        assert_eq!(rpcs[1].decls.len(), 1);
    }

    #[test]
    fn label_versus_type_disambiguation() {
        let out = parse("message M {\n  optional foo = 1;\n  optional int32 bar = 2;\n}\n");
        let FileElement::Message(m) = &out.file.decls()[0] else {
            panic!("expected message");
        };
        let MessageElement::Field(f0) = &m.decls[0] else {
            panic!("field");
        };
        assert!(f0.label.is_none());
        assert_eq!(f0.field_type.as_string(), "optional");
        let MessageElement::Field(f1) = &m.decls[1] else {
            panic!("field");
        };
        assert_eq!(f1.label.as_ref().unwrap().value, "optional");
    }

    #[test]
    fn map_reserved_extensions_group() {
        let out = parse(
            "message M {\n  map<string, int32> pairs = 1;\n  reserved 5, 10 to max;\n  reserved \"old\";\n  extensions 100 to 199 [declaration = {}];\n  optional group Key = 4 {\n    optional uint64 id = 1;\n  }\n}\n",
        );
        assert!(!out.has_errors(), "{:?}", out.messages());
        let FileElement::Message(m) = &out.file.decls()[0] else {
            panic!("expected message");
        };
        assert_eq!(m.decls.len(), 5);
    }

    #[test]
    fn stray_token_reports_error_but_parse_continues() {
        let out = parse("message M { ??? int32 a = 1; }\n");
        assert!(out.has_errors());
        let FileElement::Message(m) = &out.file.decls()[0] else {
            panic!("expected message");
        };
        assert!(m
            .decls
            .iter()
            .any(|d| matches!(d, MessageElement::Field(_))));
    }

    #[test]
    fn unterminated_message_synthesizes_close() {
        let out = parse("message M {\n  int32 a = 1;\n");
        assert!(out.has_errors());
        let FileElement::Message(m) = &out.file.decls()[0] else {
            panic!("expected message");
        };
        assert!(m.close_brace.is_virtual());
    }

    #[test]
    fn any_url_in_message_literal() {
        let out = parse("option (x) = { [type.googleapis.com/foo.Bar] { id: 1 } };\n");
        assert!(!out.has_errors(), "{:?}", out.messages());
        let FileElement::Option(o) = &out.file.decls()[0] else {
            panic!("expected option");
        };
        let Some(ValueNode::Message(lit)) = &o.value else {
            panic!("expected message literal");
        };
        let name = &lit.elements[0].name;
        assert!(name.open.is_some());
        assert!(name.slash.is_some());
    }
}
