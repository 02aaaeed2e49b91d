//! Literal Writers
//!
//! Scalars preserve their raw source text (numeric bases, exponents);
//! single-quoted strings are rewritten to double quotes at the outermost
//! delimiters only. Composite literals choose compact or expanded form by
//! reading the original whitespace: a newline before the first element
//! keeps the literal expanded.

use pb_ast::{
    ArrayLiteralNode, CompoundIdentNode, CompoundStringLiteralNode, FloatLiteralNode,
    MessageLiteralNode, NegativeIntLiteralNode, RuneNode, SignedFloatLiteralNode,
    SpecialFloatLiteralNode, StringLiteralNode, UintLiteralNode, ValueNode,
};

use crate::emitter::Emitter;
use crate::formatter::{float_value_ref, is_terminal_value, value_ref, Formatter, NodeRef};

impl<E: Emitter> Formatter<'_, E> {
    pub(crate) fn write_ident(&mut self, node: &pb_ast::IdentNode) {
        self.ctx.write_str(&node.value);
    }

    pub(crate) fn write_rune(&mut self, node: &RuneNode) {
        if "{[(<".contains(node.rune) {
            self.ctx.bump_pending_indent(1);
        } else if "}])>".contains(node.rune) {
            self.ctx.bump_pending_indent(-1);
        }
        let mut buf = [0u8; 4];
        self.ctx.write_str(node.rune.encode_utf8(&mut buf));
    }

    /// Raw text preserved; outermost single quotes become double quotes.
    pub(crate) fn write_string_literal(&mut self, node: &StringLiteralNode) {
        let info = self.info_of(node);
        let raw = info.raw;
        if raw.len() > 1 && raw.starts_with('\'') && raw.ends_with('\'') {
            let text = format!("\"{}\"", &raw[1..raw.len() - 1]);
            self.ctx.write_str(&text);
        } else {
            self.ctx.write_str(raw);
        }
    }

    /// Raw text preserved so bases and digit grouping survive; canonical
    /// base-10 only when no raw text exists.
    pub(crate) fn write_uint_literal(&mut self, node: &UintLiteralNode) {
        let info = self.info_of(node);
        if !info.raw.is_empty() {
            let raw = info.raw.to_string();
            self.ctx.write_str(&raw);
        } else {
            self.ctx.write_str(&node.value.to_string());
        }
    }

    pub(crate) fn write_float_literal(&mut self, node: &FloatLiteralNode) {
        let info = self.info_of(node);
        let raw = info.raw.to_string();
        self.ctx.write_str(&raw);
    }

    pub(crate) fn write_special_float_literal(&mut self, node: &SpecialFloatLiteralNode) {
        self.ctx.write_str(&node.keyword.value);
    }

    pub(crate) fn write_negative_int_literal(&mut self, node: &NegativeIntLiteralNode) {
        self.write_inline(NodeRef::Rune(&node.minus));
        self.write_inline(NodeRef::Uint(&node.uint));
    }

    pub(crate) fn write_signed_float_literal(&mut self, node: &SignedFloatLiteralNode) {
        self.write_inline(NodeRef::Rune(&node.sign));
        self.write_inline(float_value_ref(&node.float));
    }

    pub(crate) fn write_compound_ident(&mut self, node: &CompoundIdentNode) {
        for part in &node.components {
            self.write_inline(compound_part_ref(part));
        }
    }

    /// A compound identifier at the head of a field-like line: the first
    /// component carries the leading comments and indentation.
    pub(crate) fn write_compound_ident_for_field_name(&mut self, node: &CompoundIdentNode) {
        for (i, part) in node.components.iter().enumerate() {
            if i == 0 {
                self.write_start(compound_part_ref(part));
            } else {
                self.write_inline(compound_part_ref(part));
            }
        }
    }

    // -- compound string literals --

    /// Adjacent string segments, one per line.
    fn write_compound_string_literal(
        &mut self,
        node: &CompoundStringLiteralNode,
        needs_indent: bool,
        has_trailing_punctuation: bool,
    ) {
        self.ctx.p("");
        if needs_indent {
            self.ctx.indent_in();
        }
        for (i, child) in node.elements.iter().enumerate() {
            if has_trailing_punctuation && i == node.elements.len() - 1 {
                // Inline: enclosing punctuation follows on the same line.
                self.write_start(NodeRef::String(child));
                break;
            }
            self.write_line_element(NodeRef::String(child));
        }
        if needs_indent {
            self.ctx.indent_out();
        }
    }

    pub(crate) fn write_compound_string_indent(&mut self, node: &CompoundStringLiteralNode) {
        self.write_compound_string_literal(node, true, false);
    }

    pub(crate) fn write_compound_string_indent_end_inline(
        &mut self,
        node: &CompoundStringLiteralNode,
    ) {
        self.write_compound_string_literal(node, true, true);
    }

    pub(crate) fn write_compound_string_no_indent_end_inline(
        &mut self,
        node: &CompoundStringLiteralNode,
    ) {
        self.write_compound_string_literal(node, false, true);
    }

    /// Compound string as an array element; the last segment ends the
    /// line unless a comma follows.
    pub(crate) fn write_compound_string_for_array(
        &mut self,
        node: &CompoundStringLiteralNode,
        last_element: bool,
    ) {
        for (i, child) in node.elements.iter().enumerate() {
            if !last_element && i == node.elements.len() - 1 {
                self.write_start(NodeRef::String(child));
                return;
            }
            self.write_line_element(NodeRef::String(child));
        }
    }

    pub(crate) fn write_negative_int_for_array(
        &mut self,
        node: &NegativeIntLiteralNode,
        last_element: bool,
    ) {
        self.write_start(NodeRef::Rune(&node.minus));
        if last_element {
            self.write_line_end(NodeRef::Uint(&node.uint));
            return;
        }
        self.write_inline(NodeRef::Uint(&node.uint));
    }

    pub(crate) fn write_signed_float_for_array(
        &mut self,
        node: &SignedFloatLiteralNode,
        last_element: bool,
    ) {
        self.write_start(NodeRef::Rune(&node.sign));
        if last_element {
            self.write_line_end(float_value_ref(&node.float));
            return;
        }
        self.write_inline(float_value_ref(&node.float));
    }

    // -- expansion predicates --

    /// Expanded iff the source already broke before the first element.
    pub(crate) fn message_literal_should_be_expanded(&self, node: &MessageLiteralNode) -> bool {
        match node.elements.first() {
            Some(first) => self.info_of(first).leading_ws.contains('\n'),
            None => false,
        }
    }

    pub(crate) fn array_literal_should_be_expanded(&self, node: &ArrayLiteralNode) -> bool {
        match node.values().next() {
            Some(first) => self.info_of(first).leading_ws.contains('\n'),
            None => false,
        }
    }

    // -- array literals --

    pub(crate) fn write_array_literal(&mut self, node: &ArrayLiteralNode) {
        let inline = !self.array_literal_should_be_expanded(node);
        let has_elements = !node.is_empty();
        let open_style = if inline {
            OpenStyle::PrefixInline
        } else {
            OpenStyle::Prefix
        };
        self.write_body(
            Some(&node.open_bracket),
            Some(&node.close_bracket),
            node.semicolon.as_ref(),
            has_elements.then(|| {
                |f: &mut Self| {
                    f.write_array_literal_elements(node, inline);
                }
            }),
            open_style,
            CloseStyle::BodyEndInline,
        );
    }

    fn write_array_literal_elements(&mut self, node: &ArrayLiteralNode, inline: bool) {
        let (values, commas) = node.split();
        for (i, &value) in values.iter().enumerate() {
            let last = i == values.len() - 1;
            if !is_terminal_value(value) {
                self.write_composite_value_for_array(value, !inline && last);
                if !last {
                    let comma = separator_or_virtual(commas[i], ',');
                    if inline {
                        self.write_inline(NodeRef::Rune(&comma));
                        self.ctx.space();
                    } else {
                        self.write_line_end(NodeRef::Rune(&comma));
                    }
                }
                continue;
            }
            if last {
                // The last element won't have a trailing comma.
                if inline {
                    self.write_body_end_inline(value_ref(value), None, true);
                } else {
                    self.write_line_element(value_ref(value));
                }
                return;
            }
            self.write_start_maybe_compact(value_ref(value), inline);
            let comma = separator_or_virtual(commas[i], ',');
            if inline {
                self.write_inline(NodeRef::Rune(&comma));
                self.ctx.space();
            } else {
                self.write_line_end(NodeRef::Rune(&comma));
            }
        }
    }

    /// Composite values occupy whole lines inside an expanded array, so
    /// their comments format like standalone nodes.
    fn write_composite_value_for_array(&mut self, value: &ValueNode, last_element: bool) {
        match value {
            ValueNode::CompoundString(n) => self.write_compound_string_for_array(n, last_element),
            ValueNode::NegativeInt(n) => self.write_negative_int_for_array(n, last_element),
            ValueNode::SignedFloat(n) => self.write_signed_float_for_array(n, last_element),
            ValueNode::Message(n) => self.write_message_literal_for_array(n, last_element),
            other => {
                self.internal_error(format!(
                    "unexpected array value node: {}",
                    value_kind_name(other)
                ));
            }
        }
    }

    // -- message literals --

    pub(crate) fn write_message_literal(&mut self, node: &MessageLiteralNode) {
        if self.maybe_write_compact_message_literal(node, false) {
            return;
        }
        let has_elements = !node.elements.is_empty();
        self.write_body(
            Some(&node.open),
            Some(&node.close),
            node.semicolon.as_ref(),
            has_elements.then(|| |f: &mut Self| f.write_message_literal_elements(node)),
            OpenStyle::Prefix,
            CloseStyle::BodyEndInline,
        );
    }

    pub(crate) fn write_message_literal_for_array(
        &mut self,
        node: &MessageLiteralNode,
        last_element: bool,
    ) {
        if self.maybe_write_compact_message_literal(node, true) {
            if last_element {
                self.ctx.p("");
            }
            return;
        }
        let has_elements = !node.elements.is_empty();
        let close_style = if last_element {
            CloseStyle::BodyEnd
        } else {
            CloseStyle::BodyEndInline
        };
        self.write_body(
            Some(&node.open),
            Some(&node.close),
            node.semicolon.as_ref(),
            has_elements.then(|| |f: &mut Self| f.write_message_literal_elements(node)),
            OpenStyle::PrefixForArray,
            close_style,
        );
    }

    /// Compact rendering on one line, with `:` and `,` synthesized where
    /// the source omitted them. Returns false when the literal must stay
    /// expanded.
    fn maybe_write_compact_message_literal(
        &mut self,
        node: &MessageLiteralNode,
        in_array_literal: bool,
    ) -> bool {
        if self.message_literal_should_be_expanded(node) {
            return false;
        }
        if in_array_literal {
            self.ctx.do_indent(Some(node.open.rune));
        }
        self.write_inline(NodeRef::Rune(&node.open));
        for (i, field) in node.elements.iter().enumerate() {
            self.write_inline(NodeRef::FieldReference(&field.name));
            match &field.sep {
                Some(sep) => self.write_inline(NodeRef::Rune(sep)),
                None => {
                    // fill in missing ':' automatically
                    let colon = RuneNode::synthetic(':');
                    self.write_inline(NodeRef::Rune(&colon));
                }
            }
            self.ctx.space();
            self.write_inline(value_ref(&field.value));
            if i + 1 < node.elements.len() {
                let sep = separator_or_virtual(field.semicolon.as_ref(), ',');
                self.write_inline(NodeRef::Rune(&sep));
                self.ctx.space();
            }
        }
        self.write_inline(NodeRef::Rune(&node.close));
        true
    }
}

/// Use the source separator when present (preserving its comments),
/// otherwise synthesize one. The synthesized rune prints but carries no
/// trivia.
pub(crate) fn separator_or_virtual(sep: Option<&RuneNode>, rune: char) -> RuneNode {
    match sep {
        Some(s) => RuneNode {
            rune,
            token: s.token,
        },
        None => RuneNode::synthetic(rune),
    }
}

pub(crate) fn compound_part_ref(part: &pb_ast::CompoundIdentPart) -> NodeRef<'_> {
    match part {
        pb_ast::CompoundIdentPart::Dot(d) => NodeRef::Rune(d),
        pb_ast::CompoundIdentPart::Ident(i) => NodeRef::Ident(i),
    }
}

fn value_kind_name(value: &ValueNode) -> &'static str {
    match value {
        ValueNode::Ident(_) => "identifier",
        ValueNode::CompoundIdent(_) => "compound identifier",
        ValueNode::String(_) => "string literal",
        ValueNode::CompoundString(_) => "compound string literal",
        ValueNode::Uint(_) => "integer literal",
        ValueNode::NegativeInt(_) => "negative integer literal",
        ValueNode::Float(_) => "float literal",
        ValueNode::SignedFloat(_) => "signed float literal",
        ValueNode::SpecialFloat(_) => "special float literal",
        ValueNode::Array(_) => "array literal",
        ValueNode::Message(_) => "message literal",
    }
}

/// How the opening brace of a body is written.
#[derive(Clone, Copy, Debug)]
pub(crate) enum OpenStyle {
    /// Leading comments inline, then the rune, then end the line.
    Prefix,
    /// Leading comments inline, rune, line left open (compact values).
    PrefixInline,
    /// Leading comments multiline (message literals in arrays).
    PrefixForArray,
}

/// How the closing brace of a body is written.
#[derive(Clone, Copy, Debug)]
pub(crate) enum CloseStyle {
    /// Concludes the line (composite types).
    BodyEnd,
    /// Leaves the line open (composite values; tokens may follow `]`).
    BodyEndInline,
}
