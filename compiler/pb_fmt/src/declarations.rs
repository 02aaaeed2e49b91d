//! Declaration Writers
//!
//! One writer per declaration variant. Each decides the layout for its
//! node (single-line vs multi-line, compact vs expanded) and delegates
//! token emission to the token writer and comment placement to the
//! comment engine. Brace-delimited bodies share [`Formatter::write_body`];
//! sibling runs inside bodies go through the column aligner.

use pb_ast::{
    CompactOptionsNode, EditionNode, EnumNode, EnumValueNode, ExtendNode, ExtensionRangeNode,
    FieldNode, FieldReferenceNode, GroupNode, IdentifierNode, ImportNode, MapFieldNode,
    MapTypeNode, MessageFieldNode, MessageLiteralNode, MessageNode, OneofNode, OptionNameNode,
    OptionNamePart, OptionNode, PackageNode, RangeNode, ReservedNode, RpcNode, RpcTypeNode,
    RuneNode, ServiceNode, Spanned, SyntaxNode,
};

use crate::columns::{ColItem, OptionStyle, RowData, RowSpec};
use crate::emitter::Emitter;
use crate::formatter::{
    has_interior_comments, identifier_ref, int_value_ref, string_value_ref, value_ref, Formatter,
    NodeRef,
};
use crate::literals::{separator_or_virtual, CloseStyle, OpenStyle};

impl<E: Emitter> Formatter<'_, E> {
    // -- header declarations --

    pub(crate) fn write_syntax(&mut self, node: &SyntaxNode) {
        self.write_start(NodeRef::Ident(&node.keyword));
        self.ctx.space();
        self.write_inline(NodeRef::Rune(&node.equals));
        self.ctx.space();
        if let Some(value) = &node.value {
            self.write_inline(string_value_ref(value));
        }
        let semi = separator_or_virtual(node.semicolon.as_ref(), ';');
        self.write_line_end(NodeRef::Rune(&semi));
    }

    pub(crate) fn write_edition(&mut self, node: &EditionNode) {
        self.write_start(NodeRef::Ident(&node.keyword));
        self.ctx.space();
        self.write_inline(NodeRef::Rune(&node.equals));
        self.ctx.space();
        if let Some(value) = &node.value {
            self.write_inline(string_value_ref(value));
        }
        let semi = separator_or_virtual(node.semicolon.as_ref(), ';');
        self.write_line_end(NodeRef::Rune(&semi));
    }

    pub(crate) fn write_package(&mut self, node: &PackageNode) {
        self.write_start(NodeRef::Ident(&node.keyword));
        self.ctx.space();
        if let Some(name) = &node.name {
            self.write_inline(identifier_ref(name));
        }
        let semi = separator_or_virtual(node.semicolon.as_ref(), ';');
        self.write_line_end(NodeRef::Rune(&semi));
    }

    pub(crate) fn write_import(&mut self, node: &ImportNode, force_compact: bool) {
        self.write_start_maybe_compact(NodeRef::Ident(&node.keyword), force_compact);
        self.ctx.space();
        if let Some(modifier) = &node.modifier {
            self.write_inline(NodeRef::Ident(&modifier.keyword));
            self.ctx.space();
        }
        self.write_inline(string_value_ref(&node.name));
        let semi = separator_or_virtual(node.semicolon.as_ref(), ';');
        self.write_line_end(NodeRef::Rune(&semi));
    }

    // -- options --

    /// A full `option name = value;` declaration outside any aligner run.
    pub(crate) fn write_option(&mut self, node: &OptionNode) {
        self.write_option_prefix(node);
        if let Some(semi) = &node.semicolon {
            if let Some(compound) = node.value.as_ref().and_then(|v| v.as_compound_string()) {
                // Compound strings break immediately after the '='.
                self.write_compound_string_indent_end_inline(compound);
                self.write_line_end(NodeRef::Rune(semi));
                return;
            }
            if let Some(value) = &node.value {
                self.write_inline(value_ref(value));
            }
            self.write_line_end(NodeRef::Rune(semi));
            return;
        }

        if let Some(compound) = node.value.as_ref().and_then(|v| v.as_compound_string()) {
            self.write_compound_string_indent(compound);
            return;
        }
        if let Some(value) = &node.value {
            self.write_inline(value_ref(value));
        }
    }

    /// A file option: sorted to the top of the file, so blank-line
    /// preservation is suppressed for all but the first.
    pub(crate) fn write_file_option(&mut self, node: &OptionNode, force_compact: bool) {
        if let Some(keyword) = &node.keyword {
            self.write_start_maybe_compact(NodeRef::Ident(keyword), force_compact);
            self.ctx.space();
        }
        if let Some(name) = &node.name {
            self.write_node(NodeRef::OptionName(name));
        }
        self.ctx.space();
        if let Some(equals) = &node.equals {
            self.write_inline(NodeRef::Rune(equals));
        }
        let semi = separator_or_virtual(node.semicolon.as_ref(), ';');
        if let Some(compound) = node.value.as_ref().and_then(|v| v.as_compound_string()) {
            self.write_compound_string_indent_end_inline(compound);
            self.write_line_end(NodeRef::Rune(&semi));
            return;
        }
        self.ctx.space();
        if let Some(value) = &node.value {
            self.write_inline(value_ref(value));
        }
        self.write_line_end(NodeRef::Rune(&semi));
    }

    /// The last entry of an expanded compact-options list: no trailing
    /// comma, and the value concludes the line.
    pub(crate) fn write_last_compact_option(&mut self, node: &OptionNode) {
        self.write_option_prefix(node);
        if let Some(value) = &node.value {
            self.write_line_end(value_ref(value));
        } else {
            self.ctx.p("");
        }
    }

    /// Everything up to (and including) the `=` of an option.
    pub(crate) fn write_option_prefix(&mut self, node: &OptionNode) {
        if let Some(keyword) = &node.keyword {
            // Compact options don't have the keyword.
            self.write_start(NodeRef::Ident(keyword));
            self.ctx.space();
            if let Some(name) = &node.name {
                self.write_node(NodeRef::OptionName(name));
            }
        } else if let Some(name) = &node.name {
            self.write_start(NodeRef::OptionName(name));
        }
        self.ctx.space();
        if let Some(equals) = &node.equals {
            self.write_inline(NodeRef::Rune(equals));
        }
        self.ctx.space();
    }

    pub(crate) fn write_option_name(&mut self, node: &OptionNameNode) {
        for (i, part) in node.parts.iter().enumerate() {
            if self.ctx.in_compact_options && i == 0 {
                // The leading comments of the first token were written by
                // the enclosing start primitive; write the token bare and
                // keep only its trailing comments.
                if let OptionNamePart::FieldRef(field_ref) = part {
                    if let Some(open) = &field_ref.open {
                        self.write_node(NodeRef::Rune(open));
                        let info = self.info_of(open);
                        if !info.trailing_comments.is_empty() {
                            self.write_inline_comments(info.trailing_comments);
                        }
                        self.write_inline(identifier_ref(&field_ref.name));
                    } else {
                        self.write_node(identifier_ref(&field_ref.name));
                        let info = self.info_of(&field_ref.name);
                        if !info.trailing_comments.is_empty() {
                            self.write_inline_comments(info.trailing_comments);
                        }
                    }
                    self.write_field_reference_close(field_ref);
                    continue;
                }
            }
            match part {
                OptionNamePart::FieldRef(fr) => self.write_field_reference(fr),
                OptionNamePart::Dot(dot) => self.write_inline(NodeRef::Rune(dot)),
            }
        }
    }

    pub(crate) fn write_field_reference(&mut self, node: &FieldReferenceNode) {
        if let Some(open) = &node.open {
            self.write_inline(NodeRef::Rune(open));
        }
        if let Some(url_prefix) = &node.url_prefix {
            self.write_inline(identifier_ref(url_prefix));
        }
        if let Some(slash) = &node.slash {
            self.write_inline(NodeRef::Rune(slash));
        }
        self.write_inline(identifier_ref(&node.name));
        self.write_field_reference_close(node);
    }

    /// The closing rune of a field reference, synthesized to match the
    /// opener when the source is missing it.
    pub(crate) fn write_field_reference_close(&mut self, node: &FieldReferenceNode) {
        if let Some(close) = &node.close {
            self.write_inline(NodeRef::Rune(close));
        } else if let Some(open) = &node.open {
            let close = RuneNode::synthetic(matching_close(open.rune));
            self.write_inline(NodeRef::Rune(&close));
        }
    }

    pub(crate) fn write_compact_options(&mut self, node: &CompactOptionsNode) {
        self.ctx.in_compact_options = true;
        self.write_compact_options_inner(node);
        self.ctx.in_compact_options = false;
    }

    fn write_compact_options_inner(&mut self, node: &CompactOptionsNode) {
        let spans: Vec<&dyn Spanned> = node.options.iter().map(|o| o as &dyn Spanned).collect();
        let interior = has_interior_comments(self, &spans);
        if !self.compact_options_should_be_expanded(node) && !interior {
            // A single-line option list. This excludes the case where the
            // '[' has trailing comments or an option name has leading
            // comments; those force the expanded form.
            if node.options.is_empty() {
                return;
            }
            self.write_inline(NodeRef::Rune(&node.open_bracket));
            let entries: Vec<&OptionNode> =
                node.options.iter().filter(|o| !o.is_degenerate()).collect();
            for (i, option) in entries.iter().enumerate() {
                if let Some(name) = &option.name {
                    self.write_inline(NodeRef::OptionName(name));
                }
                self.ctx.space();
                if let Some(equals) = &option.equals {
                    self.write_inline(NodeRef::Rune(equals));
                }
                if let Some(compound) = option.value.as_ref().and_then(|v| v.as_compound_string())
                {
                    // The value has to preserve the closing ']' on its
                    // own line shape.
                    self.write_compound_string_no_indent_end_inline(compound);
                    self.write_inline(NodeRef::Rune(&node.close_bracket));
                    return;
                }
                self.ctx.space();
                if let Some(value) = &option.value {
                    self.write_inline(value_ref(value));
                }
                if i + 1 < entries.len() {
                    let comma = separator_or_virtual(option.semicolon.as_ref(), ',');
                    self.write_inline(NodeRef::Rune(&comma));
                    self.ctx.space();
                }
            }
            self.write_inline(NodeRef::Rune(&node.close_bracket));
            return;
        }

        let has_elements = node.options.iter().any(|o| !o.is_degenerate());
        self.write_body(
            Some(&node.open_bracket),
            Some(&node.close_bracket),
            node.semicolon.as_ref(),
            has_elements.then(|| |f: &mut Self| f.column_format_compact_options(&node.options)),
            OpenStyle::Prefix,
            CloseStyle::BodyEndInline,
        );
    }

    /// Expand iff the source broke before the first option or comments
    /// sit between entries.
    pub(crate) fn compact_options_should_be_expanded(&self, node: &CompactOptionsNode) -> bool {
        let Some(first) = node.options.first() else {
            return false;
        };
        if self.info_of(first).leading_ws.contains('\n') {
            return true;
        }
        let spans: Vec<&dyn Spanned> = node.options.iter().map(|o| o as &dyn Spanned).collect();
        has_interior_comments(self, &spans)
    }

    // -- bodies --

    /// Write a brace-delimited body. An empty body with no interior
    /// comments renders inline (`{}`).
    pub(crate) fn write_body<F: FnOnce(&mut Self)>(
        &mut self,
        open: Option<&RuneNode>,
        close: Option<&RuneNode>,
        semicolon: Option<&RuneNode>,
        element_writer: Option<F>,
        open_style: OpenStyle,
        close_style: CloseStyle,
    ) {
        if let (Some(open), Some(close)) = (open, close) {
            let spans: [&dyn Spanned; 2] = [open, close];
            if element_writer.is_none() && !has_interior_comments(self, &spans) {
                self.write_inline(NodeRef::Rune(open));
                self.write_close_brace(close, semicolon, true, close_style);
                return;
            }
        }

        if let Some(open) = open {
            self.write_open_brace(open, open_style);
        }
        if let Some(writer) = element_writer {
            writer(self);
        }
        if let Some(close) = close {
            self.write_close_brace(close, semicolon, false, close_style);
        }
    }

    fn write_open_brace(&mut self, open: &RuneNode, style: OpenStyle) {
        let info = self.info_of(open);
        match style {
            OpenStyle::Prefix => {
                if !info.leading_comments.is_empty() {
                    self.write_inline_comments(info.leading_comments);
                    if !info.leading_ws.is_empty() {
                        self.ctx.space();
                    }
                }
                self.write_node(NodeRef::Rune(open));
                if !info.trailing_comments.is_empty() {
                    self.write_trailing_end_comments(info.trailing_comments);
                } else {
                    self.ctx.p("");
                }
            }
            OpenStyle::PrefixInline => {
                if !info.leading_comments.is_empty() {
                    self.write_inline_comments(info.leading_comments);
                    if !info.leading_ws.is_empty() {
                        self.ctx.space();
                    }
                }
                self.write_node(NodeRef::Rune(open));
                if !info.trailing_comments.is_empty() {
                    self.write_inline_comments(info.trailing_comments);
                }
            }
            OpenStyle::PrefixForArray => {
                if !info.leading_comments.is_empty() {
                    self.write_multiline_comments(info.leading_comments);
                }
                self.ctx.do_indent(Some(open.rune));
                self.write_node(NodeRef::Rune(open));
                if !info.trailing_comments.is_empty() {
                    self.write_trailing_end_comments(info.trailing_comments);
                } else {
                    self.ctx.p("");
                }
            }
        }
        self.set_previous(NodeRef::Rune(open));
    }

    fn write_close_brace(
        &mut self,
        close: &RuneNode,
        semicolon: Option<&RuneNode>,
        leading_on_line: bool,
        style: CloseStyle,
    ) {
        match style {
            CloseStyle::BodyEnd => {
                self.write_body_end(NodeRef::Rune(close), semicolon, leading_on_line)
            }
            CloseStyle::BodyEndInline => {
                self.write_body_end_inline(NodeRef::Rune(close), semicolon, leading_on_line)
            }
        }
    }

    fn write_composite_type_body<F: FnOnce(&mut Self)>(
        &mut self,
        open: &RuneNode,
        close: &RuneNode,
        semicolon: Option<&RuneNode>,
        element_writer: Option<F>,
    ) {
        self.write_body(
            Some(open),
            Some(close),
            semicolon,
            element_writer,
            OpenStyle::Prefix,
            CloseStyle::BodyEnd,
        );
    }

    // -- messages and fields --

    pub(crate) fn write_message(&mut self, node: &MessageNode) {
        self.write_start(NodeRef::Ident(&node.keyword));
        self.ctx.space();
        self.write_inline(NodeRef::Ident(&node.name));
        self.ctx.space();
        let has_decls = !node.decls.is_empty();
        self.write_composite_type_body(
            &node.open_brace,
            &node.close_brace,
            node.semicolon.as_ref(),
            has_decls.then(|| |f: &mut Self| f.column_format_message_elements(&node.decls)),
        );
    }

    pub(crate) fn write_field(&mut self, node: &FieldNode) {
        // A label may be absent, but when present it carries the leading
        // comments for the whole field.
        if let Some(label) = &node.label {
            self.write_start(NodeRef::Ident(label));
            self.ctx.space();
            self.write_inline(identifier_ref(&node.field_type));
        } else {
            match &node.field_type {
                IdentifierNode::Compound(compound) => {
                    self.write_compound_ident_for_field_name(compound)
                }
                IdentifierNode::Ident(ident) => self.write_start(NodeRef::Ident(ident)),
            }
        }
        if let Some(name) = &node.name {
            self.ctx.space();
            self.write_inline(NodeRef::Ident(name));
        }
        if let Some(equals) = &node.equals {
            self.ctx.space();
            self.write_inline(NodeRef::Rune(equals));
        }
        if let Some(tag) = &node.tag {
            self.ctx.space();
            self.write_inline(NodeRef::Uint(tag));
        }
        if let Some(options) = &node.options {
            self.ctx.space();
            self.write_node(NodeRef::CompactOptions(options));
        }
        let semi = separator_or_virtual(node.semicolon.as_ref(), ';');
        self.write_line_end(NodeRef::Rune(&semi));
    }

    pub(crate) fn write_map_field(&mut self, node: &MapFieldNode) {
        self.write_map_type(&node.map_type, true);
        if let Some(name) = &node.name {
            self.ctx.space();
            self.write_inline(NodeRef::Ident(name));
        }
        if let Some(equals) = &node.equals {
            self.ctx.space();
            self.write_inline(NodeRef::Rune(equals));
        }
        if let Some(tag) = &node.tag {
            self.ctx.space();
            self.write_inline(NodeRef::Uint(tag));
        }
        if let Some(options) = &node.options {
            self.ctx.space();
            self.write_node(NodeRef::CompactOptions(options));
        }
        let semi = separator_or_virtual(node.semicolon.as_ref(), ';');
        self.write_line_end(NodeRef::Rune(&semi));
    }

    /// `map<K, V>`: space after the comma, none inside the angles.
    /// `starts_line` distinguishes a declaration head from an aligner
    /// cell, where the prelude was already written.
    pub(crate) fn write_map_type(&mut self, node: &MapTypeNode, starts_line: bool) {
        if starts_line {
            self.write_start(NodeRef::Ident(&node.keyword));
        } else {
            self.write_cell_start(NodeRef::Ident(&node.keyword));
        }
        self.write_inline(NodeRef::Rune(&node.open_angle));
        self.write_inline(NodeRef::Ident(&node.key_type));
        self.write_inline(NodeRef::Rune(&node.comma));
        self.ctx.space();
        self.write_inline(identifier_ref(&node.value_type));
        self.write_inline(NodeRef::Rune(&node.close_angle));
        if let Some(semi) = &node.semicolon {
            let info = self.info_of(semi);
            if !info.trailing_comments.is_empty() {
                self.write_inline_comments(info.trailing_comments);
            }
        }
    }

    pub(crate) fn write_group(&mut self, node: &GroupNode) {
        if let Some(label) = &node.label {
            self.write_start(NodeRef::Ident(label));
            self.ctx.space();
            self.write_inline(NodeRef::Ident(&node.keyword));
        } else {
            self.write_start(NodeRef::Ident(&node.keyword));
        }
        self.ctx.space();
        self.write_inline(NodeRef::Ident(&node.name));
        if let Some(equals) = &node.equals {
            self.ctx.space();
            self.write_inline(NodeRef::Rune(equals));
        }
        if let Some(tag) = &node.tag {
            self.ctx.space();
            self.write_inline(NodeRef::Uint(tag));
        }
        if let Some(options) = &node.options {
            self.ctx.space();
            self.write_node(NodeRef::CompactOptions(options));
        }
        self.ctx.space();
        let has_decls = !node.decls.is_empty();
        self.write_composite_type_body(
            &node.open_brace,
            &node.close_brace,
            node.semicolon.as_ref(),
            has_decls.then(|| {
                |f: &mut Self| {
                    for decl in &node.decls {
                        f.write_message_element(decl);
                    }
                }
            }),
        );
    }

    pub(crate) fn write_message_element(&mut self, decl: &pb_ast::MessageElement) {
        use pb_ast::MessageElement::*;
        match decl {
            Field(n) => self.write_field(n),
            MapField(n) => self.write_map_field(n),
            Group(n) => self.write_group(n),
            Oneof(n) => self.write_oneof(n),
            Option(n) => self.write_option(n),
            Message(n) => self.write_message(n),
            Enum(n) => self.write_enum(n),
            Extend(n) => self.write_extend(n),
            ExtensionRange(n) => self.write_extension_range(n),
            Reserved(n) => self.write_reserved(n),
            Empty(_) => {}
        }
    }

    pub(crate) fn write_oneof(&mut self, node: &OneofNode) {
        self.write_start(NodeRef::Ident(&node.keyword));
        self.ctx.space();
        self.write_inline(NodeRef::Ident(&node.name));
        self.ctx.space();
        let has_decls = !node.decls.is_empty();
        self.write_composite_type_body(
            &node.open_brace,
            &node.close_brace,
            node.semicolon.as_ref(),
            has_decls.then(|| |f: &mut Self| f.column_format_oneof_elements(&node.decls)),
        );
    }

    // -- enums --

    pub(crate) fn write_enum(&mut self, node: &EnumNode) {
        self.write_start(NodeRef::Ident(&node.keyword));
        self.ctx.space();
        self.write_inline(NodeRef::Ident(&node.name));
        self.ctx.space();
        let has_decls = !node.decls.is_empty();
        self.write_composite_type_body(
            &node.open_brace,
            &node.close_brace,
            node.semicolon.as_ref(),
            has_decls.then(|| |f: &mut Self| f.column_format_enum_elements(&node.decls)),
        );
    }

    pub(crate) fn write_enum_value(&mut self, node: &EnumValueNode) {
        self.write_start(NodeRef::Ident(&node.name));
        if let Some(equals) = &node.equals {
            self.ctx.space();
            self.write_inline(NodeRef::Rune(equals));
        }
        if let Some(number) = &node.number {
            self.ctx.space();
            self.write_inline(int_value_ref(number));
        }
        if let Some(options) = &node.options {
            self.ctx.space();
            self.write_node(NodeRef::CompactOptions(options));
        }
        // The separator may be a ',' in source; it is always written ';'.
        let semi = separator_or_virtual(node.semicolon.as_ref(), ';');
        self.write_line_end(NodeRef::Rune(&semi));
    }

    // -- extensions and reserved --

    pub(crate) fn write_extend(&mut self, node: &ExtendNode) {
        self.write_start(NodeRef::Ident(&node.keyword));
        if let Some(extendee) = &node.extendee {
            self.ctx.space();
            self.write_inline(identifier_ref(extendee));
        }
        self.ctx.space();
        let has_decls = !node.decls.is_empty();
        self.write_composite_type_body(
            &node.open_brace,
            &node.close_brace,
            node.semicolon.as_ref(),
            has_decls.then(|| |f: &mut Self| f.column_format_extend_elements(&node.decls)),
        );
    }

    pub(crate) fn write_extension_range(&mut self, node: &ExtensionRangeNode) {
        self.write_start(NodeRef::Ident(&node.keyword));
        self.ctx.space();
        for element in &node.elements {
            match element {
                pb_ast::RangeElement::Range(range) => {
                    // No spaces before commas.
                    self.ctx.space();
                    self.write_inline(NodeRef::Range(range));
                }
                pb_ast::RangeElement::Comma(comma) => self.write_inline(NodeRef::Rune(comma)),
            }
        }
        if let Some(options) = &node.options {
            self.ctx.space();
            self.write_node(NodeRef::CompactOptions(options));
        }
        let semi = separator_or_virtual(node.semicolon.as_ref(), ';');
        self.write_line_end(NodeRef::Rune(&semi));
    }

    pub(crate) fn write_reserved(&mut self, node: &ReservedNode) {
        self.write_start(NodeRef::Ident(&node.keyword));
        for element in &node.elements {
            if let pb_ast::ReservedElement::Comma(comma) = element {
                self.write_inline(NodeRef::Rune(comma));
                continue;
            }
            // No spaces before commas.
            self.ctx.space();
            match element {
                pb_ast::ReservedElement::Range(range) => self.write_inline(NodeRef::Range(range)),
                pb_ast::ReservedElement::Name(name) => self.write_inline(NodeRef::String(name)),
                pb_ast::ReservedElement::Ident(ident) => self.write_inline(NodeRef::Ident(ident)),
                pb_ast::ReservedElement::Comma(_) => {}
            }
        }
        let semi = separator_or_virtual(node.semicolon.as_ref(), ';');
        self.write_line_end(NodeRef::Rune(&semi));
    }

    pub(crate) fn write_range(&mut self, node: &RangeNode) {
        self.write_inline(int_value_ref(&node.start));
        if let Some(to) = &node.to {
            self.ctx.space();
            self.write_inline(NodeRef::Ident(to));
        }
        // Either end or max is set, never both.
        if let Some(end) = &node.end {
            self.ctx.space();
            self.write_inline(int_value_ref(end));
        } else if let Some(max) = &node.max {
            self.ctx.space();
            self.write_inline(NodeRef::Ident(max));
        }
    }

    // -- services --

    pub(crate) fn write_service(&mut self, node: &ServiceNode) {
        self.write_start(NodeRef::Ident(&node.keyword));
        self.ctx.space();
        self.write_inline(NodeRef::Ident(&node.name));
        self.ctx.space();
        let has_decls = !node.decls.is_empty();
        self.write_composite_type_body(
            &node.open_brace,
            &node.close_brace,
            node.semicolon.as_ref(),
            has_decls.then(|| {
                |f: &mut Self| {
                    for decl in &node.decls {
                        match decl {
                            pb_ast::ServiceElement::Option(o) => f.write_option(o),
                            pb_ast::ServiceElement::Rpc(r) => f.write_rpc(r),
                            pb_ast::ServiceElement::Empty(_) => {}
                        }
                    }
                }
            }),
        );
    }

    pub(crate) fn write_rpc(&mut self, node: &RpcNode) {
        self.write_start(NodeRef::Ident(&node.keyword));
        self.ctx.space();
        self.write_inline(NodeRef::Ident(&node.name));
        self.write_inline(NodeRef::RpcType(&node.input));
        if let Some(returns) = &node.returns {
            self.ctx.space();
            self.write_inline(NodeRef::Ident(returns));
        }
        self.ctx.space();
        self.write_inline(NodeRef::RpcType(&node.output));
        if node.decls.is_empty() {
            // No elements: the ';' form is preferred over '{}'. Borrow
            // the dropped tokens' trivia so their comments survive.
            let semi = match (&node.semicolon, &node.close_brace) {
                (Some(semi), _) => RuneNode {
                    rune: ';',
                    token: semi.token,
                },
                (None, Some(close)) => RuneNode {
                    rune: ';',
                    token: close.token,
                },
                (None, None) => RuneNode::synthetic(';'),
            };
            self.write_line_end(NodeRef::Rune(&semi));
            return;
        }
        self.ctx.space();
        let open = node.open_brace.as_ref();
        let close = node.close_brace.as_ref();
        let has_decls = !node.decls.is_empty();
        self.write_body(
            open,
            close,
            node.semicolon.as_ref(),
            has_decls.then(|| {
                |f: &mut Self| {
                    for decl in &node.decls {
                        match decl {
                            pb_ast::RpcElement::Option(o) => f.write_option(o),
                            pb_ast::RpcElement::Empty(_) => {}
                        }
                    }
                }
            }),
            OpenStyle::Prefix,
            CloseStyle::BodyEnd,
        );
    }

    pub(crate) fn write_rpc_type(&mut self, node: &RpcTypeNode) {
        self.write_inline(NodeRef::Rune(&node.open_paren));
        if let Some(stream) = &node.stream {
            self.write_inline(NodeRef::Ident(stream));
            self.ctx.space();
        }
        self.write_inline(identifier_ref(&node.message_type));
        self.write_inline(NodeRef::Rune(&node.close_paren));
    }

    // -- message literal fields --

    /// A message-literal field occupying a whole line, concluding it.
    pub(crate) fn write_message_field(&mut self, node: &MessageFieldNode) {
        self.write_message_field_prefix(node);
        self.ctx.space();
        if let Some(compound) = node.value.as_compound_string() {
            self.write_compound_string_indent(compound);
            return;
        }
        self.write_line_end(value_ref(&node.value));
    }

    /// Like [`Self::write_message_field`] but leaves room for a trailing
    /// separator owned by the caller.
    pub(crate) fn write_message_field_with_separator(&mut self, node: &MessageFieldNode) {
        self.write_message_field_prefix(node);
        self.ctx.space();
        if let Some(compound) = node.value.as_compound_string() {
            self.write_compound_string_indent_end_inline(compound);
            return;
        }
        self.write_inline(value_ref(&node.value));
    }

    /// The `name:` head of a message-literal field. Comments above the
    /// field attach to the name, written multiline — unlike field
    /// references inline in option names.
    fn write_message_field_prefix(&mut self, node: &MessageFieldNode) {
        let field_ref = &node.name;
        if let Some(open) = &field_ref.open {
            self.write_start(NodeRef::Rune(open));
            if let Some(url_prefix) = &field_ref.url_prefix {
                self.write_inline(identifier_ref(url_prefix));
            }
            if let Some(slash) = &field_ref.slash {
                self.write_inline(NodeRef::Rune(slash));
            }
            self.write_inline(identifier_ref(&field_ref.name));
        } else {
            self.write_start(identifier_ref(&field_ref.name));
        }
        self.write_field_reference_close(field_ref);
        match &node.sep {
            Some(sep) => self.write_inline(NodeRef::Rune(sep)),
            None => {
                // fill in missing ':' automatically
                let colon = RuneNode::synthetic(':');
                self.write_inline(NodeRef::Rune(&colon));
            }
        }
    }

    /// Expanded message-literal bodies: one field per line through the
    /// aligner, separators preserved where the source had them.
    pub(crate) fn write_message_literal_elements(&mut self, node: &MessageLiteralNode) {
        self.column_format_message_literal(&node.elements);
    }

    // -- aligner adapters --

    pub(crate) fn column_format_message_elements(&mut self, decls: &[pb_ast::MessageElement]) {
        use pb_ast::MessageElement::*;
        let items: Vec<ColItem<'_>> = decls
            .iter()
            .map(|decl| match decl {
                Field(n) => ColItem::Row(RowSpec::new(n, RowData::Field(n))),
                MapField(n) => ColItem::Row(RowSpec::new(n, RowData::MapField(n))),
                Option(n) => ColItem::Option {
                    node: n,
                    style: OptionStyle::Declaration,
                },
                Group(n) => ColItem::Other(NodeRef::Group(n)),
                Oneof(n) => ColItem::Other(NodeRef::Oneof(n)),
                Message(n) => ColItem::Other(NodeRef::Message(n)),
                Enum(n) => ColItem::Other(NodeRef::Enum(n)),
                Extend(n) => ColItem::Other(NodeRef::Extend(n)),
                ExtensionRange(n) => ColItem::Other(NodeRef::ExtensionRange(n)),
                Reserved(n) => ColItem::Other(NodeRef::Reserved(n)),
                Empty(_) => ColItem::Skip,
            })
            .collect();
        self.column_format(items);
    }

    pub(crate) fn column_format_enum_elements(&mut self, decls: &[pb_ast::EnumElement]) {
        use pb_ast::EnumElement::*;
        let items: Vec<ColItem<'_>> = decls
            .iter()
            .map(|decl| match decl {
                Value(n) => ColItem::Row(RowSpec::new(n, RowData::EnumValue(n))),
                Option(n) => ColItem::Option {
                    node: n,
                    style: OptionStyle::Declaration,
                },
                Reserved(n) => ColItem::Other(NodeRef::Reserved(n)),
                Empty(_) => ColItem::Skip,
            })
            .collect();
        self.column_format(items);
    }

    pub(crate) fn column_format_oneof_elements(&mut self, decls: &[pb_ast::OneofElement]) {
        use pb_ast::OneofElement::*;
        let items: Vec<ColItem<'_>> = decls
            .iter()
            .map(|decl| match decl {
                Field(n) => ColItem::Row(RowSpec::new(n, RowData::Field(n))),
                Option(n) => ColItem::Option {
                    node: n,
                    style: OptionStyle::Declaration,
                },
                Group(n) => ColItem::Other(NodeRef::Group(n)),
                Empty(_) => ColItem::Skip,
            })
            .collect();
        self.column_format(items);
    }

    pub(crate) fn column_format_extend_elements(&mut self, decls: &[pb_ast::ExtendElement]) {
        use pb_ast::ExtendElement::*;
        let items: Vec<ColItem<'_>> = decls
            .iter()
            .map(|decl| match decl {
                Field(n) => ColItem::Row(RowSpec::new(n, RowData::Field(n))),
                Group(n) => ColItem::Other(NodeRef::Group(n)),
                Empty(_) => ColItem::Skip,
            })
            .collect();
        self.column_format(items);
    }

    pub(crate) fn column_format_compact_options(&mut self, options: &[OptionNode]) {
        let entries: Vec<&OptionNode> = options.iter().filter(|o| !o.is_degenerate()).collect();
        let last = entries.len().saturating_sub(1);
        let items: Vec<ColItem<'_>> = entries
            .iter()
            .enumerate()
            .map(|(i, &option)| ColItem::Option {
                node: option,
                style: OptionStyle::CompactEntry { last: i == last },
            })
            .collect();
        self.column_format(items);
    }

    pub(crate) fn column_format_message_literal(&mut self, elements: &[MessageFieldNode]) {
        let items: Vec<ColItem<'_>> = elements.iter().map(ColItem::MessageField).collect();
        self.column_format(items);
    }
}

/// The close delimiter matching an open rune.
pub(crate) fn matching_close(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        '{' => '}',
        '<' => '>',
        other => other,
    }
}
