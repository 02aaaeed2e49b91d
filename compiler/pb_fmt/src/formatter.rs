//! Formatter Core
//!
//! The recursive walk over the CST. [`Formatter`] owns the token-writer
//! state for one file; [`NodeRef`] is the borrowed any-node union the
//! dispatch matches on. The three emission primitives mirror how a node
//! sits on its line:
//!
//! - *start*: begins a line — leading comments in multiline form, blank
//!   lines preserved, indentation, then the node, then trailing comments
//!   inline;
//! - *inline*: mid-line — comments on both sides rewritten to fit inline;
//! - *line end*: concludes a line — trailing comments keep their style and
//!   may break onto the next line.

use pb_ast::{newline_count, FileNode, NodeInfo, RuneNode, Spanned};

use crate::emitter::{Emitter, StringEmitter};
use crate::error::FormatError;
use crate::context::FormatContext;

/// Borrowed reference to any CST node, for exhaustive dispatch.
#[derive(Clone, Copy)]
pub(crate) enum NodeRef<'b> {
    ArrayLiteral(&'b pb_ast::ArrayLiteralNode),
    CompactOptions(&'b pb_ast::CompactOptionsNode),
    CompoundIdent(&'b pb_ast::CompoundIdentNode),
    CompoundString(&'b pb_ast::CompoundStringLiteralNode),
    Edition(&'b pb_ast::EditionNode),
    Enum(&'b pb_ast::EnumNode),
    EnumValue(&'b pb_ast::EnumValueNode),
    Extend(&'b pb_ast::ExtendNode),
    ExtensionRange(&'b pb_ast::ExtensionRangeNode),
    Field(&'b pb_ast::FieldNode),
    FieldReference(&'b pb_ast::FieldReferenceNode),
    Float(&'b pb_ast::FloatLiteralNode),
    Group(&'b pb_ast::GroupNode),
    Ident(&'b pb_ast::IdentNode),
    Import(&'b pb_ast::ImportNode),
    MapField(&'b pb_ast::MapFieldNode),
    MapType(&'b pb_ast::MapTypeNode),
    Message(&'b pb_ast::MessageNode),
    MessageField(&'b pb_ast::MessageFieldNode),
    MessageLiteral(&'b pb_ast::MessageLiteralNode),
    NegativeInt(&'b pb_ast::NegativeIntLiteralNode),
    Oneof(&'b pb_ast::OneofNode),
    Option(&'b pb_ast::OptionNode),
    OptionName(&'b pb_ast::OptionNameNode),
    Package(&'b pb_ast::PackageNode),
    Range(&'b pb_ast::RangeNode),
    Reserved(&'b pb_ast::ReservedNode),
    Rpc(&'b pb_ast::RpcNode),
    RpcType(&'b pb_ast::RpcTypeNode),
    Rune(&'b RuneNode),
    Service(&'b pb_ast::ServiceNode),
    SignedFloat(&'b pb_ast::SignedFloatLiteralNode),
    SpecialFloat(&'b pb_ast::SpecialFloatLiteralNode),
    String(&'b pb_ast::StringLiteralNode),
    Syntax(&'b pb_ast::SyntaxNode),
    Uint(&'b pb_ast::UintLiteralNode),
    /// A stray `;` declaration: dropped from output.
    EmptyDecl(&'b RuneNode),
}

impl<'b> NodeRef<'b> {
    /// Terminal nodes write their own comments in the inline/line-end
    /// primitives; composites delegate to their children.
    pub(crate) fn is_terminal(self) -> bool {
        matches!(
            self,
            NodeRef::Ident(_)
                | NodeRef::Rune(_)
                | NodeRef::String(_)
                | NodeRef::Uint(_)
                | NodeRef::Float(_)
        )
    }

    pub(crate) fn spanned(self) -> &'b dyn Spanned {
        match self {
            NodeRef::ArrayLiteral(n) => n,
            NodeRef::CompactOptions(n) => n,
            NodeRef::CompoundIdent(n) => n,
            NodeRef::CompoundString(n) => n,
            NodeRef::Edition(n) => n,
            NodeRef::Enum(n) => n,
            NodeRef::EnumValue(n) => n,
            NodeRef::Extend(n) => n,
            NodeRef::ExtensionRange(n) => n,
            NodeRef::Field(n) => n,
            NodeRef::FieldReference(n) => n,
            NodeRef::Float(n) => n,
            NodeRef::Group(n) => n,
            NodeRef::Ident(n) => n,
            NodeRef::Import(n) => n,
            NodeRef::MapField(n) => n,
            NodeRef::MapType(n) => n,
            NodeRef::Message(n) => n,
            NodeRef::MessageField(n) => n,
            NodeRef::MessageLiteral(n) => n,
            NodeRef::NegativeInt(n) => n,
            NodeRef::Oneof(n) => n,
            NodeRef::Option(n) => n,
            NodeRef::OptionName(n) => n,
            NodeRef::Package(n) => n,
            NodeRef::Range(n) => n,
            NodeRef::Reserved(n) => n,
            NodeRef::Rpc(n) => n,
            NodeRef::RpcType(n) => n,
            NodeRef::Rune(n) => n,
            NodeRef::Service(n) => n,
            NodeRef::SignedFloat(n) => n,
            NodeRef::SpecialFloat(n) => n,
            NodeRef::String(n) => n,
            NodeRef::Syntax(n) => n,
            NodeRef::Uint(n) => n,
            NodeRef::EmptyDecl(n) => n,
        }
    }

    /// The rune character, for indentation decisions at line starts.
    pub(crate) fn rune_char(self) -> Option<char> {
        match self {
            NodeRef::Rune(r) => Some(r.rune),
            _ => None,
        }
    }
}

/// Map a value node onto the dispatch union.
pub(crate) fn value_ref(value: &pb_ast::ValueNode) -> NodeRef<'_> {
    use pb_ast::ValueNode::*;
    match value {
        Ident(n) => NodeRef::Ident(n),
        CompoundIdent(n) => NodeRef::CompoundIdent(n),
        String(n) => NodeRef::String(n),
        CompoundString(n) => NodeRef::CompoundString(n),
        Uint(n) => NodeRef::Uint(n),
        NegativeInt(n) => NodeRef::NegativeInt(n),
        Float(n) => NodeRef::Float(n),
        SignedFloat(n) => NodeRef::SignedFloat(n),
        SpecialFloat(n) => NodeRef::SpecialFloat(n),
        Array(n) => NodeRef::ArrayLiteral(n),
        Message(n) => NodeRef::MessageLiteral(n),
    }
}

pub(crate) fn identifier_ref(ident: &pb_ast::IdentifierNode) -> NodeRef<'_> {
    match ident {
        pb_ast::IdentifierNode::Ident(n) => NodeRef::Ident(n),
        pb_ast::IdentifierNode::Compound(n) => NodeRef::CompoundIdent(n),
    }
}

pub(crate) fn string_value_ref(value: &pb_ast::StringValueNode) -> NodeRef<'_> {
    match value {
        pb_ast::StringValueNode::Single(n) => NodeRef::String(n),
        pb_ast::StringValueNode::Compound(n) => NodeRef::CompoundString(n),
    }
}

pub(crate) fn int_value_ref(value: &pb_ast::IntValueNode) -> NodeRef<'_> {
    match value {
        pb_ast::IntValueNode::Uint(n) => NodeRef::Uint(n),
        pb_ast::IntValueNode::Negative(n) => NodeRef::NegativeInt(n),
    }
}

pub(crate) fn float_value_ref(value: &pb_ast::FloatValueNode) -> NodeRef<'_> {
    match value {
        pb_ast::FloatValueNode::Float(n) => NodeRef::Float(n),
        pb_ast::FloatValueNode::Special(n) => NodeRef::SpecialFloat(n),
    }
}

/// What the previously-completed writer emitted, reduced to what the
/// blank-line logic needs to know.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PreviousNode {
    /// Start of file; nothing written yet.
    None,
    /// An opening `{`, `[`, or `<` — suppresses a leading blank inside the
    /// new block.
    OpenBrace,
    Other,
}

/// Streaming formatter for one file. Create one instance per file; state
/// never crosses files.
pub struct Formatter<'a, E: Emitter> {
    pub(crate) file: &'a FileNode,
    pub(crate) ctx: FormatContext<E>,
    pub(crate) previous: PreviousNode,
}

impl<'a, E: Emitter> Formatter<'a, E> {
    pub fn new(file: &'a FileNode, emitter: E) -> Self {
        Self {
            file,
            ctx: FormatContext::new(emitter),
            previous: PreviousNode::None,
        }
    }

    /// Format the whole file into the sink. Accumulated errors (all of
    /// which indicate bugs or sink failures) are surfaced afterwards via
    /// [`Formatter::finish`].
    pub fn run(&mut self) {
        self.write_file();
    }

    pub fn finish(mut self) -> (E, Option<FormatError>) {
        let errors = self.ctx.take_errors();
        let (emitter, late) = self.ctx.into_parts();
        let mut all = errors;
        all.extend(late);
        (emitter, FormatError::join(all))
    }

    /// Trivia for any node. The returned view borrows the file, not the
    /// formatter, so writers can keep mutating state while holding it.
    pub(crate) fn info_of(&self, node: &dyn Spanned) -> NodeInfo<'a> {
        self.file.node_info(node)
    }

    pub(crate) fn set_previous(&mut self, node: NodeRef<'_>) {
        self.previous = match node {
            NodeRef::Rune(r) if "{[<".contains(r.rune) => PreviousNode::OpenBrace,
            _ => PreviousNode::Other,
        };
    }

    pub(crate) fn internal_error(&mut self, message: impl Into<String>) {
        self.ctx.push_error(FormatError::Internal(message.into()));
    }

    /// Snapshot state onto a scratch formatter whose output goes to an
    /// in-memory buffer. Speculative layout decisions render through the
    /// scratch and either merge back or drop it.
    pub fn save_state(&self) -> Formatter<'a, StringEmitter> {
        Formatter {
            file: self.file,
            ctx: self.ctx.save(StringEmitter::new()),
            previous: self.previous,
        }
    }

    /// Accept a speculative rendering: append its buffer and adopt its
    /// state. The rejection path simply drops the scratch formatter.
    pub fn merge_state(&mut self, other: Formatter<'a, StringEmitter>) {
        self.ctx.merge(other.ctx);
        self.previous = other.previous;
    }

    // -- dispatch --

    pub(crate) fn write_node(&mut self, node: NodeRef<'_>) {
        match node {
            NodeRef::ArrayLiteral(n) => self.write_array_literal(n),
            NodeRef::CompactOptions(n) => self.write_compact_options(n),
            NodeRef::CompoundIdent(n) => self.write_compound_ident(n),
            NodeRef::CompoundString(n) => self.write_compound_string_indent_end_inline(n),
            NodeRef::Edition(n) => self.write_edition(n),
            NodeRef::Enum(n) => self.write_enum(n),
            NodeRef::EnumValue(n) => self.write_enum_value(n),
            NodeRef::Extend(n) => self.write_extend(n),
            NodeRef::ExtensionRange(n) => self.write_extension_range(n),
            NodeRef::Field(n) => self.write_field(n),
            NodeRef::FieldReference(n) => self.write_field_reference(n),
            NodeRef::Float(n) => self.write_float_literal(n),
            NodeRef::Group(n) => self.write_group(n),
            NodeRef::Ident(n) => self.write_ident(n),
            NodeRef::Import(n) => self.write_import(n, false),
            NodeRef::MapField(n) => self.write_map_field(n),
            NodeRef::MapType(n) => self.write_map_type(n, true),
            NodeRef::Message(n) => self.write_message(n),
            NodeRef::MessageField(n) => self.write_message_field(n),
            NodeRef::MessageLiteral(n) => self.write_message_literal(n),
            NodeRef::NegativeInt(n) => self.write_negative_int_literal(n),
            NodeRef::Oneof(n) => self.write_oneof(n),
            NodeRef::Option(n) => self.write_option(n),
            NodeRef::OptionName(n) => self.write_option_name(n),
            NodeRef::Package(n) => self.write_package(n),
            NodeRef::Range(n) => self.write_range(n),
            NodeRef::Reserved(n) => self.write_reserved(n),
            NodeRef::Rpc(n) => self.write_rpc(n),
            NodeRef::RpcType(n) => self.write_rpc_type(n),
            NodeRef::Rune(n) => self.write_rune(n),
            NodeRef::Service(n) => self.write_service(n),
            NodeRef::SignedFloat(n) => self.write_signed_float_literal(n),
            NodeRef::SpecialFloat(n) => self.write_special_float_literal(n),
            NodeRef::String(n) => self.write_string_literal(n),
            NodeRef::Syntax(n) => self.write_syntax(n),
            NodeRef::Uint(n) => self.write_uint_literal(n),
            NodeRef::EmptyDecl(_) => {}
        }
    }

    // -- emission primitives --

    /// Write a node as the start of a line.
    pub(crate) fn write_start(&mut self, node: NodeRef<'_>) {
        self.write_start_maybe_compact(node, false);
    }

    /// Like [`Self::write_start`], but `force_compact` suppresses blank
    /// line preservation (used for sorted header elements, whose source
    /// grouping is meaningless after reordering).
    pub(crate) fn write_start_maybe_compact(&mut self, node: NodeRef<'_>, force_compact: bool) {
        self.write_start_prelude(node.spanned(), node.rune_char(), force_compact);
        let info = self.info_of(node.spanned());
        self.write_node(node);
        if !info.trailing_comments.is_empty() {
            self.write_inline_comments(info.trailing_comments);
        }
        self.set_previous(node);
    }

    /// The front half of a line start: leading comments, preserved blank
    /// lines, and indentation — everything up to the node itself. The
    /// column aligner shares this with the plain start primitive.
    pub(crate) fn write_start_prelude(
        &mut self,
        node: &dyn Spanned,
        next_rune: Option<char>,
        force_compact: bool,
    ) {
        let info = self.info_of(node);
        let node_newlines = newline_count(info.leading_ws);
        let compact = force_compact || self.previous == PreviousNode::OpenBrace;
        if !info.leading_comments.is_empty() {
            // The whitespace that matters is attached to the first
            // comment; `node_newlines` now measures the gap between the
            // last comment and the node.
            self.write_multiline_comments_maybe_compact(info.leading_comments, force_compact);
            if !force_compact && node_newlines > 1 {
                self.ctx.p("");
            }
        } else if !compact && node_newlines > 1 {
            self.ctx.p("");
        }
        self.ctx.do_indent(next_rune);
    }

    /// Write a node and its comments mid-line. Line comments that must
    /// appear here are rewritten to block style.
    pub(crate) fn write_inline(&mut self, node: NodeRef<'_>) {
        self.ctx.inline = true;
        if !node.is_terminal() {
            // Composites delegate; their terminals write the comments.
            self.write_node(node);
            self.ctx.inline = false;
            return;
        }
        let info = self.info_of(node.spanned());
        if !info.leading_comments.is_empty() {
            self.write_inline_comments(info.leading_comments);
            if !info.leading_ws.is_empty() {
                self.ctx.space();
            }
        }
        self.write_node(node);
        self.write_inline_comments(info.trailing_comments);
        self.set_previous(node);
        self.ctx.inline = false;
    }

    /// Write a node that concludes a composite type body (`}` and
    /// friends). Leading comments go above on their own lines unless
    /// `leading_endline`; trailing comments keep their style.
    pub(crate) fn write_body_end(
        &mut self,
        node: NodeRef<'_>,
        semicolon: Option<&RuneNode>,
        leading_endline: bool,
    ) {
        if !node.is_terminal() {
            self.write_node(node);
            if self.ctx.last_written() != '\n' {
                self.ctx.p("");
            }
            return;
        }
        let info = self.info_of(node.spanned());
        if leading_endline {
            if !info.leading_comments.is_empty() {
                self.write_inline_comments(info.leading_comments);
                if !info.leading_ws.is_empty() {
                    self.ctx.space();
                }
            }
        } else {
            self.write_multiline_comments(info.leading_comments);
            self.ctx.do_indent(node.rune_char());
        }
        self.write_node(node);

        // A dropped trailing `;` may still carry the line's comments.
        let trailing = if !info.trailing_comments.is_empty() {
            info.trailing_comments
        } else if let Some(semi) = semicolon {
            self.info_of(semi).trailing_comments
        } else {
            &[]
        };
        self.write_trailing_end_comments(trailing);
        self.set_previous(node);
    }

    /// Write a node on its own line within a multi-line composite value.
    pub(crate) fn write_line_element(&mut self, node: NodeRef<'_>) {
        self.write_body_end(node, None, false);
    }

    /// Write a node that concludes a composite *value* body (`]` of
    /// compact options, etc.) — like [`Self::write_body_end`] but the line
    /// is left open for whatever follows.
    pub(crate) fn write_body_end_inline(
        &mut self,
        node: NodeRef<'_>,
        semicolon: Option<&RuneNode>,
        leading_inline: bool,
    ) {
        if !node.is_terminal() {
            self.write_node(node);
            return;
        }
        let info = self.info_of(node.spanned());
        if leading_inline {
            if !info.leading_comments.is_empty() {
                self.write_inline_comments(info.leading_comments);
                if !info.leading_ws.is_empty() {
                    self.ctx.space();
                }
            }
        } else {
            self.write_multiline_comments(info.leading_comments);
            self.ctx.do_indent(node.rune_char());
        }
        self.write_node(node);

        let trailing = if !info.trailing_comments.is_empty() {
            info.trailing_comments
        } else if let Some(semi) = semicolon {
            self.info_of(semi).trailing_comments
        } else {
            &[]
        };
        if !trailing.is_empty() {
            self.write_inline_comments(trailing);
        }
        self.set_previous(node);
    }

    /// Write a node so that it ends the current line. Trailing comments
    /// keep their original style; a newline in their leading whitespace
    /// moves them under the line.
    pub(crate) fn write_line_end(&mut self, node: NodeRef<'_>) {
        if !node.is_terminal() {
            self.write_node(node);
            if self.ctx.last_written() != '\n' {
                self.ctx.p("");
            }
            return;
        }
        let info = self.info_of(node.spanned());
        if !info.leading_comments.is_empty() {
            self.write_inline_comments(info.leading_comments);
            if !info.leading_ws.is_empty() {
                self.ctx.space();
            }
        }
        self.write_node(node);
        self.ctx.space();
        self.write_trailing_end_comments(info.trailing_comments);
        self.set_previous(node);
    }

    // -- file --

    fn write_file(&mut self) {
        self.write_file_header();
        self.write_file_body();
        let eof_info = self.file.token_info(self.file.eof());
        self.write_multiline_comments(eof_info.leading_comments);
        if self.ctx.wrote_anything() && self.ctx.last_written() != '\n' {
            // If anything was written, we always conclude with a newline.
            self.ctx.p("");
        }
    }

    fn write_file_body(&mut self) {
        use pb_ast::FileElement;
        for decl in self.file.decls() {
            match decl {
                // Already written by the header pass.
                FileElement::Package(_)
                | FileElement::Import(_)
                | FileElement::Option(_)
                | FileElement::Empty(_) => continue,
                FileElement::Message(m) => self.write_file_type(NodeRef::Message(m)),
                FileElement::Enum(e) => self.write_file_type(NodeRef::Enum(e)),
                FileElement::Extend(e) => self.write_file_type(NodeRef::Extend(e)),
                FileElement::Service(s) => self.write_file_type(NodeRef::Service(s)),
            }
        }
    }

    fn write_file_type(&mut self, node: NodeRef<'_>) {
        if self.previous != PreviousNode::None && !self.leading_trivia_contains_blank_line(node.spanned())
        {
            self.ctx.p("");
        }
        self.write_node(node);
    }

    /// True when the node's own leading trivia already provides a blank
    /// line, so the header/body separator must not add another.
    pub(crate) fn leading_trivia_contains_blank_line(&self, node: &dyn Spanned) -> bool {
        let info = self.info_of(node);
        if info
            .leading_comments
            .iter()
            .any(|c| newline_count(&c.leading_ws) > 1)
        {
            return true;
        }
        newline_count(info.leading_ws) > 1
    }
}

pub(crate) fn is_terminal_value(value: &pb_ast::ValueNode) -> bool {
    matches!(
        value,
        pb_ast::ValueNode::Ident(_)
            | pb_ast::ValueNode::String(_)
            | pb_ast::ValueNode::Uint(_)
            | pb_ast::ValueNode::Float(_)
            | pb_ast::ValueNode::SpecialFloat(_)
    )
}

/// Interior comments: leading comments on any node but the first, or
/// trailing comments on any but the last. They force expanded layout so
/// no comment ends up inside a compact rendering.
pub(crate) fn has_interior_comments<E: Emitter>(
    f: &Formatter<'_, E>,
    nodes: &[&dyn Spanned],
) -> bool {
    for (i, node) in nodes.iter().enumerate() {
        let info = f.info_of(*node);
        if i > 0 && !info.leading_comments.is_empty() {
            return true;
        }
        if i + 1 < nodes.len() && !info.trailing_comments.is_empty() {
            return true;
        }
    }
    false
}
