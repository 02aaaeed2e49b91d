//! CST Node Types
//!
//! One variant per Protobuf construct, as plain structs with public fields.
//! Terminal nodes hold a [`TokenId`] into the file's trivia table; a `None`
//! token marks a node synthesized by error recovery (virtual), which prints
//! nothing and contributes no comments.
//!
//! Dispatch is by exhaustive `match` over [`NodeRef`], the borrowed
//! any-node union used by tree walkers.

use crate::file_info::{FileInfo, NodeInfo, TokenId};

/// A single punctuation rune (`;`, `=`, `{`, …).
///
/// `token == None` means the rune was synthesized during error recovery.
#[derive(Clone, Debug)]
pub struct RuneNode {
    pub rune: char,
    pub token: Option<TokenId>,
}

impl RuneNode {
    pub fn new(rune: char, token: TokenId) -> Self {
        Self {
            rune,
            token: Some(token),
        }
    }

    /// A synthesized rune covering a missing source token.
    pub fn synthetic(rune: char) -> Self {
        Self { rune, token: None }
    }

    pub fn is_virtual(&self) -> bool {
        self.token.is_none()
    }
}

/// An identifier or keyword token.
#[derive(Clone, Debug)]
pub struct IdentNode {
    pub value: String,
    pub token: TokenId,
}

/// A string literal token. `value` is the decoded contents (used for import
/// sorting); the exact source text lives in the trivia table.
#[derive(Clone, Debug)]
pub struct StringLiteralNode {
    pub value: String,
    pub token: TokenId,
}

/// Adjacent string literals concatenated by the grammar.
#[derive(Clone, Debug)]
pub struct CompoundStringLiteralNode {
    pub elements: Vec<StringLiteralNode>,
}

impl CompoundStringLiteralNode {
    pub fn as_string(&self) -> String {
        self.elements.iter().map(|e| e.value.as_str()).collect()
    }
}

/// Single or compound string value.
#[derive(Clone, Debug)]
pub enum StringValueNode {
    Single(StringLiteralNode),
    Compound(CompoundStringLiteralNode),
}

impl StringValueNode {
    pub fn as_string(&self) -> String {
        match self {
            StringValueNode::Single(s) => s.value.clone(),
            StringValueNode::Compound(c) => c.as_string(),
        }
    }
}

/// An unsigned integer literal in any base.
#[derive(Clone, Debug)]
pub struct UintLiteralNode {
    pub value: u64,
    pub token: TokenId,
}

/// `- <uint>`.
#[derive(Clone, Debug)]
pub struct NegativeIntLiteralNode {
    pub minus: RuneNode,
    pub uint: UintLiteralNode,
}

/// A floating point literal token.
#[derive(Clone, Debug)]
pub struct FloatLiteralNode {
    pub value: f64,
    pub token: TokenId,
}

/// `inf` or `nan`.
#[derive(Clone, Debug)]
pub struct SpecialFloatLiteralNode {
    pub keyword: IdentNode,
}

/// The float part of a signed float literal.
#[derive(Clone, Debug)]
pub enum FloatValueNode {
    Float(FloatLiteralNode),
    Special(SpecialFloatLiteralNode),
}

/// `- <float>` / `- inf`.
#[derive(Clone, Debug)]
pub struct SignedFloatLiteralNode {
    pub sign: RuneNode,
    pub float: FloatValueNode,
}

/// One segment of a dotted identifier: a dot rune or a name.
#[derive(Clone, Debug)]
pub enum CompoundIdentPart {
    Dot(RuneNode),
    Ident(IdentNode),
}

/// A dotted identifier (`.com.foo.Bar`), dots interleaved with names.
#[derive(Clone, Debug)]
pub struct CompoundIdentNode {
    pub components: Vec<CompoundIdentPart>,
}

impl CompoundIdentNode {
    pub fn as_string(&self) -> String {
        let mut out = String::new();
        for part in &self.components {
            match part {
                CompoundIdentPart::Dot(d) => out.push(d.rune),
                CompoundIdentPart::Ident(i) => out.push_str(&i.value),
            }
        }
        out
    }
}

/// A plain or dotted identifier.
#[derive(Clone, Debug)]
pub enum IdentifierNode {
    Ident(IdentNode),
    Compound(CompoundIdentNode),
}

impl IdentifierNode {
    pub fn as_string(&self) -> String {
        match self {
            IdentifierNode::Ident(i) => i.value.clone(),
            IdentifierNode::Compound(c) => c.as_string(),
        }
    }
}

/// A positive or negative integer value.
#[derive(Clone, Debug)]
pub enum IntValueNode {
    Uint(UintLiteralNode),
    Negative(NegativeIntLiteralNode),
}

/// Any option / literal value.
#[derive(Clone, Debug)]
pub enum ValueNode {
    Ident(IdentNode),
    CompoundIdent(CompoundIdentNode),
    String(StringLiteralNode),
    CompoundString(CompoundStringLiteralNode),
    Uint(UintLiteralNode),
    NegativeInt(NegativeIntLiteralNode),
    Float(FloatLiteralNode),
    SignedFloat(SignedFloatLiteralNode),
    SpecialFloat(SpecialFloatLiteralNode),
    Array(ArrayLiteralNode),
    Message(MessageLiteralNode),
}

impl ValueNode {
    pub fn as_compound_string(&self) -> Option<&CompoundStringLiteralNode> {
        match self {
            ValueNode::CompoundString(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayLiteralNode> {
        match self {
            ValueNode::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&MessageLiteralNode> {
        match self {
            ValueNode::Message(m) => Some(m),
            _ => None,
        }
    }
}

/// `syntax = "proto3";`
#[derive(Clone, Debug)]
pub struct SyntaxNode {
    pub keyword: IdentNode,
    pub equals: RuneNode,
    pub value: Option<StringValueNode>,
    pub semicolon: Option<RuneNode>,
}

/// `edition = "2023";`
#[derive(Clone, Debug)]
pub struct EditionNode {
    pub keyword: IdentNode,
    pub equals: RuneNode,
    pub value: Option<StringValueNode>,
    pub semicolon: Option<RuneNode>,
}

/// `package acme.v1;`
#[derive(Clone, Debug)]
pub struct PackageNode {
    pub keyword: IdentNode,
    pub name: Option<IdentifierNode>,
    pub semicolon: Option<RuneNode>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportModifier {
    Public,
    Weak,
}

/// The `public` / `weak` keyword on an import.
#[derive(Clone, Debug)]
pub struct ImportModifierNode {
    pub kind: ImportModifier,
    pub keyword: IdentNode,
}

/// `import "a.proto";`
#[derive(Clone, Debug)]
pub struct ImportNode {
    pub keyword: IdentNode,
    pub modifier: Option<ImportModifierNode>,
    pub name: StringValueNode,
    pub semicolon: Option<RuneNode>,
}

/// One segment of an option name: a parenthesized or plain field
/// reference, or the dot between segments.
#[derive(Clone, Debug)]
pub enum OptionNamePart {
    FieldRef(FieldReferenceNode),
    Dot(RuneNode),
}

/// A full option name, e.g. `(custom.thing).bridge.(another.thing)`.
#[derive(Clone, Debug)]
pub struct OptionNameNode {
    pub parts: Vec<OptionNamePart>,
}

/// An option-name component, optionally parenthesized for extensions and
/// optionally carrying an Any-URL prefix inside message literals.
#[derive(Clone, Debug)]
pub struct FieldReferenceNode {
    pub open: Option<RuneNode>,
    pub url_prefix: Option<IdentifierNode>,
    pub slash: Option<RuneNode>,
    pub name: IdentifierNode,
    pub close: Option<RuneNode>,
}

impl FieldReferenceNode {
    pub fn is_extension(&self) -> bool {
        self.open.is_some()
    }
}

/// `option foo = value;` or a compact-option entry.
#[derive(Clone, Debug)]
pub struct OptionNode {
    /// `option` keyword; absent inside compact options.
    pub keyword: Option<IdentNode>,
    pub name: Option<OptionNameNode>,
    pub equals: Option<RuneNode>,
    pub value: Option<ValueNode>,
    /// `;` at file/body scope, `,` between compact options.
    pub semicolon: Option<RuneNode>,
}

impl OptionNode {
    /// A degenerate entry produced by recovery (e.g. a stray leading comma
    /// in a compact-options list).
    pub fn is_degenerate(&self) -> bool {
        self.name.is_none() && self.equals.is_none() && self.value.is_none()
    }
}

/// `[deprecated = true, ...]`
#[derive(Clone, Debug)]
pub struct CompactOptionsNode {
    pub open_bracket: RuneNode,
    pub options: Vec<OptionNode>,
    pub close_bracket: RuneNode,
    pub semicolon: Option<RuneNode>,
}

/// `message Foo { ... }`
#[derive(Clone, Debug)]
pub struct MessageNode {
    pub keyword: IdentNode,
    pub name: IdentNode,
    pub open_brace: RuneNode,
    pub decls: Vec<MessageElement>,
    pub close_brace: RuneNode,
    pub semicolon: Option<RuneNode>,
}

#[derive(Clone, Debug)]
pub enum MessageElement {
    Field(FieldNode),
    MapField(MapFieldNode),
    Group(GroupNode),
    Oneof(OneofNode),
    Option(OptionNode),
    Message(MessageNode),
    Enum(EnumNode),
    Extend(ExtendNode),
    ExtensionRange(ExtensionRangeNode),
    Reserved(ReservedNode),
    Empty(RuneNode),
}

/// `optional string name = 1 [ ... ];`
#[derive(Clone, Debug)]
pub struct FieldNode {
    pub label: Option<IdentNode>,
    pub field_type: IdentifierNode,
    pub name: Option<IdentNode>,
    pub equals: Option<RuneNode>,
    pub tag: Option<UintLiteralNode>,
    pub options: Option<CompactOptionsNode>,
    pub semicolon: Option<RuneNode>,
}

/// `map<string, int32> pairs = 1;`
#[derive(Clone, Debug)]
pub struct MapFieldNode {
    pub map_type: MapTypeNode,
    pub name: Option<IdentNode>,
    pub equals: Option<RuneNode>,
    pub tag: Option<UintLiteralNode>,
    pub options: Option<CompactOptionsNode>,
    pub semicolon: Option<RuneNode>,
}

/// `map<string, int32>`
#[derive(Clone, Debug)]
pub struct MapTypeNode {
    pub keyword: IdentNode,
    pub open_angle: RuneNode,
    pub key_type: IdentNode,
    pub comma: RuneNode,
    pub value_type: IdentifierNode,
    pub close_angle: RuneNode,
    /// Recovery-attached terminator; carries trailing comments only.
    pub semicolon: Option<RuneNode>,
}

/// proto2 `group` field with a body.
#[derive(Clone, Debug)]
pub struct GroupNode {
    pub label: Option<IdentNode>,
    pub keyword: IdentNode,
    pub name: IdentNode,
    pub equals: Option<RuneNode>,
    pub tag: Option<UintLiteralNode>,
    pub options: Option<CompactOptionsNode>,
    pub open_brace: RuneNode,
    pub decls: Vec<MessageElement>,
    pub close_brace: RuneNode,
    pub semicolon: Option<RuneNode>,
}

/// `oneof foo { ... }`
#[derive(Clone, Debug)]
pub struct OneofNode {
    pub keyword: IdentNode,
    pub name: IdentNode,
    pub open_brace: RuneNode,
    pub decls: Vec<OneofElement>,
    pub close_brace: RuneNode,
    pub semicolon: Option<RuneNode>,
}

#[derive(Clone, Debug)]
pub enum OneofElement {
    Option(OptionNode),
    Field(FieldNode),
    Group(GroupNode),
    Empty(RuneNode),
}

/// `enum Foo { ... }`
#[derive(Clone, Debug)]
pub struct EnumNode {
    pub keyword: IdentNode,
    pub name: IdentNode,
    pub open_brace: RuneNode,
    pub decls: Vec<EnumElement>,
    pub close_brace: RuneNode,
    pub semicolon: Option<RuneNode>,
}

#[derive(Clone, Debug)]
pub enum EnumElement {
    Option(OptionNode),
    Value(EnumValueNode),
    Reserved(ReservedNode),
    Empty(RuneNode),
}

/// `FOO_UNSPECIFIED = 0 [ ... ];`
#[derive(Clone, Debug)]
pub struct EnumValueNode {
    pub name: IdentNode,
    pub equals: Option<RuneNode>,
    pub number: Option<IntValueNode>,
    pub options: Option<CompactOptionsNode>,
    pub semicolon: Option<RuneNode>,
}

/// `extend google.protobuf.FieldOptions { ... }`
#[derive(Clone, Debug)]
pub struct ExtendNode {
    pub keyword: IdentNode,
    pub extendee: Option<IdentifierNode>,
    pub open_brace: RuneNode,
    pub decls: Vec<ExtendElement>,
    pub close_brace: RuneNode,
    pub semicolon: Option<RuneNode>,
}

#[derive(Clone, Debug)]
pub enum ExtendElement {
    Field(FieldNode),
    Group(GroupNode),
    Empty(RuneNode),
}

/// A range list entry: a range or the comma between ranges.
#[derive(Clone, Debug)]
pub enum RangeElement {
    Range(RangeNode),
    Comma(RuneNode),
}

impl RangeElement {
    pub fn as_comma(&self) -> Option<&RuneNode> {
        match self {
            RangeElement::Comma(c) => Some(c),
            RangeElement::Range(_) => None,
        }
    }
}

/// `extensions 5 to 10, 100 to max [ ... ];`
#[derive(Clone, Debug)]
pub struct ExtensionRangeNode {
    pub keyword: IdentNode,
    pub elements: Vec<RangeElement>,
    pub options: Option<CompactOptionsNode>,
    pub semicolon: Option<RuneNode>,
}

/// A reserved list entry: range, string name, ident name (editions), or
/// the comma between entries.
#[derive(Clone, Debug)]
pub enum ReservedElement {
    Range(RangeNode),
    Name(StringLiteralNode),
    Ident(IdentNode),
    Comma(RuneNode),
}

impl ReservedElement {
    pub fn as_comma(&self) -> Option<&RuneNode> {
        match self {
            ReservedElement::Comma(c) => Some(c),
            _ => None,
        }
    }
}

/// `reserved 5, 100 to max;` / `reserved "foo";`
#[derive(Clone, Debug)]
pub struct ReservedNode {
    pub keyword: IdentNode,
    pub elements: Vec<ReservedElement>,
    pub semicolon: Option<RuneNode>,
}

/// `1 to max` — either `end` or `max` may be set, never both.
#[derive(Clone, Debug)]
pub struct RangeNode {
    pub start: IntValueNode,
    pub to: Option<IdentNode>,
    pub end: Option<IntValueNode>,
    pub max: Option<IdentNode>,
}

/// `service FooService { ... }`
#[derive(Clone, Debug)]
pub struct ServiceNode {
    pub keyword: IdentNode,
    pub name: IdentNode,
    pub open_brace: RuneNode,
    pub decls: Vec<ServiceElement>,
    pub close_brace: RuneNode,
    pub semicolon: Option<RuneNode>,
}

#[derive(Clone, Debug)]
pub enum ServiceElement {
    Option(OptionNode),
    Rpc(RpcNode),
    Empty(RuneNode),
}

/// `rpc Foo(FooRequest) returns (FooResponse) { ... }`
#[derive(Clone, Debug)]
pub struct RpcNode {
    pub keyword: IdentNode,
    pub name: IdentNode,
    pub input: RpcTypeNode,
    pub returns: Option<IdentNode>,
    pub output: RpcTypeNode,
    pub open_brace: Option<RuneNode>,
    pub decls: Vec<RpcElement>,
    pub close_brace: Option<RuneNode>,
    pub semicolon: Option<RuneNode>,
}

#[derive(Clone, Debug)]
pub enum RpcElement {
    Option(OptionNode),
    Empty(RuneNode),
}

/// `(stream foo.Bar)`
#[derive(Clone, Debug)]
pub struct RpcTypeNode {
    pub open_paren: RuneNode,
    pub stream: Option<IdentNode>,
    pub message_type: IdentifierNode,
    pub close_paren: RuneNode,
}

/// An array literal entry: a value or the comma between values.
#[derive(Clone, Debug)]
pub enum ArrayElement {
    Value(ValueNode),
    Comma(RuneNode),
}

/// `[1, 2, 3]`
#[derive(Clone, Debug)]
pub struct ArrayLiteralNode {
    pub open_bracket: RuneNode,
    pub elements: Vec<ArrayElement>,
    pub close_bracket: RuneNode,
    pub semicolon: Option<RuneNode>,
}

impl ArrayLiteralNode {
    /// Values in order, each paired with the comma that follows it (if the
    /// source had one).
    pub fn split(&self) -> (Vec<&ValueNode>, Vec<Option<&RuneNode>>) {
        let mut values = Vec::new();
        let mut commas = Vec::new();
        for elem in &self.elements {
            match elem {
                ArrayElement::Value(v) => {
                    values.push(v);
                    commas.push(None);
                }
                ArrayElement::Comma(c) => {
                    if let Some(last) = commas.last_mut() {
                        *last = Some(c);
                    }
                }
            }
        }
        (values, commas)
    }

    pub fn values(&self) -> impl Iterator<Item = &ValueNode> {
        self.elements.iter().filter_map(|e| match e {
            ArrayElement::Value(v) => Some(v),
            ArrayElement::Comma(_) => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.values().next().is_none()
    }
}

/// `{ foo: 1 bar: 2 }` or the `< ... >` form.
#[derive(Clone, Debug)]
pub struct MessageLiteralNode {
    pub open: RuneNode,
    pub elements: Vec<MessageFieldNode>,
    pub close: RuneNode,
    pub semicolon: Option<RuneNode>,
}

/// `foo: 1` inside a message literal. `sep` is the `:`, which the grammar
/// allows to be omitted before composite values; `semicolon` is the
/// optional `,` or `;` after the value.
#[derive(Clone, Debug)]
pub struct MessageFieldNode {
    pub name: FieldReferenceNode,
    pub sep: Option<RuneNode>,
    pub value: ValueNode,
    pub semicolon: Option<RuneNode>,
}

/// A top-level file element.
#[derive(Clone, Debug)]
pub enum FileElement {
    Package(PackageNode),
    Import(ImportNode),
    Option(OptionNode),
    Message(MessageNode),
    Enum(EnumNode),
    Extend(ExtendNode),
    Service(ServiceNode),
    Empty(RuneNode),
}

/// A parsed `.proto` file: the CST plus its trivia table.
#[derive(Debug)]
pub struct FileNode {
    syntax: Option<SyntaxNode>,
    edition: Option<EditionNode>,
    decls: Vec<FileElement>,
    eof: TokenId,
    info: FileInfo,
}

impl FileNode {
    pub fn new(
        syntax: Option<SyntaxNode>,
        edition: Option<EditionNode>,
        decls: Vec<FileElement>,
        eof: TokenId,
        info: FileInfo,
    ) -> Self {
        Self {
            syntax,
            edition,
            decls,
            eof,
            info,
        }
    }

    pub fn syntax(&self) -> Option<&SyntaxNode> {
        self.syntax.as_ref()
    }

    pub fn edition(&self) -> Option<&EditionNode> {
        self.edition.as_ref()
    }

    pub fn decls(&self) -> &[FileElement] {
        &self.decls
    }

    /// Sentinel end-of-file token; its leading comments are the file's
    /// trailing comments.
    pub fn eof(&self) -> TokenId {
        self.eof
    }

    pub fn file_info(&self) -> &FileInfo {
        &self.info
    }

    /// Trivia for any node, resolved through its first/last terminal.
    /// Virtual nodes yield empty info.
    pub fn node_info(&self, node: &dyn Spanned) -> NodeInfo<'_> {
        match (node.first_token(), node.last_token()) {
            (Some(first), Some(last)) => self.info.span_info(first, last),
            _ => NodeInfo::EMPTY,
        }
    }

    pub fn token_info(&self, id: TokenId) -> NodeInfo<'_> {
        self.info.span_info(id, id)
    }
}

/// Resolves a node to the tokens at its edges. Virtual nodes (and nodes
/// whose edges are virtual) report `None` and carry no trivia.
pub trait Spanned {
    fn first_token(&self) -> Option<TokenId>;
    fn last_token(&self) -> Option<TokenId>;
}

fn first_of(nodes: &[&dyn Spanned]) -> Option<TokenId> {
    nodes.iter().find_map(|n| n.first_token())
}

fn last_of(nodes: &[&dyn Spanned]) -> Option<TokenId> {
    nodes.iter().rev().find_map(|n| n.last_token())
}

impl<T: Spanned> Spanned for Option<T> {
    fn first_token(&self) -> Option<TokenId> {
        self.as_ref().and_then(Spanned::first_token)
    }
    fn last_token(&self) -> Option<TokenId> {
        self.as_ref().and_then(Spanned::last_token)
    }
}

impl Spanned for RuneNode {
    fn first_token(&self) -> Option<TokenId> {
        self.token
    }
    fn last_token(&self) -> Option<TokenId> {
        self.token
    }
}

macro_rules! spanned_terminal {
    ($($ty:ty),+ $(,)?) => {$(
        impl Spanned for $ty {
            fn first_token(&self) -> Option<TokenId> {
                Some(self.token)
            }
            fn last_token(&self) -> Option<TokenId> {
                Some(self.token)
            }
        }
    )+};
}

spanned_terminal!(IdentNode, StringLiteralNode, UintLiteralNode, FloatLiteralNode);

macro_rules! spanned_enum {
    ($ty:ty { $($variant:ident),+ $(,)? }) => {
        impl Spanned for $ty {
            fn first_token(&self) -> Option<TokenId> {
                match self {
                    $(Self::$variant(n) => n.first_token(),)+
                }
            }
            fn last_token(&self) -> Option<TokenId> {
                match self {
                    $(Self::$variant(n) => n.last_token(),)+
                }
            }
        }
    };
}

spanned_enum!(StringValueNode { Single, Compound });
spanned_enum!(IdentifierNode { Ident, Compound });
spanned_enum!(IntValueNode { Uint, Negative });
spanned_enum!(FloatValueNode { Float, Special });
spanned_enum!(CompoundIdentPart { Dot, Ident });
spanned_enum!(OptionNamePart { FieldRef, Dot });
spanned_enum!(ValueNode {
    Ident,
    CompoundIdent,
    String,
    CompoundString,
    Uint,
    NegativeInt,
    Float,
    SignedFloat,
    SpecialFloat,
    Array,
    Message,
});
spanned_enum!(MessageElement {
    Field,
    MapField,
    Group,
    Oneof,
    Option,
    Message,
    Enum,
    Extend,
    ExtensionRange,
    Reserved,
    Empty,
});
spanned_enum!(EnumElement { Option, Value, Reserved, Empty });
spanned_enum!(OneofElement { Option, Field, Group, Empty });
spanned_enum!(ExtendElement { Field, Group, Empty });
spanned_enum!(ServiceElement { Option, Rpc, Empty });
spanned_enum!(RpcElement { Option, Empty });
spanned_enum!(RangeElement { Range, Comma });
spanned_enum!(ReservedElement { Range, Name, Ident, Comma });
spanned_enum!(ArrayElement { Value, Comma });
spanned_enum!(FileElement {
    Package,
    Import,
    Option,
    Message,
    Enum,
    Extend,
    Service,
    Empty,
});

macro_rules! spanned_slice {
    ($ty:ty, $field:ident) => {
        impl Spanned for $ty {
            fn first_token(&self) -> Option<TokenId> {
                self.$field.iter().find_map(Spanned::first_token)
            }
            fn last_token(&self) -> Option<TokenId> {
                self.$field.iter().rev().find_map(Spanned::last_token)
            }
        }
    };
}

spanned_slice!(CompoundStringLiteralNode, elements);
spanned_slice!(CompoundIdentNode, components);
spanned_slice!(OptionNameNode, parts);

impl Spanned for SpecialFloatLiteralNode {
    fn first_token(&self) -> Option<TokenId> {
        self.keyword.first_token()
    }
    fn last_token(&self) -> Option<TokenId> {
        self.keyword.last_token()
    }
}

impl Spanned for NegativeIntLiteralNode {
    fn first_token(&self) -> Option<TokenId> {
        first_of(&[&self.minus, &self.uint])
    }
    fn last_token(&self) -> Option<TokenId> {
        last_of(&[&self.minus, &self.uint])
    }
}

impl Spanned for SignedFloatLiteralNode {
    fn first_token(&self) -> Option<TokenId> {
        first_of(&[&self.sign, &self.float])
    }
    fn last_token(&self) -> Option<TokenId> {
        last_of(&[&self.sign, &self.float])
    }
}

impl Spanned for SyntaxNode {
    fn first_token(&self) -> Option<TokenId> {
        first_of(&[&self.keyword, &self.equals, &self.value, &self.semicolon])
    }
    fn last_token(&self) -> Option<TokenId> {
        last_of(&[&self.keyword, &self.equals, &self.value, &self.semicolon])
    }
}

impl Spanned for EditionNode {
    fn first_token(&self) -> Option<TokenId> {
        first_of(&[&self.keyword, &self.equals, &self.value, &self.semicolon])
    }
    fn last_token(&self) -> Option<TokenId> {
        last_of(&[&self.keyword, &self.equals, &self.value, &self.semicolon])
    }
}

impl Spanned for PackageNode {
    fn first_token(&self) -> Option<TokenId> {
        first_of(&[&self.keyword, &self.name, &self.semicolon])
    }
    fn last_token(&self) -> Option<TokenId> {
        last_of(&[&self.keyword, &self.name, &self.semicolon])
    }
}

impl Spanned for ImportModifierNode {
    fn first_token(&self) -> Option<TokenId> {
        self.keyword.first_token()
    }
    fn last_token(&self) -> Option<TokenId> {
        self.keyword.last_token()
    }
}

impl Spanned for ImportNode {
    fn first_token(&self) -> Option<TokenId> {
        first_of(&[&self.keyword, &self.modifier, &self.name, &self.semicolon])
    }
    fn last_token(&self) -> Option<TokenId> {
        last_of(&[&self.keyword, &self.modifier, &self.name, &self.semicolon])
    }
}

impl Spanned for FieldReferenceNode {
    fn first_token(&self) -> Option<TokenId> {
        first_of(&[
            &self.open,
            &self.url_prefix,
            &self.slash,
            &self.name,
            &self.close,
        ])
    }
    fn last_token(&self) -> Option<TokenId> {
        last_of(&[
            &self.open,
            &self.url_prefix,
            &self.slash,
            &self.name,
            &self.close,
        ])
    }
}

impl Spanned for OptionNode {
    fn first_token(&self) -> Option<TokenId> {
        first_of(&[
            &self.keyword,
            &self.name,
            &self.equals,
            &self.value,
            &self.semicolon,
        ])
    }
    fn last_token(&self) -> Option<TokenId> {
        last_of(&[
            &self.keyword,
            &self.name,
            &self.equals,
            &self.value,
            &self.semicolon,
        ])
    }
}

impl Spanned for CompactOptionsNode {
    fn first_token(&self) -> Option<TokenId> {
        self.open_bracket
            .first_token()
            .or_else(|| self.options.iter().find_map(Spanned::first_token))
    }
    fn last_token(&self) -> Option<TokenId> {
        last_of(&[&self.semicolon, &self.close_bracket]).or_else(|| {
            self.options.iter().rev().find_map(Spanned::last_token)
        })
    }
}

macro_rules! spanned_body {
    ($ty:ty) => {
        impl Spanned for $ty {
            fn first_token(&self) -> Option<TokenId> {
                self.keyword.first_token()
            }
            fn last_token(&self) -> Option<TokenId> {
                last_of(&[&self.semicolon, &self.close_brace])
                    .or_else(|| self.decls.iter().rev().find_map(Spanned::last_token))
                    .or_else(|| self.open_brace.last_token())
            }
        }
    };
}

spanned_body!(MessageNode);
spanned_body!(OneofNode);
spanned_body!(EnumNode);
spanned_body!(ExtendNode);
spanned_body!(ServiceNode);

impl Spanned for FieldNode {
    fn first_token(&self) -> Option<TokenId> {
        first_of(&[&self.label, &self.field_type as &dyn Spanned])
    }
    fn last_token(&self) -> Option<TokenId> {
        last_of(&[
            &self.semicolon,
            &self.options,
            &self.tag,
            &self.equals,
            &self.name,
            &self.field_type as &dyn Spanned,
        ])
    }
}

impl Spanned for MapFieldNode {
    fn first_token(&self) -> Option<TokenId> {
        self.map_type.first_token()
    }
    fn last_token(&self) -> Option<TokenId> {
        last_of(&[
            &self.semicolon,
            &self.options,
            &self.tag,
            &self.equals,
            &self.name,
            &self.map_type as &dyn Spanned,
        ])
    }
}

impl Spanned for MapTypeNode {
    fn first_token(&self) -> Option<TokenId> {
        self.keyword.first_token()
    }
    fn last_token(&self) -> Option<TokenId> {
        last_of(&[
            &self.close_angle,
            &self.value_type as &dyn Spanned,
            &self.comma,
        ])
    }
}

impl Spanned for GroupNode {
    fn first_token(&self) -> Option<TokenId> {
        first_of(&[&self.label, &self.keyword as &dyn Spanned])
    }
    fn last_token(&self) -> Option<TokenId> {
        last_of(&[&self.semicolon, &self.close_brace])
            .or_else(|| self.decls.iter().rev().find_map(Spanned::last_token))
            .or_else(|| self.open_brace.last_token())
    }
}

impl Spanned for EnumValueNode {
    fn first_token(&self) -> Option<TokenId> {
        self.name.first_token()
    }
    fn last_token(&self) -> Option<TokenId> {
        last_of(&[
            &self.semicolon,
            &self.options,
            &self.number as &dyn Spanned,
            &self.equals,
            &self.name as &dyn Spanned,
        ])
    }
}

impl Spanned for ExtensionRangeNode {
    fn first_token(&self) -> Option<TokenId> {
        self.keyword.first_token()
    }
    fn last_token(&self) -> Option<TokenId> {
        last_of(&[&self.semicolon, &self.options])
            .or_else(|| self.elements.iter().rev().find_map(Spanned::last_token))
            .or_else(|| self.keyword.last_token())
    }
}

impl Spanned for ReservedNode {
    fn first_token(&self) -> Option<TokenId> {
        self.keyword.first_token()
    }
    fn last_token(&self) -> Option<TokenId> {
        self.semicolon
            .last_token()
            .or_else(|| self.elements.iter().rev().find_map(Spanned::last_token))
            .or_else(|| self.keyword.last_token())
    }
}

impl Spanned for RangeNode {
    fn first_token(&self) -> Option<TokenId> {
        self.start.first_token()
    }
    fn last_token(&self) -> Option<TokenId> {
        last_of(&[
            &self.max,
            &self.end as &dyn Spanned,
            &self.to,
            &self.start as &dyn Spanned,
        ])
    }
}

impl Spanned for RpcNode {
    fn first_token(&self) -> Option<TokenId> {
        self.keyword.first_token()
    }
    fn last_token(&self) -> Option<TokenId> {
        last_of(&[&self.semicolon, &self.close_brace])
            .or_else(|| self.decls.iter().rev().find_map(Spanned::last_token))
            .or_else(|| self.open_brace.last_token())
            .or_else(|| self.output.last_token())
    }
}

impl Spanned for RpcTypeNode {
    fn first_token(&self) -> Option<TokenId> {
        first_of(&[&self.open_paren, &self.stream, &self.message_type as &dyn Spanned])
    }
    fn last_token(&self) -> Option<TokenId> {
        last_of(&[&self.close_paren, &self.message_type as &dyn Spanned])
    }
}

impl Spanned for ArrayLiteralNode {
    fn first_token(&self) -> Option<TokenId> {
        self.open_bracket
            .first_token()
            .or_else(|| self.elements.iter().find_map(Spanned::first_token))
    }
    fn last_token(&self) -> Option<TokenId> {
        last_of(&[&self.semicolon, &self.close_bracket])
            .or_else(|| self.elements.iter().rev().find_map(Spanned::last_token))
    }
}

impl Spanned for MessageLiteralNode {
    fn first_token(&self) -> Option<TokenId> {
        self.open
            .first_token()
            .or_else(|| self.elements.iter().find_map(Spanned::first_token))
    }
    fn last_token(&self) -> Option<TokenId> {
        last_of(&[&self.semicolon, &self.close])
            .or_else(|| self.elements.iter().rev().find_map(Spanned::last_token))
    }
}

impl Spanned for MessageFieldNode {
    fn first_token(&self) -> Option<TokenId> {
        self.name.first_token()
    }
    fn last_token(&self) -> Option<TokenId> {
        last_of(&[
            &self.semicolon,
            &self.value as &dyn Spanned,
            &self.sep,
            &self.name as &dyn Spanned,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_info::TokenInfo;

    fn ident(value: &str, token: u32) -> IdentNode {
        IdentNode {
            value: value.into(),
            token: TokenId(token),
        }
    }

    #[test]
    fn virtual_rune_has_no_span() {
        let r = RuneNode::synthetic(';');
        assert!(r.is_virtual());
        assert_eq!(r.first_token(), None);
    }

    #[test]
    fn field_span_prefers_label() {
        let field = FieldNode {
            label: Some(ident("optional", 0)),
            field_type: IdentifierNode::Ident(ident("string", 1)),
            name: Some(ident("name", 2)),
            equals: Some(RuneNode::new('=', TokenId(3))),
            tag: Some(UintLiteralNode {
                value: 1,
                token: TokenId(4),
            }),
            options: None,
            semicolon: Some(RuneNode::new(';', TokenId(5))),
        };
        assert_eq!(field.first_token(), Some(TokenId(0)));
        assert_eq!(field.last_token(), Some(TokenId(5)));
    }

    #[test]
    fn field_span_skips_virtual_terminator() {
        let field = FieldNode {
            label: None,
            field_type: IdentifierNode::Ident(ident("string", 0)),
            name: Some(ident("name", 1)),
            equals: Some(RuneNode::new('=', TokenId(2))),
            tag: Some(UintLiteralNode {
                value: 1,
                token: TokenId(3),
            }),
            options: None,
            semicolon: Some(RuneNode::synthetic(';')),
        };
        assert_eq!(field.last_token(), Some(TokenId(3)));
    }

    #[test]
    fn array_split_pairs_commas() {
        let arr = ArrayLiteralNode {
            open_bracket: RuneNode::new('[', TokenId(0)),
            elements: vec![
                ArrayElement::Value(ValueNode::Uint(UintLiteralNode {
                    value: 1,
                    token: TokenId(1),
                })),
                ArrayElement::Comma(RuneNode::new(',', TokenId(2))),
                ArrayElement::Value(ValueNode::Uint(UintLiteralNode {
                    value: 2,
                    token: TokenId(3),
                })),
            ],
            close_bracket: RuneNode::new(']', TokenId(4)),
            semicolon: None,
        };
        let (values, commas) = arr.split();
        assert_eq!(values.len(), 2);
        assert!(commas[0].is_some());
        assert!(commas[1].is_none());
    }

    #[test]
    fn node_info_on_virtual_node_is_empty() {
        let info = FileInfo::new(vec![TokenInfo::default()]);
        let file = FileNode::new(None, None, Vec::new(), TokenId(0), info);
        let r = RuneNode::synthetic(',');
        let ni = file.node_info(&r);
        assert!(!ni.has_comments());
        assert_eq!(ni.leading_ws, "");
    }
}
