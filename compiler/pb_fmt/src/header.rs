//! Header Orderer
//!
//! The file header is written in a fixed order — syntax/edition, package,
//! imports, file options — with imports and options sorted. Imports sort
//! by path, then visibility (public before plain before weak), then
//! comment-bearing first; adjacent equal-path imports without comments
//! are dropped. File options put the well-known defaults before custom
//! `(extension)` options. The body pass skips everything written here.

use std::cmp::Ordering;

use pb_ast::{
    FieldReferenceNode, FileElement, ImportModifier, ImportNode, OptionNameNode, OptionNamePart,
    OptionNode, PackageNode, Spanned,
};

use crate::emitter::Emitter;
use crate::formatter::{Formatter, PreviousNode};

impl<E: Emitter> Formatter<'_, E> {
    pub(crate) fn write_file_header(&mut self) {
        let mut package: Option<&PackageNode> = None;
        let mut imports: Vec<&ImportNode> = Vec::new();
        let mut options: Vec<&OptionNode> = Vec::new();
        for decl in self.file.decls() {
            match decl {
                FileElement::Package(node) => package = Some(node),
                FileElement::Import(node) => imports.push(node),
                FileElement::Option(node) => options.push(node),
                _ => continue,
            }
        }
        if self.file.syntax().is_none()
            && self.file.edition().is_none()
            && package.is_none()
            && imports.is_empty()
            && options.is_empty()
        {
            // No header values at all.
            return;
        }

        if let Some(syntax) = self.file.syntax() {
            self.write_syntax(syntax);
        } else if let Some(edition) = self.file.edition() {
            self.write_edition(edition);
        }
        if let Some(package) = package {
            self.write_package(package);
        }

        imports.sort_by(|a, b| self.compare_imports(a, b));
        let mut previous_name: Option<String> = None;
        for (i, import) in imports.iter().enumerate() {
            if i == 0
                && self.previous != PreviousNode::None
                && !self.leading_trivia_contains_blank_line(*import)
            {
                self.ctx.p("");
            }
            // Sorted order makes duplicates adjacent; a duplicate without
            // comments adds nothing and is dropped.
            let name = import.name.as_string();
            if i > 0 && previous_name.as_deref() == Some(name.as_str())
                && !self.import_has_comment(import)
            {
                continue;
            }
            previous_name = Some(name);
            self.write_import(import, i > 0);
        }

        options.sort_by(|a, b| compare_file_options(a, b));
        if let Some(first) = options.first() {
            if self.previous != PreviousNode::None
                && !self.leading_trivia_contains_blank_line(*first)
            {
                self.ctx.p("");
            }
        }
        for (i, option) in options.iter().enumerate() {
            self.write_file_option(option, i > 0);
        }
    }

    /// Path ascending; public before plain before weak at equal paths;
    /// comment-bearing first among full duplicates.
    fn compare_imports(&self, a: &ImportNode, b: &ImportNode) -> Ordering {
        a.name
            .as_string()
            .cmp(&b.name.as_string())
            .then_with(|| import_sort_order(b).cmp(&import_sort_order(a)))
            .then_with(|| {
                match (self.import_has_comment(a), self.import_has_comment(b)) {
                    (true, false) => Ordering::Less,
                    (false, true) => Ordering::Greater,
                    _ => Ordering::Equal,
                }
            })
    }

    pub(crate) fn import_has_comment(&self, import: &ImportNode) -> bool {
        if self.node_has_comment(import) {
            return true;
        }
        self.node_has_comment(&import.keyword)
            || self.node_has_comment(&import.name)
            || import
                .semicolon
                .as_ref()
                .is_some_and(|s| self.node_has_comment(s))
            || import
                .modifier
                .as_ref()
                .is_some_and(|m| self.node_has_comment(&m.keyword))
    }

    fn node_has_comment(&self, node: &dyn Spanned) -> bool {
        self.info_of(node).has_comments()
    }
}

/// `import public` = 2, plain = 3, `import weak` = 1; higher sorts first
/// at equal paths.
fn import_sort_order(import: &ImportNode) -> u8 {
    match import.modifier.as_ref().map(|m| m.kind) {
        Some(ImportModifier::Public) => 2,
        Some(ImportModifier::Weak) => 1,
        None => 3,
    }
}

/// Default options (no leading `(`) sort above custom options; both sides
/// then sort lexicographically on the normalized name string.
fn compare_file_options(a: &OptionNode, b: &OptionNode) -> Ordering {
    let left = string_for_option_name(a.name.as_ref());
    let right = string_for_option_name(b.name.as_ref());
    match (left.starts_with('('), right.starts_with('(')) {
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ => left.cmp(&right),
    }
}

/// The normalized option-name string used for sorting, e.g.
/// `(foo.bar).baz`.
pub(crate) fn string_for_option_name(name: Option<&OptionNameNode>) -> String {
    let Some(name) = name else {
        return String::new();
    };
    let mut result = String::new();
    let mut first = true;
    for part in &name.parts {
        let OptionNamePart::FieldRef(field_ref) = part else {
            continue;
        };
        if !first {
            result.push('.');
        }
        first = false;
        result.push_str(&string_for_field_reference(field_ref));
    }
    result
}

fn string_for_field_reference(field_ref: &FieldReferenceNode) -> String {
    let mut result = String::new();
    if field_ref.open.is_some() {
        result.push('(');
    }
    result.push_str(&field_ref.name.as_string());
    if field_ref.close.is_some() || field_ref.open.is_some() {
        // A missing close paren is filled in, here as in the output.
        result.push(')');
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pb_ast::{
        CompoundIdentNode, CompoundIdentPart, IdentNode, IdentifierNode, RuneNode, TokenId,
    };

    fn ident(value: &str, token: u32) -> IdentNode {
        IdentNode {
            value: value.into(),
            token: TokenId(token),
        }
    }

    fn plain_ref(name: &str) -> FieldReferenceNode {
        FieldReferenceNode {
            open: None,
            url_prefix: None,
            slash: None,
            name: IdentifierNode::Ident(ident(name, 0)),
            close: None,
        }
    }

    fn custom_ref(dotted: &[&str]) -> FieldReferenceNode {
        let mut components = Vec::new();
        for (i, part) in dotted.iter().enumerate() {
            if i > 0 {
                components.push(CompoundIdentPart::Dot(RuneNode::new('.', TokenId(0))));
            }
            components.push(CompoundIdentPart::Ident(ident(part, 0)));
        }
        FieldReferenceNode {
            open: Some(RuneNode::new('(', TokenId(0))),
            url_prefix: None,
            slash: None,
            name: IdentifierNode::Compound(CompoundIdentNode { components }),
            close: Some(RuneNode::new(')', TokenId(0))),
        }
    }

    fn name_of(parts: Vec<OptionNamePart>) -> OptionNameNode {
        OptionNameNode { parts }
    }

    #[test]
    fn option_name_string_plain() {
        let name = name_of(vec![OptionNamePart::FieldRef(plain_ref("go_package"))]);
        assert_eq!(string_for_option_name(Some(&name)), "go_package");
    }

    #[test]
    fn option_name_string_custom_with_suffix() {
        let name = name_of(vec![
            OptionNamePart::FieldRef(custom_ref(&["custom", "thing"])),
            OptionNamePart::Dot(RuneNode::new('.', TokenId(0))),
            OptionNamePart::FieldRef(plain_ref("bridge")),
        ]);
        assert_eq!(string_for_option_name(Some(&name)), "(custom.thing).bridge");
    }

    #[test]
    fn missing_close_paren_is_filled_in() {
        let mut reference = custom_ref(&["foo"]);
        reference.close = None;
        assert_eq!(string_for_field_reference(&reference), "(foo)");
    }

    #[test]
    fn defaults_sort_before_customs() {
        let default = OptionNode {
            keyword: None,
            name: Some(name_of(vec![OptionNamePart::FieldRef(plain_ref(
                "cc_enable_arenas",
            ))])),
            equals: None,
            value: None,
            semicolon: None,
        };
        let custom = OptionNode {
            keyword: None,
            name: Some(name_of(vec![OptionNamePart::FieldRef(custom_ref(&[
                "acme", "opt",
            ]))])),
            equals: None,
            value: None,
            semicolon: None,
        };
        assert_eq!(compare_file_options(&default, &custom), Ordering::Less);
        assert_eq!(compare_file_options(&custom, &default), Ordering::Greater);
    }
}
