//! Property-based tests for the formatter.
//!
//! Random well-formed sources are generated and the universal invariants
//! checked: idempotence, trailing-newline discipline, no dangling spaces,
//! and re-parseability of the output.

use pb_fmt::format_file;
use proptest::prelude::*;

fn format(source: &str) -> String {
    let parsed = pb_parse::parse(source);
    assert!(
        !parsed.has_errors(),
        "generated source failed to parse: {:?}\n{source}",
        parsed.messages()
    );
    let result = format_file(&parsed.file);
    assert!(result.error.is_none(), "formatter error: {:?}", result.error);
    result.text
}

fn identifier() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,12}").expect("valid regex")
}

fn type_name() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "int32", "int64", "uint32", "uint64", "sint32", "bool", "string", "bytes", "double",
        "float", "fixed32",
    ])
}

fn label() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["", "optional ", "repeated "])
}

prop_compose! {
    fn field_decl()(
        label in label(),
        ty in type_name(),
        name in identifier(),
        tag in 1u32..536_870_911,
        deprecated in any::<bool>(),
    ) -> String {
        let options = if deprecated { " [deprecated = true]" } else { "" };
        format!("  {label}{ty} field_{name} = {tag}{options};")
    }
}

prop_compose! {
    fn message_decl()(
        name in prop::string::string_regex("[A-Z][A-Za-z0-9]{0,10}").expect("valid regex"),
        fields in prop::collection::vec(field_decl(), 0..8),
    ) -> String {
        let mut out = format!("message M{name} {{\n");
        for field in &fields {
            out.push_str(field);
            out.push('\n');
        }
        out.push_str("}\n");
        out
    }
}

prop_compose! {
    fn enum_decl()(
        name in prop::string::string_regex("[A-Z][A-Za-z0-9]{0,10}").expect("valid regex"),
        values in prop::collection::vec(
            prop::string::string_regex("[A-Z][A-Z0-9_]{0,14}").expect("valid regex"),
            1..6,
        ),
    ) -> String {
        let mut out = format!("enum E{name} {{\n");
        for (i, value) in values.iter().enumerate() {
            out.push_str(&format!("  V{i}_{value} = {i};\n"));
        }
        out.push_str("}\n");
        out
    }
}

prop_compose! {
    fn source_file()(
        messages in prop::collection::vec(message_decl(), 0..4),
        enums in prop::collection::vec(enum_decl(), 0..3),
    ) -> String {
        let mut out = String::from("syntax = \"proto3\";\n\npackage gen.v1;\n");
        for m in messages {
            out.push('\n');
            out.push_str(&m);
        }
        for e in enums {
            out.push('\n');
            out.push_str(&e);
        }
        out
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn formatting_is_idempotent(source in source_file()) {
        let once = format(&source);
        let twice = format(&once);
        prop_assert_eq!(&once, &twice);
    }

    #[test]
    fn output_has_exactly_one_trailing_newline(source in source_file()) {
        let output = format(&source);
        prop_assert!(output.ends_with('\n'));
        prop_assert!(!output.ends_with("\n\n"));
    }

    #[test]
    fn output_has_no_dangling_spaces(source in source_file()) {
        let output = format(&source);
        for line in output.lines() {
            prop_assert_eq!(line.trim_end(), line, "dangling whitespace in {:?}", line);
        }
    }

    #[test]
    fn output_reparses_cleanly(source in source_file()) {
        let output = format(&source);
        let reparsed = pb_parse::parse(&output);
        prop_assert!(!reparsed.has_errors(), "{:?}", reparsed.messages());
    }

    #[test]
    fn every_field_survives(source in source_file()) {
        let output = format(&source);
        let count_in = source.matches("field_").count();
        let count_out = output.matches("field_").count();
        prop_assert_eq!(count_in, count_out);
    }
}
