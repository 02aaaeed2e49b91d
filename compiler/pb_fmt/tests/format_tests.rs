//! End-to-end formatting tests.
//!
//! Each case parses a source fragment and checks the canonical rendering:
//! header ordering, column alignment, comment placement and rewriting,
//! compact/expanded layout decisions, and recovery over incomplete input.

use pb_fmt::format_file;

fn format(source: &str) -> String {
    let parsed = pb_parse::parse(source);
    let result = format_file(&parsed.file);
    assert!(result.error.is_none(), "formatter error: {:?}", result.error);
    result.text
}

#[test]
fn empty_file_produces_empty_output() {
    assert_eq!(format(""), "");
}

#[test]
fn syntax_only() {
    assert_eq!(format("syntax = \"proto3\";"), "syntax = \"proto3\";\n");
}

#[test]
fn edition_only() {
    assert_eq!(format("edition = \"2023\";"), "edition = \"2023\";\n");
}

#[test]
fn header_gets_blank_line_before_imports() {
    let output = format("syntax = \"proto3\";\nimport \"b.proto\";\nimport \"a.proto\";\nimport \"a.proto\";\n");
    assert_eq!(
        output,
        "syntax = \"proto3\";\n\nimport \"a.proto\";\nimport \"b.proto\";\n"
    );
}

#[test]
fn import_visibility_ordering_at_equal_paths() {
    // Comments keep the duplicates alive so the visibility ordering is
    // observable: plain above public above weak.
    let output = format(
        "import weak \"a.proto\"; // w\nimport public \"a.proto\"; // p\nimport \"a.proto\"; // n\n",
    );
    assert_eq!(
        output,
        "import \"a.proto\"; // n\nimport public \"a.proto\"; // p\nimport weak \"a.proto\"; // w\n"
    );
}

#[test]
fn comment_free_duplicates_collapse_across_visibility() {
    let output = format("import \"a.proto\";\nimport public \"a.proto\";\n");
    assert_eq!(output, "import \"a.proto\";\n");
}

#[test]
fn commented_duplicate_import_survives_dedupe() {
    let output = format("// keep me\nimport \"a.proto\";\nimport \"a.proto\";\n");
    assert_eq!(output, "// keep me\nimport \"a.proto\";\n");
}

#[test]
fn file_options_sort_defaults_before_customs() {
    let output = format(
        "syntax = \"proto3\";\noption (acme.custom) = true;\noption cc_enable_arenas = true;\n",
    );
    assert_eq!(
        output,
        "syntax = \"proto3\";\n\noption cc_enable_arenas = true;\noption (acme.custom) = true;\n"
    );
}

#[test]
fn package_between_syntax_and_imports() {
    let output = format("syntax = \"proto3\";\npackage acme.v1;\nimport \"a.proto\";\n");
    assert_eq!(
        output,
        "syntax = \"proto3\";\npackage acme.v1;\n\nimport \"a.proto\";\n"
    );
}

#[test]
fn field_columns_align() {
    let output = format("message M { string short = 1; int64 longer_name = 2; }");
    assert_eq!(
        output,
        "message M {\n  string short       = 1;\n  int64  longer_name = 2;\n}\n"
    );
}

#[test]
fn labels_join_the_type_column() {
    let output = format("message M {\n  optional int32 a = 1;\n  repeated string bb = 2;\n}\n");
    assert_eq!(
        output,
        "message M {\n  optional int32  a  = 1;\n  repeated string bb = 2;\n}\n"
    );
}

#[test]
fn blank_line_between_field_groups_is_preserved() {
    let source = "message M {\n  int32 a = 1;\n\n  int32 b = 2;\n}\n";
    assert_eq!(format(source), source);
}

#[test]
fn extra_blank_lines_collapse_to_one() {
    let output = format("message M {\n  int32 a = 1;\n\n\n\n  int32 b = 2;\n}\n");
    assert_eq!(output, "message M {\n  int32 a = 1;\n\n  int32 b = 2;\n}\n");
}

#[test]
fn leading_blank_inside_new_block_is_dropped() {
    let output = format("message M {\n\n  int32 a = 1;\n}\n");
    assert_eq!(output, "message M {\n  int32 a = 1;\n}\n");
}

#[test]
fn alignment_never_crosses_a_comment() {
    let output = format(
        "message M {\n  int32 a = 1;\n  // boundary\n  int64 long_name_here = 2;\n}\n",
    );
    assert_eq!(
        output,
        "message M {\n  int32 a = 1;\n  // boundary\n  int64 long_name_here = 2;\n}\n"
    );
}

#[test]
fn empty_message_renders_inline() {
    assert_eq!(format("message X {\n}\n"), "message X {}\n");
}

#[test]
fn single_quotes_become_double_quotes() {
    assert_eq!(
        format("option go_package = 'x';\n"),
        "option go_package = \"x\";\n"
    );
}

#[test]
fn numeric_literal_text_is_preserved() {
    let output = format("message M { int32 a = 0x10; }");
    assert_eq!(output, "message M {\n  int32 a = 0x10;\n}\n");
}

#[test]
fn compact_options_stay_inline_without_a_leading_break() {
    let output = format("message M { int32 x = 1 [deprecated = true, json_name = \"x\"]; }");
    assert_eq!(
        output,
        "message M {\n  int32 x = 1 [deprecated = true, json_name = \"x\"];\n}\n"
    );
}

#[test]
fn compact_options_expand_on_pre_first_element_newline() {
    let output = format(
        "message M { int32 x = 1 [\n  deprecated = true,\n  json_name = \"x\"]; }",
    );
    assert_eq!(
        output,
        "message M {\n  int32 x = 1 [\n    deprecated = true,\n    json_name = \"x\"\n  ];\n}\n"
    );
}

#[test]
fn compact_options_expand_on_interior_comment() {
    let output = format(
        "message M { int32 x = 1 [deprecated = true, /* why */ json_name = \"x\"]; }",
    );
    assert!(output.contains("[\n"), "expected expanded options:\n{output}");
    assert!(output.contains("/* why */"));
}

#[test]
fn missing_trailing_comma_is_synthesized_between_options() {
    let output = format("message M { int32 x = 1 [\n  deprecated = true\n  json_name = \"x\"]; }");
    assert!(
        output.contains("deprecated = true,\n"),
        "missing synthesized comma:\n{output}"
    );
}

#[test]
fn enum_value_commas_normalize_to_semicolons() {
    let output = format("enum E {\n  A = 0,\n  B = 1,\n}\n");
    assert_eq!(output, "enum E {\n  A = 0;\n  B = 1;\n}\n");
}

#[test]
fn enum_values_align() {
    let output = format("enum E {\n  A = 0;\n  LONGER = 1;\n}\n");
    assert_eq!(output, "enum E {\n  A      = 0;\n  LONGER = 1;\n}\n");
}

#[test]
fn rpc_without_body_prefers_semicolon_form() {
    let output = format("service S {\n  rpc Ping(PingRequest) returns (PingResponse) {}\n}\n");
    assert_eq!(
        output,
        "service S {\n  rpc Ping(PingRequest) returns (PingResponse);\n}\n"
    );
}

#[test]
fn rpc_with_options_keeps_body() {
    let output = format(
        "service S {\n  rpc Watch(Req) returns (stream Resp) {\n    option deprecated = true;\n  }\n}\n",
    );
    assert_eq!(
        output,
        "service S {\n  rpc Watch(Req) returns (stream Resp) {\n    option deprecated = true;\n  }\n}\n"
    );
}

#[test]
fn map_fields_format_with_single_space_after_comma() {
    let output = format("message M { map<string,int32> pairs = 1; }");
    assert_eq!(output, "message M {\n  map<string, int32> pairs = 1;\n}\n");
}

#[test]
fn reserved_ranges_and_names() {
    let output = format("message M {\n  reserved 5, 10 to 20, 100 to max;\n  reserved \"old\";\n}\n");
    assert_eq!(
        output,
        "message M {\n  reserved 5, 10 to 20, 100 to max;\n  reserved \"old\";\n}\n"
    );
}

#[test]
fn extension_range_with_options() {
    let output = format("message M {\n  extensions 100 to 199 [deprecated = true];\n}\n");
    assert_eq!(
        output,
        "message M {\n  extensions 100 to 199 [deprecated = true];\n}\n"
    );
}

#[test]
fn oneof_fields_align() {
    let output = format("message M {\n  oneof choice {\n    string a = 1;\n    int64 long_one = 2;\n  }\n}\n");
    assert_eq!(
        output,
        "message M {\n  oneof choice {\n    string a        = 1;\n    int64  long_one = 2;\n  }\n}\n"
    );
}

#[test]
fn nested_message_breaks_alignment_run() {
    let output = format(
        "message M {\n  int32 a = 1;\n  message N {}\n  int64 moderately_long = 2;\n}\n",
    );
    assert_eq!(
        output,
        "message M {\n  int32 a = 1;\n  message N {}\n  int64 moderately_long = 2;\n}\n"
    );
}

#[test]
fn compact_message_literal_synthesizes_colon() {
    let output = format("option (x) = { foo 1 };\n");
    assert_eq!(output, "option (x) = {foo: 1};\n");
}

#[test]
fn compact_message_literal_joins_fields_with_commas() {
    let output = format("option (x) = { foo: 1, bar: 2 };\n");
    assert_eq!(output, "option (x) = {foo: 1, bar: 2};\n");
}

#[test]
fn expanded_message_literal_one_field_per_line() {
    let output = format("option (x) = {\n  foo: 1\n  bar: 2\n};\n");
    assert_eq!(output, "option (x) = {\n  foo: 1\n  bar: 2\n};\n");
}

#[test]
fn empty_array_literal_renders_inline() {
    let output = format("message M { int32 x = 1 [(vals) = []]; }");
    assert_eq!(output, "message M {\n  int32 x = 1 [(vals) = []];\n}\n");
}

#[test]
fn inline_array_literal_spaces_after_commas() {
    let output = format("option (ids) = [1, 2, 3];\n");
    assert_eq!(output, "option (ids) = [1, 2, 3];\n");
}

#[test]
fn expanded_array_literal_one_value_per_line() {
    let output = format("option (ids) = [\n  1,\n  2\n];\n");
    assert_eq!(output, "option (ids) = [\n  1,\n  2\n];\n");
}

#[test]
fn comment_only_file_preserves_comments() {
    let output = format("// just a note\n// and another\n");
    assert_eq!(output, "// just a note\n// and another\n");
}

#[test]
fn license_header_blank_line_is_preserved() {
    let output = format("// license line\n\n// package doc\npackage acme.v1;\n");
    assert_eq!(output, "// license line\n\n// package doc\npackage acme.v1;\n");
}

#[test]
fn trailing_comment_stays_on_its_line() {
    let output = format("message M {\n  int32 a = 1; // counted\n}\n");
    assert_eq!(output, "message M {\n  int32 a = 1; // counted\n}\n");
}

#[test]
fn comment_after_closing_brace_attaches_to_file_end() {
    let output = format("enum Type {\n  TYPE_UNSPECIFIED = 0;\n}\n// attached below\n");
    assert_eq!(
        output,
        "enum Type {\n  TYPE_UNSPECIFIED = 0;\n}\n// attached below\n"
    );
}

#[test]
fn line_comment_forced_inline_becomes_block_comment() {
    let output = format("extend .google. // note\n  protobuf.Foo { }\n");
    assert_eq!(output, "extend .google. /* note */protobuf.Foo {}\n");
}

#[test]
fn block_comment_reindents_under_opening() {
    let output = format("message M {\n      /*\n       * one\n       * two\n       */\n  int32 a = 1;\n}\n");
    assert_eq!(
        output,
        "message M {\n  /*\n   * one\n   * two\n   */\n  int32 a = 1;\n}\n"
    );
}

#[test]
fn field_without_semicolon_gets_one() {
    let output = format("message M {\n  int32 a = 1\n}\n");
    assert_eq!(output, "message M {\n  int32 a = 1;\n}\n");
}

#[test]
fn missing_close_paren_in_option_name_is_filled() {
    let output = format("option (foo.bar = 1;\n");
    assert_eq!(output, "option (foo.bar) = 1;\n");
}

#[test]
fn stray_top_level_semicolons_are_dropped() {
    let output = format("syntax = \"proto3\";\n;\nmessage M {}\n;\n");
    assert_eq!(output, "syntax = \"proto3\";\n\nmessage M {}\n");
}

#[test]
fn group_declaration_round_trips() {
    let output = format(
        "message M {\n  optional group Key = 4 {\n    optional uint64 id = 1;\n  }\n}\n",
    );
    assert_eq!(
        output,
        "message M {\n  optional group Key = 4 {\n    optional uint64 id = 1;\n  }\n}\n"
    );
}

#[test]
fn negative_enum_values_format() {
    let output = format("enum E {\n  A = 0;\n  B = -1;\n}\n");
    assert_eq!(output, "enum E {\n  A = 0;\n  B = -1;\n}\n");
}

#[test]
fn compound_string_option_breaks_after_equals() {
    let output = format("option (text) = \"one\"\n  \"two\";\n");
    assert_eq!(output, "option (text) =\n  \"one\"\n  \"two\";\n");
}

#[test]
fn blank_line_separates_header_from_first_type() {
    let output = format("syntax = \"proto3\";\nmessage M {}\n");
    assert_eq!(output, "syntax = \"proto3\";\n\nmessage M {}\n");
}

#[test]
fn formatting_is_idempotent_on_a_mixed_file() {
    let source = "syntax = \"proto3\";\n\npackage acme.v1;\n\nimport \"b.proto\";\nimport \"a.proto\";\n\noption java_package = \"com.acme\";\n\n// Main request.\nmessage Request {\n  string name = 1; // trailing\n  int64 long_field_name = 2 [deprecated = true];\n\n  oneof body {\n    string text = 3;\n    bytes blob = 4;\n  }\n}\n\nenum Kind {\n  KIND_UNSPECIFIED = 0;\n  KIND_OTHER = 1;\n}\n\nservice Api {\n  rpc Get(Request) returns (Request);\n}\n";
    let once = format(source);
    let twice = format(&once);
    assert_eq!(once, twice);
}

#[test]
fn no_dangling_spaces_anywhere() {
    let source = "syntax = \"proto3\";\nmessage M {\n  string a = 1;\n  int64 bb = 2 [deprecated = true];\n  // note\n  int32 c = 3;\n}\n";
    let output = format(source);
    for line in output.lines() {
        assert_eq!(line.trim_end(), line, "dangling space in line: {line:?}");
    }
    assert!(!output.contains("\n\n\n"), "doubled blank lines:\n{output}");
    assert!(output.ends_with('\n'));
    assert!(!output.ends_with("\n\n"));
}
