//! Integration tests for the inference engine: parse a document, check it
//! and look at the inferred types and errors.

use std::fmt::Write;

use loom_typeck::error::TypeError;
use loom_typeck::ty::Ty;
use loom_typeck::TypeckResult;
use rowan::TextRange;

// ── Helpers ────────────────────────────────────────────────────────────

fn check_source(src: &str) -> TypeckResult {
    let parse = loom_parser::parse(src);
    loom_typeck::check(&parse)
}

/// The displayed type of the last expression; the document must be clean.
fn result_type(src: &str) -> String {
    let result = check_source(src);
    assert!(
        result.errors.is_empty(),
        "expected no errors, got: {:?}",
        result.errors
    );
    result
        .result_type
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| panic!("no result type for {src:?}"))
}

fn assert_has_error<F: Fn(&TypeError) -> bool>(src: &str, pred: F, desc: &str) -> TypeckResult {
    let result = check_source(src);
    assert!(
        result.errors.iter().any(&pred),
        "expected error matching `{}`, got errors: {:?}",
        desc,
        result.errors
    );
    result
}

/// Type of the first occurrence of `needle` in `src`, matched exactly.
fn type_of(src: &str, result: &TypeckResult, needle: &str) -> String {
    let start = src.find(needle).unwrap() as u32;
    let range = TextRange::new(start.into(), (start + needle.len() as u32).into());
    result
        .type_of(range)
        .map(ToString::to_string)
        .unwrap_or_else(|| panic!("no type recorded for {needle:?}"))
}

fn dump(src: &str) -> String {
    let result = check_source(src);
    let mut out = String::new();
    for (range, ty) in result.types() {
        let text = &src[usize::from(range.start())..usize::from(range.end())];
        writeln!(out, "{}..{} {:?}: {}", u32::from(range.start()), u32::from(range.end()), text, ty)
            .unwrap();
    }
    out
}

// ── Literals and bindings ──────────────────────────────────────────────

#[test]
fn literals() {
    assert_eq!(result_type("42"), "int");
    assert_eq!(result_type("3.14"), "float");
    assert_eq!(result_type("\"hello\""), "string");
    assert_eq!(result_type("true"), "bool");
    assert_eq!(result_type("nil"), "unit");
}

#[test]
fn let_binding_flows_to_use() {
    assert_eq!(result_type("let x = 1\nx"), "int");
}

#[test]
fn typed_ranges_snapshot() {
    insta::assert_snapshot!(dump("let x = 1\nlet y = x + 2"), @r###"
    4..5 "x": int
    8..9 "1": int
    14..15 "y": int
    18..19 "x": int
    18..23 "x + 2": int
    22..23 "2": int
    "###);
}

#[test]
fn equal_types_share_one_id() {
    let result = check_source("let a = 1\nlet b = 2");
    assert_eq!(result.interner().len(), 1);
}

// ── Functions ──────────────────────────────────────────────────────────

#[test]
fn arithmetic_defaults_to_int() {
    assert_eq!(result_type("fn add(a, b) do a + b end\nadd"), "(int, int) -> int");
}

#[test]
fn float_arithmetic() {
    assert_eq!(result_type("let f = 1.5 * 2.0\nf"), "float");
}

#[test]
fn let_polymorphism() {
    assert_eq!(result_type("fn id(x) do x end\nid"), "('a) -> 'a");
    assert_eq!(
        result_type("fn id(x) do x end\nlet a = id(1)\nlet b = id(\"s\")\nb"),
        "string"
    );
}

#[test]
fn polymorphic_closure_binding() {
    assert_eq!(
        result_type("let pair = fn(a, b) -> [a, b] end\npair(true, false)"),
        "list<bool>"
    );
}

#[test]
fn functions_are_visible_before_their_definition() {
    assert_eq!(result_type("let r = double(4)\nfn double(n) do n * 2 end\nr"), "int");
}

#[test]
fn mutual_recursion() {
    let src = "fn even(n) do if n == 0 do true else odd(n - 1) end end\n\
               fn odd(n) do if n == 0 do false else even(n - 1) end end\n\
               even(10)";
    assert_eq!(result_type(src), "bool");
}

#[test]
fn early_return() {
    let src = "fn f(x) do\n  if x do return 1 end\n  2\nend\nf(true)";
    assert_eq!(result_type(src), "int");
}

#[test]
fn builtins_are_polymorphic() {
    assert_eq!(result_type("push([1], 2)"), "list<int>");
    assert_eq!(result_type("length([])"), "int");
    assert_eq!(result_type("head([\"a\"])"), "string");
    assert_eq!(result_type("to_string(1.5)"), "string");
}

#[test]
fn annotated_signature() {
    assert_eq!(
        result_type("fn f(a: int) -> string do to_string(a) end\nf"),
        "(int) -> string"
    );
}

// ── Records and lists ──────────────────────────────────────────────────

#[test]
fn record_field_access() {
    assert_eq!(result_type("let r = { name: \"a\", age: 3 }\nr.age"), "int");
    assert_eq!(result_type("{ b: 1, a: true }"), "{ a: bool, b: int }");
}

#[test]
fn field_on_a_parameter_resolves_after_the_call() {
    assert_eq!(result_type("let n = (fn(r) -> r.age end)({ age: 1 })\nn"), "int");
}

#[test]
fn missing_field_is_an_error() {
    let result = assert_has_error(
        "let r = { a: 1 }\nr.b",
        |e| matches!(e, TypeError::NoSuchField { field_name, .. } if field_name == "b"),
        "NoSuchField(b)",
    );
    assert_eq!(result.result_type, Some(Ty::Unknown));
}

#[test]
fn list_indexing() {
    assert_eq!(result_type("let xs = [1, 2, 3]\nxs[0]"), "int");
    assert_eq!(result_type("let e = []\ne"), "list<'a>");
}

#[test]
fn mixed_list_is_an_error() {
    assert_has_error(
        "[1, \"a\"]",
        |e| matches!(e, TypeError::Mismatch { .. }),
        "Mismatch",
    );
}

// ── Operators ──────────────────────────────────────────────────────────

#[test]
fn concat_and_comparison() {
    assert_eq!(result_type("\"a\" ++ \"b\""), "string");
    assert_eq!(result_type("[1] ++ [2]"), "list<int>");
    assert_eq!(result_type("1 < 2"), "bool");
    assert_eq!(result_type("not (1 == 2) and true"), "bool");
}

#[test]
fn operator_on_the_wrong_type() {
    assert_has_error(
        "1 ++ 2",
        |e| matches!(e, TypeError::UnsupportedOperator { op, .. } if op == "++"),
        "UnsupportedOperator(++)",
    );
    assert_has_error(
        "true < false",
        |e| matches!(e, TypeError::UnsupportedOperator { op, .. } if op == "<"),
        "UnsupportedOperator(<)",
    );
}

// ── Control flow ───────────────────────────────────────────────────────

#[test]
fn if_without_else_is_unit() {
    assert_eq!(result_type("if true do 1 end"), "unit");
    assert_eq!(result_type("if 1 > 2 do \"a\" else \"b\" end"), "string");
}

#[test]
fn if_branch_mismatch() {
    assert_has_error(
        "if true do 1 else \"s\" end",
        |e| matches!(e, TypeError::Mismatch { .. }),
        "Mismatch",
    );
}

#[test]
fn return_outside_function() {
    assert_has_error(
        "return 1",
        |e| matches!(e, TypeError::ReturnOutsideFunction { .. }),
        "ReturnOutsideFunction",
    );
}

// ── Annotations ────────────────────────────────────────────────────────

#[test]
fn annotation_mismatch() {
    assert_has_error(
        "let x: float = 1",
        |e| {
            matches!(e, TypeError::Mismatch { expected, found, .. }
                if *expected == Ty::float() && *found == Ty::int())
        },
        "Mismatch(float, int)",
    );
}

#[test]
fn unknown_annotation() {
    assert_has_error(
        "let x: foo = 1",
        |e| matches!(e, TypeError::UnknownType { name, .. } if name == "foo"),
        "UnknownType(foo)",
    );
}

// ── Error recovery ─────────────────────────────────────────────────────

#[test]
fn unbound_variable_is_unknown() {
    let src = "y + 1";
    let result = assert_has_error(
        src,
        |e| matches!(e, TypeError::UnboundVariable { name, .. } if name == "y"),
        "UnboundVariable(y)",
    );
    assert_eq!(type_of(src, &result, "y"), "unknown");
}

#[test]
fn self_reference_without_earlier_binding_is_unbound() {
    assert_has_error(
        "let x = x",
        |e| matches!(e, TypeError::UnboundVariable { .. }),
        "UnboundVariable",
    );
}

#[test]
fn cycle_through_a_let_falls_back_to_unknown() {
    let src = "let a = f()\nfn f() do a end\na";
    let result = assert_has_error(
        src,
        |e| matches!(e, TypeError::CyclicDefinition { name, .. } if name == "a"),
        "CyclicDefinition(a)",
    );
    assert_eq!(type_of(src, &result, "a"), "unknown");
    assert_eq!(type_of(src, &result, "f"), "() -> unknown");
    assert_eq!(result.result_type, Some(Ty::Unknown));
}

#[test]
fn infinite_type_is_reported() {
    assert_has_error(
        "fn f(x) do x(x) end",
        |e| matches!(e, TypeError::InfiniteType { .. }),
        "InfiniteType",
    );
}

#[test]
fn broken_statement_does_not_hide_the_rest() {
    let src = "let a = 1\nlet b = a +\nlet c = a";
    let parse = loom_parser::parse(src);
    assert!(!parse.ok());
    let result = loom_typeck::check(&parse);
    assert_eq!(type_of(src, &result, "c"), "int");
}

// ── Determinism ────────────────────────────────────────────────────────

#[test]
fn inference_is_idempotent() {
    for src in [
        "let x = 1\nx",
        "fn id(x) do x end\nlet p = { a: id(1), b: id(\"s\") }\np",
        "let a = f()\nfn f() do a end",
        "let broken = (1 +\nlet ok = [1, 2]",
        "fn even(n) do if n == 0 do true else odd(n - 1) end end\nfn odd(n) do even(n) end",
    ] {
        let parse = loom_parser::parse(src);
        assert_eq!(loom_typeck::check(&parse), loom_typeck::check(&parse), "{src}");
    }
}

// ── Large inputs ───────────────────────────────────────────────────────

#[test]
fn long_chain_of_hoisted_functions() {
    let mut src: String = (0..19_999)
        .map(|i| format!("fn f{i}(x) do f{}(x) end\n", i + 1))
        .collect();
    src.push_str("fn f19999(x) do x end\nf0(1)");
    assert_eq!(result_type(&src), "int");
}

#[test]
fn deeply_nested_parens_still_type_later_bindings() {
    let depth = 20_000;
    let src = format!("let x = {}1{}\nlet y = 2", "(".repeat(depth), ")".repeat(depth));
    let result = check_source(&src);
    assert_eq!(type_of(&src, &result, "y"), "int");
}
