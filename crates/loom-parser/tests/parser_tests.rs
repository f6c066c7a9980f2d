//! Parser integration tests: CST snapshots for small inputs and structural
//! checks through the typed AST.

use insta::assert_snapshot;
use loom_parser::ast::expr::Expr;
use loom_parser::ast::item::Stmt;
use loom_parser::{parse, SyntaxKind};

fn single_expr(source: &str) -> Expr {
    let parse = parse(source);
    assert!(parse.ok(), "{:?}", parse.errors());
    match parse.tree().stmts().next() {
        Some(Stmt::Expr(expr)) => expr,
        other => panic!("expected an expression, got {other:?}"),
    }
}

// ── Snapshots ──────────────────────────────────────────────────────────

#[test]
fn let_binding_tree() {
    assert_snapshot!(parse("let x = 1").debug_tree(), @r###"
    SOURCE_FILE@0..9
      LET_BINDING@0..9
        LET_KW@0..3 "let"
        WHITESPACE@3..4 " "
        NAME@4..5
          IDENT@4..5 "x"
        WHITESPACE@5..6 " "
        EQ@6..7 "="
        WHITESPACE@7..8 " "
        LITERAL@8..9
          INT_LITERAL@8..9 "1"
    "###);
}

#[test]
fn precedence_tree() {
    assert_snapshot!(parse("1 + 2 * 3").debug_tree(), @r###"
    SOURCE_FILE@0..9
      BINARY_EXPR@0..9
        LITERAL@0..1
          INT_LITERAL@0..1 "1"
        WHITESPACE@1..2 " "
        PLUS@2..3 "+"
        WHITESPACE@3..4 " "
        BINARY_EXPR@4..9
          LITERAL@4..5
            INT_LITERAL@4..5 "2"
          WHITESPACE@5..6 " "
          STAR@6..7 "*"
          WHITESPACE@7..8 " "
          LITERAL@8..9
            INT_LITERAL@8..9 "3"
    "###);
}

// ── Structure ──────────────────────────────────────────────────────────

#[test]
fn subtraction_is_left_associative() {
    let Expr::BinaryExpr(outer) = single_expr("a - b - c") else {
        panic!("expected a binary expression");
    };
    assert!(matches!(outer.lhs(), Some(Expr::BinaryExpr(_))));
    assert!(matches!(outer.rhs(), Some(Expr::NameRef(_))));
}

#[test]
fn postfix_chain() {
    let Expr::IndexExpr(index) = single_expr("r.items[0]") else {
        panic!("expected an index expression");
    };
    let Some(Expr::FieldAccess(field)) = index.base() else {
        panic!("expected a field access");
    };
    assert_eq!(field.field().map(|t| t.text().to_string()), Some("items".to_string()));
}

#[test]
fn call_arguments() {
    let Expr::CallExpr(call) = single_expr("push([1, 2], x + 1)") else {
        panic!("expected a call");
    };
    let args: Vec<_> = call.arg_list().unwrap().args().collect();
    assert_eq!(args.len(), 2);
    assert!(matches!(args[0], Expr::ListLiteral(_)));
    assert!(matches!(args[1], Expr::BinaryExpr(_)));
}

#[test]
fn else_if_chain_nests() {
    let Expr::IfExpr(outer) = single_expr("if a do 1 else if b do 2 else 3 end") else {
        panic!("expected an if");
    };
    let inner = outer.else_branch().and_then(|e| e.if_expr()).expect("nested if");
    assert!(inner.else_branch().and_then(|e| e.block()).is_some());
}

#[test]
fn function_definition_parts() {
    let parse = parse("fn add(a: int, b) -> int do\n  a + b\nend");
    assert!(parse.ok(), "{:?}", parse.errors());
    let Some(Stmt::FnDef(f)) = parse.tree().stmts().next() else {
        panic!("expected a function");
    };
    assert_eq!(f.name().and_then(|n| n.text()), Some("add".to_string()));
    let params: Vec<_> = f.param_list().unwrap().params().collect();
    assert_eq!(params.len(), 2);
    assert!(params[0].annotation().is_some());
    assert!(params[1].annotation().is_none());
    assert!(f.return_type().is_some());
    assert_eq!(f.body().unwrap().stmts().count(), 1);
}

#[test]
fn semicolons_separate_statements() {
    let parse = parse("let a = 1; let b = 2; a");
    assert!(parse.ok(), "{:?}", parse.errors());
    assert_eq!(parse.tree().stmts().count(), 3);
}

// ── Error recovery ─────────────────────────────────────────────────────

#[test]
fn unclosed_block_points_at_its_start() {
    let parse = parse("fn f() do\n  1\n");
    let error = &parse.errors()[0];
    assert_eq!(error.message, "expected `end` to close block");
    let related = error.related.as_ref().expect("related location");
    assert_eq!((related.span.start, related.span.end), (7, 9));
}

#[test]
fn errors_are_wrapped_and_text_is_kept() {
    let source = "let = 1\nlet ok = 2\n)";
    let parse = parse(source);
    assert_eq!(parse.syntax().text().to_string(), source);
    let error_nodes = parse
        .syntax()
        .descendants()
        .filter(|n| n.kind() == SyntaxKind::ERROR_NODE)
        .count();
    assert!(error_nodes >= 1);
    let names: Vec<_> = parse
        .tree()
        .stmts()
        .filter_map(|s| s.bound_name())
        .filter_map(|n| n.text())
        .collect();
    assert_eq!(names, vec!["ok".to_string()]);
    assert!(parse.tree().stmts().all(|s| s.syntax().kind() != SyntaxKind::ERROR_NODE));
}

#[test]
fn deeply_nested_parens_are_reported_not_fatal() {
    let depth = 20_000;
    let source = format!("let x = {}1{}\nlet y = 2", "(".repeat(depth), ")".repeat(depth));
    let parse = parse(&source);
    assert!(parse.errors().iter().any(|e| e.message == "nesting too deep"));
    assert_eq!(parse.syntax().text().to_string(), source);
    let last = parse.tree().stmts().last().and_then(|s| s.bound_name());
    assert_eq!(last.and_then(|n| n.text()), Some("y".to_string()));
}

#[test]
fn long_operator_chains_are_bounded() {
    let source = format!("let total = 1{}", " + 1".repeat(20_000));
    let parse = parse(&source);
    assert!(parse.errors().iter().any(|e| e.message == "nesting too deep"));
    assert_eq!(parse.syntax().text().to_string(), source);
}
