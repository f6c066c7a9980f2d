use insta::assert_snapshot;
use loom_lexer::Lexer;

/// One line per token: `Kind@start..end "text"`.
fn dump(source: &str) -> String {
    Lexer::tokenize(source)
        .iter()
        .map(|t| {
            let text = &source[t.span.start as usize..t.span.end as usize];
            format!("{:?}@{}..{} {:?}", t.kind, t.span.start, t.span.end, text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn let_binding_with_string() {
    assert_snapshot!(dump("let x = \"s\""), @r###"
    Let@0..3 "let"
    Whitespace@3..4 " "
    Ident@4..5 "x"
    Whitespace@5..6 " "
    Eq@6..7 "="
    Whitespace@7..8 " "
    StringLiteral@8..11 "\"s\""
    Eof@11..11 ""
    "###);
}

#[test]
fn function_with_comment() {
    assert_snapshot!(dump("fn id(a) do # same\n  a\nend"), @r###"
    Fn@0..2 "fn"
    Whitespace@2..3 " "
    Ident@3..5 "id"
    LParen@5..6 "("
    Ident@6..7 "a"
    RParen@7..8 ")"
    Whitespace@8..9 " "
    Do@9..11 "do"
    Whitespace@11..12 " "
    Comment@12..18 "# same"
    Newline@18..19 "\n"
    Whitespace@19..21 "  "
    Ident@21..22 "a"
    Newline@22..23 "\n"
    End@23..26 "end"
    Eof@26..26 ""
    "###);
}

#[test]
fn record_and_list_literals() {
    assert_snapshot!(dump("{a: [1, 2.5]}"), @r###"
    LBrace@0..1 "{"
    Ident@1..2 "a"
    Colon@2..3 ":"
    Whitespace@3..4 " "
    LBracket@4..5 "["
    IntLiteral@5..6 "1"
    Comma@6..7 ","
    Whitespace@7..8 " "
    FloatLiteral@8..11 "2.5"
    RBracket@11..12 "]"
    RBrace@12..13 "}"
    Eof@13..13 ""
    "###);
}

#[test]
fn unknown_characters_become_error_tokens() {
    assert_snapshot!(dump("a @ b"), @r###"
    Ident@0..1 "a"
    Whitespace@1..2 " "
    Error@2..3 "@"
    Whitespace@3..4 " "
    Ident@4..5 "b"
    Eof@5..5 ""
    "###);
}
