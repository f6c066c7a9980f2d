//! Pratt expression parser.
//!
//! Operator precedence comes from the binding power tables below. Atoms are
//! literals, names, parenthesized expressions, list and record literals,
//! `if` expressions and closures.

use crate::syntax_kind::SyntaxKind;

use super::{MarkClosed, Parser};

// ── Binding Power Tables ───────────────────────────────────────────────

/// (left_bp, right_bp) for infix operators. Left < right is left-associative.
fn infix_binding_power(op: SyntaxKind) -> Option<(u8, u8)> {
    match op {
        SyntaxKind::OR_KW | SyntaxKind::PIPE_PIPE => Some((5, 6)),
        SyntaxKind::AND_KW | SyntaxKind::AMP_AMP => Some((7, 8)),
        SyntaxKind::EQ_EQ | SyntaxKind::NOT_EQ => Some((9, 10)),
        SyntaxKind::LT | SyntaxKind::GT | SyntaxKind::LT_EQ | SyntaxKind::GT_EQ => Some((11, 12)),
        SyntaxKind::PLUS_PLUS => Some((15, 16)),
        SyntaxKind::PLUS | SyntaxKind::MINUS => Some((17, 18)),
        SyntaxKind::STAR | SyntaxKind::SLASH | SyntaxKind::PERCENT => Some((19, 20)),
        _ => None,
    }
}

fn prefix_binding_power(op: SyntaxKind) -> Option<u8> {
    match op {
        SyntaxKind::MINUS | SyntaxKind::BANG | SyntaxKind::NOT_KW => Some(23),
        _ => None,
    }
}

/// Call, field access and indexing bind tighter than every operator.
const POSTFIX_BP: u8 = 25;

// ── Expression Entry Point ─────────────────────────────────────────────

pub(crate) fn expr(p: &mut Parser) {
    expr_bp(p, 0);
}

fn expr_bp(p: &mut Parser, min_bp: u8) -> Option<MarkClosed> {
    let outer = p.nesting();
    let result = expr_bp_nested(p, min_bp);
    p.restore_nesting(outer);
    result
}

/// Each wrapping node (call, field, index, binary) deepens the tree like a
/// nested atom does, so it counts against the nesting limit too.
fn expr_bp_nested(p: &mut Parser, min_bp: u8) -> Option<MarkClosed> {
    if !p.enter_nesting() {
        return None;
    }
    let mut lhs = lhs(p)?;

    loop {
        if p.has_error() {
            break;
        }

        let current = p.current();
        let wraps = matches!(
            current,
            SyntaxKind::L_PAREN | SyntaxKind::DOT | SyntaxKind::L_BRACKET
        ) || infix_binding_power(current).is_some();
        if wraps && !p.enter_nesting() {
            break;
        }

        if current == SyntaxKind::L_PAREN && POSTFIX_BP >= min_bp {
            let m = p.open_before(lhs);
            parse_arg_list(p);
            lhs = p.close(m, SyntaxKind::CALL_EXPR);
            continue;
        }

        if current == SyntaxKind::DOT && POSTFIX_BP >= min_bp {
            let m = p.open_before(lhs);
            p.advance(); // .
            p.expect(SyntaxKind::IDENT);
            lhs = p.close(m, SyntaxKind::FIELD_ACCESS);
            continue;
        }

        if current == SyntaxKind::L_BRACKET && POSTFIX_BP >= min_bp {
            let m = p.open_before(lhs);
            p.advance(); // [
            expr_bp(p, 0);
            if !p.has_error() {
                p.expect(SyntaxKind::R_BRACKET);
            }
            lhs = p.close(m, SyntaxKind::INDEX_EXPR);
            continue;
        }

        if let Some((l_bp, r_bp)) = infix_binding_power(current) {
            if l_bp < min_bp {
                break;
            }
            let m = p.open_before(lhs);
            p.advance(); // operator
            expr_bp(p, r_bp);
            lhs = p.close(m, SyntaxKind::BINARY_EXPR);
            continue;
        }

        break;
    }

    Some(lhs)
}

// ── Atoms and prefix operators ─────────────────────────────────────────

fn lhs(p: &mut Parser) -> Option<MarkClosed> {
    let current = p.current();

    if let Some(r_bp) = prefix_binding_power(current) {
        let m = p.open();
        p.advance(); // operator
        expr_bp(p, r_bp);
        return Some(p.close(m, SyntaxKind::UNARY_EXPR));
    }

    match current {
        SyntaxKind::INT_LITERAL
        | SyntaxKind::FLOAT_LITERAL
        | SyntaxKind::STRING_LITERAL
        | SyntaxKind::TRUE_KW
        | SyntaxKind::FALSE_KW
        | SyntaxKind::NIL_KW => {
            let m = p.open();
            p.advance();
            Some(p.close(m, SyntaxKind::LITERAL))
        }

        SyntaxKind::IDENT => {
            let m = p.open();
            p.advance();
            Some(p.close(m, SyntaxKind::NAME_REF))
        }

        SyntaxKind::L_PAREN => {
            let m = p.open();
            p.advance(); // (
            if !p.at(SyntaxKind::R_PAREN) {
                expr_bp(p, 0);
            }
            if !p.has_error() {
                p.expect(SyntaxKind::R_PAREN);
            }
            Some(p.close(m, SyntaxKind::PAREN_EXPR))
        }

        SyntaxKind::L_BRACKET => Some(parse_list_literal(p)),
        SyntaxKind::L_BRACE => Some(parse_record_literal(p)),
        SyntaxKind::IF_KW => Some(parse_if_expr(p)),
        SyntaxKind::FN_KW => Some(parse_closure(p)),

        SyntaxKind::ERROR => {
            // Lexer error token: consume it so the message points at it.
            let m = p.open();
            p.error("unexpected character");
            p.advance();
            p.close(m, SyntaxKind::ERROR_NODE);
            None
        }

        _ => {
            p.error("expected expression");
            None
        }
    }
}

/// `(expr, expr, ...)` after a callee.
fn parse_arg_list(p: &mut Parser) {
    let m = p.open();
    p.advance(); // (
    comma_separated(p, SyntaxKind::R_PAREN, |p| expr(p));
    p.close(m, SyntaxKind::ARG_LIST);
}

/// `[a, b, c]`
fn parse_list_literal(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    p.advance(); // [
    comma_separated(p, SyntaxKind::R_BRACKET, |p| expr(p));
    p.close(m, SyntaxKind::LIST_LITERAL)
}

/// `{ name: expr, ... }`
fn parse_record_literal(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    p.advance(); // {
    comma_separated(p, SyntaxKind::R_BRACE, |p| {
        let field = p.open();
        if p.expect(SyntaxKind::IDENT) && p.expect(SyntaxKind::COLON) {
            expr(p);
        }
        p.close(field, SyntaxKind::RECORD_FIELD);
    });
    p.close(m, SyntaxKind::RECORD_LITERAL)
}

/// Items separated by commas up to `close`, which is consumed. A trailing
/// comma is allowed.
pub(crate) fn comma_separated(
    p: &mut Parser,
    close: SyntaxKind,
    mut item: impl FnMut(&mut Parser),
) {
    while !p.at(close) && !p.at(SyntaxKind::EOF) {
        item(p);
        if p.has_error() || !p.eat(SyntaxKind::COMMA) {
            break;
        }
    }
    if !p.has_error() {
        p.expect(close);
    }
}

// ── Compound expressions ───────────────────────────────────────────────

/// Statements up to `end` or `else`, wrapped in a BLOCK node.
pub(crate) fn parse_block(p: &mut Parser) {
    let outer = p.nesting();
    let m = p.open();
    if p.enter_nesting() {
        super::parse_statements(p, &[SyntaxKind::END_KW, SyntaxKind::ELSE_KW]);
    }
    p.close(m, SyntaxKind::BLOCK);
    p.restore_nesting(outer);
}

/// `return [expr]`
pub(crate) fn parse_return_expr(p: &mut Parser) {
    let m = p.open();
    p.advance(); // RETURN_KW
    let bare = p.at_any(&[
        SyntaxKind::NEWLINE,
        SyntaxKind::SEMICOLON,
        SyntaxKind::END_KW,
        SyntaxKind::ELSE_KW,
        SyntaxKind::EOF,
    ]);
    if !bare {
        expr(p);
    }
    p.close(m, SyntaxKind::RETURN_EXPR);
}

/// `if cond do body [else (if ... | body end)] end`
///
/// An `else if` nests a second IF_EXPR that owns the single closing `end`.
fn parse_if_expr(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    p.advance(); // IF_KW

    expr(p);
    if p.has_error() {
        return p.close(m, SyntaxKind::IF_EXPR);
    }

    let do_span = p.current_span();
    if !p.expect(SyntaxKind::DO_KW) {
        return p.close(m, SyntaxKind::IF_EXPR);
    }

    parse_block(p);

    if p.at(SyntaxKind::ELSE_KW) {
        let else_m = p.open();
        p.advance(); // ELSE_KW
        if p.at(SyntaxKind::IF_KW) {
            parse_if_expr(p);
        } else {
            parse_block(p);
            expect_end(p, do_span);
        }
        p.close(else_m, SyntaxKind::ELSE_BRANCH);
    } else {
        expect_end(p, do_span);
    }

    p.close(m, SyntaxKind::IF_EXPR)
}

/// `fn(params) -> body end`
fn parse_closure(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    let fn_span = p.current_span();
    p.advance(); // FN_KW

    if p.at(SyntaxKind::L_PAREN) {
        super::items::parse_param_list(p);
    } else {
        p.error("expected `(` after `fn`");
    }
    if !p.has_error() && p.expect(SyntaxKind::ARROW) {
        parse_block(p);
        expect_end(p, fn_span);
    }

    p.close(m, SyntaxKind::CLOSURE_EXPR)
}

/// Consume the `end` closing a block opened at `opened`.
pub(crate) fn expect_end(p: &mut Parser, opened: loom_common::span::Span) {
    if p.at(SyntaxKind::END_KW) {
        p.advance();
    } else {
        p.error_with_related("expected `end` to close block", opened, "block started here");
    }
}
