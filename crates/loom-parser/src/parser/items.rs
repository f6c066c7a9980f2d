//! Bindings: named functions, `let` and parameters.

use crate::syntax_kind::SyntaxKind;

use super::expressions::{comma_separated, expect_end, expr, parse_block};
use super::types::parse_type;
use super::Parser;

/// `fn name(params) [-> T] do body end`
pub(crate) fn parse_fn_def(p: &mut Parser) {
    let m = p.open();
    p.advance(); // FN_KW

    parse_name(p);

    if p.at(SyntaxKind::L_PAREN) {
        parse_param_list(p);
    } else {
        p.error("expected parameter list");
    }
    if p.has_error() {
        p.close(m, SyntaxKind::FN_DEF);
        return;
    }

    if p.at(SyntaxKind::ARROW) {
        let ann = p.open();
        p.advance(); // ->
        parse_type(p);
        p.close(ann, SyntaxKind::TYPE_ANNOTATION);
        if p.has_error() {
            p.close(m, SyntaxKind::FN_DEF);
            return;
        }
    }

    let do_span = p.current_span();
    if p.expect(SyntaxKind::DO_KW) {
        parse_block(p);
        expect_end(p, do_span);
    }

    p.close(m, SyntaxKind::FN_DEF);
}

/// `let name [: T] = expr`
pub(crate) fn parse_let_binding(p: &mut Parser) {
    let m = p.open();
    p.advance(); // LET_KW

    if !p.at(SyntaxKind::IDENT) {
        p.error("expected identifier after `let`");
        p.close(m, SyntaxKind::LET_BINDING);
        return;
    }
    parse_name(p);

    if p.at(SyntaxKind::COLON) {
        parse_colon_annotation(p);
    }

    if !p.has_error() && p.expect(SyntaxKind::EQ) {
        expr(p);
    }

    p.close(m, SyntaxKind::LET_BINDING);
}

/// `(a, b: T)`
pub(crate) fn parse_param_list(p: &mut Parser) {
    let m = p.open();
    p.advance(); // (
    comma_separated(p, SyntaxKind::R_PAREN, |p| {
        let param = p.open();
        if p.at(SyntaxKind::IDENT) {
            parse_name(p);
            if p.at(SyntaxKind::COLON) {
                parse_colon_annotation(p);
            }
        } else {
            p.error("expected parameter name");
        }
        p.close(param, SyntaxKind::PARAM);
    });
    p.close(m, SyntaxKind::PARAM_LIST);
}

fn parse_name(p: &mut Parser) {
    let name = p.open();
    p.expect(SyntaxKind::IDENT);
    p.close(name, SyntaxKind::NAME);
}

fn parse_colon_annotation(p: &mut Parser) {
    let ann = p.open();
    p.advance(); // :
    parse_type(p);
    p.close(ann, SyntaxKind::TYPE_ANNOTATION);
}
