//! Type annotations: `int`, `list<T>`, `{ f: T }`, `fn(T) -> R`.

use crate::syntax_kind::SyntaxKind;

use super::expressions::comma_separated;
use super::Parser;

pub(crate) fn parse_type(p: &mut Parser) {
    let outer = p.nesting();
    if p.enter_nesting() {
        parse_type_nested(p);
    }
    p.restore_nesting(outer);
}

fn parse_type_nested(p: &mut Parser) {
    match p.current() {
        SyntaxKind::IDENT => {
            let m = p.open();
            p.advance(); // type name
            if p.at(SyntaxKind::LT) {
                let args = p.open();
                p.advance(); // <
                comma_separated(p, SyntaxKind::GT, parse_type);
                p.close(args, SyntaxKind::TYPE_ARG_LIST);
            }
            p.close(m, SyntaxKind::NAMED_TYPE);
        }
        SyntaxKind::L_BRACE => {
            let m = p.open();
            p.advance(); // {
            comma_separated(p, SyntaxKind::R_BRACE, |p| {
                let field = p.open();
                if p.expect(SyntaxKind::IDENT) && p.expect(SyntaxKind::COLON) {
                    parse_type(p);
                }
                p.close(field, SyntaxKind::RECORD_TYPE_FIELD);
            });
            p.close(m, SyntaxKind::RECORD_TYPE);
        }
        SyntaxKind::FN_KW => {
            let m = p.open();
            p.advance(); // fn
            if p.at(SyntaxKind::L_PAREN) {
                let params = p.open();
                p.advance(); // (
                comma_separated(p, SyntaxKind::R_PAREN, parse_type);
                p.close(params, SyntaxKind::TYPE_ARG_LIST);
            } else {
                p.error("expected `(` after `fn`");
            }
            if !p.has_error() && p.expect(SyntaxKind::ARROW) {
                parse_type(p);
            }
            p.close(m, SyntaxKind::FN_TYPE);
        }
        _ => p.error("expected type"),
    }
}
