//! SyntaxKind enum for the loom CST.
//!
//! A superset of `TokenKind` (mapped to SCREAMING_SNAKE_CASE) plus the
//! composite node kinds produced by the parser.

use loom_common::token::TokenKind;

/// Every kind of syntax element in the loom CST.
///
/// Token kinds (leaves) map 1:1 from [`TokenKind`]. The first two values are
/// sentinels used by the event-based parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // ── Sentinels ──────────────────────────────────────────────────────
    /// Placeholder kind for unfinished or abandoned parser events.
    TOMBSTONE = 0,
    /// Wraps tokens that could not be parsed.
    ERROR_NODE = 1,

    // ── Keywords ───────────────────────────────────────────────────────
    AND_KW,
    DO_KW,
    ELSE_KW,
    END_KW,
    FALSE_KW,
    FN_KW,
    IF_KW,
    LET_KW,
    NIL_KW,
    NOT_KW,
    OR_KW,
    RETURN_KW,
    TRUE_KW,

    // ── Operators ──────────────────────────────────────────────────────
    PLUS,
    MINUS,
    STAR,
    SLASH,
    PERCENT,
    EQ_EQ,
    NOT_EQ,
    LT,
    GT,
    LT_EQ,
    GT_EQ,
    AMP_AMP,
    PIPE_PIPE,
    BANG,
    PLUS_PLUS,
    EQ,
    ARROW,

    // ── Delimiters ─────────────────────────────────────────────────────
    L_PAREN,
    R_PAREN,
    L_BRACKET,
    R_BRACKET,
    L_BRACE,
    R_BRACE,

    // ── Punctuation ────────────────────────────────────────────────────
    COMMA,
    DOT,
    COLON,
    SEMICOLON,
    NEWLINE,

    // ── Literals ───────────────────────────────────────────────────────
    INT_LITERAL,
    FLOAT_LITERAL,
    STRING_LITERAL,

    // ── Identifiers and trivia ─────────────────────────────────────────
    IDENT,
    COMMENT,
    WHITESPACE,

    // ── Special ────────────────────────────────────────────────────────
    EOF,
    /// Lexer error token.
    ERROR,

    // ── Composite node kinds ───────────────────────────────────────────
    /// Root node of a parsed document.
    SOURCE_FILE,
    /// Named function: `fn name(params) [-> T] do ... end`
    FN_DEF,
    /// Parameter list: `(a, b: int)`
    PARAM_LIST,
    /// Single parameter in a parameter list.
    PARAM,
    /// Let binding: `let x [: T] = expr`
    LET_BINDING,
    /// `return [expr]`
    RETURN_EXPR,
    /// Statements between `do` and `end`/`else`.
    BLOCK,
    /// `if cond do ... [else ...] end`
    IF_EXPR,
    /// `else` part of an if expression (a block or a nested if).
    ELSE_BRANCH,
    /// `fn(params) -> body end`
    CLOSURE_EXPR,
    /// `a + b`, `a == b`, ...
    BINARY_EXPR,
    /// `-x`, `!x`, `not x`
    UNARY_EXPR,
    /// `f(args)`
    CALL_EXPR,
    /// `(a, b)` after a callee.
    ARG_LIST,
    /// `expr.field`
    FIELD_ACCESS,
    /// `expr[index]`
    INDEX_EXPR,
    /// `(expr)` or `()`
    PAREN_EXPR,
    /// `[a, b, c]`
    LIST_LITERAL,
    /// `{ name: expr, ... }`
    RECORD_LITERAL,
    /// `name: expr` inside a record literal.
    RECORD_FIELD,
    /// Int, float, string, bool or nil literal.
    LITERAL,
    /// Name in a definition position.
    NAME,
    /// Identifier used as an expression.
    NAME_REF,
    /// `: T` after a binding, or `-> T` after a parameter list.
    TYPE_ANNOTATION,
    /// `int`, `list<T>`
    NAMED_TYPE,
    /// `{ f: T, ... }` in type position.
    RECORD_TYPE,
    /// `f: T` inside a record type.
    RECORD_TYPE_FIELD,
    /// `fn(T, U) -> R` in type position.
    FN_TYPE,
    /// `<T, U>` after a type name, or `(T, U)` in a function type.
    TYPE_ARG_LIST,
}

impl SyntaxKind {
    /// Whether this kind is trivia in the finished tree.
    ///
    /// Newlines are only trivia where the parser skipped them; a newline
    /// that terminated a statement stays a child of the enclosing node, but
    /// nothing in the typed AST inspects either kind.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            SyntaxKind::WHITESPACE | SyntaxKind::NEWLINE | SyntaxKind::COMMENT
        )
    }
}

impl From<TokenKind> for SyntaxKind {
    fn from(kind: TokenKind) -> Self {
        match kind {
            TokenKind::And => SyntaxKind::AND_KW,
            TokenKind::Do => SyntaxKind::DO_KW,
            TokenKind::Else => SyntaxKind::ELSE_KW,
            TokenKind::End => SyntaxKind::END_KW,
            TokenKind::False => SyntaxKind::FALSE_KW,
            TokenKind::Fn => SyntaxKind::FN_KW,
            TokenKind::If => SyntaxKind::IF_KW,
            TokenKind::Let => SyntaxKind::LET_KW,
            TokenKind::Nil => SyntaxKind::NIL_KW,
            TokenKind::Not => SyntaxKind::NOT_KW,
            TokenKind::Or => SyntaxKind::OR_KW,
            TokenKind::Return => SyntaxKind::RETURN_KW,
            TokenKind::True => SyntaxKind::TRUE_KW,

            TokenKind::Plus => SyntaxKind::PLUS,
            TokenKind::Minus => SyntaxKind::MINUS,
            TokenKind::Star => SyntaxKind::STAR,
            TokenKind::Slash => SyntaxKind::SLASH,
            TokenKind::Percent => SyntaxKind::PERCENT,
            TokenKind::EqEq => SyntaxKind::EQ_EQ,
            TokenKind::NotEq => SyntaxKind::NOT_EQ,
            TokenKind::Lt => SyntaxKind::LT,
            TokenKind::Gt => SyntaxKind::GT,
            TokenKind::LtEq => SyntaxKind::LT_EQ,
            TokenKind::GtEq => SyntaxKind::GT_EQ,
            TokenKind::AmpAmp => SyntaxKind::AMP_AMP,
            TokenKind::PipePipe => SyntaxKind::PIPE_PIPE,
            TokenKind::Bang => SyntaxKind::BANG,
            TokenKind::PlusPlus => SyntaxKind::PLUS_PLUS,
            TokenKind::Eq => SyntaxKind::EQ,
            TokenKind::Arrow => SyntaxKind::ARROW,

            TokenKind::LParen => SyntaxKind::L_PAREN,
            TokenKind::RParen => SyntaxKind::R_PAREN,
            TokenKind::LBracket => SyntaxKind::L_BRACKET,
            TokenKind::RBracket => SyntaxKind::R_BRACKET,
            TokenKind::LBrace => SyntaxKind::L_BRACE,
            TokenKind::RBrace => SyntaxKind::R_BRACE,

            TokenKind::Comma => SyntaxKind::COMMA,
            TokenKind::Dot => SyntaxKind::DOT,
            TokenKind::Colon => SyntaxKind::COLON,
            TokenKind::Semicolon => SyntaxKind::SEMICOLON,
            TokenKind::Newline => SyntaxKind::NEWLINE,

            TokenKind::IntLiteral => SyntaxKind::INT_LITERAL,
            TokenKind::FloatLiteral => SyntaxKind::FLOAT_LITERAL,
            TokenKind::StringLiteral => SyntaxKind::STRING_LITERAL,

            TokenKind::Ident => SyntaxKind::IDENT,
            TokenKind::Comment => SyntaxKind::COMMENT,
            TokenKind::Whitespace => SyntaxKind::WHITESPACE,

            TokenKind::Eof => SyntaxKind::EOF,
            TokenKind::Error => SyntaxKind::ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_have_fixed_values() {
        assert_eq!(SyntaxKind::TOMBSTONE as u16, 0);
        assert_eq!(SyntaxKind::ERROR_NODE as u16, 1);
    }

    #[test]
    fn token_kinds_convert() {
        assert_eq!(SyntaxKind::from(TokenKind::Let), SyntaxKind::LET_KW);
        assert_eq!(SyntaxKind::from(TokenKind::StringLiteral), SyntaxKind::STRING_LITERAL);
        assert_eq!(SyntaxKind::from(TokenKind::Whitespace), SyntaxKind::WHITESPACE);
    }

    #[test]
    fn trivia_kinds() {
        assert!(SyntaxKind::WHITESPACE.is_trivia());
        assert!(SyntaxKind::COMMENT.is_trivia());
        assert!(!SyntaxKind::IDENT.is_trivia());
        assert!(!SyntaxKind::LET_BINDING.is_trivia());
    }
}
