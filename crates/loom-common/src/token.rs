use serde::Serialize;

use crate::span::Span;

/// A token produced by the loom lexer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    /// Create a new token from a kind and byte offsets.
    pub fn new(kind: TokenKind, start: u32, end: u32) -> Self {
        Self {
            kind,
            span: Span::new(start, end),
        }
    }
}

/// Every kind of token the lexer produces.
///
/// The lexer is lossless: whitespace and comments are tokens too, so the
/// concatenated token text always reproduces the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    // ── Keywords (13) ──────────────────────────────────────────────────
    And,
    Do,
    Else,
    End,
    False,
    Fn,
    If,
    Let,
    Nil,
    Not,
    Or,
    Return,
    True,

    // ── Operators (18) ─────────────────────────────────────────────────
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    LtEq,
    /// `>=`
    GtEq,
    /// `&&`
    AmpAmp,
    /// `||`
    PipePipe,
    /// `!`
    Bang,
    /// `++`
    PlusPlus,
    /// `=`
    Eq,
    /// `->`
    Arrow,

    // ── Delimiters (6) ─────────────────────────────────────────────────
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,

    // ── Punctuation (5) ────────────────────────────────────────────────
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `:`
    Colon,
    /// `;`
    Semicolon,
    /// Line break. The parser decides whether it terminates a statement.
    Newline,

    // ── Literals (3) ───────────────────────────────────────────────────
    /// Integer literal, e.g. `42`, `0xFF`.
    IntLiteral,
    /// Floating-point literal, e.g. `3.14`, `1.0e10`.
    FloatLiteral,
    /// A whole double-quoted string including its quotes.
    StringLiteral,

    // ── Identifiers and trivia (3) ─────────────────────────────────────
    /// Regular identifier, e.g. `foo`, `my_var`.
    Ident,
    /// Line comment (`# ...`), without the trailing newline.
    Comment,
    /// Run of spaces, tabs and carriage returns.
    Whitespace,

    // ── Special (2) ────────────────────────────────────────────────────
    /// End of file.
    Eof,
    /// Invalid/unexpected input. Used for error recovery.
    Error,
}

impl TokenKind {
    /// Tokens the parser never sees directly.
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::Whitespace | TokenKind::Comment)
    }
}

/// Look up a keyword from its string representation.
///
/// The lexer calls this to distinguish keywords from identifiers after
/// scanning an identifier-shaped token.
pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
    match s {
        "and" => Some(TokenKind::And),
        "do" => Some(TokenKind::Do),
        "else" => Some(TokenKind::Else),
        "end" => Some(TokenKind::End),
        "false" => Some(TokenKind::False),
        "fn" => Some(TokenKind::Fn),
        "if" => Some(TokenKind::If),
        "let" => Some(TokenKind::Let),
        "nil" => Some(TokenKind::Nil),
        "not" => Some(TokenKind::Not),
        "or" => Some(TokenKind::Or),
        "return" => Some(TokenKind::Return),
        "true" => Some(TokenKind::True),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_from_str_recognizes_all_keywords() {
        let keywords = [
            ("and", TokenKind::And),
            ("do", TokenKind::Do),
            ("else", TokenKind::Else),
            ("end", TokenKind::End),
            ("false", TokenKind::False),
            ("fn", TokenKind::Fn),
            ("if", TokenKind::If),
            ("let", TokenKind::Let),
            ("nil", TokenKind::Nil),
            ("not", TokenKind::Not),
            ("or", TokenKind::Or),
            ("return", TokenKind::Return),
            ("true", TokenKind::True),
        ];

        for (s, expected) in &keywords {
            assert_eq!(
                keyword_from_str(s),
                Some(*expected),
                "keyword_from_str({s:?}) should return Some({expected:?})"
            );
        }
    }

    #[test]
    fn keyword_from_str_rejects_non_keywords() {
        assert_eq!(keyword_from_str("foo"), None);
        assert_eq!(keyword_from_str(""), None);
        assert_eq!(keyword_from_str("LET"), None); // case-sensitive
        assert_eq!(keyword_from_str("int"), None); // type names are identifiers
    }

    #[test]
    fn trivia_kinds() {
        assert!(TokenKind::Whitespace.is_trivia());
        assert!(TokenKind::Comment.is_trivia());
        assert!(!TokenKind::Newline.is_trivia());
    }
}
