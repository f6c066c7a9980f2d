// loom lexer -- lossless tokenizer for the hint engine's source language.

mod cursor;

use cursor::Cursor;
use loom_common::token::{keyword_from_str, Token, TokenKind};

/// Converts source text into a stream of tokens.
///
/// Unlike a compiler front end that throws whitespace away, this lexer emits
/// `Whitespace`, `Newline` and `Comment` tokens so that the syntax tree built
/// on top of it covers every byte of the document. The stream always ends with
/// a single zero-width `Eof` token.
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    emitted_eof: bool,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source text.
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            emitted_eof: false,
        }
    }

    /// Tokenize the entire source into a `Vec<Token>`, including `Eof`.
    pub fn tokenize(source: &str) -> Vec<Token> {
        Lexer::new(source).collect()
    }

    fn next_token(&mut self) -> Token {
        let start = self.cursor.pos();

        let Some(c) = self.cursor.peek() else {
            return Token::new(TokenKind::Eof, start, start);
        };

        match c {
            // ── Trivia ───────────────────────────────────────────────────
            ' ' | '\t' | '\r' => {
                self.cursor.eat_while(|c| c == ' ' || c == '\t' || c == '\r');
                Token::new(TokenKind::Whitespace, start, self.cursor.pos())
            }
            '\n' => self.single_char_token(TokenKind::Newline, start),
            '#' => {
                self.cursor.eat_while(|c| c != '\n');
                Token::new(TokenKind::Comment, start, self.cursor.pos())
            }

            // ── Single-character delimiters ──────────────────────────────
            '(' => self.single_char_token(TokenKind::LParen, start),
            ')' => self.single_char_token(TokenKind::RParen, start),
            '[' => self.single_char_token(TokenKind::LBracket, start),
            ']' => self.single_char_token(TokenKind::RBracket, start),
            '{' => self.single_char_token(TokenKind::LBrace, start),
            '}' => self.single_char_token(TokenKind::RBrace, start),
            ',' => self.single_char_token(TokenKind::Comma, start),
            ';' => self.single_char_token(TokenKind::Semicolon, start),
            '.' => self.single_char_token(TokenKind::Dot, start),
            ':' => self.single_char_token(TokenKind::Colon, start),
            '*' => self.single_char_token(TokenKind::Star, start),
            '/' => self.single_char_token(TokenKind::Slash, start),
            '%' => self.single_char_token(TokenKind::Percent, start),

            // ── Multi-character operators ────────────────────────────────
            '=' => self.one_or_two(start, '=', TokenKind::Eq, TokenKind::EqEq),
            '!' => self.one_or_two(start, '=', TokenKind::Bang, TokenKind::NotEq),
            '<' => self.one_or_two(start, '=', TokenKind::Lt, TokenKind::LtEq),
            '>' => self.one_or_two(start, '=', TokenKind::Gt, TokenKind::GtEq),
            '+' => self.one_or_two(start, '+', TokenKind::Plus, TokenKind::PlusPlus),
            '-' => self.one_or_two(start, '>', TokenKind::Minus, TokenKind::Arrow),
            '&' => self.one_or_two(start, '&', TokenKind::Error, TokenKind::AmpAmp),
            '|' => self.one_or_two(start, '|', TokenKind::Error, TokenKind::PipePipe),

            '0'..='9' => self.lex_number(start),
            '"' => self.lex_string(start),
            c if is_ident_start(c) => self.lex_ident(start),

            // ── Unknown character (error recovery) ───────────────────────
            _ => {
                self.cursor.advance();
                Token::new(TokenKind::Error, start, self.cursor.pos())
            }
        }
    }

    /// Consume one character and return a token of the given kind.
    fn single_char_token(&mut self, kind: TokenKind, start: u32) -> Token {
        self.cursor.advance();
        Token::new(kind, start, self.cursor.pos())
    }

    /// Consume the current character, then `second` if it follows.
    fn one_or_two(&mut self, start: u32, second: char, one: TokenKind, two: TokenKind) -> Token {
        self.cursor.advance();
        let kind = if self.cursor.eat(second) { two } else { one };
        Token::new(kind, start, self.cursor.pos())
    }

    /// Decimal and hex integers, floats with optional exponent.
    /// Underscore separators are allowed.
    fn lex_number(&mut self, start: u32) -> Token {
        let first = self.cursor.advance();

        if first == Some('0') && matches!(self.cursor.peek(), Some('x' | 'X')) {
            self.cursor.advance();
            self.cursor.eat_while(|c| c.is_ascii_hexdigit() || c == '_');
            return Token::new(TokenKind::IntLiteral, start, self.cursor.pos());
        }

        self.cursor.eat_while(|c| c.is_ascii_digit() || c == '_');

        let mut kind = TokenKind::IntLiteral;
        let fraction = self.cursor.peek_next().is_some_and(|c| c.is_ascii_digit());
        if self.cursor.peek() == Some('.') && fraction {
            self.cursor.advance();
            self.cursor.eat_while(|c| c.is_ascii_digit() || c == '_');
            kind = TokenKind::FloatLiteral;
        }

        if matches!(self.cursor.peek(), Some('e' | 'E')) {
            self.cursor.advance();
            if matches!(self.cursor.peek(), Some('+' | '-')) {
                self.cursor.advance();
            }
            self.cursor.eat_while(|c| c.is_ascii_digit() || c == '_');
            kind = TokenKind::FloatLiteral;
        }

        Token::new(kind, start, self.cursor.pos())
    }

    /// A whole string literal, quotes included. An unterminated string runs to
    /// the end of the line and is returned as `Error`.
    fn lex_string(&mut self, start: u32) -> Token {
        self.cursor.advance(); // opening quote
        loop {
            match self.cursor.peek() {
                Some('"') => {
                    self.cursor.advance();
                    return Token::new(TokenKind::StringLiteral, start, self.cursor.pos());
                }
                Some('\\') => {
                    self.cursor.advance();
                    if self.cursor.peek() != Some('\n') {
                        self.cursor.advance();
                    }
                }
                Some('\n') | None => {
                    return Token::new(TokenKind::Error, start, self.cursor.pos());
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
    }

    fn lex_ident(&mut self, start: u32) -> Token {
        self.cursor.advance();
        self.cursor.eat_while(is_ident_continue);
        let text = self.cursor.slice(start, self.cursor.pos());

        let kind = keyword_from_str(text).unwrap_or(TokenKind::Ident);
        Token::new(kind, start, self.cursor.pos())
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.emitted_eof {
            return None;
        }
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            debug_assert!(self.cursor.is_eof());
            self.emitted_eof = true;
        }
        Some(token)
    }
}

/// Relex `text` and return its kind if it forms exactly one token.
///
/// The incremental parser uses this to decide whether an edit that stays
/// inside one token can be applied by swapping that token alone.
pub fn lex_single_token(text: &str) -> Option<TokenKind> {
    let mut lexer = Lexer::new(text);
    let first = lexer.next()?;
    if first.kind == TokenKind::Eof || first.span.end as usize != text.len() {
        return None;
    }
    Some(first.kind)
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
