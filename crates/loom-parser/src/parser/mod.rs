//! Event-based parser.
//!
//! Parse functions call `open()` to start a node, `advance()` to consume a
//! significant token and `close()` to finish a node with its real kind. The
//! events are collected into a flat `Vec<Event>` and turned into a rowan green
//! tree by [`Parser::build_tree`]. `open_before()` wraps an already completed
//! node (an identifier that turns out to be a callee) through a forward
//! parent link instead of inserting into the event list.
//!
//! # Trivia
//!
//! Whitespace and comments are always trivia. Newlines are statement
//! terminators at delimiter depth zero and trivia inside `()`, `[]` and `{}`.
//! The parse functions never see trivia: lookahead skips it, and the tree
//! builder re-inserts it. Trivia in front of a node is attached to the parent,
//! so every node's range starts at its first real token.

pub(crate) mod expressions;
pub(crate) mod items;
pub(crate) mod types;

use loom_common::span::Span;
use loom_common::token::{Token, TokenKind};

use crate::error::ParseError;
use crate::syntax_kind::SyntaxKind;

#[derive(Debug)]
enum Event {
    /// Start a node. `kind` stays TOMBSTONE until `close()` patches it.
    Open {
        kind: SyntaxKind,
        forward_parent: Option<usize>,
    },
    Close,
    /// Consume the significant token at index `token`.
    Advance { token: usize },
}

/// A started but not yet closed node.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MarkOpened {
    index: usize,
}

/// A completed node, usable with `open_before()`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MarkClosed {
    index: usize,
}

/// Deepest syntactic nesting the parser descends into. Input nested deeper
/// is reported and skipped by error recovery.
pub(crate) const MAX_NESTING: u32 = 256;

/// Delimiter nesting at some point of the parse, restored by error recovery.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Depth {
    paren: u32,
    bracket: u32,
    brace: u32,
}

pub(crate) struct Parser<'src> {
    /// All tokens from the lexer, trivia included, ending with Eof.
    tokens: Vec<Token>,
    pos: usize,
    events: Vec<Event>,
    source: &'src str,
    depth: Depth,
    /// Current syntactic nesting, bounded by [`MAX_NESTING`].
    nesting: u32,
    errors: Vec<ParseError>,
    /// Set by `error()`; statement loops recover and clear it.
    has_error: bool,
}

impl<'src> Parser<'src> {
    pub(crate) fn new(tokens: Vec<Token>, source: &'src str) -> Self {
        Self {
            tokens,
            pos: 0,
            events: Vec::new(),
            source,
            depth: Depth::default(),
            nesting: 0,
            errors: Vec::new(),
            has_error: false,
        }
    }

    // ── Lookahead ──────────────────────────────────────────────────────

    pub(crate) fn current(&self) -> SyntaxKind {
        self.nth(0)
    }

    /// Kind of the Nth significant token ahead, or EOF past the end.
    pub(crate) fn nth(&self, n: usize) -> SyntaxKind {
        let mut pos = self.pos;
        let mut remaining = n;
        while pos < self.tokens.len() {
            let kind = self.tokens[pos].kind;
            if self.should_skip(kind) {
                pos += 1;
                continue;
            }
            if remaining == 0 {
                return SyntaxKind::from(kind);
            }
            remaining -= 1;
            pos += 1;
        }
        SyntaxKind::EOF
    }

    pub(crate) fn current_span(&self) -> Span {
        let pos = self.skip_to_significant(self.pos);
        match self.tokens.get(pos) {
            Some(token) => token.span,
            None => {
                let end = self.source.len() as u32;
                Span::new(end, end)
            }
        }
    }

    pub(crate) fn at(&self, kind: SyntaxKind) -> bool {
        self.current() == kind
    }

    pub(crate) fn at_any(&self, kinds: &[SyntaxKind]) -> bool {
        kinds.contains(&self.current())
    }

    // ── Node management ────────────────────────────────────────────────

    pub(crate) fn open(&mut self) -> MarkOpened {
        let mark = MarkOpened {
            index: self.events.len(),
        };
        self.events.push(Event::Open {
            kind: SyntaxKind::TOMBSTONE,
            forward_parent: None,
        });
        mark
    }

    /// Start a node that will become the parent of `completed`.
    pub(crate) fn open_before(&mut self, completed: MarkClosed) -> MarkOpened {
        let mark = self.open();
        if let Event::Open { forward_parent, .. } = &mut self.events[completed.index] {
            *forward_parent = Some(mark.index);
        }
        mark
    }

    pub(crate) fn close(&mut self, m: MarkOpened, kind: SyntaxKind) -> MarkClosed {
        if let Event::Open { kind: slot, .. } = &mut self.events[m.index] {
            *slot = kind;
        }
        self.events.push(Event::Close);
        MarkClosed { index: m.index }
    }

    // ── Token consumption ──────────────────────────────────────────────

    /// Consume the current significant token, tracking delimiter depth.
    /// Does nothing at EOF.
    pub(crate) fn advance(&mut self) {
        self.pos = self.skip_to_significant(self.pos);
        let Some(token) = self.tokens.get(self.pos) else {
            return;
        };
        if token.kind == TokenKind::Eof {
            return;
        }
        let kind = token.kind;
        self.update_depth(kind);
        self.events.push(Event::Advance { token: self.pos });
        self.pos += 1;
    }

    /// Consume the current token without touching delimiter depth.
    fn advance_raw(&mut self) {
        self.pos = self.skip_to_significant(self.pos);
        if self.pos < self.tokens.len() && self.tokens[self.pos].kind != TokenKind::Eof {
            self.events.push(Event::Advance { token: self.pos });
            self.pos += 1;
        }
    }

    /// Consume the current token if it is `kind`, otherwise record an error.
    pub(crate) fn expect(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            self.error(&format!("expected {}", describe(kind)));
            false
        }
    }

    pub(crate) fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume statement separators: significant newlines and semicolons.
    pub(crate) fn eat_separators(&mut self) {
        while self.at_any(&[SyntaxKind::NEWLINE, SyntaxKind::SEMICOLON]) {
            self.advance();
        }
    }

    // ── Errors and recovery ────────────────────────────────────────────

    pub(crate) fn error(&mut self, message: &str) {
        let span = self.current_span();
        self.errors.push(ParseError::new(message, span));
        self.has_error = true;
    }

    pub(crate) fn error_with_related(
        &mut self,
        message: &str,
        related_span: Span,
        related_msg: &str,
    ) {
        let span = self.current_span();
        self.errors
            .push(ParseError::with_related(message, span, related_msg, related_span));
        self.has_error = true;
    }

    pub(crate) fn has_error(&self) -> bool {
        self.has_error
    }

    pub(crate) fn depth(&self) -> Depth {
        self.depth
    }

    /// Skip the rest of a broken statement.
    ///
    /// Restores the delimiter depth the statement started at, then wraps
    /// every token up to the next separator (or one of `stop`) in an
    /// ERROR_NODE. Clears the error flag so parsing resumes.
    pub(crate) fn recover(&mut self, depth: Depth, stop: &[SyntaxKind]) {
        self.has_error = false;
        self.depth = depth;
        let at_stop = |p: &Self| {
            p.at_any(&[SyntaxKind::NEWLINE, SyntaxKind::SEMICOLON, SyntaxKind::EOF])
                || p.at_any(stop)
        };
        if at_stop(self) {
            return;
        }
        let m = self.open();
        while !at_stop(self) {
            self.advance_raw();
        }
        self.close(m, SyntaxKind::ERROR_NODE);
    }

    // ── Nesting ────────────────────────────────────────────────────────

    pub(crate) fn nesting(&self) -> u32 {
        self.nesting
    }

    /// Go one level deeper. At [`MAX_NESTING`] an error is recorded instead
    /// and `false` is returned; the caller must not descend.
    pub(crate) fn enter_nesting(&mut self) -> bool {
        if self.nesting >= MAX_NESTING {
            if !self.has_error {
                self.error("nesting too deep");
            }
            return false;
        }
        self.nesting += 1;
        true
    }

    pub(crate) fn restore_nesting(&mut self, nesting: u32) {
        self.nesting = nesting;
    }

    // ── Newline significance ───────────────────────────────────────────

    fn newlines_insignificant(&self) -> bool {
        self.depth.paren > 0 || self.depth.bracket > 0 || self.depth.brace > 0
    }

    fn should_skip(&self, kind: TokenKind) -> bool {
        match kind {
            TokenKind::Whitespace | TokenKind::Comment => true,
            TokenKind::Newline => self.newlines_insignificant(),
            _ => false,
        }
    }

    fn skip_to_significant(&self, mut pos: usize) -> usize {
        while pos < self.tokens.len() && self.should_skip(self.tokens[pos].kind) {
            pos += 1;
        }
        pos
    }

    fn update_depth(&mut self, kind: TokenKind) {
        let d = &mut self.depth;
        match kind {
            TokenKind::LParen => d.paren += 1,
            TokenKind::RParen => d.paren = d.paren.saturating_sub(1),
            TokenKind::LBracket => d.bracket += 1,
            TokenKind::RBracket => d.bracket = d.bracket.saturating_sub(1),
            TokenKind::LBrace => d.brace += 1,
            TokenKind::RBrace => d.brace = d.brace.saturating_sub(1),
            _ => {}
        }
    }

    // ── Tree building ──────────────────────────────────────────────────

    /// Convert the collected events into a green tree.
    ///
    /// Tokens the parser never advanced over are trivia. They are emitted in
    /// front of the next advanced token, or in front of the next node that
    /// opens, so they end up in the outermost node that is still open. The
    /// root node takes everything left at the end except the Eof token.
    ///
    /// Forward parents: when a node's Open event links forward to wrapper
    /// Open events, the whole chain is opened at once, outermost first, and
    /// the wrappers are tombstoned so they are skipped later.
    pub(crate) fn build_tree(mut self) -> (rowan::GreenNode, Vec<ParseError>) {
        let mut significant = vec![false; self.tokens.len()];
        for event in &self.events {
            if let Event::Advance { token } = event {
                significant[*token] = true;
            }
        }

        let mut sink = TreeSink {
            builder: rowan::GreenNodeBuilder::new(),
            tokens: &self.tokens,
            source: self.source,
            significant,
            token_pos: 0,
            depth: 0,
        };
        let mut chain: Vec<SyntaxKind> = Vec::new();

        for i in 0..self.events.len() {
            match self.events[i] {
                Event::Open {
                    kind,
                    forward_parent,
                } => {
                    if kind == SyntaxKind::TOMBSTONE && forward_parent.is_none() {
                        continue;
                    }
                    chain.clear();
                    chain.push(kind);
                    let mut next = forward_parent;
                    while let Some(idx) = next {
                        match &mut self.events[idx] {
                            Event::Open {
                                kind,
                                forward_parent,
                            } => {
                                chain.push(*kind);
                                *kind = SyntaxKind::TOMBSTONE;
                                next = forward_parent.take();
                            }
                            _ => break,
                        }
                    }
                    for &kind in chain.iter().rev() {
                        if kind != SyntaxKind::TOMBSTONE {
                            sink.start_node(kind);
                        }
                    }
                }
                Event::Close => sink.finish_node(),
                Event::Advance { token } => sink.token(token),
            }
        }

        (sink.builder.finish(), self.errors)
    }
}

struct TreeSink<'a> {
    builder: rowan::GreenNodeBuilder<'static>,
    tokens: &'a [Token],
    source: &'a str,
    significant: Vec<bool>,
    token_pos: usize,
    depth: usize,
}

impl TreeSink<'_> {
    fn start_node(&mut self, kind: SyntaxKind) {
        if self.depth > 0 {
            self.flush_trivia();
        }
        self.builder.start_node(rowan::SyntaxKind(kind as u16));
        self.depth += 1;
    }

    fn finish_node(&mut self) {
        if self.depth == 1 {
            while self.token_pos < self.tokens.len() {
                self.emit_raw(self.token_pos);
            }
        }
        self.builder.finish_node();
        self.depth -= 1;
    }

    fn token(&mut self, index: usize) {
        while self.token_pos < index {
            self.emit_raw(self.token_pos);
        }
        self.emit_raw(index);
    }

    fn flush_trivia(&mut self) {
        while self.token_pos < self.tokens.len() && !self.significant[self.token_pos] {
            if self.tokens[self.token_pos].kind == TokenKind::Eof {
                break;
            }
            self.emit_raw(self.token_pos);
        }
    }

    fn emit_raw(&mut self, index: usize) {
        let token = &self.tokens[index];
        self.token_pos = index + 1;
        if token.kind == TokenKind::Eof {
            return;
        }
        let kind = SyntaxKind::from(token.kind);
        let text = &self.source[token.span.start as usize..token.span.end as usize];
        self.builder.token(rowan::SyntaxKind(kind as u16), text);
    }
}

/// Human-readable token name for "expected ..." messages.
fn describe(kind: SyntaxKind) -> &'static str {
    match kind {
        SyntaxKind::IDENT => "identifier",
        SyntaxKind::EQ => "`=`",
        SyntaxKind::COLON => "`:`",
        SyntaxKind::COMMA => "`,`",
        SyntaxKind::ARROW => "`->`",
        SyntaxKind::DO_KW => "`do`",
        SyntaxKind::END_KW => "`end`",
        SyntaxKind::L_PAREN => "`(`",
        SyntaxKind::R_PAREN => "`)`",
        SyntaxKind::R_BRACKET => "`]`",
        SyntaxKind::R_BRACE => "`}`",
        SyntaxKind::GT => "`>`",
        _ => "token",
    }
}

// ── Statements ─────────────────────────────────────────────────────────

/// Parse a whole document into a SOURCE_FILE node.
pub(crate) fn parse_source_file(p: &mut Parser) {
    let root = p.open();
    parse_statements(p, &[]);
    p.close(root, SyntaxKind::SOURCE_FILE);
}

/// Parse statements until EOF or one of `terminators`.
///
/// A statement that fails to parse is followed by an ERROR_NODE covering
/// the rest of its line; the next statement parses normally.
pub(crate) fn parse_statements(p: &mut Parser, terminators: &[SyntaxKind]) {
    loop {
        p.eat_separators();
        if p.at(SyntaxKind::EOF) || p.at_any(terminators) {
            break;
        }

        let depth = p.depth();
        parse_stmt(p);

        if p.has_error() {
            p.recover(depth, terminators);
            continue;
        }

        let current = p.current();
        let separated = matches!(
            current,
            SyntaxKind::NEWLINE | SyntaxKind::SEMICOLON | SyntaxKind::EOF
        ) || terminators.contains(&current);
        if !separated {
            p.error("expected newline or `;` after statement");
            p.recover(depth, terminators);
        }
    }
}

fn parse_stmt(p: &mut Parser) {
    match p.current() {
        SyntaxKind::FN_KW if p.nth(1) == SyntaxKind::IDENT => items::parse_fn_def(p),
        SyntaxKind::LET_KW => items::parse_let_binding(p),
        SyntaxKind::RETURN_KW => expressions::parse_return_expr(p),
        _ => expressions::expr(p),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SyntaxNode;
    use loom_lexer::Lexer;

    fn build(source: &str) -> (SyntaxNode, Vec<ParseError>) {
        let mut parser = Parser::new(Lexer::tokenize(source), source);
        parse_source_file(&mut parser);
        let (green, errors) = parser.build_tree();
        (SyntaxNode::new_root(green), errors)
    }

    #[test]
    fn leading_trivia_stays_outside_nodes() {
        let (root, errors) = build("  let x = 5");
        assert!(errors.is_empty());
        let binding = root.first_child().unwrap();
        assert_eq!(binding.kind(), SyntaxKind::LET_BINDING);
        assert_eq!(u32::from(binding.text_range().start()), 2);
    }

    #[test]
    fn trailing_comment_belongs_to_the_root() {
        let (root, _) = build("let x = 5 # five\n");
        let last = root.last_token().unwrap();
        assert_eq!(last.kind(), SyntaxKind::NEWLINE);
        let binding = root.first_child().unwrap();
        assert_eq!(u32::from(binding.text_range().end()), 9);
    }

    #[test]
    fn newlines_inside_parens_are_trivia() {
        let (root, errors) = build("f(1,\n 2)");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(root.children().count(), 1);
        assert_eq!(root.text().to_string(), "f(1,\n 2)");
    }

    #[test]
    fn recovery_resumes_at_next_line() {
        let (root, errors) = build("let = 1\nlet y = 2");
        assert_eq!(errors.len(), 1);
        let kinds: Vec<_> = root.children().map(|n| n.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                SyntaxKind::LET_BINDING,
                SyntaxKind::ERROR_NODE,
                SyntaxKind::LET_BINDING
            ]
        );
    }

    #[test]
    fn missing_separator_is_an_error() {
        let (root, errors) = build("1 2");
        assert_eq!(errors[0].message, "expected newline or `;` after statement");
        assert_eq!(root.text().to_string(), "1 2");
    }

    #[test]
    fn nesting_below_the_limit_parses() {
        let depth = MAX_NESTING as usize - 10;
        let source = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
        let (_, errors) = build(&source);
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn nesting_past_the_limit_is_an_error() {
        let depth = MAX_NESTING as usize + 10;
        let source = format!("{}1{}\nlet ok = 1", "[".repeat(depth), "]".repeat(depth));
        let (root, errors) = build(&source);
        assert_eq!(errors[0].message, "nesting too deep");
        assert_eq!(root.text().to_string(), source);
        assert_eq!(root.last_child().unwrap().kind(), SyntaxKind::LET_BINDING);
    }

    #[test]
    fn nested_type_annotations_are_bounded() {
        let depth = MAX_NESTING as usize + 1;
        let source = format!("let x: {}int{} = 1", "list<".repeat(depth), ">".repeat(depth));
        let (_, errors) = build(&source);
        assert_eq!(errors[0].message, "nesting too deep");
    }
}
