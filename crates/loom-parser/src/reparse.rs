//! Incremental reparsing.
//!
//! After an edit, the cheapest tier that provably reproduces a full parse is
//! used:
//!
//! 1. **Token**: the edit stays inside one identifier, literal, whitespace or
//!    comment token, and relexing that token next to its neighbours gives the
//!    same token kinds. Only the green token is swapped.
//! 2. **Statement**: the edit lies inside one top-level statement and the
//!    edited statement parses alone, without errors, into exactly one node.
//!    That node's green tree is spliced into the old root.
//! 3. **Full**: anything else, including an old tree with errors.

use loom_lexer::{lex_single_token, Lexer};
use rowan::{GreenToken, NodeOrToken, TextRange, TextSize};

use crate::syntax_kind::SyntaxKind;
use crate::{parse, Parse};

/// Replace the bytes in `delete` with `insert`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub delete: TextRange,
    pub insert: String,
}

impl Edit {
    pub fn new(delete: TextRange, insert: impl Into<String>) -> Self {
        Self {
            delete,
            insert: insert.into(),
        }
    }

    pub fn apply(&self, text: &mut String) {
        let range = usize::from(self.delete.start())..usize::from(self.delete.end());
        text.replace_range(range, &self.insert);
    }

    /// Apply the edit to a slice of the document that starts at `base`.
    fn apply_within(&self, text: &str, base: TextSize) -> String {
        let mut out = text.to_string();
        let start = usize::from(self.delete.start() - base);
        let end = usize::from(self.delete.end() - base);
        out.replace_range(start..end, &self.insert);
        out
    }
}

/// Which tier produced a reparse result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Token,
    Statement,
    Full,
}

/// Reparse after `edit`, reusing `old` where possible.
///
/// `new_text` is the document after the edit. The result is identical to
/// `parse(new_text)` whichever tier is taken.
pub fn reparse(old: &Parse, edit: &Edit, new_text: &str) -> (Parse, Strategy) {
    if old.ok() {
        if let Some(parse) = reparse_token(old, edit) {
            return (parse, Strategy::Token);
        }
        if let Some(parse) = reparse_statement(old, edit) {
            return (parse, Strategy::Statement);
        }
    }
    (parse(new_text), Strategy::Full)
}

fn reparse_token(old: &Parse, edit: &Edit) -> Option<Parse> {
    let root = old.syntax();
    if edit.delete.end() > root.text_range().end() {
        return None;
    }
    let token = match root.covering_element(edit.delete) {
        NodeOrToken::Token(token) => token,
        NodeOrToken::Node(_) => return None,
    };
    let kind = token.kind();
    if !matches!(
        kind,
        SyntaxKind::IDENT
            | SyntaxKind::INT_LITERAL
            | SyntaxKind::FLOAT_LITERAL
            | SyntaxKind::STRING_LITERAL
            | SyntaxKind::WHITESPACE
            | SyntaxKind::COMMENT
    ) {
        return None;
    }

    let new_text = edit.apply_within(token.text(), token.text_range().start());
    if lex_single_token(&new_text).map(SyntaxKind::from) != Some(kind) {
        return None;
    }

    // The new token must not merge with or split from its neighbours.
    let prev = token.prev_token();
    let next = token.next_token();
    let mut window = String::new();
    let mut expected = Vec::new();
    if let Some(prev) = &prev {
        window.push_str(prev.text());
        expected.push(prev.kind());
    }
    window.push_str(&new_text);
    expected.push(kind);
    if let Some(next) = &next {
        window.push_str(next.text());
        expected.push(next.kind());
    }
    let relexed: Vec<SyntaxKind> = Lexer::tokenize(&window)
        .into_iter()
        .map(|t| SyntaxKind::from(t.kind))
        .filter(|k| *k != SyntaxKind::EOF)
        .collect();
    if relexed != expected {
        return None;
    }

    let green = token.replace_with(GreenToken::new(rowan::SyntaxKind(kind as u16), &new_text));
    Some(Parse {
        green,
        errors: Vec::new(),
    })
}

fn reparse_statement(old: &Parse, edit: &Edit) -> Option<Parse> {
    let root = old.syntax();
    let stmt = root.children().find(|node| {
        let range = node.text_range();
        range.start() <= edit.delete.start() && edit.delete.end() <= range.end()
    })?;

    let text = edit.apply_within(&stmt.text().to_string(), stmt.text_range().start());
    let fresh = parse(&text);
    if !fresh.ok() {
        return None;
    }

    let fresh_root = fresh.syntax();
    let mut elements = fresh_root.children_with_tokens();
    let only = elements.next()?.into_node()?;
    if elements.next().is_some() {
        return None;
    }

    let green = stmt.replace_with(only.green().into_owned());
    Some(Parse {
        green,
        errors: Vec::new(),
    })
}
