//! loom parser: error-tolerant, incremental parser producing a rowan CST.
//!
//! The tree is lossless: the text of the root node is exactly the source
//! text, so node ranges double as byte offsets into the document. Parsing
//! never fails; broken statements end up wrapped in `ERROR_NODE`s and the
//! errors are reported alongside the tree.

pub mod ast;
pub mod cst;
pub mod error;
mod parser;
mod reparse;
pub mod syntax_kind;

pub use cst::{LoomLanguage, SyntaxElement, SyntaxNode, SyntaxToken};
pub use error::ParseError;
pub use reparse::{reparse, Edit, Strategy};
pub use syntax_kind::SyntaxKind;

use std::fmt::Write;

use ast::item::SourceFile;
use loom_lexer::Lexer;
use rowan::NodeOrToken;

/// Result of parsing a document.
///
/// Holds the green tree (immutable, cheap to clone, `Send + Sync`) and the
/// parse errors. A red `SyntaxNode` view is built on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parse {
    green: rowan::GreenNode,
    errors: Vec<ParseError>,
}

impl Parse {
    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    /// Typed view of the root.
    pub fn tree(&self) -> SourceFile {
        SourceFile {
            syntax: self.syntax(),
        }
    }

    pub fn green(&self) -> &rowan::GreenNode {
        &self.green
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Indented dump of the tree, one element per line.
    pub fn debug_tree(&self) -> String {
        debug_tree(&self.syntax())
    }
}

/// Parse a document from scratch.
pub fn parse(source: &str) -> Parse {
    let tokens = Lexer::tokenize(source);
    let mut p = parser::Parser::new(tokens, source);
    parser::parse_source_file(&mut p);
    let (green, errors) = p.build_tree();
    Parse { green, errors }
}

/// Render `node` as `KIND@start..end`, with tokens followed by their text.
pub fn debug_tree(node: &SyntaxNode) -> String {
    let mut out = String::new();
    let mut indent = 0usize;
    for event in node.preorder_with_tokens() {
        match event {
            rowan::WalkEvent::Enter(element) => {
                let range = element.text_range();
                let _ = write!(
                    out,
                    "{:indent$}{:?}@{}..{}",
                    "",
                    element.kind(),
                    u32::from(range.start()),
                    u32::from(range.end()),
                    indent = indent
                );
                if let NodeOrToken::Token(token) = &element {
                    let _ = write!(out, " {:?}", token.text());
                }
                out.push('\n');
                if element.as_node().is_some() {
                    indent += 2;
                }
            }
            rowan::WalkEvent::Leave(element) => {
                if element.as_node().is_some() {
                    indent -= 2;
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_text_matches_source() {
        for source in [
            "let x = 1",
            "  # only a comment\n\n",
            "fn f(a: int) -> int do\n  a + 1\nend\n",
            "let broken = (1 +\nlet y = 2",
            "\"unterminated",
        ] {
            assert_eq!(parse(source).syntax().text().to_string(), source);
        }
    }

    #[test]
    fn parse_is_deterministic() {
        let source = "let r = { a: [1, 2], b: fn(x) -> x end }\nr.a[0]";
        assert_eq!(parse(source), parse(source));
    }

    #[test]
    fn tree_exposes_statements() {
        let parse = parse("let x = 1\nfn f() do x end\nf()");
        assert!(parse.ok(), "{:?}", parse.errors());
        assert_eq!(parse.tree().stmts().count(), 3);
    }
}
