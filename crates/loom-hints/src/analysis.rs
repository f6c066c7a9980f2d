//! One analysed document version: parse plus inference, and the queries the
//! dispatcher answers from it.

use std::sync::Arc;

use loom_common::position::{Position, Range};
use loom_common::span::LineIndex;
use loom_parser::ast::item::{LetBinding, Name, Param};
use loom_parser::ast::AstNode;
use loom_parser::{Parse, ParseError};
use loom_typeck::{Budget, Interrupted, TypeckResult};
use rowan::{TextRange, TextSize};
use serde::{Deserialize, Serialize};

use crate::source::{DocumentSnapshot, Revision};
use crate::{TypeHint, Unavailable};

/// Inference results for one document version.
#[derive(Debug)]
pub struct Analysis {
    pub uri: String,
    pub version: i32,
    pub generation: u64,
    pub text: Arc<str>,
    pub parse: Parse,
    pub typeck: TypeckResult,
    pub line_index: Arc<LineIndex>,
}

/// Run inference over a snapshot within `budget`.
pub fn analyze(snapshot: DocumentSnapshot, budget: Budget) -> Result<Analysis, Interrupted> {
    let typeck = loom_typeck::check_with_budget(&snapshot.parse, budget)?;
    Ok(Analysis {
        uri: snapshot.uri,
        version: snapshot.version,
        generation: snapshot.generation,
        text: snapshot.text,
        parse: snapshot.parse,
        typeck,
        line_index: snapshot.line_index,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub range: Range,
    pub severity: Severity,
    /// `P0001` for syntax errors, `E....` for type errors.
    pub code: String,
    pub message: String,
}

/// A `: type` label placed after a binding name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlayHint {
    pub position: Position,
    pub label: String,
}

impl Analysis {
    /// The document revision this analysis was computed from.
    pub fn revision(&self) -> Revision {
        Revision {
            version: self.version,
            generation: self.generation,
        }
    }

    /// The type of the innermost typed node at `position`.
    pub fn hint_at(&self, position: Position) -> Result<TypeHint, Unavailable> {
        let offset = self
            .line_index
            .offset(position)
            .ok_or(Unavailable::OutOfRange)?;
        let (range, ty) = self
            .typeck
            .type_at(TextSize::from(offset))
            .ok_or(Unavailable::NoType)?;
        Ok(TypeHint {
            ty: ty.to_string(),
            range: self.lsp_range(range),
        })
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut out = parse_diagnostics(&self.parse, &self.line_index);
        out.extend(self.typeck.errors.iter().map(|err| Diagnostic {
            range: self.lsp_range(err.span().unwrap_or_default()),
            severity: Severity::Error,
            code: loom_typeck::diagnostics::error_code(err).to_string(),
            message: err.to_string(),
        }));
        out
    }

    /// Labels for unannotated `let` names and parameters inside `range`.
    pub fn inlay_hints(&self, range: Range) -> Vec<InlayHint> {
        let root = self.parse.syntax();
        let mut hints = Vec::new();
        for node in root.descendants() {
            let name = if let Some(let_) = LetBinding::cast(node.clone()) {
                let_.annotation().is_none().then(|| let_.name()).flatten()
            } else if let Some(param) = Param::cast(node) {
                param.annotation().is_none().then(|| param.name()).flatten()
            } else {
                None
            };
            let Some(name) = name else { continue };
            if let Some(hint) = self.name_hint(&name, range) {
                hints.push(hint);
            }
        }
        hints
    }

    fn name_hint(&self, name: &Name, visible: Range) -> Option<InlayHint> {
        let name_range = name.syntax().text_range();
        let ty = self.typeck.type_of(name_range)?;
        let position = self.line_index.position(name_range.end().into());
        visible.contains(position).then(|| InlayHint {
            position,
            label: format!(": {ty}"),
        })
    }

    fn lsp_range(&self, range: TextRange) -> Range {
        Range::new(
            self.line_index.position(range.start().into()),
            self.line_index.position(range.end().into()),
        )
    }
}

/// Syntax errors alone, for when inference is unavailable.
pub fn parse_diagnostics(parse: &Parse, line_index: &LineIndex) -> Vec<Diagnostic> {
    parse
        .errors()
        .iter()
        .map(|err: &ParseError| Diagnostic {
            range: Range::new(
                line_index.position(err.span.start),
                line_index.position(err.span.end),
            ),
            severity: Severity::Error,
            code: "P0001".to_string(),
            message: err.message.clone(),
        })
        .collect()
}
