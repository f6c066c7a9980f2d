//! Conversions between `lsp_types` and the engine's wire types.

use loom_common::position as loom;
use loom_hints::{Diagnostic, EngineError, InlayHint, Severity};
use tower_lsp::jsonrpc;
use tower_lsp::lsp_types as lsp;

pub fn position(p: lsp::Position) -> loom::Position {
    loom::Position::new(p.line, p.character)
}

pub fn range(r: lsp::Range) -> loom::Range {
    loom::Range::new(position(r.start), position(r.end))
}

pub fn to_position(p: loom::Position) -> lsp::Position {
    lsp::Position::new(p.line, p.character)
}

pub fn to_range(r: loom::Range) -> lsp::Range {
    lsp::Range::new(to_position(r.start), to_position(r.end))
}

pub fn to_diagnostic(d: Diagnostic) -> lsp::Diagnostic {
    lsp::Diagnostic {
        range: to_range(d.range),
        severity: Some(match d.severity {
            Severity::Error => lsp::DiagnosticSeverity::ERROR,
            Severity::Warning => lsp::DiagnosticSeverity::WARNING,
        }),
        code: Some(lsp::NumberOrString::String(d.code)),
        source: Some("loom".to_string()),
        message: d.message,
        ..Default::default()
    }
}

pub fn to_inlay_hint(h: InlayHint) -> lsp::InlayHint {
    lsp::InlayHint {
        position: to_position(h.position),
        label: lsp::InlayHintLabel::String(h.label),
        kind: Some(lsp::InlayHintKind::TYPE),
        text_edits: None,
        tooltip: None,
        padding_left: None,
        padding_right: None,
        data: None,
    }
}

/// Unknown documents are the client's mistake; everything else is ours.
pub fn to_rpc_error(err: EngineError) -> jsonrpc::Error {
    match err {
        EngineError::UnknownDocument(_) | EngineError::InvalidEdit { .. } => {
            jsonrpc::Error::invalid_params(err.to_string())
        }
        EngineError::StaleChange { .. } | EngineError::Worker(_) => jsonrpc::Error {
            code: jsonrpc::ErrorCode::InternalError,
            message: err.to_string().into(),
            data: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_document_is_invalid_params() {
        let err = to_rpc_error(EngineError::UnknownDocument("file:///x".to_string()));
        assert_eq!(err.code, jsonrpc::ErrorCode::InvalidParams);
        assert_eq!(err.message, "unknown document: file:///x");
    }

    #[test]
    fn diagnostic_keeps_its_code() {
        let d = to_diagnostic(Diagnostic {
            range: loom::Range::new(loom::Position::new(1, 2), loom::Position::new(1, 3)),
            severity: Severity::Error,
            code: "E0004".to_string(),
            message: "unbound variable `y`".to_string(),
        });
        assert_eq!(d.code, Some(lsp::NumberOrString::String("E0004".to_string())));
        assert_eq!(d.range.start, lsp::Position::new(1, 2));
        assert_eq!(d.severity, Some(lsp::DiagnosticSeverity::ERROR));
    }
}
