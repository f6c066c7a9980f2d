//! Parse errors. None of them are fatal: the tree is always built.

use std::fmt;

use loom_common::span::Span;

/// A parse error with its location and an optional secondary location.
///
/// The secondary location points at context such as the `do` that an
/// unclosed block started with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    /// Where the problem was detected.
    pub span: Span,
    pub related: Option<Related>,
}

/// Secondary location attached to a [`ParseError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Related {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            related: None,
        }
    }

    pub fn with_related(
        message: impl Into<String>,
        span: Span,
        related_message: impl Into<String>,
        related_span: Span,
    ) -> Self {
        Self {
            message: message.into(),
            span,
            related: Some(Related {
                message: related_message.into(),
                span: related_span,
            }),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn related_location_is_kept() {
        let err = ParseError::with_related(
            "expected `end` to close `do` block",
            Span::new(50, 53),
            "`do` block started here",
            Span::new(10, 12),
        );
        let related = err.related.as_ref().unwrap();
        assert_eq!(related.span, Span::new(10, 12));
        assert_eq!(err.to_string(), "expected `end` to close `do` block");
    }
}
