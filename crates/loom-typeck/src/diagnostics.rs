//! Ariadne rendering for parse and type errors.
//!
//! Output is colorless so it is stable in snapshots and readable in logs.

use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use loom_parser::ParseError;
use rowan::TextRange;

use crate::error::{ConstraintOrigin, TypeError};
use crate::ty::Ty;

// ── Error Codes ────────────────────────────────────────────────────────

pub fn error_code(err: &TypeError) -> &'static str {
    match err {
        TypeError::Mismatch { .. } => "E0001",
        TypeError::InfiniteType { .. } => "E0002",
        TypeError::ArityMismatch { .. } => "E0003",
        TypeError::UnboundVariable { .. } => "E0004",
        TypeError::NotAFunction { .. } => "E0005",
        TypeError::NoSuchField { .. } => "E0006",
        TypeError::UnsupportedOperator { .. } => "E0007",
        TypeError::UnknownType { .. } => "E0008",
        TypeError::CyclicDefinition { .. } => "E0009",
        TypeError::ReturnOutsideFunction { .. } => "E0010",
    }
}

// ── Span Helpers ───────────────────────────────────────────────────────

fn text_range_to_range(range: TextRange) -> Range<usize> {
    let start: usize = range.start().into();
    let end: usize = range.end().into();
    start..end
}

/// Clamp into the source and widen empty spans to one byte where possible.
fn clamp(range: Range<usize>, source_len: usize) -> Range<usize> {
    let start = range.start.min(source_len);
    let end = range.end.min(source_len).max(start);
    if start == end {
        start..(end + 1).min(source_len)
    } else {
        start..end
    }
}

fn fix_suggestion(expected: &Ty, found: &Ty) -> Option<&'static str> {
    if expected.is_con("string") && (found.is_con("int") || found.is_con("float")) {
        return Some("use to_string(...) to convert");
    }
    if expected.is_con("float") && found.is_con("int") {
        return Some("write the literal with a decimal point, e.g. `1.0`");
    }
    if expected.is_con("bool") && !found.is_con("bool") {
        return Some("expected a boolean expression");
    }
    None
}

fn write_report(report: Report<'_, Range<usize>>, source: &str) -> String {
    let mut buf = Vec::new();
    let _ = report.write(Source::from(source), &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

// ── Rendering ──────────────────────────────────────────────────────────

/// Render a parse error.
pub fn render_parse_error(error: &ParseError, source: &str) -> String {
    let config = Config::default().with_color(false);
    let span = clamp(error.span.start as usize..error.span.end as usize, source.len());
    let mut builder = Report::build(ReportKind::Error, span.clone())
        .with_code("P0001")
        .with_message(&error.message)
        .with_config(config)
        .with_label(
            Label::new(span)
                .with_message(&error.message)
                .with_color(Color::Red),
        );
    if let Some(related) = &error.related {
        let related_span = clamp(
            related.span.start as usize..related.span.end as usize,
            source.len(),
        );
        builder.add_label(
            Label::new(related_span)
                .with_message(&related.message)
                .with_color(Color::Blue),
        );
    }
    write_report(builder.finish(), source)
}

/// Render a type error.
pub fn render_diagnostic(error: &TypeError, source: &str) -> String {
    let config = Config::default().with_color(false);
    let source_len = source.len();
    let span = clamp(
        error
            .span()
            .map_or(0..source_len, text_range_to_range),
        source_len,
    );

    let mut builder = Report::build(ReportKind::Error, span.clone())
        .with_code(error_code(error))
        .with_message(error.to_string())
        .with_config(config);

    match error {
        TypeError::Mismatch {
            expected,
            found,
            origin,
        } => {
            match origin {
                ConstraintOrigin::IfBranches {
                    then_span,
                    else_span,
                    ..
                } => {
                    builder.add_label(
                        Label::new(clamp(text_range_to_range(*then_span), source_len))
                            .with_message(format!("this branch is `{}`", expected))
                            .with_color(Color::Red),
                    );
                    builder.add_label(
                        Label::new(clamp(text_range_to_range(*else_span), source_len))
                            .with_message(format!("this branch is `{}`", found))
                            .with_color(Color::Blue),
                    );
                }
                ConstraintOrigin::Annotation { .. } => {
                    builder.add_label(
                        Label::new(span)
                            .with_message(format!("annotation requires `{}`", expected))
                            .with_color(Color::Red),
                    );
                }
                _ => {
                    builder.add_label(
                        Label::new(span)
                            .with_message(format!("expected `{}`, found `{}`", expected, found))
                            .with_color(Color::Red),
                    );
                }
            }
            if let Some(fix) = fix_suggestion(expected, found) {
                builder.set_help(fix);
            }
        }
        TypeError::InfiniteType { .. } => {
            builder.add_label(
                Label::new(span)
                    .with_message("recursive type here")
                    .with_color(Color::Red),
            );
            builder.set_help("a value cannot have a type that refers to itself");
        }
        TypeError::ArityMismatch {
            expected, found, ..
        } => {
            builder.add_label(
                Label::new(span)
                    .with_message(format!("expected {} argument(s)", expected))
                    .with_color(Color::Red),
            );
            if expected > found {
                builder.set_help(format!("missing {} argument(s)", expected - found));
            } else {
                builder.set_help(format!("{} extra argument(s)", found - expected));
            }
        }
        TypeError::UnboundVariable { .. } => {
            builder.add_label(
                Label::new(span)
                    .with_message("not found in this scope")
                    .with_color(Color::Red),
            );
        }
        TypeError::CyclicDefinition { .. } => {
            builder.add_label(
                Label::new(span)
                    .with_message("this binding's type is unknown")
                    .with_color(Color::Red),
            );
            builder.set_help("move the value into a function, or break the cycle");
        }
        _ => {
            builder.add_label(Label::new(span).with_color(Color::Red));
        }
    }

    write_report(builder.finish(), source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatch_points_at_the_operator() {
        let source = "let a = 1 + \"s\"";
        let result = crate::check(&loom_parser::parse(source));
        assert_eq!(result.errors.len(), 1);
        let rendered = render_diagnostic(&result.errors[0], source);
        assert!(rendered.contains("E0001"), "{rendered}");
        assert!(rendered.contains("expected `int`, found `string`"), "{rendered}");
    }

    #[test]
    fn parse_error_mentions_the_message() {
        let source = "let = 1";
        let parse = loom_parser::parse(source);
        let rendered = render_parse_error(&parse.errors()[0], source);
        assert!(rendered.contains("P0001"), "{rendered}");
        assert!(rendered.contains(&parse.errors()[0].message), "{rendered}");
    }

    #[test]
    fn empty_span_is_widened() {
        let err = TypeError::UnboundVariable {
            name: "x".into(),
            span: TextRange::new(0.into(), 0.into()),
        };
        assert_eq!(clamp(0..0, 1), 0..1);
        let rendered = render_diagnostic(&err, "x");
        assert!(rendered.contains("unbound variable `x`"), "{rendered}");
    }
}
