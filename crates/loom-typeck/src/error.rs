//! Type errors with provenance.
//!
//! Every constraint records a `ConstraintOrigin` saying where in the source
//! it came from, so a failed unification can point at the expression that
//! introduced it.

use std::fmt;

use rowan::TextRange;

use crate::ty::{Ty, TyVar};

/// Where a constraint between two types was generated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConstraintOrigin {
    /// Argument `param_idx` of the call at `call_site`.
    FnArg {
        call_site: TextRange,
        param_idx: usize,
    },
    /// Both operands of a binary operator.
    BinOp { op_span: TextRange },
    /// The two branches of an `if`.
    IfBranches {
        if_span: TextRange,
        then_span: TextRange,
        else_span: TextRange,
    },
    /// The condition of an `if`.
    Condition { span: TextRange },
    /// A `: T` or `-> T` annotation.
    Annotation { annotation_span: TextRange },
    /// A `return` (or the final expression of a body) against the function's
    /// return type.
    Return {
        return_span: TextRange,
        fn_span: TextRange,
    },
    /// The elements of a list literal.
    ListElement { span: TextRange },
    /// `xs[i]`: list base and integer index.
    Index { span: TextRange },
    /// `r.field`: the field's type against the access result.
    FieldAccess { span: TextRange },
    /// A binding's inferred type against its recursive uses.
    LetBinding { binding_span: TextRange },
    /// Internal constraints with no source location.
    Builtin,
}

impl ConstraintOrigin {
    /// The primary source range of the constraint.
    pub fn span(&self) -> Option<TextRange> {
        match self {
            ConstraintOrigin::FnArg { call_site, .. } => Some(*call_site),
            ConstraintOrigin::BinOp { op_span } => Some(*op_span),
            ConstraintOrigin::IfBranches { if_span, .. } => Some(*if_span),
            ConstraintOrigin::Condition { span } => Some(*span),
            ConstraintOrigin::Annotation { annotation_span } => Some(*annotation_span),
            ConstraintOrigin::Return { return_span, .. } => Some(*return_span),
            ConstraintOrigin::ListElement { span } => Some(*span),
            ConstraintOrigin::Index { span } => Some(*span),
            ConstraintOrigin::FieldAccess { span } => Some(*span),
            ConstraintOrigin::LetBinding { binding_span } => Some(*binding_span),
            ConstraintOrigin::Builtin => None,
        }
    }
}

/// A type error. Inference records these and keeps going.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeError {
    /// Two types that should be equal are not.
    Mismatch {
        expected: Ty,
        found: Ty,
        origin: ConstraintOrigin,
    },
    /// A variable would have to contain itself. The variable is bound to
    /// `unknown` instead.
    InfiniteType {
        var: TyVar,
        ty: Ty,
        origin: ConstraintOrigin,
    },
    /// Wrong number of arguments or type parameters.
    ArityMismatch {
        expected: usize,
        found: usize,
        origin: ConstraintOrigin,
    },
    UnboundVariable { name: String, span: TextRange },
    NotAFunction { ty: Ty, span: TextRange },
    NoSuchField {
        ty: Ty,
        field_name: String,
        span: TextRange,
    },
    /// An operator applied to a type it does not support, e.g. `true + 1`.
    UnsupportedOperator {
        op: String,
        ty: Ty,
        span: TextRange,
    },
    /// An unknown name in a type annotation.
    UnknownType { name: String, span: TextRange },
    /// A `let` whose value depends on itself through other definitions.
    CyclicDefinition { name: String, span: TextRange },
    ReturnOutsideFunction { span: TextRange },
}

impl TypeError {
    /// The source range the error should be reported at.
    pub fn span(&self) -> Option<TextRange> {
        match self {
            TypeError::Mismatch { origin, .. }
            | TypeError::InfiniteType { origin, .. }
            | TypeError::ArityMismatch { origin, .. } => origin.span(),
            TypeError::UnboundVariable { span, .. }
            | TypeError::NotAFunction { span, .. }
            | TypeError::NoSuchField { span, .. }
            | TypeError::UnsupportedOperator { span, .. }
            | TypeError::UnknownType { span, .. }
            | TypeError::CyclicDefinition { span, .. }
            | TypeError::ReturnOutsideFunction { span } => Some(*span),
        }
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeError::Mismatch {
                expected, found, ..
            } => {
                write!(f, "type mismatch: expected `{}`, found `{}`", expected, found)
            }
            TypeError::InfiniteType { ty, .. } => {
                write!(f, "infinite type: a value would have type `{}` inside itself", ty)
            }
            TypeError::ArityMismatch {
                expected, found, ..
            } => {
                write!(
                    f,
                    "arity mismatch: expected {} arguments, found {}",
                    expected, found
                )
            }
            TypeError::UnboundVariable { name, .. } => {
                write!(f, "unbound variable `{}`", name)
            }
            TypeError::NotAFunction { ty, .. } => {
                write!(f, "`{}` is not a function", ty)
            }
            TypeError::NoSuchField { ty, field_name, .. } => {
                write!(f, "type `{}` has no field `{}`", ty, field_name)
            }
            TypeError::UnsupportedOperator { op, ty, .. } => {
                write!(f, "operator `{}` cannot be applied to `{}`", op, ty)
            }
            TypeError::UnknownType { name, .. } => {
                write!(f, "unknown type `{}`", name)
            }
            TypeError::CyclicDefinition { name, .. } => {
                write!(f, "`{}` is defined in terms of itself", name)
            }
            TypeError::ReturnOutsideFunction { .. } => {
                write!(f, "`return` outside of a function")
            }
        }
    }
}

impl std::error::Error for TypeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatch_message() {
        let err = TypeError::Mismatch {
            expected: Ty::int(),
            found: Ty::string(),
            origin: ConstraintOrigin::Builtin,
        };
        assert_eq!(err.to_string(), "type mismatch: expected `int`, found `string`");
        assert_eq!(err.span(), None);
    }

    #[test]
    fn span_comes_from_origin() {
        let range = TextRange::new(2.into(), 5.into());
        let err = TypeError::ArityMismatch {
            expected: 1,
            found: 2,
            origin: ConstraintOrigin::FnArg {
                call_site: range,
                param_idx: 0,
            },
        };
        assert_eq!(err.span(), Some(range));
    }
}
