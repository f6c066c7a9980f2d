//! loom type checker: Hindley-Milner inference over the loom syntax tree.
//!
//! - [`ty`]: types, schemes and the type interner
//! - [`unify`]: unification with occurs check, levels and the work budget
//! - [`env`]: lexical scopes for local bindings
//! - [`graph`]: dependency order of top-level definitions
//! - [`builtins`]: built-in function signatures
//! - [`error`]: type errors with provenance
//! - [`infer`]: the inference walk
//! - [`diagnostics`]: ariadne rendering of parse and type errors
//!
//! Inference never fails: errors are collected and the offending
//! expressions get type `unknown`.

pub mod builtins;
pub mod diagnostics;
pub mod env;
pub mod error;
pub mod graph;
mod infer;
pub mod ty;
pub mod unify;

use std::fmt;
use std::sync::Arc;

use rowan::{TextRange, TextSize};

use crate::error::TypeError;
use crate::ty::{Ty, TypeId, TypeInterner};

/// Types assigned to one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeckResult {
    /// Typed ranges sorted by start then end. Ranges are unique.
    types: Vec<(TextRange, TypeId)>,
    interner: TypeInterner,
    pub errors: Vec<TypeError>,
    /// The type of the last top-level statement when it is an expression.
    pub result_type: Option<Ty>,
}

impl TypeckResult {
    pub fn types(&self) -> impl Iterator<Item = (TextRange, &Ty)> + '_ {
        self.types
            .iter()
            .map(|(range, id)| (*range, self.interner.get(*id)))
    }

    pub fn interner(&self) -> &TypeInterner {
        &self.interner
    }

    /// The type recorded for exactly `range`.
    pub fn type_of(&self, range: TextRange) -> Option<&Ty> {
        self.types
            .binary_search_by_key(&(range.start(), range.end()), |(r, _)| (r.start(), r.end()))
            .ok()
            .map(|idx| self.interner.get(self.types[idx].1))
    }

    /// The innermost typed range containing `offset`.
    ///
    /// When no range contains it, a range ending exactly at `offset` is
    /// used, so a cursor just past an identifier still finds it.
    pub fn type_at(&self, offset: TextSize) -> Option<(TextRange, &Ty)> {
        let smallest = |pred: &dyn Fn(TextRange) -> bool| {
            self.types
                .iter()
                .filter(|(range, _)| pred(*range))
                .min_by_key(|(range, _)| range.len())
                .map(|(range, id)| (*range, self.interner.get(*id)))
        };
        smallest(&|range| range.start() <= offset && offset < range.end())
            .or_else(|| smallest(&|range| range.end() == offset && !range.is_empty()))
    }
}

/// Limits on the work one inference run may do.
#[derive(Clone, Default)]
pub struct Budget {
    /// Maximum number of inference steps; `None` is unlimited.
    pub max_steps: Option<u64>,
    cancel: Option<Arc<dyn Fn() -> bool + Send + Sync>>,
}

impl Budget {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn steps(max_steps: u64) -> Self {
        Budget {
            max_steps: Some(max_steps),
            cancel: None,
        }
    }

    /// Poll `probe` periodically and stop once it returns `true`.
    pub fn with_cancel(mut self, probe: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.cancel = Some(Arc::new(probe));
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|probe| probe())
    }
}

impl fmt::Debug for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Budget")
            .field("max_steps", &self.max_steps)
            .field("cancellable", &self.cancel.is_some())
            .finish()
    }
}

/// Why an inference run stopped before finishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupted {
    BudgetExhausted,
    Cancelled,
}

impl fmt::Display for Interrupted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interrupted::BudgetExhausted => write!(f, "inference budget exhausted"),
            Interrupted::Cancelled => write!(f, "inference cancelled"),
        }
    }
}

impl std::error::Error for Interrupted {}

/// Type-check a parsed document without limits.
pub fn check(parse: &loom_parser::Parse) -> TypeckResult {
    infer::infer(parse, Budget::unlimited()).0
}

/// Type-check within `budget`. A run that is cut short returns why instead
/// of a partial result.
pub fn check_with_budget(
    parse: &loom_parser::Parse,
    budget: Budget,
) -> Result<TypeckResult, Interrupted> {
    match infer::infer(parse, budget) {
        (result, None) => Ok(result),
        (_, Some(reason)) => Err(reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_source(source: &str) -> TypeckResult {
        check(&loom_parser::parse(source))
    }

    #[test]
    fn type_at_prefers_the_innermost_range() {
        let result = check_source("let x = (1 + 2)");
        let (range, ty) = result.type_at(9.into()).unwrap();
        assert_eq!(range, TextRange::new(9.into(), 10.into()));
        assert_eq!(ty.to_string(), "int");
    }

    #[test]
    fn type_at_falls_back_to_a_range_ending_at_the_cursor() {
        let result = check_source("let name = \"a\"");
        let (range, ty) = result.type_at(8.into()).unwrap();
        assert_eq!(range, TextRange::new(4.into(), 8.into()));
        assert_eq!(ty.to_string(), "string");
    }

    #[test]
    fn type_of_finds_exact_ranges() {
        let result = check_source("let x = 1");
        let ty = result.type_of(TextRange::new(4.into(), 5.into()));
        assert_eq!(ty.map(ToString::to_string).as_deref(), Some("int"));
        assert!(result.type_of(TextRange::new(0.into(), 9.into())).is_none());
    }

    #[test]
    fn tiny_budget_is_exhausted() {
        let parse = loom_parser::parse("let a = [1, 2, 3]\nlet b = a[0] + 1");
        assert_eq!(
            check_with_budget(&parse, Budget::steps(2)),
            Err(Interrupted::BudgetExhausted)
        );
        assert!(check_with_budget(&parse, Budget::steps(10_000)).is_ok());
    }

    #[test]
    fn cancelled_run_reports_it() {
        let source = "let a = 1\n".repeat(300);
        let parse = loom_parser::parse(&source);
        let budget = Budget::unlimited().with_cancel(|| true);
        assert_eq!(check_with_budget(&parse, budget), Err(Interrupted::Cancelled));
    }
}
