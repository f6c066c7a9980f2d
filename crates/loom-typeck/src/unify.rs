//! Unification engine.
//!
//! Wraps `ena`'s union-find table with an occurs check, level-based
//! generalization and scheme instantiation. The context also meters work:
//! every unification and every visited expression costs one step against the
//! caller's [`Budget`].

use ena::unify::InPlaceUnificationTable;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{ConstraintOrigin, TypeError};
use crate::ty::{Scheme, Ty, TyVar};
use crate::{Budget, Interrupted};

/// How many steps pass between two polls of the cancel probe.
const CANCEL_POLL_INTERVAL: u64 = 256;

/// The inference context: unification table, level state, errors and the
/// work budget.
pub struct InferCtx {
    table: InPlaceUnificationTable<TyVar>,
    current_level: u32,
    /// Level at which each variable was created, indexed by `TyVar.0`.
    var_levels: Vec<u32>,
    pub errors: Vec<TypeError>,
    budget: Budget,
    steps: u64,
    interrupted: Option<Interrupted>,
}

impl InferCtx {
    pub fn new() -> Self {
        Self::with_budget(Budget::unlimited())
    }

    pub fn with_budget(budget: Budget) -> Self {
        InferCtx {
            table: InPlaceUnificationTable::new(),
            current_level: 0,
            var_levels: Vec::new(),
            errors: Vec::new(),
            budget,
            steps: 0,
            interrupted: None,
        }
    }

    // ── Budget ──────────────────────────────────────────────────────────

    /// Spend one step. Returns `false` once the budget is gone or the
    /// computation was cancelled; callers then stop descending.
    pub fn tick(&mut self) -> bool {
        if self.interrupted.is_some() {
            return false;
        }
        self.steps += 1;
        if let Some(max) = self.budget.max_steps {
            if self.steps > max {
                self.interrupted = Some(Interrupted::BudgetExhausted);
                return false;
            }
        }
        if self.steps % CANCEL_POLL_INTERVAL == 0 && self.budget.is_cancelled() {
            self.interrupted = Some(Interrupted::Cancelled);
            return false;
        }
        true
    }

    pub fn interrupted(&self) -> Option<Interrupted> {
        self.interrupted
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    // ── Type Variable Creation ──────────────────────────────────────────

    /// Create a fresh type variable at the current level.
    pub fn fresh_var(&mut self) -> Ty {
        let var = self.table.new_key(None);
        let idx = var.0 as usize;
        if self.var_levels.len() <= idx {
            self.var_levels.resize(idx + 1, 0);
        }
        self.var_levels[idx] = self.current_level;
        Ty::Var(var)
    }

    // ── Resolution ──────────────────────────────────────────────────────

    /// Substitute every bound variable in `ty`. Unbound variables come back
    /// as the root of their equivalence class.
    pub fn resolve(&mut self, ty: Ty) -> Ty {
        match ty {
            Ty::Var(v) => match self.table.probe_value(v) {
                Some(inner) => self.resolve(inner),
                None => Ty::Var(self.table.find(v)),
            },
            Ty::Fun(params, ret) => {
                let params = params.into_iter().map(|p| self.resolve(p)).collect();
                let ret = Box::new(self.resolve(*ret));
                Ty::Fun(params, ret)
            }
            Ty::App(con, args) => {
                let con = Box::new(self.resolve(*con));
                let args = args.into_iter().map(|a| self.resolve(a)).collect();
                Ty::App(con, args)
            }
            Ty::Record(fields) => Ty::Record(
                fields
                    .into_iter()
                    .map(|(name, ty)| (name, self.resolve(ty)))
                    .collect(),
            ),
            other => other,
        }
    }

    /// Follow bindings at the head of `ty` only.
    pub fn shallow_resolve(&mut self, ty: &Ty) -> Ty {
        match ty {
            Ty::Var(v) => match self.table.probe_value(*v) {
                Some(inner) => self.shallow_resolve(&inner),
                None => Ty::Var(self.table.find(*v)),
            },
            other => other.clone(),
        }
    }

    // ── Occurs Check ────────────────────────────────────────────────────

    pub fn occurs_in(&mut self, var: TyVar, ty: &Ty) -> bool {
        match ty {
            Ty::Var(v) => {
                if self.table.find(*v) == self.table.find(var) {
                    return true;
                }
                match self.table.probe_value(*v) {
                    Some(inner) => self.occurs_in(var, &inner),
                    None => false,
                }
            }
            Ty::Con(_) | Ty::Never | Ty::Unknown => false,
            Ty::Fun(params, ret) => {
                params.iter().any(|p| self.occurs_in(var, p)) || self.occurs_in(var, ret)
            }
            Ty::App(con, args) => {
                self.occurs_in(var, con) || args.iter().any(|a| self.occurs_in(var, a))
            }
            Ty::Record(fields) => fields.iter().any(|(_, t)| self.occurs_in(var, t)),
        }
    }

    // ── Unification ─────────────────────────────────────────────────────

    /// Unify two types. A failure is recorded in `errors` and also returned
    /// so callers can skip follow-up constraints.
    pub fn unify(&mut self, a: Ty, b: Ty, origin: ConstraintOrigin) -> Result<(), TypeError> {
        if !self.tick() {
            return Ok(());
        }
        let a = self.resolve(a);
        let b = self.resolve(b);

        match (a, b) {
            (Ty::Var(v1), Ty::Var(v2)) if v1 == v2 => Ok(()),

            // `never` fits anywhere and binds nothing.
            (Ty::Never, _) | (_, Ty::Never) => Ok(()),

            (Ty::Var(v1), Ty::Var(v2)) => {
                // Keep the shallower level so generalization stays sound.
                let level = self.level_of(v1).min(self.level_of(v2));
                if self.table.unify_var_var(v1, v2).is_ok() {
                    let root = self.table.find(v1);
                    self.var_levels[root.0 as usize] = level;
                }
                Ok(())
            }

            (Ty::Var(v), ty) | (ty, Ty::Var(v)) => {
                if self.occurs_in(v, &ty) {
                    let _ = self.table.unify_var_value(v, Some(Ty::Unknown));
                    let err = TypeError::InfiniteType { var: v, ty, origin };
                    self.errors.push(err.clone());
                    return Err(err);
                }
                self.adjust_levels(&ty, self.level_of(v));
                let _ = self.table.unify_var_value(v, Some(ty));
                Ok(())
            }

            // `unknown` absorbs anything without reporting again.
            (Ty::Unknown, _) | (_, Ty::Unknown) => Ok(()),

            (Ty::Con(c1), Ty::Con(c2)) => {
                if c1 == c2 {
                    Ok(())
                } else {
                    self.mismatch(Ty::Con(c1), Ty::Con(c2), origin)
                }
            }

            (Ty::Fun(p1, r1), Ty::Fun(p2, r2)) => {
                if p1.len() != p2.len() {
                    let err = TypeError::ArityMismatch {
                        expected: p1.len(),
                        found: p2.len(),
                        origin,
                    };
                    self.errors.push(err.clone());
                    return Err(err);
                }
                for (a, b) in p1.into_iter().zip(p2) {
                    self.unify(a, b, origin.clone())?;
                }
                self.unify(*r1, *r2, origin)
            }

            (Ty::App(c1, a1), Ty::App(c2, a2)) => {
                if c1 != c2 || a1.len() != a2.len() {
                    return self.mismatch(Ty::App(c1, a1), Ty::App(c2, a2), origin);
                }
                for (a, b) in a1.into_iter().zip(a2) {
                    self.unify(a, b, origin.clone())?;
                }
                Ok(())
            }

            (Ty::Record(f1), Ty::Record(f2)) => {
                let same_fields = f1.len() == f2.len()
                    && f1.iter().zip(&f2).all(|((n1, _), (n2, _))| n1 == n2);
                if !same_fields {
                    return self.mismatch(Ty::Record(f1), Ty::Record(f2), origin);
                }
                for ((_, a), (_, b)) in f1.into_iter().zip(f2) {
                    self.unify(a, b, origin.clone())?;
                }
                Ok(())
            }

            (a, b) => self.mismatch(a, b, origin),
        }
    }

    fn mismatch(
        &mut self,
        expected: Ty,
        found: Ty,
        origin: ConstraintOrigin,
    ) -> Result<(), TypeError> {
        let err = TypeError::Mismatch {
            expected,
            found,
            origin,
        };
        self.errors.push(err.clone());
        Err(err)
    }

    fn level_of(&self, var: TyVar) -> u32 {
        self.var_levels.get(var.0 as usize).copied().unwrap_or(0)
    }

    /// Lower the level of every unbound variable in `ty` to at most `level`.
    fn adjust_levels(&mut self, ty: &Ty, level: u32) {
        match ty {
            Ty::Var(v) => match self.table.probe_value(*v) {
                Some(inner) => self.adjust_levels(&inner, level),
                None => {
                    let root = self.table.find(*v);
                    let slot = &mut self.var_levels[root.0 as usize];
                    *slot = (*slot).min(level);
                }
            },
            Ty::Con(_) | Ty::Never | Ty::Unknown => {}
            Ty::Fun(params, ret) => {
                for p in params {
                    self.adjust_levels(p, level);
                }
                self.adjust_levels(ret, level);
            }
            Ty::App(con, args) => {
                self.adjust_levels(con, level);
                for a in args {
                    self.adjust_levels(a, level);
                }
            }
            Ty::Record(fields) => {
                for (_, t) in fields {
                    self.adjust_levels(t, level);
                }
            }
        }
    }

    // ── Level Management ────────────────────────────────────────────────

    pub fn enter_level(&mut self) {
        self.current_level += 1;
    }

    pub fn leave_level(&mut self) {
        debug_assert!(self.current_level > 0, "cannot leave level 0");
        self.current_level = self.current_level.saturating_sub(1);
    }

    pub fn current_level(&self) -> u32 {
        self.current_level
    }

    /// Whether `ty` is an unbound variable created deeper than the current
    /// level, i.e. one that `generalize` would quantify.
    pub fn is_generalizable_var(&mut self, ty: &Ty) -> bool {
        match self.shallow_resolve(ty) {
            Ty::Var(v) => self.level_of(v) > self.current_level,
            _ => false,
        }
    }

    // ── Generalization ──────────────────────────────────────────────────

    /// Quantify every unbound variable in `ty` whose level is deeper than the
    /// current one.
    pub fn generalize(&mut self, ty: Ty) -> Scheme {
        let resolved = self.resolve(ty);
        let mut vars = Vec::new();
        self.collect_generalizable_vars(&resolved, &mut vars);
        let mut seen = FxHashSet::default();
        vars.retain(|v| seen.insert(*v));
        Scheme { vars, ty: resolved }
    }

    fn collect_generalizable_vars(&mut self, ty: &Ty, out: &mut Vec<TyVar>) {
        match ty {
            Ty::Var(v) => match self.table.probe_value(*v) {
                Some(inner) => self.collect_generalizable_vars(&inner, out),
                None => {
                    if self.level_of(*v) > self.current_level {
                        out.push(*v);
                    }
                }
            },
            Ty::Con(_) | Ty::Never | Ty::Unknown => {}
            Ty::Fun(params, ret) => {
                for p in params {
                    self.collect_generalizable_vars(p, out);
                }
                self.collect_generalizable_vars(ret, out);
            }
            Ty::App(con, args) => {
                self.collect_generalizable_vars(con, out);
                for a in args {
                    self.collect_generalizable_vars(a, out);
                }
            }
            Ty::Record(fields) => {
                for (_, t) in fields {
                    self.collect_generalizable_vars(t, out);
                }
            }
        }
    }

    // ── Instantiation ───────────────────────────────────────────────────

    /// Replace the scheme's quantified variables with fresh ones.
    pub fn instantiate(&mut self, scheme: &Scheme) -> Ty {
        if scheme.vars.is_empty() {
            return scheme.ty.clone();
        }
        let substitution: FxHashMap<TyVar, Ty> = scheme
            .vars
            .iter()
            .map(|v| (*v, self.fresh_var()))
            .collect();
        self.apply_substitution(&scheme.ty, &substitution)
    }

    fn apply_substitution(&mut self, ty: &Ty, subst: &FxHashMap<TyVar, Ty>) -> Ty {
        match ty {
            Ty::Var(v) => {
                if let Some(replacement) = subst.get(v) {
                    return replacement.clone();
                }
                match self.table.probe_value(*v) {
                    Some(inner) => self.apply_substitution(&inner, subst),
                    None => ty.clone(),
                }
            }
            Ty::Con(_) | Ty::Never | Ty::Unknown => ty.clone(),
            Ty::Fun(params, ret) => {
                let params = params
                    .iter()
                    .map(|p| self.apply_substitution(p, subst))
                    .collect();
                let ret = Box::new(self.apply_substitution(ret, subst));
                Ty::Fun(params, ret)
            }
            Ty::App(con, args) => {
                let con = Box::new(self.apply_substitution(con, subst));
                let args = args
                    .iter()
                    .map(|a| self.apply_substitution(a, subst))
                    .collect();
                Ty::App(con, args)
            }
            Ty::Record(fields) => Ty::Record(
                fields
                    .iter()
                    .map(|(name, t)| (name.clone(), self.apply_substitution(t, subst)))
                    .collect(),
            ),
        }
    }
}

impl Default for InferCtx {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> ConstraintOrigin {
        ConstraintOrigin::Builtin
    }

    #[test]
    fn unify_two_fresh_vars() {
        let mut ctx = InferCtx::new();
        let a = ctx.fresh_var();
        let b = ctx.fresh_var();
        assert!(ctx.unify(a.clone(), b.clone(), origin()).is_ok());
        assert!(ctx.unify(a.clone(), Ty::int(), origin()).is_ok());
        assert_eq!(ctx.resolve(a), Ty::int());
        assert_eq!(ctx.resolve(b), Ty::int());
    }

    #[test]
    fn unify_mismatch_is_recorded() {
        let mut ctx = InferCtx::new();
        let result = ctx.unify(Ty::int(), Ty::string(), origin());
        match result {
            Err(TypeError::Mismatch { expected, found, .. }) => {
                assert_eq!(expected, Ty::int());
                assert_eq!(found, Ty::string());
            }
            other => panic!("expected Mismatch, got {:?}", other),
        }
        assert_eq!(ctx.errors.len(), 1);
    }

    #[test]
    fn occurs_check_falls_back_to_unknown() {
        let mut ctx = InferCtx::new();
        let a = ctx.fresh_var();
        let fun = Ty::fun(vec![a.clone()], Ty::int());
        assert!(matches!(
            ctx.unify(a.clone(), fun, origin()),
            Err(TypeError::InfiniteType { .. })
        ));
        assert_eq!(ctx.resolve(a), Ty::Unknown);
    }

    #[test]
    fn unknown_and_never_unify_with_anything() {
        let mut ctx = InferCtx::new();
        assert!(ctx.unify(Ty::Unknown, Ty::int(), origin()).is_ok());
        assert!(ctx.unify(Ty::string(), Ty::Never, origin()).is_ok());
        assert!(ctx.errors.is_empty());
    }

    #[test]
    fn records_need_the_same_fields() {
        let mut ctx = InferCtx::new();
        let a = Ty::record([("x".to_string(), Ty::int())]);
        let b = Ty::record([("x".to_string(), Ty::int()), ("y".to_string(), Ty::int())]);
        assert!(ctx.unify(a.clone(), a.clone(), origin()).is_ok());
        assert!(ctx.unify(a, b, origin()).is_err());
    }

    #[test]
    fn generalize_and_instantiate() {
        let mut ctx = InferCtx::new();
        ctx.enter_level();
        let a = ctx.fresh_var();
        let identity = Ty::fun(vec![a.clone()], a);
        ctx.leave_level();

        let scheme = ctx.generalize(identity);
        assert_eq!(scheme.vars.len(), 1);

        let first = ctx.instantiate(&scheme);
        let second = ctx.instantiate(&scheme);
        match (&first, &second) {
            (Ty::Fun(p1, _), Ty::Fun(p2, _)) => assert_ne!(p1[0], p2[0]),
            _ => panic!("expected function types"),
        }
    }

    #[test]
    fn binding_to_an_outer_var_blocks_generalization() {
        let mut ctx = InferCtx::new();
        let outer = ctx.fresh_var();
        ctx.enter_level();
        let inner = ctx.fresh_var();
        ctx.unify(inner.clone(), Ty::list(outer), origin()).unwrap();
        ctx.leave_level();
        assert!(ctx.generalize(inner).vars.is_empty());
    }

    #[test]
    fn step_budget_interrupts() {
        let mut ctx = InferCtx::with_budget(Budget::steps(3));
        assert!(ctx.tick());
        assert!(ctx.tick());
        assert!(ctx.tick());
        assert!(!ctx.tick());
        assert_eq!(ctx.interrupted(), Some(Interrupted::BudgetExhausted));
    }

    #[test]
    fn cancel_probe_interrupts() {
        let mut ctx = InferCtx::with_budget(Budget::unlimited().with_cancel(|| true));
        while ctx.tick() {}
        assert_eq!(ctx.interrupted(), Some(Interrupted::Cancelled));
        assert_eq!(ctx.steps(), CANCEL_POLL_INTERVAL);
    }
}
