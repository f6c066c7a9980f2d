//! Built-in functions available in every document.

use rustc_hash::FxHashMap;

use crate::ty::{Scheme, Ty};
use crate::unify::InferCtx;

/// The built-in function table.
///
/// Polymorphic entries quantify over variables created one level deeper than
/// the caller's current level, so instantiation gives each use fresh
/// variables.
pub fn builtin_schemes(ctx: &mut InferCtx) -> FxHashMap<String, Scheme> {
    let mut table = FxHashMap::default();

    let mut poly = |ctx: &mut InferCtx, name: &str, build: fn(Ty) -> Ty| {
        ctx.enter_level();
        let a = ctx.fresh_var();
        ctx.leave_level();
        let scheme = ctx.generalize(build(a));
        table.insert(name.to_string(), scheme);
    };

    // print('a) -> unit
    poly(ctx, "print", |a| Ty::fun(vec![a], Ty::unit()));
    // to_string('a) -> string
    poly(ctx, "to_string", |a| Ty::fun(vec![a], Ty::string()));
    // length(list<'a>) -> int
    poly(ctx, "length", |a| Ty::fun(vec![Ty::list(a)], Ty::int()));
    // head(list<'a>) -> 'a
    poly(ctx, "head", |a| Ty::fun(vec![Ty::list(a.clone())], a));
    // push(list<'a>, 'a) -> list<'a>
    poly(ctx, "push", |a| {
        Ty::fun(vec![Ty::list(a.clone()), a.clone()], Ty::list(a))
    });

    table.insert(
        "str_length".to_string(),
        Scheme::mono(Ty::fun(vec![Ty::string()], Ty::int())),
    );

    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_is_registered() {
        let mut ctx = InferCtx::new();
        let table = builtin_schemes(&mut ctx);
        let mut names: Vec<_> = table.keys().map(String::as_str).collect();
        names.sort_unstable();
        assert_eq!(
            names,
            ["head", "length", "print", "push", "str_length", "to_string"]
        );
    }

    #[test]
    fn polymorphic_builtins_instantiate_fresh() {
        let mut ctx = InferCtx::new();
        let table = builtin_schemes(&mut ctx);
        let head = &table["head"];
        assert_eq!(head.vars.len(), 1);
        let first = ctx.instantiate(head);
        let second = ctx.instantiate(head);
        assert_ne!(first, second);
        assert_eq!(first.to_string(), "(list<'a>) -> 'a");
    }
}
