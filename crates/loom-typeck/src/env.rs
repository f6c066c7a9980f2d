//! Lexical scopes for local bindings.
//!
//! Parameters and block-level `let`/`fn` bindings live here. Top-level
//! definitions are resolved separately through the binding graph because
//! they are inferred out of source order.

use rustc_hash::FxHashMap;

use crate::ty::Scheme;

/// A stack of scopes mapping names to type schemes. Lookups search from the
/// innermost scope outward.
pub struct TypeEnv {
    scopes: Vec<FxHashMap<String, Scheme>>,
}

impl TypeEnv {
    pub fn new() -> Self {
        TypeEnv {
            scopes: vec![FxHashMap::default()],
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    /// Pop the innermost scope. The outermost scope is never removed.
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn insert(&mut self, name: String, scheme: Scheme) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, scheme);
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Scheme> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}

impl Default for TypeEnv {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::Ty;

    #[test]
    fn shadowing_and_cleanup() {
        let mut env = TypeEnv::new();
        env.insert("x".into(), Scheme::mono(Ty::int()));

        env.push_scope();
        env.insert("x".into(), Scheme::mono(Ty::string()));
        env.insert("y".into(), Scheme::mono(Ty::bool()));
        assert_eq!(env.lookup("x").unwrap().ty, Ty::string());

        env.pop_scope();
        assert_eq!(env.lookup("x").unwrap().ty, Ty::int());
        assert!(env.lookup("y").is_none());
    }

    #[test]
    fn outermost_scope_survives_pop() {
        let mut env = TypeEnv::new();
        env.insert("x".into(), Scheme::mono(Ty::int()));
        env.pop_scope();
        assert_eq!(env.depth(), 1);
        assert!(env.lookup("x").is_some());
    }
}
