//! Type representation.
//!
//! `Ty` is the working representation used during inference: it may contain
//! unification variables that only make sense against an `InferCtx`. Once
//! inference is finished every recorded type is resolved, normalized and
//! interned into a [`TypeInterner`], so equal types share one [`TypeId`].

use std::fmt;

use rustc_hash::FxHashMap;

/// A type variable, identified by a `u32` index into the unification table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TyVar(pub u32);

/// A named type constructor: `int`, `string`, `list`, ...
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TyCon {
    pub name: String,
}

impl TyCon {
    pub fn new(name: impl Into<String>) -> Self {
        TyCon { name: name.into() }
    }
}

impl fmt::Display for TyCon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Ty {
    /// An inference variable.
    Var(TyVar),
    /// A primitive: `int`, `float`, `string`, `bool`, `unit`.
    Con(TyCon),
    /// `(params) -> ret`
    Fun(Vec<Ty>, Box<Ty>),
    /// A constructor applied to arguments: `list<int>`.
    App(Box<Ty>, Vec<Ty>),
    /// A closed record. Fields are kept sorted by name.
    Record(Vec<(String, Ty)>),
    /// The type of expressions that never produce a value (`return`).
    Never,
    /// Error recovery: the type could not be determined.
    Unknown,
}

impl Ty {
    pub fn int() -> Ty {
        Ty::Con(TyCon::new("int"))
    }

    pub fn float() -> Ty {
        Ty::Con(TyCon::new("float"))
    }

    pub fn string() -> Ty {
        Ty::Con(TyCon::new("string"))
    }

    pub fn bool() -> Ty {
        Ty::Con(TyCon::new("bool"))
    }

    pub fn unit() -> Ty {
        Ty::Con(TyCon::new("unit"))
    }

    pub fn list(elem: Ty) -> Ty {
        Ty::App(Box::new(Ty::Con(TyCon::new("list"))), vec![elem])
    }

    pub fn fun(params: Vec<Ty>, ret: Ty) -> Ty {
        Ty::Fun(params, Box::new(ret))
    }

    /// Build a record type; fields are sorted and later duplicates win.
    pub fn record(fields: impl IntoIterator<Item = (String, Ty)>) -> Ty {
        let mut sorted: Vec<(String, Ty)> = Vec::new();
        for (name, ty) in fields {
            match sorted.iter_mut().find(|(n, _)| *n == name) {
                Some(slot) => slot.1 = ty,
                None => sorted.push((name, ty)),
            }
        }
        sorted.sort_by(|a, b| a.0.cmp(&b.0));
        Ty::Record(sorted)
    }

    pub fn is_con(&self, name: &str) -> bool {
        matches!(self, Ty::Con(c) if c.name == name)
    }

    /// The element type of `list<T>`.
    pub fn list_elem(&self) -> Option<&Ty> {
        match self {
            Ty::App(con, args) if con.is_con("list") && args.len() == 1 => args.first(),
            _ => None,
        }
    }

    /// Renumber variables from zero in order of first appearance.
    ///
    /// Two types that differ only in variable names normalize to the same
    /// value, which is what makes interning collapse them.
    pub fn normalized(&self) -> Ty {
        let mut map = FxHashMap::default();
        self.renumber(&mut map)
    }

    fn renumber(&self, map: &mut FxHashMap<TyVar, TyVar>) -> Ty {
        match self {
            Ty::Var(v) => {
                let next = TyVar(map.len() as u32);
                Ty::Var(*map.entry(*v).or_insert(next))
            }
            Ty::Con(_) | Ty::Never | Ty::Unknown => self.clone(),
            Ty::Fun(params, ret) => {
                let params = params.iter().map(|p| p.renumber(map)).collect();
                Ty::Fun(params, Box::new(ret.renumber(map)))
            }
            Ty::App(con, args) => {
                let con = Box::new(con.renumber(map));
                Ty::App(con, args.iter().map(|a| a.renumber(map)).collect())
            }
            Ty::Record(fields) => Ty::Record(
                fields
                    .iter()
                    .map(|(name, ty)| (name.clone(), ty.renumber(map)))
                    .collect(),
            ),
        }
    }
}

/// Prints variables as `'a`, `'b`, ... in order of first appearance.
#[derive(Default)]
struct TyPrinter {
    names: FxHashMap<TyVar, String>,
}

impl TyPrinter {
    fn var_name(&mut self, var: TyVar) -> &str {
        let next = self.names.len();
        self.names.entry(var).or_insert_with(|| {
            let letter = (b'a' + (next % 26) as u8) as char;
            match next / 26 {
                0 => format!("'{letter}"),
                n => format!("'{letter}{n}"),
            }
        })
    }

    fn write(&mut self, f: &mut fmt::Formatter<'_>, ty: &Ty) -> fmt::Result {
        match ty {
            Ty::Var(v) => {
                let name = self.var_name(*v).to_string();
                f.write_str(&name)
            }
            Ty::Con(c) => write!(f, "{c}"),
            Ty::Fun(params, ret) => {
                f.write_str("(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    self.write(f, p)?;
                }
                f.write_str(") -> ")?;
                self.write(f, ret)
            }
            Ty::App(con, args) => {
                self.write(f, con)?;
                f.write_str("<")?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    self.write(f, a)?;
                }
                f.write_str(">")
            }
            Ty::Record(fields) => {
                if fields.is_empty() {
                    return f.write_str("{}");
                }
                f.write_str("{ ")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: ")?;
                    self.write(f, ty)?;
                }
                f.write_str(" }")
            }
            Ty::Never => f.write_str("never"),
            Ty::Unknown => f.write_str("unknown"),
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        TyPrinter::default().write(f, self)
    }
}

/// A polymorphic type scheme: `forall vars. ty`.
#[derive(Clone, Debug)]
pub struct Scheme {
    pub vars: Vec<TyVar>,
    pub ty: Ty,
}

impl Scheme {
    /// A scheme with no quantified variables.
    pub fn mono(ty: Ty) -> Self {
        Scheme {
            vars: Vec::new(),
            ty,
        }
    }
}

// ── ena trait implementations ──────────────────────────────────────────

impl ena::unify::UnifyKey for TyVar {
    type Value = Option<Ty>;

    fn index(&self) -> u32 {
        self.0
    }

    fn from_index(u: u32) -> Self {
        TyVar(u)
    }

    fn tag() -> &'static str {
        "TyVar"
    }
}

impl ena::unify::EqUnifyValue for Ty {}

// ── Interning ──────────────────────────────────────────────────────────

/// Handle to an interned type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

/// Owns every distinct type of one inference result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeInterner {
    types: Vec<Ty>,
    ids: FxHashMap<Ty, TypeId>,
}

impl TypeInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a fully resolved type.
    pub fn intern(&mut self, ty: Ty) -> TypeId {
        if let Some(id) = self.ids.get(&ty) {
            return *id;
        }
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty.clone());
        self.ids.insert(ty, id);
        id
    }

    pub fn get(&self, id: TypeId) -> &Ty {
        &self.types[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_lowercase_names() {
        assert_eq!(Ty::int().to_string(), "int");
        assert_eq!(Ty::list(Ty::string()).to_string(), "list<string>");
        assert_eq!(
            Ty::fun(vec![Ty::int(), Ty::float()], Ty::bool()).to_string(),
            "(int, float) -> bool"
        );
        assert_eq!(Ty::Unknown.to_string(), "unknown");
        assert_eq!(Ty::Never.to_string(), "never");
    }

    #[test]
    fn variables_are_named_by_first_appearance() {
        let ty = Ty::fun(vec![Ty::Var(TyVar(7)), Ty::Var(TyVar(3))], Ty::Var(TyVar(7)));
        assert_eq!(ty.to_string(), "('a, 'b) -> 'a");
    }

    #[test]
    fn records_sort_fields() {
        let ty = Ty::record([("name".to_string(), Ty::string()), ("age".to_string(), Ty::int())]);
        assert_eq!(ty.to_string(), "{ age: int, name: string }");
        assert_eq!(Ty::record([]).to_string(), "{}");
    }

    #[test]
    fn normalized_types_intern_to_one_id() {
        let a = Ty::fun(vec![Ty::Var(TyVar(4))], Ty::Var(TyVar(4))).normalized();
        let b = Ty::fun(vec![Ty::Var(TyVar(9))], Ty::Var(TyVar(9))).normalized();
        let mut interner = TypeInterner::new();
        let ia = interner.intern(a);
        let ib = interner.intern(b);
        assert_eq!(ia, ib);
        assert_eq!(interner.len(), 1);
        assert_ne!(interner.intern(Ty::int()), ia);
    }
}
