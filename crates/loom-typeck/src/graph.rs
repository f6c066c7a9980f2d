//! Dependency graph of top-level definitions.
//!
//! A name used at the top level resolves to the nearest preceding definition
//! with that name, or else to the first later `fn` (functions are hoisted).
//! Definitions are then grouped into strongly connected components so that
//! inference can visit every binding before its uses and treat mutually
//! recursive functions as one group.

use loom_parser::ast::expr::Expr;
use loom_parser::ast::item::{Block, ParamList, Stmt};
use loom_parser::ast::AstNode;
use loom_parser::{SyntaxKind, SyntaxNode};
use rowan::TextRange;
use rustc_hash::FxHashMap;

/// Deepest expression or block nesting the walkers in this crate descend
/// into. Anything below is skipped.
pub(crate) const MAX_WALK_DEPTH: u32 = 1024;

/// Index of a top-level statement.
pub type StmtIdx = usize;

pub struct BindingGraph {
    /// Statements each statement depends on, sorted and deduplicated.
    pub deps: Vec<Vec<StmtIdx>>,
    /// Which top-level statement each free `NAME_REF` refers to.
    pub resolution: FxHashMap<TextRange, StmtIdx>,
}

/// One strongly connected component, members in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub members: Vec<StmtIdx>,
    /// More than one member, or a member that refers to itself.
    pub recursive: bool,
}

impl BindingGraph {
    /// Build the graph, calling `tick` once per statement and once per free
    /// name. When `tick` returns `false` the remaining statements get no
    /// edges; the caller is expected to abandon the result.
    pub fn build(stmts: &[Stmt], mut tick: impl FnMut() -> bool) -> Self {
        let names: Vec<Option<String>> = stmts
            .iter()
            .map(|s| s.bound_name().and_then(|n| n.text()))
            .collect();
        let is_fn: Vec<bool> = stmts.iter().map(|s| matches!(s, Stmt::FnDef(_))).collect();

        // Definition sites per name, ascending.
        let mut sites: FxHashMap<&str, Vec<StmtIdx>> = FxHashMap::default();
        let mut fn_sites: FxHashMap<&str, Vec<StmtIdx>> = FxHashMap::default();
        for (idx, name) in names.iter().enumerate() {
            if let Some(name) = name.as_deref() {
                sites.entry(name).or_default().push(idx);
                if is_fn[idx] {
                    fn_sites.entry(name).or_default().push(idx);
                }
            }
        }

        let resolve = |name: &str, from: StmtIdx| -> Option<StmtIdx> {
            if is_fn[from] && names[from].as_deref() == Some(name) {
                return Some(from);
            }
            let earlier = sites.get(name).and_then(|defs| {
                let before = defs.partition_point(|&j| j < from);
                before.checked_sub(1).map(|i| defs[i])
            });
            earlier.or_else(|| {
                let defs = fn_sites.get(name)?;
                defs.get(defs.partition_point(|&j| j <= from)).copied()
            })
        };

        let mut deps = vec![Vec::new(); stmts.len()];
        let mut resolution = FxHashMap::default();
        'stmts: for (idx, stmt) in stmts.iter().enumerate() {
            if !tick() {
                break;
            }
            let mut own = Vec::new();
            for (name, range) in free_names(stmt) {
                if !tick() {
                    break 'stmts;
                }
                if let Some(target) = resolve(&name, idx) {
                    resolution.insert(range, target);
                    own.push(target);
                }
            }
            own.sort_unstable();
            own.dedup();
            deps[idx] = own;
        }

        BindingGraph { deps, resolution }
    }

    /// Components in dependency order: every component comes after the
    /// components it uses. Unrelated components keep source order.
    pub fn components(&self) -> Vec<Component> {
        let mut tarjan = Tarjan {
            deps: &self.deps,
            index: vec![None; self.deps.len()],
            lowlink: vec![0; self.deps.len()],
            on_stack: vec![false; self.deps.len()],
            stack: Vec::new(),
            next_index: 0,
            out: Vec::new(),
        };
        for node in 0..self.deps.len() {
            if tarjan.index[node].is_none() {
                tarjan.visit(node);
            }
        }
        tarjan
            .out
            .into_iter()
            .map(|mut members| {
                members.sort_unstable();
                let recursive = members.len() > 1 || self.deps[members[0]].contains(&members[0]);
                Component { members, recursive }
            })
            .collect()
    }
}

struct Tarjan<'a> {
    deps: &'a [Vec<StmtIdx>],
    index: Vec<Option<usize>>,
    lowlink: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<StmtIdx>,
    next_index: usize,
    out: Vec<Vec<StmtIdx>>,
}

impl Tarjan<'_> {
    fn discover(&mut self, node: StmtIdx) {
        self.index[node] = Some(self.next_index);
        self.lowlink[node] = self.next_index;
        self.next_index += 1;
        self.stack.push(node);
        self.on_stack[node] = true;
    }

    /// Depth-first search from `root` with an explicit work stack of
    /// (node, next edge to follow).
    fn visit(&mut self, root: StmtIdx) {
        let deps = self.deps;
        self.discover(root);
        let mut work: Vec<(StmtIdx, usize)> = vec![(root, 0)];

        while let Some(&(node, edge)) = work.last() {
            if let Some(&dep) = deps[node].get(edge) {
                if let Some(top) = work.last_mut() {
                    top.1 += 1;
                }
                match self.index[dep] {
                    None => {
                        self.discover(dep);
                        work.push((dep, 0));
                    }
                    Some(dep_index) if self.on_stack[dep] => {
                        self.lowlink[node] = self.lowlink[node].min(dep_index);
                    }
                    Some(_) => {}
                }
                continue;
            }

            work.pop();
            if let Some(&(parent, _)) = work.last() {
                self.lowlink[parent] = self.lowlink[parent].min(self.lowlink[node]);
            }
            if Some(self.lowlink[node]) == self.index[node] {
                let mut component = Vec::new();
                while let Some(member) = self.stack.pop() {
                    self.on_stack[member] = false;
                    component.push(member);
                    if member == node {
                        break;
                    }
                }
                self.out.push(component);
            }
        }
    }
}

// ── Free names ─────────────────────────────────────────────────────────

/// Names a top-level statement uses without binding them itself, with the
/// range of each `NAME_REF`.
///
/// A top-level function's own name is left free so that recursion shows up
/// as a self edge.
fn free_names(stmt: &Stmt) -> Vec<(String, TextRange)> {
    let mut walker = FreeNames::default();
    match stmt {
        Stmt::FnDef(f) => {
            walker.scopes.push(Vec::new());
            walker.params(f.param_list());
            if let Some(body) = f.body() {
                walker.block(&body);
            }
        }
        Stmt::LetBinding(l) => {
            if let Some(init) = l.initializer() {
                walker.expr(&init);
            }
        }
        Stmt::Expr(e) => walker.expr(e),
    }
    walker.out
}

#[derive(Default)]
struct FreeNames {
    scopes: Vec<Vec<String>>,
    out: Vec<(String, TextRange)>,
    depth: u32,
}

impl FreeNames {
    fn is_bound(&self, name: &str) -> bool {
        self.scopes.iter().any(|scope| scope.iter().any(|n| n == name))
    }

    fn bind(&mut self, name: Option<String>) {
        if let (Some(name), Some(scope)) = (name, self.scopes.last_mut()) {
            scope.push(name);
        }
    }

    fn params(&mut self, params: Option<ParamList>) {
        let Some(params) = params else { return };
        for param in params.params() {
            self.bind(param.name().and_then(|n| n.text()));
        }
    }

    fn block(&mut self, block: &Block) {
        if self.depth >= MAX_WALK_DEPTH {
            return;
        }
        self.depth += 1;
        self.scopes.push(Vec::new());
        for stmt in block.stmts() {
            match stmt {
                Stmt::LetBinding(l) => {
                    if let Some(init) = l.initializer() {
                        self.expr(&init);
                    }
                    self.bind(l.name().and_then(|n| n.text()));
                }
                Stmt::FnDef(f) => {
                    self.bind(f.name().and_then(|n| n.text()));
                    self.scopes.push(Vec::new());
                    self.params(f.param_list());
                    if let Some(body) = f.body() {
                        self.block(&body);
                    }
                    self.scopes.pop();
                }
                Stmt::Expr(e) => self.expr(&e),
            }
        }
        self.scopes.pop();
        self.depth -= 1;
    }

    fn expr(&mut self, expr: &Expr) {
        if self.depth >= MAX_WALK_DEPTH {
            return;
        }
        self.depth += 1;
        match expr {
            Expr::NameRef(name_ref) => {
                let name = name_ref.text();
                if !name.is_empty() && !self.is_bound(&name) {
                    self.out.push((name, name_ref.syntax().text_range()));
                }
            }
            Expr::ClosureExpr(closure) => {
                self.scopes.push(Vec::new());
                self.params(closure.param_list());
                if let Some(body) = closure.body() {
                    self.block(&body);
                }
                self.scopes.pop();
            }
            other => self.children(other.syntax()),
        }
        self.depth -= 1;
    }

    fn children(&mut self, node: &SyntaxNode) {
        for child in node.children() {
            if let Some(expr) = Expr::cast(child.clone()) {
                self.expr(&expr);
            } else if let Some(block) = Block::cast(child.clone()) {
                self.block(&block);
            } else if child.kind() != SyntaxKind::TYPE_ANNOTATION {
                self.children(&child);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(source: &str) -> (BindingGraph, Vec<Component>) {
        let parse = loom_parser::parse(source);
        let stmts: Vec<Stmt> = parse.tree().stmts().collect();
        let graph = BindingGraph::build(&stmts, || true);
        let components = graph.components();
        (graph, components)
    }

    fn members(components: &[Component]) -> Vec<Vec<StmtIdx>> {
        components.iter().map(|c| c.members.clone()).collect()
    }

    #[test]
    fn straight_line_code_keeps_source_order() {
        let (graph, components) = graph("let a = 1\nlet b = a\nb");
        assert_eq!(graph.deps, vec![vec![], vec![0], vec![1]]);
        assert_eq!(members(&components), vec![vec![0], vec![1], vec![2]]);
        assert!(components.iter().all(|c| !c.recursive));
    }

    #[test]
    fn functions_are_hoisted() {
        let (graph, components) = graph("let r = f(1)\nfn f(x) do x end");
        assert_eq!(graph.deps[0], vec![1]);
        assert_eq!(members(&components), vec![vec![1], vec![0]]);
    }

    #[test]
    fn let_refers_to_earlier_binding_not_itself() {
        let (graph, _) = graph("let x = 1\nlet x = x + 1");
        assert_eq!(graph.deps[1], vec![0]);
    }

    #[test]
    fn mutual_recursion_forms_one_component() {
        let source = "fn even(n) do odd(n) end\nfn odd(n) do even(n) end\neven(2)";
        let (_, components) = graph(source);
        assert_eq!(members(&components), vec![vec![0, 1], vec![2]]);
        assert!(components[0].recursive);
    }

    #[test]
    fn self_recursion_is_marked() {
        let (_, components) = graph("fn f(n) do f(n) end");
        assert!(components[0].recursive);
    }

    #[test]
    fn locals_and_params_shadow_top_level_names() {
        let source = "let x = 1\nfn f(x) do let y = x\ny end\nlet g = fn(y) -> y end";
        let (graph, _) = graph(source);
        assert!(graph.deps[1].is_empty());
        assert!(graph.deps[2].is_empty());
    }

    #[test]
    fn long_hoisted_chain_is_ordered_without_recursion() {
        let source: String = (0..20_000)
            .map(|i| format!("fn f{i}(x) do f{}(x) end\n", i + 1))
            .collect();
        let (graph, components) = graph(&source);
        assert_eq!(graph.deps[0], vec![1]);
        assert!(graph.deps[19_999].is_empty());
        assert_eq!(components.len(), 20_000);
        assert_eq!(components[0].members, vec![19_999]);
        assert_eq!(components[19_999].members, vec![0]);
    }

    #[test]
    fn build_stops_when_out_of_budget() {
        let parse = loom_parser::parse("let a = 1\nlet b = a\nlet c = b");
        let stmts: Vec<Stmt> = parse.tree().stmts().collect();
        let mut left = 2;
        let graph = BindingGraph::build(&stmts, || {
            if left == 0 {
                return false;
            }
            left -= 1;
            true
        });
        assert!(graph.deps.iter().all(Vec::is_empty));
        assert!(graph.resolution.is_empty());
    }

    #[test]
    fn shadowed_names_resolve_to_the_nearest_definition() {
        let source = "let x = 1\nlet x = 2\nlet y = x\n\
                      fn g(n) do n end\nlet z = g(1)\nfn g(n) do n end";
        let (graph, _) = graph(source);
        assert_eq!(graph.deps[2], vec![1]);
        assert_eq!(graph.deps[4], vec![3]);
    }
}

