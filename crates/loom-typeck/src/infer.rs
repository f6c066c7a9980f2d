//! Inference engine.
//!
//! Walks the typed AST, generates constraints and solves them by
//! unification. Hindley-Milner with:
//! - let-polymorphism (generalize at `let` and `fn`, instantiate at uses)
//! - level-based generalization
//! - occurs check, falling back to `unknown`
//! - top-level definitions visited in dependency order (see [`crate::graph`])
//! - deferred constraints for operators and field access, solved by a
//!   fixed-point loop and defaulted when nothing else decides them

use loom_parser::ast::expr::{
    BinaryExpr, CallExpr, ClosureExpr, Expr, FieldAccess, IfExpr, IndexExpr, ListLiteral,
    Literal, NameRef, RecordLiteral, ReturnExpr, UnaryExpr,
};
use loom_parser::ast::item::{Block, FnDef, LetBinding, Name, ParamList, Stmt};
use loom_parser::ast::ty::TypeExpr;
use loom_parser::ast::AstNode;
use loom_parser::{Parse, SyntaxKind};
use rowan::TextRange;
use rustc_hash::FxHashMap;

use crate::builtins::builtin_schemes;
use crate::env::TypeEnv;
use crate::error::{ConstraintOrigin, TypeError};
use crate::graph::{BindingGraph, Component, MAX_WALK_DEPTH};
use crate::ty::{Scheme, Ty, TyCon, TypeInterner};
use crate::unify::InferCtx;
use crate::{Budget, Interrupted, TypeckResult};

/// Infer types for a whole document.
///
/// When the budget runs out the walk stops early; the partial result is
/// returned together with the reason.
pub(crate) fn infer(parse: &Parse, budget: Budget) -> (TypeckResult, Option<Interrupted>) {
    let stmts: Vec<Stmt> = parse.tree().stmts().collect();
    let mut ctx = InferCtx::with_budget(budget);
    let graph = BindingGraph::build(&stmts, || ctx.tick());
    let components = graph.components();

    let builtins = builtin_schemes(&mut ctx);
    let mut inferrer = Inferrer {
        ctx,
        env: TypeEnv::new(),
        builtins,
        top: vec![None; stmts.len()],
        resolution: graph.resolution,
        types: Vec::new(),
        deferred: Vec::new(),
        fn_returns: Vec::new(),
        depth: 0,
    };

    let mut stmt_types: Vec<Option<Ty>> = vec![None; stmts.len()];
    for component in &components {
        if inferrer.ctx.interrupted().is_some() {
            break;
        }
        inferrer.infer_component(&stmts, component, &mut stmt_types);
    }
    inferrer.solve_deferred(Defaulting::All);

    let result_type = match stmts.last() {
        Some(Stmt::Expr(_)) => stmt_types.last().cloned().flatten(),
        _ => None,
    };
    let interrupted = inferrer.ctx.interrupted();
    (inferrer.finish(result_type), interrupted)
}

/// A constraint that can only be checked once its subject is known.
enum Deferred {
    /// `receiver.field` where the receiver was still a variable.
    Field {
        receiver: Ty,
        field: String,
        result: Ty,
        span: TextRange,
    },
    /// An operator that only accepts certain operand types.
    Operator {
        requirement: Requirement,
        ty: Ty,
        op: String,
        span: TextRange,
    },
}

impl Deferred {
    fn subject(&self) -> &Ty {
        match self {
            Deferred::Field { receiver, .. } => receiver,
            Deferred::Operator { ty, .. } => ty,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Requirement {
    /// `+ - * / %` and unary `-`: `int` or `float`, defaulting to `int`.
    Numeric,
    /// `< > <= >=`: `int`, `float` or `string`, defaulting to `int`.
    Comparable,
    /// `++`: `string` or any `list`, defaulting to `string`.
    Concat,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Defaulting {
    /// Only constraints on variables about to be generalized.
    Generalizable,
    /// Everything still pending.
    All,
}

struct Inferrer {
    ctx: InferCtx,
    /// Parameters and block-local bindings.
    env: TypeEnv,
    builtins: FxHashMap<String, Scheme>,
    /// Scheme of each top-level statement once inferred.
    top: Vec<Option<Scheme>>,
    /// Free `NAME_REF` range -> top-level statement it names.
    resolution: FxHashMap<TextRange, usize>,
    /// Every typed range, in the order it was visited.
    types: Vec<(TextRange, Ty)>,
    deferred: Vec<Deferred>,
    /// Return type and range of each enclosing function, innermost last.
    fn_returns: Vec<(Ty, TextRange)>,
    /// Current expression and block nesting.
    depth: u32,
}

impl Inferrer {
    fn record(&mut self, range: TextRange, ty: Ty) {
        self.types.push((range, ty));
    }

    fn record_name(&mut self, name: Option<&Name>, ty: &Ty) {
        if let Some(name) = name {
            self.record(name.syntax().text_range(), ty.clone());
        }
    }

    // ── Top level ───────────────────────────────────────────────────────

    fn infer_component(
        &mut self,
        stmts: &[Stmt],
        component: &Component,
        stmt_types: &mut [Option<Ty>],
    ) {
        if component.recursive {
            for &idx in &component.members {
                if let Stmt::LetBinding(let_) = &stmts[idx] {
                    if let Some(name) = let_.name() {
                        self.ctx.errors.push(TypeError::CyclicDefinition {
                            name: name.text().unwrap_or_default(),
                            span: name.syntax().text_range(),
                        });
                    }
                    self.top[idx] = Some(Scheme::mono(Ty::Unknown));
                }
            }
        }

        self.ctx.enter_level();
        if component.recursive {
            for &idx in &component.members {
                if matches!(stmts[idx], Stmt::FnDef(_)) {
                    let var = self.ctx.fresh_var();
                    self.top[idx] = Some(Scheme::mono(var));
                }
            }
        }

        let mut inferred = Vec::with_capacity(component.members.len());
        for &idx in &component.members {
            let ty = match &stmts[idx] {
                Stmt::FnDef(fn_def) => {
                    let ty = self.infer_fn_def(fn_def);
                    if let Some(scheme) = self.top[idx].clone() {
                        let origin = ConstraintOrigin::LetBinding {
                            binding_span: fn_def.syntax().text_range(),
                        };
                        let _ = self.ctx.unify(scheme.ty, ty.clone(), origin);
                    }
                    ty
                }
                Stmt::LetBinding(let_) => {
                    let ty = self.infer_let_binding(let_);
                    let ty = if component.recursive { Ty::Unknown } else { ty };
                    self.record_name(let_.name().as_ref(), &ty);
                    ty
                }
                Stmt::Expr(expr) => self.infer_expr(expr),
            };
            inferred.push((idx, ty));
        }
        self.ctx.leave_level();

        self.solve_deferred(Defaulting::Generalizable);
        for (idx, ty) in inferred {
            if !matches!(stmts[idx], Stmt::Expr(_)) {
                self.top[idx] = Some(self.ctx.generalize(ty.clone()));
            }
            stmt_types[idx] = Some(ty);
        }
    }

    // ── Bindings ────────────────────────────────────────────────────────

    /// The type of a `let` initializer, checked against its annotation. The
    /// caller records and binds the name.
    fn infer_let_binding(&mut self, let_: &LetBinding) -> Ty {
        let init_ty = match let_.initializer() {
            Some(init) => self.infer_expr(&init),
            None => Ty::Unknown,
        };
        let Some(annotation) = let_.annotation() else {
            return init_ty;
        };
        let Some(type_expr) = annotation.type_expr() else {
            return init_ty;
        };
        let annotated = self.resolve_type_expr(&type_expr);
        let origin = ConstraintOrigin::Annotation {
            annotation_span: annotation.syntax().text_range(),
        };
        let _ = self.ctx.unify(annotated.clone(), init_ty, origin);
        annotated
    }

    fn infer_fn_def(&mut self, fn_def: &FnDef) -> Ty {
        let fn_span = fn_def.syntax().text_range();
        self.env.push_scope();
        let params = self.bind_params(fn_def.param_list());

        let annotation = fn_def.return_type();
        let ret = match annotation.as_ref().and_then(|a| a.type_expr()) {
            Some(type_expr) => self.resolve_type_expr(&type_expr),
            None => self.ctx.fresh_var(),
        };

        self.fn_returns.push((ret.clone(), fn_span));
        let body = fn_def.body();
        let body_ty = match &body {
            Some(block) => self.infer_block(block),
            None => Ty::Unknown,
        };
        self.fn_returns.pop();

        let origin = match &annotation {
            Some(annotation) => ConstraintOrigin::Annotation {
                annotation_span: annotation.syntax().text_range(),
            },
            None => ConstraintOrigin::Return {
                return_span: body.map_or(fn_span, |b| b.syntax().text_range()),
                fn_span,
            },
        };
        let _ = self.ctx.unify(ret.clone(), body_ty, origin);
        self.env.pop_scope();

        let ty = Ty::fun(params, ret);
        self.record_name(fn_def.name().as_ref(), &ty);
        ty
    }

    /// Bind each parameter in the current scope; returns their types.
    fn bind_params(&mut self, params: Option<ParamList>) -> Vec<Ty> {
        let Some(params) = params else {
            return Vec::new();
        };
        let mut tys = Vec::new();
        for param in params.params() {
            let ty = match param.annotation().and_then(|a| a.type_expr()) {
                Some(type_expr) => self.resolve_type_expr(&type_expr),
                None => self.ctx.fresh_var(),
            };
            let name = param.name();
            self.record_name(name.as_ref(), &ty);
            if let Some(text) = name.and_then(|n| n.text()) {
                self.env.insert(text, Scheme::mono(ty.clone()));
            }
            tys.push(ty);
        }
        tys
    }

    fn infer_local_let(&mut self, let_: &LetBinding) {
        self.ctx.enter_level();
        let ty = self.infer_let_binding(let_);
        self.ctx.leave_level();
        self.solve_deferred(Defaulting::Generalizable);

        let name = let_.name();
        self.record_name(name.as_ref(), &ty);
        let scheme = self.ctx.generalize(ty);
        if let Some(text) = name.and_then(|n| n.text()) {
            self.env.insert(text, scheme);
        }
    }

    fn infer_local_fn(&mut self, fn_def: &FnDef) {
        let name = fn_def.name().and_then(|n| n.text());
        self.ctx.enter_level();
        let var = self.ctx.fresh_var();
        if let Some(name) = &name {
            self.env.insert(name.clone(), Scheme::mono(var.clone()));
        }
        let ty = self.infer_fn_def(fn_def);
        let origin = ConstraintOrigin::LetBinding {
            binding_span: fn_def.syntax().text_range(),
        };
        let _ = self.ctx.unify(var, ty.clone(), origin);
        self.ctx.leave_level();
        self.solve_deferred(Defaulting::Generalizable);

        let scheme = self.ctx.generalize(ty);
        if let Some(name) = name {
            self.env.insert(name, scheme);
        }
    }

    /// A block's type is the type of its last statement; `let`, `fn` and an
    /// empty block give `unit`.
    fn infer_block(&mut self, block: &Block) -> Ty {
        if self.depth >= MAX_WALK_DEPTH {
            return Ty::Unknown;
        }
        self.depth += 1;
        self.env.push_scope();
        let mut last = Ty::unit();
        for stmt in block.stmts() {
            last = match &stmt {
                Stmt::LetBinding(let_) => {
                    self.infer_local_let(let_);
                    Ty::unit()
                }
                Stmt::FnDef(fn_def) => {
                    self.infer_local_fn(fn_def);
                    Ty::unit()
                }
                Stmt::Expr(expr) => self.infer_expr(expr),
            };
        }
        self.env.pop_scope();
        self.depth -= 1;
        last
    }

    // ── Expressions ─────────────────────────────────────────────────────

    fn infer_expr(&mut self, expr: &Expr) -> Ty {
        if !self.ctx.tick() {
            return Ty::Unknown;
        }
        if self.depth >= MAX_WALK_DEPTH {
            self.record(expr.syntax().text_range(), Ty::Unknown);
            return Ty::Unknown;
        }
        self.depth += 1;
        let ty = match expr {
            Expr::Literal(lit) => infer_literal(lit),
            Expr::NameRef(name_ref) => self.infer_name_ref(name_ref),
            Expr::BinaryExpr(bin) => self.infer_binary(bin),
            Expr::UnaryExpr(un) => self.infer_unary(un),
            Expr::CallExpr(call) => self.infer_call(call),
            Expr::FieldAccess(fa) => self.infer_field_access(fa),
            Expr::IndexExpr(index) => self.infer_index(index),
            Expr::ParenExpr(paren) => match paren.inner() {
                Some(inner) => self.infer_expr(&inner),
                None => Ty::unit(),
            },
            Expr::ListLiteral(list) => self.infer_list(list),
            Expr::RecordLiteral(record) => self.infer_record(record),
            Expr::IfExpr(if_expr) => self.infer_if(if_expr),
            Expr::ClosureExpr(closure) => self.infer_closure(closure),
            Expr::ReturnExpr(ret) => self.infer_return(ret),
        };
        self.depth -= 1;
        self.record(expr.syntax().text_range(), ty.clone());
        ty
    }

    fn infer_operand(&mut self, expr: Option<Expr>) -> Ty {
        match expr {
            Some(expr) => self.infer_expr(&expr),
            None => Ty::Unknown,
        }
    }

    fn infer_name_ref(&mut self, name_ref: &NameRef) -> Ty {
        let name = name_ref.text();
        let range = name_ref.syntax().text_range();

        if let Some(scheme) = self.env.lookup(&name).cloned() {
            return self.ctx.instantiate(&scheme);
        }
        if let Some(&idx) = self.resolution.get(&range) {
            return match self.top[idx].clone() {
                Some(scheme) => self.ctx.instantiate(&scheme),
                None => Ty::Unknown,
            };
        }
        if let Some(scheme) = self.builtins.get(&name).cloned() {
            return self.ctx.instantiate(&scheme);
        }

        self.ctx
            .errors
            .push(TypeError::UnboundVariable { name, span: range });
        Ty::Unknown
    }

    fn infer_binary(&mut self, bin: &BinaryExpr) -> Ty {
        let lhs = self.infer_operand(bin.lhs());
        let rhs = self.infer_operand(bin.rhs());
        let Some(op) = bin.op() else {
            return Ty::Unknown;
        };
        let op_span = op.text_range();
        let origin = ConstraintOrigin::BinOp { op_span };

        match op.kind() {
            SyntaxKind::PLUS
            | SyntaxKind::MINUS
            | SyntaxKind::STAR
            | SyntaxKind::SLASH
            | SyntaxKind::PERCENT => {
                let _ = self.ctx.unify(lhs.clone(), rhs, origin);
                self.require(Requirement::Numeric, lhs.clone(), op.text(), op_span);
                lhs
            }
            SyntaxKind::PLUS_PLUS => {
                let _ = self.ctx.unify(lhs.clone(), rhs, origin);
                self.require(Requirement::Concat, lhs.clone(), op.text(), op_span);
                lhs
            }
            SyntaxKind::EQ_EQ | SyntaxKind::NOT_EQ => {
                let _ = self.ctx.unify(lhs, rhs, origin);
                Ty::bool()
            }
            SyntaxKind::LT | SyntaxKind::GT | SyntaxKind::LT_EQ | SyntaxKind::GT_EQ => {
                let _ = self.ctx.unify(lhs.clone(), rhs, origin);
                self.require(Requirement::Comparable, lhs, op.text(), op_span);
                Ty::bool()
            }
            SyntaxKind::AND_KW
            | SyntaxKind::OR_KW
            | SyntaxKind::AMP_AMP
            | SyntaxKind::PIPE_PIPE => {
                let _ = self.ctx.unify(Ty::bool(), lhs, origin.clone());
                let _ = self.ctx.unify(Ty::bool(), rhs, origin);
                Ty::bool()
            }
            _ => Ty::Unknown,
        }
    }

    fn infer_unary(&mut self, un: &UnaryExpr) -> Ty {
        let operand = self.infer_operand(un.operand());
        let Some(op) = un.op() else {
            return Ty::Unknown;
        };
        let op_span = op.text_range();
        match op.kind() {
            SyntaxKind::MINUS => {
                self.require(Requirement::Numeric, operand.clone(), op.text(), op_span);
                operand
            }
            SyntaxKind::BANG | SyntaxKind::NOT_KW => {
                let _ = self
                    .ctx
                    .unify(Ty::bool(), operand, ConstraintOrigin::BinOp { op_span });
                Ty::bool()
            }
            _ => Ty::Unknown,
        }
    }

    fn infer_call(&mut self, call: &CallExpr) -> Ty {
        let call_site = call.syntax().text_range();
        let callee = call.callee();
        let callee_ty = self.infer_operand(callee.clone());

        let mut args = Vec::new();
        if let Some(arg_list) = call.arg_list() {
            for arg in arg_list.args() {
                args.push(self.infer_expr(&arg));
            }
        }

        match self.ctx.shallow_resolve(&callee_ty) {
            Ty::Fun(params, ret) => {
                if params.len() != args.len() {
                    self.ctx.errors.push(TypeError::ArityMismatch {
                        expected: params.len(),
                        found: args.len(),
                        origin: ConstraintOrigin::FnArg {
                            call_site,
                            param_idx: params.len().min(args.len()),
                        },
                    });
                }
                for (param_idx, (param, arg)) in params.into_iter().zip(args).enumerate() {
                    let origin = ConstraintOrigin::FnArg {
                        call_site,
                        param_idx,
                    };
                    let _ = self.ctx.unify(param, arg, origin);
                }
                *ret
            }
            Ty::Var(_) => {
                let ret = self.ctx.fresh_var();
                let expected = Ty::fun(args, ret.clone());
                let origin = ConstraintOrigin::FnArg {
                    call_site,
                    param_idx: 0,
                };
                let _ = self.ctx.unify(callee_ty, expected, origin);
                ret
            }
            Ty::Unknown | Ty::Never => Ty::Unknown,
            other => {
                let ty = self.ctx.resolve(other);
                let span = callee.map_or(call_site, |c| c.syntax().text_range());
                self.ctx.errors.push(TypeError::NotAFunction { ty, span });
                Ty::Unknown
            }
        }
    }

    fn infer_field_access(&mut self, fa: &FieldAccess) -> Ty {
        let receiver = self.infer_operand(fa.base());
        let Some(field) = fa.field() else {
            return Ty::Unknown;
        };
        let result = self.ctx.fresh_var();
        let deferred = Deferred::Field {
            receiver,
            field: field.text().to_string(),
            result: result.clone(),
            span: field.text_range(),
        };
        self.defer(deferred);
        result
    }

    fn infer_index(&mut self, index: &IndexExpr) -> Ty {
        let base = index.base();
        let base_ty = self.infer_operand(base.clone());
        let idx = index.index();
        let idx_ty = self.infer_operand(idx.clone());
        let range = index.syntax().text_range();

        let idx_span = idx.map_or(range, |i| i.syntax().text_range());
        let _ = self
            .ctx
            .unify(Ty::int(), idx_ty, ConstraintOrigin::Index { span: idx_span });

        let elem = self.ctx.fresh_var();
        let base_span = base.map_or(range, |b| b.syntax().text_range());
        let _ = self.ctx.unify(
            Ty::list(elem.clone()),
            base_ty,
            ConstraintOrigin::Index { span: base_span },
        );
        elem
    }

    fn infer_list(&mut self, list: &ListLiteral) -> Ty {
        let elem = self.ctx.fresh_var();
        for element in list.elements() {
            let ty = self.infer_expr(&element);
            let origin = ConstraintOrigin::ListElement {
                span: element.syntax().text_range(),
            };
            let _ = self.ctx.unify(elem.clone(), ty, origin);
        }
        Ty::list(elem)
    }

    fn infer_record(&mut self, record: &RecordLiteral) -> Ty {
        let mut fields = Vec::new();
        for field in record.fields() {
            let ty = self.infer_operand(field.value());
            if let Some(name) = field.name() {
                self.record(name.text_range(), ty.clone());
                fields.push((name.text().to_string(), ty));
            }
        }
        Ty::record(fields)
    }

    fn infer_if(&mut self, if_expr: &IfExpr) -> Ty {
        let if_span = if_expr.syntax().text_range();
        if let Some(cond) = if_expr.condition() {
            let cond_ty = self.infer_expr(&cond);
            let origin = ConstraintOrigin::Condition {
                span: cond.syntax().text_range(),
            };
            let _ = self.ctx.unify(Ty::bool(), cond_ty, origin);
        }

        let then_block = if_expr.then_block();
        let then_ty = match &then_block {
            Some(block) => self.infer_block(block),
            None => Ty::Unknown,
        };
        let then_span = then_block.map_or(if_span, |b| b.syntax().text_range());

        let Some(else_branch) = if_expr.else_branch() else {
            return Ty::unit();
        };
        let (else_ty, else_span) = if let Some(nested) = else_branch.if_expr() {
            let span = nested.syntax().text_range();
            (self.infer_expr(&Expr::IfExpr(nested)), span)
        } else if let Some(block) = else_branch.block() {
            (self.infer_block(&block), block.syntax().text_range())
        } else {
            (Ty::Unknown, else_branch.syntax().text_range())
        };

        if matches!(self.ctx.shallow_resolve(&then_ty), Ty::Never) {
            return else_ty;
        }
        let origin = ConstraintOrigin::IfBranches {
            if_span,
            then_span,
            else_span,
        };
        let _ = self.ctx.unify(then_ty.clone(), else_ty, origin);
        then_ty
    }

    fn infer_closure(&mut self, closure: &ClosureExpr) -> Ty {
        let fn_span = closure.syntax().text_range();
        self.env.push_scope();
        let params = self.bind_params(closure.param_list());
        let ret = self.ctx.fresh_var();

        self.fn_returns.push((ret.clone(), fn_span));
        let body = closure.body();
        let body_ty = match &body {
            Some(block) => self.infer_block(block),
            None => Ty::Unknown,
        };
        self.fn_returns.pop();

        let origin = ConstraintOrigin::Return {
            return_span: body.map_or(fn_span, |b| b.syntax().text_range()),
            fn_span,
        };
        let _ = self.ctx.unify(ret.clone(), body_ty, origin);
        self.env.pop_scope();
        Ty::fun(params, ret)
    }

    fn infer_return(&mut self, ret: &ReturnExpr) -> Ty {
        let value_ty = match ret.value() {
            Some(value) => self.infer_expr(&value),
            None => Ty::unit(),
        };
        let return_span = ret.syntax().text_range();
        match self.fn_returns.last().cloned() {
            Some((expected, fn_span)) => {
                let origin = ConstraintOrigin::Return {
                    return_span,
                    fn_span,
                };
                let _ = self.ctx.unify(expected, value_ty, origin);
            }
            None => self
                .ctx
                .errors
                .push(TypeError::ReturnOutsideFunction { span: return_span }),
        }
        Ty::Never
    }

    // ── Annotations ─────────────────────────────────────────────────────

    fn resolve_type_expr(&mut self, type_expr: &TypeExpr) -> Ty {
        let span = type_expr.syntax().text_range();
        match type_expr {
            TypeExpr::Named(named) => {
                let Some(name) = named.name() else {
                    return Ty::Unknown;
                };
                let args = named.args();
                let expected_arity = match name.as_str() {
                    "int" | "float" | "string" | "bool" | "unit" => 0,
                    "list" => 1,
                    _ => {
                        self.ctx.errors.push(TypeError::UnknownType { name, span });
                        return Ty::Unknown;
                    }
                };
                if args.len() != expected_arity {
                    self.ctx.errors.push(TypeError::ArityMismatch {
                        expected: expected_arity,
                        found: args.len(),
                        origin: ConstraintOrigin::Annotation {
                            annotation_span: span,
                        },
                    });
                    return Ty::Unknown;
                }
                match args.first() {
                    Some(elem) => Ty::list(self.resolve_type_expr(elem)),
                    None => Ty::Con(TyCon::new(name)),
                }
            }
            TypeExpr::Record(record) => {
                let mut fields = Vec::new();
                for field in record.fields() {
                    let ty = match field.type_expr() {
                        Some(t) => self.resolve_type_expr(&t),
                        None => Ty::Unknown,
                    };
                    fields.push((field.name().unwrap_or_default(), ty));
                }
                Ty::record(fields)
            }
            TypeExpr::Fn(fn_type) => {
                let params = fn_type
                    .params()
                    .iter()
                    .map(|p| self.resolve_type_expr(p))
                    .collect();
                let ret = match fn_type.ret() {
                    Some(t) => self.resolve_type_expr(&t),
                    None => Ty::unit(),
                };
                Ty::fun(params, ret)
            }
        }
    }

    // ── Deferred constraints ────────────────────────────────────────────

    fn require(&mut self, requirement: Requirement, ty: Ty, op: &str, span: TextRange) {
        self.defer(Deferred::Operator {
            requirement,
            ty,
            op: op.to_string(),
            span,
        });
    }

    /// Check `deferred` now if its subject is known, otherwise queue it.
    fn defer(&mut self, deferred: Deferred) {
        if !self.try_solve(&deferred) {
            self.deferred.push(deferred);
        }
    }

    /// Returns `false` while the subject is still an unbound variable.
    fn try_solve(&mut self, deferred: &Deferred) -> bool {
        let subject = self.ctx.shallow_resolve(deferred.subject());
        if matches!(subject, Ty::Var(_)) {
            return false;
        }
        match deferred {
            Deferred::Field {
                field,
                result,
                span,
                ..
            } => {
                let field_ty = match &subject {
                    Ty::Record(fields) => fields
                        .iter()
                        .find(|(name, _)| name == field)
                        .map(|(_, ty)| ty.clone()),
                    Ty::Unknown | Ty::Never => Some(Ty::Unknown),
                    _ => None,
                };
                let field_ty = field_ty.unwrap_or_else(|| {
                    let ty = self.ctx.resolve(subject.clone());
                    self.ctx.errors.push(TypeError::NoSuchField {
                        ty,
                        field_name: field.clone(),
                        span: *span,
                    });
                    Ty::Unknown
                });
                let origin = ConstraintOrigin::FieldAccess { span: *span };
                let _ = self.ctx.unify(result.clone(), field_ty, origin);
            }
            Deferred::Operator {
                requirement,
                op,
                span,
                ..
            } => {
                let accepted = match requirement {
                    Requirement::Numeric => subject.is_con("int") || subject.is_con("float"),
                    Requirement::Comparable => {
                        subject.is_con("int") || subject.is_con("float") || subject.is_con("string")
                    }
                    Requirement::Concat => {
                        subject.is_con("string") || subject.list_elem().is_some()
                    }
                };
                if !accepted && !matches!(subject, Ty::Unknown | Ty::Never) {
                    let ty = self.ctx.resolve(subject);
                    self.ctx.errors.push(TypeError::UnsupportedOperator {
                        op: op.clone(),
                        ty,
                        span: *span,
                    });
                }
            }
        }
        true
    }

    fn apply_default(&mut self, deferred: &Deferred) {
        let (target, default) = match deferred {
            Deferred::Field { result, .. } => (result.clone(), Ty::Unknown),
            Deferred::Operator {
                requirement, ty, ..
            } => {
                let default = match requirement {
                    Requirement::Numeric | Requirement::Comparable => Ty::int(),
                    Requirement::Concat => Ty::string(),
                };
                (ty.clone(), default)
            }
        };
        let _ = self.ctx.unify(target, default, ConstraintOrigin::Builtin);
    }

    /// Run pending constraints to a fixed point, then default them one at a
    /// time (re-solving after each default) until nothing eligible is left.
    fn solve_deferred(&mut self, mode: Defaulting) {
        loop {
            loop {
                let pending = std::mem::take(&mut self.deferred);
                let before = pending.len();
                for deferred in pending {
                    if !self.try_solve(&deferred) {
                        self.deferred.push(deferred);
                    }
                }
                if self.deferred.len() == before {
                    break;
                }
            }

            let eligible = self.deferred.iter().position(|d| {
                mode == Defaulting::All || self.ctx.is_generalizable_var(d.subject())
            });
            match eligible {
                Some(idx) => {
                    let deferred = self.deferred.remove(idx);
                    self.apply_default(&deferred);
                }
                None => break,
            }
        }
    }

    // ── Output ──────────────────────────────────────────────────────────

    fn finish(mut self, result_type: Option<Ty>) -> TypeckResult {
        let mut interner = TypeInterner::new();
        let mut types = Vec::with_capacity(self.types.len());
        for (range, ty) in std::mem::take(&mut self.types) {
            let resolved = self.ctx.resolve(ty).normalized();
            types.push((range, interner.intern(resolved)));
        }
        types.sort_by_key(|(range, _)| (range.start(), range.end()));
        types.dedup_by_key(|(range, _)| *range);

        let errors = std::mem::take(&mut self.ctx.errors)
            .into_iter()
            .map(|err| self.resolve_error(err))
            .collect();
        let result_type = result_type.map(|ty| self.ctx.resolve(ty).normalized());

        TypeckResult {
            types,
            interner,
            errors,
            result_type,
        }
    }

    /// Substitute solved variables into the types an error mentions.
    fn resolve_error(&mut self, err: TypeError) -> TypeError {
        match err {
            TypeError::Mismatch {
                expected,
                found,
                origin,
            } => TypeError::Mismatch {
                expected: self.ctx.resolve(expected),
                found: self.ctx.resolve(found),
                origin,
            },
            TypeError::InfiniteType { var, ty, origin } => TypeError::InfiniteType {
                var,
                ty: self.ctx.resolve(ty),
                origin,
            },
            TypeError::NotAFunction { ty, span } => TypeError::NotAFunction {
                ty: self.ctx.resolve(ty),
                span,
            },
            TypeError::NoSuchField {
                ty,
                field_name,
                span,
            } => TypeError::NoSuchField {
                ty: self.ctx.resolve(ty),
                field_name,
                span,
            },
            TypeError::UnsupportedOperator { op, ty, span } => TypeError::UnsupportedOperator {
                op,
                ty: self.ctx.resolve(ty),
                span,
            },
            other => other,
        }
    }
}

fn infer_literal(lit: &Literal) -> Ty {
    match lit.token().map(|t| t.kind()) {
        Some(SyntaxKind::INT_LITERAL) => Ty::int(),
        Some(SyntaxKind::FLOAT_LITERAL) => Ty::float(),
        Some(SyntaxKind::STRING_LITERAL) => Ty::string(),
        Some(SyntaxKind::TRUE_KW | SyntaxKind::FALSE_KW) => Ty::bool(),
        Some(SyntaxKind::NIL_KW) => Ty::unit(),
        _ => Ty::Unknown,
    }
}
