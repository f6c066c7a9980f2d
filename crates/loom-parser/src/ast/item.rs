//! Statements and binding forms.

use crate::ast::expr::Expr;
use crate::ast::ty::TypeExpr;
use crate::ast::{ast_node, child_node, child_nodes, child_token, AstNode};
use crate::cst::{SyntaxNode, SyntaxToken};
use crate::syntax_kind::SyntaxKind;

ast_node!(SourceFile, SOURCE_FILE);
ast_node!(FnDef, FN_DEF);
ast_node!(LetBinding, LET_BINDING);
ast_node!(ParamList, PARAM_LIST);
ast_node!(Param, PARAM);
ast_node!(Name, NAME);
ast_node!(TypeAnnotation, TYPE_ANNOTATION);
ast_node!(Block, BLOCK);

/// One entry of a statement list (document root or block).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Stmt {
    FnDef(FnDef),
    LetBinding(LetBinding),
    Expr(Expr),
}

impl Stmt {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        match node.kind() {
            SyntaxKind::FN_DEF => Some(Stmt::FnDef(FnDef { syntax: node })),
            SyntaxKind::LET_BINDING => Some(Stmt::LetBinding(LetBinding { syntax: node })),
            _ => Expr::cast(node).map(Stmt::Expr),
        }
    }

    pub fn syntax(&self) -> &SyntaxNode {
        match self {
            Stmt::FnDef(n) => n.syntax(),
            Stmt::LetBinding(n) => n.syntax(),
            Stmt::Expr(e) => e.syntax(),
        }
    }

    /// The name this statement binds in its scope, if any.
    pub fn bound_name(&self) -> Option<Name> {
        match self {
            Stmt::FnDef(f) => f.name(),
            Stmt::LetBinding(l) => l.name(),
            Stmt::Expr(_) => None,
        }
    }
}

impl SourceFile {
    pub fn stmts(&self) -> impl Iterator<Item = Stmt> + '_ {
        self.syntax.children().filter_map(Stmt::cast)
    }
}

impl Block {
    pub fn stmts(&self) -> impl Iterator<Item = Stmt> + '_ {
        self.syntax.children().filter_map(Stmt::cast)
    }
}

impl FnDef {
    pub fn name(&self) -> Option<Name> {
        child_node(&self.syntax)
    }

    pub fn param_list(&self) -> Option<ParamList> {
        child_node(&self.syntax)
    }

    /// The `-> T` annotation.
    pub fn return_type(&self) -> Option<TypeAnnotation> {
        child_node(&self.syntax)
    }

    pub fn body(&self) -> Option<Block> {
        child_node(&self.syntax)
    }
}

impl LetBinding {
    pub fn name(&self) -> Option<Name> {
        child_node(&self.syntax)
    }

    pub fn annotation(&self) -> Option<TypeAnnotation> {
        child_node(&self.syntax)
    }

    pub fn initializer(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }
}

impl ParamList {
    pub fn params(&self) -> impl Iterator<Item = Param> + '_ {
        child_nodes(&self.syntax)
    }
}

impl Param {
    pub fn name(&self) -> Option<Name> {
        child_node(&self.syntax)
    }

    pub fn annotation(&self) -> Option<TypeAnnotation> {
        child_node(&self.syntax)
    }
}

impl Name {
    pub fn ident(&self) -> Option<SyntaxToken> {
        child_token(&self.syntax, SyntaxKind::IDENT)
    }

    pub fn text(&self) -> Option<String> {
        self.ident().map(|t| t.text().to_string())
    }
}

impl TypeAnnotation {
    pub fn type_expr(&self) -> Option<TypeExpr> {
        self.syntax.children().find_map(TypeExpr::cast)
    }
}
