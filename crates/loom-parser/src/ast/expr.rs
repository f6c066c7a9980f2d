//! Typed AST nodes for expressions.

use crate::ast::item::{Block, ParamList};
use crate::ast::{ast_node, child_node, child_token, AstNode};
use crate::cst::{SyntaxNode, SyntaxToken};
use crate::syntax_kind::SyntaxKind;

/// Any expression node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Literal(Literal),
    NameRef(NameRef),
    BinaryExpr(BinaryExpr),
    UnaryExpr(UnaryExpr),
    CallExpr(CallExpr),
    FieldAccess(FieldAccess),
    IndexExpr(IndexExpr),
    ParenExpr(ParenExpr),
    ListLiteral(ListLiteral),
    RecordLiteral(RecordLiteral),
    IfExpr(IfExpr),
    ClosureExpr(ClosureExpr),
    ReturnExpr(ReturnExpr),
}

impl Expr {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        let expr = match node.kind() {
            SyntaxKind::LITERAL => Expr::Literal(Literal { syntax: node }),
            SyntaxKind::NAME_REF => Expr::NameRef(NameRef { syntax: node }),
            SyntaxKind::BINARY_EXPR => Expr::BinaryExpr(BinaryExpr { syntax: node }),
            SyntaxKind::UNARY_EXPR => Expr::UnaryExpr(UnaryExpr { syntax: node }),
            SyntaxKind::CALL_EXPR => Expr::CallExpr(CallExpr { syntax: node }),
            SyntaxKind::FIELD_ACCESS => Expr::FieldAccess(FieldAccess { syntax: node }),
            SyntaxKind::INDEX_EXPR => Expr::IndexExpr(IndexExpr { syntax: node }),
            SyntaxKind::PAREN_EXPR => Expr::ParenExpr(ParenExpr { syntax: node }),
            SyntaxKind::LIST_LITERAL => Expr::ListLiteral(ListLiteral { syntax: node }),
            SyntaxKind::RECORD_LITERAL => Expr::RecordLiteral(RecordLiteral { syntax: node }),
            SyntaxKind::IF_EXPR => Expr::IfExpr(IfExpr { syntax: node }),
            SyntaxKind::CLOSURE_EXPR => Expr::ClosureExpr(ClosureExpr { syntax: node }),
            SyntaxKind::RETURN_EXPR => Expr::ReturnExpr(ReturnExpr { syntax: node }),
            _ => return None,
        };
        Some(expr)
    }

    pub fn syntax(&self) -> &SyntaxNode {
        match self {
            Expr::Literal(n) => &n.syntax,
            Expr::NameRef(n) => &n.syntax,
            Expr::BinaryExpr(n) => &n.syntax,
            Expr::UnaryExpr(n) => &n.syntax,
            Expr::CallExpr(n) => &n.syntax,
            Expr::FieldAccess(n) => &n.syntax,
            Expr::IndexExpr(n) => &n.syntax,
            Expr::ParenExpr(n) => &n.syntax,
            Expr::ListLiteral(n) => &n.syntax,
            Expr::RecordLiteral(n) => &n.syntax,
            Expr::IfExpr(n) => &n.syntax,
            Expr::ClosureExpr(n) => &n.syntax,
            Expr::ReturnExpr(n) => &n.syntax,
        }
    }
}

ast_node!(Literal, LITERAL);
ast_node!(NameRef, NAME_REF);
ast_node!(BinaryExpr, BINARY_EXPR);
ast_node!(UnaryExpr, UNARY_EXPR);
ast_node!(CallExpr, CALL_EXPR);
ast_node!(ArgList, ARG_LIST);
ast_node!(FieldAccess, FIELD_ACCESS);
ast_node!(IndexExpr, INDEX_EXPR);
ast_node!(ParenExpr, PAREN_EXPR);
ast_node!(ListLiteral, LIST_LITERAL);
ast_node!(RecordLiteral, RECORD_LITERAL);
ast_node!(RecordField, RECORD_FIELD);
ast_node!(IfExpr, IF_EXPR);
ast_node!(ElseBranch, ELSE_BRANCH);
ast_node!(ClosureExpr, CLOSURE_EXPR);
ast_node!(ReturnExpr, RETURN_EXPR);

fn child_exprs(node: &SyntaxNode) -> impl Iterator<Item = Expr> + '_ {
    node.children().filter_map(Expr::cast)
}

/// First token that is not trivia.
fn first_significant_token(node: &SyntaxNode) -> Option<SyntaxToken> {
    node.children_with_tokens()
        .filter_map(|it| it.into_token())
        .find(|t| !t.kind().is_trivia())
}

impl Literal {
    /// The literal token (INT_LITERAL, STRING_LITERAL, TRUE_KW, ...).
    pub fn token(&self) -> Option<SyntaxToken> {
        first_significant_token(&self.syntax)
    }
}

impl NameRef {
    pub fn ident(&self) -> Option<SyntaxToken> {
        child_token(&self.syntax, SyntaxKind::IDENT)
    }

    pub fn text(&self) -> String {
        self.ident().map(|t| t.text().to_string()).unwrap_or_default()
    }
}

impl BinaryExpr {
    pub fn lhs(&self) -> Option<Expr> {
        child_exprs(&self.syntax).next()
    }

    pub fn rhs(&self) -> Option<Expr> {
        child_exprs(&self.syntax).nth(1)
    }

    /// The operator token: the first non-trivia token directly under the node.
    pub fn op(&self) -> Option<SyntaxToken> {
        first_significant_token(&self.syntax)
    }
}

impl UnaryExpr {
    pub fn op(&self) -> Option<SyntaxToken> {
        first_significant_token(&self.syntax)
    }

    pub fn operand(&self) -> Option<Expr> {
        child_exprs(&self.syntax).next()
    }
}

impl CallExpr {
    pub fn callee(&self) -> Option<Expr> {
        child_exprs(&self.syntax).next()
    }

    pub fn arg_list(&self) -> Option<ArgList> {
        child_node(&self.syntax)
    }
}

impl ArgList {
    pub fn args(&self) -> impl Iterator<Item = Expr> + '_ {
        child_exprs(&self.syntax)
    }
}

impl FieldAccess {
    pub fn base(&self) -> Option<Expr> {
        child_exprs(&self.syntax).next()
    }

    pub fn field(&self) -> Option<SyntaxToken> {
        child_token(&self.syntax, SyntaxKind::IDENT)
    }
}

impl IndexExpr {
    pub fn base(&self) -> Option<Expr> {
        child_exprs(&self.syntax).next()
    }

    pub fn index(&self) -> Option<Expr> {
        child_exprs(&self.syntax).nth(1)
    }
}

impl ParenExpr {
    /// `None` for `()`.
    pub fn inner(&self) -> Option<Expr> {
        child_exprs(&self.syntax).next()
    }
}

impl ListLiteral {
    pub fn elements(&self) -> impl Iterator<Item = Expr> + '_ {
        child_exprs(&self.syntax)
    }
}

impl RecordLiteral {
    pub fn fields(&self) -> impl Iterator<Item = RecordField> + '_ {
        self.syntax.children().filter_map(RecordField::cast)
    }
}

impl RecordField {
    pub fn name(&self) -> Option<SyntaxToken> {
        child_token(&self.syntax, SyntaxKind::IDENT)
    }

    pub fn value(&self) -> Option<Expr> {
        child_exprs(&self.syntax).next()
    }
}

impl IfExpr {
    pub fn condition(&self) -> Option<Expr> {
        child_exprs(&self.syntax).next()
    }

    pub fn then_block(&self) -> Option<Block> {
        child_node(&self.syntax)
    }

    pub fn else_branch(&self) -> Option<ElseBranch> {
        child_node(&self.syntax)
    }
}

impl ElseBranch {
    pub fn block(&self) -> Option<Block> {
        child_node(&self.syntax)
    }

    /// The nested `if` of an `else if` chain.
    pub fn if_expr(&self) -> Option<IfExpr> {
        child_node(&self.syntax)
    }
}

impl ClosureExpr {
    pub fn param_list(&self) -> Option<ParamList> {
        child_node(&self.syntax)
    }

    pub fn body(&self) -> Option<Block> {
        child_node(&self.syntax)
    }
}

impl ReturnExpr {
    pub fn value(&self) -> Option<Expr> {
        child_exprs(&self.syntax).next()
    }
}
