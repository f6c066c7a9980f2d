//! Type annotation syntax.

use crate::ast::{ast_node, child_node, child_token, AstNode};
use crate::cst::SyntaxNode;
use crate::syntax_kind::SyntaxKind;

ast_node!(NamedType, NAMED_TYPE);
ast_node!(RecordType, RECORD_TYPE);
ast_node!(RecordTypeField, RECORD_TYPE_FIELD);
ast_node!(FnType, FN_TYPE);
ast_node!(TypeArgList, TYPE_ARG_LIST);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    Named(NamedType),
    Record(RecordType),
    Fn(FnType),
}

impl TypeExpr {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        match node.kind() {
            SyntaxKind::NAMED_TYPE => Some(TypeExpr::Named(NamedType { syntax: node })),
            SyntaxKind::RECORD_TYPE => Some(TypeExpr::Record(RecordType { syntax: node })),
            SyntaxKind::FN_TYPE => Some(TypeExpr::Fn(FnType { syntax: node })),
            _ => None,
        }
    }

    pub fn syntax(&self) -> &SyntaxNode {
        match self {
            TypeExpr::Named(n) => n.syntax(),
            TypeExpr::Record(n) => n.syntax(),
            TypeExpr::Fn(n) => n.syntax(),
        }
    }
}

impl NamedType {
    pub fn name(&self) -> Option<String> {
        child_token(&self.syntax, SyntaxKind::IDENT).map(|t| t.text().to_string())
    }

    /// Arguments of `list<T>`; empty for a bare name.
    pub fn args(&self) -> Vec<TypeExpr> {
        child_node::<TypeArgList>(&self.syntax)
            .map(|list| list.types().collect())
            .unwrap_or_default()
    }
}

impl RecordType {
    pub fn fields(&self) -> impl Iterator<Item = RecordTypeField> + '_ {
        self.syntax.children().filter_map(RecordTypeField::cast)
    }
}

impl RecordTypeField {
    pub fn name(&self) -> Option<String> {
        child_token(&self.syntax, SyntaxKind::IDENT).map(|t| t.text().to_string())
    }

    pub fn type_expr(&self) -> Option<TypeExpr> {
        self.syntax.children().find_map(TypeExpr::cast)
    }
}

impl FnType {
    pub fn params(&self) -> Vec<TypeExpr> {
        child_node::<TypeArgList>(&self.syntax)
            .map(|list| list.types().collect())
            .unwrap_or_default()
    }

    /// The type after `->`.
    pub fn ret(&self) -> Option<TypeExpr> {
        self.syntax.children().find_map(TypeExpr::cast)
    }
}

impl TypeArgList {
    pub fn types(&self) -> impl Iterator<Item = TypeExpr> + '_ {
        self.syntax.children().filter_map(TypeExpr::cast)
    }
}
