//! The whole program handed to the analysis

use serde::{Deserialize, Serialize};

use crate::visit::{walk_block, walk_expr, walk_stmt, Visitor};
use crate::{
    Block, Expr, ExternalMethod, MethodDecl, MethodId, MethodKey, Stmt, TypeDecl, VarId,
    VariableDecl,
};

/// A complete compilation unit: every type, variable and method the
/// analysis may see, plus the external methods it calls into.
///
/// Variables and methods are stored densely by id (`variables[i].id == VarId(i)`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    pub types: Vec<TypeDecl>,
    pub variables: Vec<VariableDecl>,
    pub methods: Vec<MethodDecl>,
    pub externals: Vec<ExternalMethod>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn variable(&self, id: VarId) -> Option<&VariableDecl> {
        self.variables.get(id.0 as usize).filter(|v| v.id == id)
    }

    pub fn method(&self, id: MethodId) -> Option<&MethodDecl> {
        self.methods.get(id.0 as usize).filter(|m| m.id == id)
    }

    pub fn method_by_key(&self, key: &MethodKey) -> Option<&MethodDecl> {
        self.methods.iter().find(|m| &m.key == key)
    }

    pub fn type_decl(&self, name: &str) -> Option<&TypeDecl> {
        self.types.iter().find(|t| t.name == name)
    }

    pub fn external(&self, key: &MethodKey) -> Option<&ExternalMethod> {
        self.externals.iter().find(|e| &e.key == key)
    }

    /// Total number of statements, expressions and blocks in all bodies
    pub fn node_count(&self) -> usize {
        let mut counter = NodeCounter::default();
        for body in self.methods.iter().filter_map(|m| m.body.as_ref()) {
            counter.visit_block(body);
        }
        counter.count
    }
}

#[derive(Default)]
struct NodeCounter {
    count: usize,
}

impl Visitor for NodeCounter {
    fn visit_block(&mut self, block: &Block) {
        self.count += 1;
        walk_block(self, block);
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        self.count += 1;
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        self.count += 1;
        walk_expr(self, expr);
    }
}
