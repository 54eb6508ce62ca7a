//! Structural content hash of method bodies
//!
//! The hash ignores node ids and spans and names variables by their stable
//! names, so recompiling unchanged source yields the same hash even when
//! unrelated declarations shift numeric ids.

use crate::hash::ContentHasher;
use crate::visit::{walk_block, walk_expr, walk_stmt, Visitor};
use crate::{
    AssignTarget, Block, Expr, ExprKind, Literal, MethodDecl, MethodKey, Program, Stmt, StmtKind,
    VarId,
};

impl MethodDecl {
    /// Hex SHA-256 over the method's key, kind and body structure
    pub fn content_hash(&self, program: &Program) -> String {
        let mut fingerprint = Fingerprint {
            program,
            hasher: ContentHasher::new(),
        };
        fingerprint.key(&self.key);
        fingerprint.hasher.write_str(&self.return_type);
        fingerprint
            .hasher
            .write_str(&format!("{:?}", self.modifiers));
        match &self.body {
            Some(body) => {
                fingerprint.hasher.write_tag(1);
                fingerprint.visit_block(body);
            }
            None => fingerprint.hasher.write_tag(0),
        }
        fingerprint.hasher.finish()
    }
}

struct Fingerprint<'p> {
    program: &'p Program,
    hasher: ContentHasher,
}

impl Fingerprint<'_> {
    fn key(&mut self, key: &MethodKey) {
        self.hasher.write_str(&key.to_string());
    }

    fn var(&mut self, var: VarId) {
        match self.program.variable(var) {
            Some(decl) => self.hasher.write_str(&decl.stable_name()),
            None => self.hasher.write_u64(u64::from(var.0)),
        }
    }

    fn literal(&mut self, literal: &Literal) {
        match literal {
            Literal::Int(value) => self.hasher.write_str(&format!("i{value}")),
            Literal::Float(value) => self.hasher.write_u64(value.to_bits()),
            Literal::String(value) => self.hasher.write_str(value),
            Literal::Bool(value) => self.hasher.write_tag(u8::from(*value)),
            Literal::Null => self.hasher.write_tag(0xff),
        }
    }
}

impl Visitor for Fingerprint<'_> {
    fn visit_block(&mut self, block: &Block) {
        self.hasher.write_tag(0x10);
        self.hasher.write_u64(block.statements.len() as u64);
        walk_block(self, block);
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        let tag = match &stmt.kind {
            StmtKind::Block(_) => 0x20,
            StmtKind::Let { var, init } => {
                self.hasher.write_tag(0x21);
                self.var(*var);
                self.hasher.write_tag(u8::from(init.is_some()));
                walk_stmt(self, stmt);
                return;
            }
            StmtKind::Expr(_) => 0x22,
            StmtKind::If { else_branch, .. } => {
                self.hasher.write_tag(0x23);
                self.hasher.write_tag(u8::from(else_branch.is_some()));
                walk_stmt(self, stmt);
                return;
            }
            StmtKind::While { .. } => 0x24,
            StmtKind::Return(value) => {
                self.hasher.write_tag(0x25);
                self.hasher.write_tag(u8::from(value.is_some()));
                walk_stmt(self, stmt);
                return;
            }
            StmtKind::Throw(_) => 0x26,
            StmtKind::Try {
                catches, finally, ..
            } => {
                self.hasher.write_tag(0x27);
                self.hasher.write_u64(catches.len() as u64);
                for catch in catches {
                    self.var(catch.var);
                }
                self.hasher.write_tag(u8::from(finally.is_some()));
                walk_stmt(self, stmt);
                return;
            }
            StmtKind::Break => 0x28,
            StmtKind::Continue => 0x29,
        };
        self.hasher.write_tag(tag);
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Literal(literal) => {
                self.hasher.write_tag(0x30);
                self.literal(literal);
            }
            ExprKind::Var(var) => {
                self.hasher.write_tag(0x31);
                self.var(*var);
            }
            ExprKind::Field { field, .. } => {
                self.hasher.write_tag(0x32);
                self.var(*field);
            }
            ExprKind::Index { .. } => self.hasher.write_tag(0x33),
            ExprKind::Assign { target, .. } => {
                self.hasher.write_tag(0x34);
                match target {
                    AssignTarget::Var(var) => {
                        self.hasher.write_tag(0);
                        self.var(*var);
                    }
                    AssignTarget::Field { field, .. } => {
                        self.hasher.write_tag(1);
                        self.var(*field);
                    }
                    AssignTarget::Index { .. } => self.hasher.write_tag(2),
                    AssignTarget::Unresolved(_) => self.hasher.write_tag(3),
                }
            }
            ExprKind::Binary { op, .. } => {
                self.hasher.write_tag(0x35);
                self.hasher.write_str(&format!("{op:?}"));
            }
            ExprKind::Unary { op, .. } => {
                self.hasher.write_tag(0x36);
                self.hasher.write_str(&format!("{op:?}"));
            }
            ExprKind::Call {
                callee,
                receiver,
                args,
            } => {
                self.hasher.write_tag(0x37);
                self.key(callee);
                self.hasher.write_tag(u8::from(receiver.is_some()));
                self.hasher.write_u64(args.len() as u64);
            }
            ExprKind::New {
                type_name,
                constructor,
                args,
            } => {
                self.hasher.write_tag(0x38);
                self.hasher.write_str(type_name);
                if let Some(constructor) = constructor {
                    self.hasher.write_str(&constructor.to_string());
                }
                self.hasher.write_u64(args.len() as u64);
            }
            ExprKind::Conditional { .. } => self.hasher.write_tag(0x39),
            ExprKind::Lambda { captures, .. } => {
                self.hasher.write_tag(0x3a);
                self.hasher.write_u64(captures.len() as u64);
                for var in captures {
                    self.var(*var);
                }
            }
            ExprKind::Io { op, args } => {
                self.hasher.write_tag(0x3b);
                self.hasher.write_str(op);
                self.hasher.write_u64(args.len() as u64);
            }
            ExprKind::Unresolved { name, children } => {
                self.hasher.write_tag(0x3c);
                self.hasher.write_str(name);
                self.hasher.write_u64(children.len() as u64);
            }
        }
        walk_expr(self, expr);
    }
}
