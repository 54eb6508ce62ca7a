//! Read-only tree traversal
//!
//! Implementors override the `visit_*` hooks they care about and call the
//! matching `walk_*` function to continue into children.

use crate::{AssignTarget, Block, Expr, ExprKind, Stmt, StmtKind};

pub trait Visitor {
    fn visit_block(&mut self, block: &Block) {
        walk_block(self, block);
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }
}

pub fn walk_block<V: Visitor + ?Sized>(visitor: &mut V, block: &Block) {
    for stmt in &block.statements {
        visitor.visit_stmt(stmt);
    }
}

pub fn walk_stmt<V: Visitor + ?Sized>(visitor: &mut V, stmt: &Stmt) {
    match &stmt.kind {
        StmtKind::Block(block) => visitor.visit_block(block),
        StmtKind::Let { init, .. } => {
            if let Some(init) = init {
                visitor.visit_expr(init);
            }
        }
        StmtKind::Expr(expr) | StmtKind::Throw(expr) => visitor.visit_expr(expr),
        StmtKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            visitor.visit_expr(condition);
            visitor.visit_block(then_branch);
            if let Some(else_branch) = else_branch {
                visitor.visit_block(else_branch);
            }
        }
        StmtKind::While { condition, body } => {
            visitor.visit_expr(condition);
            visitor.visit_block(body);
        }
        StmtKind::Return(value) => {
            if let Some(value) = value {
                visitor.visit_expr(value);
            }
        }
        StmtKind::Try {
            body,
            catches,
            finally,
        } => {
            visitor.visit_block(body);
            for catch in catches {
                visitor.visit_block(&catch.body);
            }
            if let Some(finally) = finally {
                visitor.visit_block(finally);
            }
        }
        StmtKind::Break | StmtKind::Continue => {}
    }
}

pub fn walk_expr<V: Visitor + ?Sized>(visitor: &mut V, expr: &Expr) {
    match &expr.kind {
        ExprKind::Literal(_) | ExprKind::Var(_) => {}
        ExprKind::Field { object, .. } => visitor.visit_expr(object),
        ExprKind::Index { array, index } => {
            visitor.visit_expr(array);
            visitor.visit_expr(index);
        }
        ExprKind::Assign { target, value } => {
            walk_assign_target(visitor, target);
            visitor.visit_expr(value);
        }
        ExprKind::Binary { left, right, .. } => {
            visitor.visit_expr(left);
            visitor.visit_expr(right);
        }
        ExprKind::Unary { operand, .. } => visitor.visit_expr(operand),
        ExprKind::Call { receiver, args, .. } => {
            if let Some(receiver) = receiver {
                visitor.visit_expr(receiver);
            }
            for arg in args {
                visitor.visit_expr(arg);
            }
        }
        ExprKind::New { args, .. } | ExprKind::Io { args, .. } => {
            for arg in args {
                visitor.visit_expr(arg);
            }
        }
        ExprKind::Conditional {
            condition,
            then_expr,
            else_expr,
        } => {
            visitor.visit_expr(condition);
            visitor.visit_expr(then_expr);
            visitor.visit_expr(else_expr);
        }
        ExprKind::Lambda { body, .. } => visitor.visit_block(body),
        ExprKind::Unresolved { children, .. } => {
            for child in children {
                visitor.visit_expr(child);
            }
        }
    }
}

pub fn walk_assign_target<V: Visitor + ?Sized>(visitor: &mut V, target: &AssignTarget) {
    match target {
        AssignTarget::Var(_) => {}
        AssignTarget::Field { object, .. } => visitor.visit_expr(object),
        AssignTarget::Index { array, index } => {
            visitor.visit_expr(array);
            visitor.visit_expr(index);
        }
        AssignTarget::Unresolved(expr) => visitor.visit_expr(expr),
    }
}
