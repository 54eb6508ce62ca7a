//! Programmatic construction of programs
//!
//! Front ends lower their syntax trees through this builder, which hands out
//! dense variable/method ids and unique node ids.

use crate::{
    AssignTarget, BinaryOp, Block, CatchClause, Expr, ExprKind, ExternalMethod, Literal,
    MethodDecl, MethodId, MethodKey, MethodModifiers, NodeId, Program, Span, Stmt, StmtKind,
    TypeDecl, VarId, VarScope, VariableDecl,
};

#[derive(Debug, Default)]
pub struct ProgramBuilder {
    program: Program,
    next_node: u32,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> Program {
        self.program
    }

    // ===== Declarations =====

    pub fn type_decl(&mut self, name: &str, supertypes: &[&str]) {
        self.program.types.push(TypeDecl {
            name: name.to_string(),
            supertypes: supertypes.iter().map(|s| s.to_string()).collect(),
            span: Span::dummy(),
        });
    }

    pub fn variable(&mut self, owner: &str, name: &str, scope: VarScope) -> VarId {
        let id = VarId(self.program.variables.len() as u32);
        self.program.variables.push(VariableDecl {
            id,
            name: name.to_string(),
            owner: owner.to_string(),
            scope,
            span: Span::dummy(),
        });
        id
    }

    pub fn method(
        &mut self,
        key: MethodKey,
        modifiers: MethodModifiers,
        body: Option<Block>,
    ) -> MethodId {
        let id = MethodId(self.program.methods.len() as u32);
        self.program.methods.push(MethodDecl {
            id,
            key,
            return_type: "void".to_string(),
            modifiers,
            body,
            span: Span::dummy(),
        });
        id
    }

    pub fn external(&mut self, key: MethodKey, content_hash: impl Into<String>) {
        self.program.externals.push(ExternalMethod {
            key,
            content_hash: content_hash.into(),
        });
    }

    // ===== Nodes =====

    fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        id
    }

    pub fn expr(&mut self, kind: ExprKind) -> Expr {
        Expr {
            id: self.next_id(),
            kind,
            span: Span::dummy(),
        }
    }

    pub fn stmt(&mut self, kind: StmtKind) -> Stmt {
        Stmt {
            id: self.next_id(),
            kind,
            span: Span::dummy(),
        }
    }

    pub fn block(&mut self, statements: Vec<Stmt>) -> Block {
        Block {
            id: self.next_id(),
            statements,
            span: Span::dummy(),
        }
    }

    pub fn int(&mut self, value: i64) -> Expr {
        self.expr(ExprKind::Literal(Literal::Int(value)))
    }

    pub fn read(&mut self, var: VarId) -> Expr {
        self.expr(ExprKind::Var(var))
    }

    pub fn field(&mut self, object: Expr, field: VarId) -> Expr {
        self.expr(ExprKind::Field {
            object: Box::new(object),
            field,
        })
    }

    pub fn index(&mut self, array: Expr, index: Expr) -> Expr {
        self.expr(ExprKind::Index {
            array: Box::new(array),
            index: Box::new(index),
        })
    }

    pub fn assign(&mut self, var: VarId, value: Expr) -> Expr {
        self.assign_to(AssignTarget::Var(var), value)
    }

    pub fn assign_field(&mut self, object: Expr, field: VarId, value: Expr) -> Expr {
        self.assign_to(
            AssignTarget::Field {
                object: Box::new(object),
                field,
            },
            value,
        )
    }

    pub fn assign_index(&mut self, array: Expr, index: Expr, value: Expr) -> Expr {
        self.assign_to(
            AssignTarget::Index {
                array: Box::new(array),
                index: Box::new(index),
            },
            value,
        )
    }

    pub fn assign_to(&mut self, target: AssignTarget, value: Expr) -> Expr {
        self.expr(ExprKind::Assign {
            target,
            value: Box::new(value),
        })
    }

    pub fn binary(&mut self, op: BinaryOp, left: Expr, right: Expr) -> Expr {
        self.expr(ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn call(&mut self, callee: MethodKey, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Call {
            callee,
            receiver: None,
            args,
        })
    }

    pub fn call_on(&mut self, receiver: Expr, callee: MethodKey, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Call {
            callee,
            receiver: Some(Box::new(receiver)),
            args,
        })
    }

    pub fn new_object(&mut self, constructor: MethodKey, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::New {
            type_name: constructor.declaring_type.clone(),
            constructor: Some(constructor),
            args,
        })
    }

    pub fn new_array(&mut self, element_type: &str, length: Expr) -> Expr {
        self.expr(ExprKind::New {
            type_name: format!("{element_type}[]"),
            constructor: None,
            args: vec![length],
        })
    }

    pub fn lambda(&mut self, captures: Vec<VarId>, body: Block) -> Expr {
        self.expr(ExprKind::Lambda { captures, body })
    }

    pub fn io(&mut self, op: &str, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Io {
            op: op.to_string(),
            args,
        })
    }

    pub fn unresolved(&mut self, name: &str, children: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Unresolved {
            name: name.to_string(),
            children,
        })
    }

    pub fn expr_stmt(&mut self, expr: Expr) -> Stmt {
        self.stmt(StmtKind::Expr(expr))
    }

    pub fn let_stmt(&mut self, var: VarId, init: Option<Expr>) -> Stmt {
        self.stmt(StmtKind::Let { var, init })
    }

    pub fn throw(&mut self, value: Expr) -> Stmt {
        self.stmt(StmtKind::Throw(value))
    }

    pub fn ret(&mut self, value: Option<Expr>) -> Stmt {
        self.stmt(StmtKind::Return(value))
    }

    pub fn if_stmt(&mut self, condition: Expr, then_branch: Block, else_branch: Option<Block>) -> Stmt {
        self.stmt(StmtKind::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    pub fn while_stmt(&mut self, condition: Expr, body: Block) -> Stmt {
        self.stmt(StmtKind::While { condition, body })
    }

    pub fn try_stmt(
        &mut self,
        body: Block,
        catches: Vec<(VarId, Block)>,
        finally: Option<Block>,
    ) -> Stmt {
        let catches = catches
            .into_iter()
            .map(|(var, body)| CatchClause {
                var,
                body,
                span: Span::dummy(),
            })
            .collect();
        self.stmt(StmtKind::Try {
            body,
            catches,
            finally,
        })
    }
}
