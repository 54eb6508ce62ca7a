//! Expression nodes

use serde::{Deserialize, Serialize};

use crate::{Block, MethodKey, NodeId, Span, VarId};

/// An expression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expr {
    pub id: NodeId,
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExprKind {
    /// Literal value: `42`, `"hello"`, `true`, `null`
    Literal(Literal),

    /// Variable read: `x`, or a static field such as `Config.DEBUG`
    Var(VarId),

    /// Instance field read: `account.balance`
    Field { object: Box<Expr>, field: VarId },

    /// Array element read: `items[i]`
    Index { array: Box<Expr>, index: Box<Expr> },

    /// Assignment: `x = 5`, `a.f = 5`, `items[i] = 5`
    Assign {
        target: AssignTarget,
        value: Box<Expr>,
    },

    /// Binary operation: `a + b`
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Unary operation: `!x`, `-y`
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// Method call: `receiver.name(args)` or `Type.name(args)`
    Call {
        callee: MethodKey,
        receiver: Option<Box<Expr>>,
        args: Vec<Expr>,
    },

    /// Object or array allocation: `new Account(owner)`, `new int[n]`.
    /// Arrays have no constructor.
    New {
        type_name: String,
        constructor: Option<MethodKey>,
        args: Vec<Expr>,
    },

    /// Conditional expression: `c ? a : b`
    Conditional {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },

    /// Lambda: `() -> { ... }`, capturing the listed variables
    Lambda { captures: Vec<VarId>, body: Block },

    /// Uncontrolled I/O primitive (console, file, network, clock)
    Io { op: String, args: Vec<Expr> },

    /// A symbol-referencing node the front end could not bind
    Unresolved { name: String, children: Vec<Expr> },
}

/// Left-hand side of an assignment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AssignTarget {
    Var(VarId),
    Field { object: Box<Expr>, field: VarId },
    Index { array: Box<Expr>, index: Box<Expr> },
    /// Target whose symbol could not be resolved
    Unresolved(Box<Expr>),
}

/// A literal value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
}
