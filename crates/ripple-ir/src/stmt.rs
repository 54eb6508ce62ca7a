//! Statement nodes

use serde::{Deserialize, Serialize};

use crate::{Expr, NodeId, Span, VarId};

/// A block of statements
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub id: NodeId,
    pub statements: Vec<Stmt>,
    pub span: Span,
}

/// A statement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stmt {
    pub id: NodeId,
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StmtKind {
    /// Nested block: `{ ... }`
    Block(Block),

    /// Local declaration: `int x = 5;` or `int x;`
    Let { var: VarId, init: Option<Expr> },

    /// Expression statement: `foo();`
    Expr(Expr),

    /// `if (cond) { ... } else { ... }`
    If {
        condition: Expr,
        then_branch: Block,
        else_branch: Option<Block>,
    },

    /// `while (cond) { ... }`
    While { condition: Expr, body: Block },

    /// `return x;`
    Return(Option<Expr>),

    /// `throw e;`
    Throw(Expr),

    /// `try { ... } catch (E e) { ... } finally { ... }`
    Try {
        body: Block,
        catches: Vec<CatchClause>,
        finally: Option<Block>,
    },

    Break,

    Continue,
}

/// A catch clause binding the caught exception to a local
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatchClause {
    pub var: VarId,
    pub body: Block,
    pub span: Span,
}
