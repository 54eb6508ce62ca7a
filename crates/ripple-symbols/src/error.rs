//! Error types for method graph building

use ripple_ir::{MethodKey, Span};
use thiserror::Error;

/// Errors from method graph building
#[derive(Debug, Clone, Error)]
pub enum SymbolError {
    /// E-METHOD-001: Two methods share a key (hard error)
    #[error("duplicate method: {key}")]
    DuplicateMethod { key: MethodKey, span: Span },

    /// E-METHOD-002: Call to a method outside the program (soft error)
    #[error("call to method outside the program: {callee}")]
    UnresolvedCall {
        callee: MethodKey,
        /// The method containing the call
        caller: MethodKey,
        span: Span,
    },

    /// E-TYPE-001: Supertype not declared in the program (soft error)
    #[error("unknown supertype {supertype} of {type_name}")]
    UnknownSupertype {
        type_name: String,
        supertype: String,
        span: Span,
    },
}

impl SymbolError {
    /// Get the source span of this error
    pub fn span(&self) -> Span {
        match self {
            SymbolError::DuplicateMethod { span, .. } => *span,
            SymbolError::UnresolvedCall { span, .. } => *span,
            SymbolError::UnknownSupertype { span, .. } => *span,
        }
    }

    /// Whether this is a hard error that blocks analysis
    pub fn is_hard_error(&self) -> bool {
        match self {
            SymbolError::DuplicateMethod { .. } => true,
            SymbolError::UnresolvedCall { .. } => false,
            SymbolError::UnknownSupertype { .. } => false,
        }
    }

    /// Error code for machine-readable output
    pub fn code(&self) -> &'static str {
        match self {
            SymbolError::DuplicateMethod { .. } => "E-METHOD-001",
            SymbolError::UnresolvedCall { .. } => "E-METHOD-002",
            SymbolError::UnknownSupertype { .. } => "E-TYPE-001",
        }
    }
}
