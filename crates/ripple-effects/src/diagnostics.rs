//! Precision-loss diagnostics
//!
//! None of these stop the analysis. Each marks a place where effects were
//! widened to a conservative default.

use ripple_ir::{MethodKey, NodeId, Span};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
pub enum EffectDiagnostic {
    /// W-EFFECT-001: Method body cannot be analyzed
    #[error("{method} has no analyzable body; assuming all effects")]
    NativeMethod { method: MethodKey, span: Span },

    /// W-EFFECT-002: Access through a symbol the front end could not bind
    #[error("unresolved target `{name}` in {method}; assuming every location")]
    UnresolvedTarget {
        method: MethodKey,
        name: String,
        node: NodeId,
        span: Span,
    },

    /// W-EFFECT-003: Callee outside the program with no usable cache entry
    #[error("no effects known for {callee}; assuming all effects")]
    UnknownCallee { callee: MethodKey },

    /// W-EFFECT-004: Cache entry rejected
    #[error("cached effects for {callee} rejected: {reason}")]
    CacheMismatch { callee: MethodKey, reason: String },

    /// W-EFFECT-005: Recursion group resolved by rebuilding from children
    #[error("recursion broken across {} method(s)", .methods.len())]
    CycleBroken { methods: Vec<MethodKey> },
}

impl EffectDiagnostic {
    pub fn code(&self) -> &'static str {
        match self {
            EffectDiagnostic::NativeMethod { .. } => "W-EFFECT-001",
            EffectDiagnostic::UnresolvedTarget { .. } => "W-EFFECT-002",
            EffectDiagnostic::UnknownCallee { .. } => "W-EFFECT-003",
            EffectDiagnostic::CacheMismatch { .. } => "W-EFFECT-004",
            EffectDiagnostic::CycleBroken { .. } => "W-EFFECT-005",
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            EffectDiagnostic::NativeMethod { span, .. }
            | EffectDiagnostic::UnresolvedTarget { span, .. } => Some(*span),
            _ => None,
        }
    }
}
