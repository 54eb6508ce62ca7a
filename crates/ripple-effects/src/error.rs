//! Error types for the effects graph and resolver

use crate::EffectsId;
use ripple_ir::MethodKey;
use thiserror::Error;

/// Structural errors in the effects graph. Any of these means the graph can
/// no longer be trusted and the analysis must be abandoned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("unknown effects node {0}")]
    UnknownNode(EffectsId),

    #[error("effects node {0} was severed by reparenting")]
    SeveredNode(EffectsId),

    #[error("edge {from} -> {to} has no matching back edge")]
    BrokenEdge { from: EffectsId, to: EffectsId },

    #[error("computed effects of {0} do not contain its direct effects")]
    UnsoundNode(EffectsId),
}

/// Errors that abort effect resolution
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// Methods still unresolved after cycle breaking
    #[error("{} method(s) could not be resolved: {}", .methods.len(), render(.methods))]
    UnresolvedMethods { methods: Vec<MethodKey> },

    #[error("no effects node for method {0}")]
    MissingMethod(MethodKey),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

fn render(methods: &[MethodKey]) -> String {
    methods
        .iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
