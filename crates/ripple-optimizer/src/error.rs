//! Errors that abort an analysis job

use ripple_cache::CacheError;
use ripple_effects::{GraphError, ResolveError};
use ripple_symbols::SymbolError;
use thiserror::Error;

/// Any of these leaves the program unoptimized
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("method graph has {} hard error(s): {}", .0.len(), render(.0))]
    Symbols(Vec<SymbolError>),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("effects graph failed verification: {0}")]
    Graph(#[from] GraphError),

    #[error("effect cache: {0}")]
    Cache(#[from] CacheError),
}

impl From<Vec<SymbolError>> for AnalysisError {
    fn from(errors: Vec<SymbolError>) -> Self {
        AnalysisError::Symbols(errors)
    }
}

fn render(errors: &[SymbolError]) -> String {
    errors
        .iter()
        .map(|e| format!("{} {e}", e.code()))
        .collect::<Vec<_>>()
        .join("; ")
}
