//! Ripple - whole-program side-effect analysis
//!
//! This is the root workspace crate that provides integration tests.
//! The actual implementation is in the workspace member crates.

// Re-export main crates for convenience
pub use ripple_cache as cache;
pub use ripple_effects as effects;
pub use ripple_ir as ir;
pub use ripple_optimizer as optimizer;
pub use ripple_symbols as symbols;

pub use ripple_optimizer::{analyze, AnalysisSettings, EffectAnalysis};
