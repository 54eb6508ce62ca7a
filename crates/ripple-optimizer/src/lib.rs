//! Effect analysis driver for Ripple rewrite passes
//!
//! Runs the side-effect analysis for one compilation job and answers the
//! questions rewrite passes ask before touching code.
//!
//! # Pipeline
//!
//! - **Method graph**: methods, call edges and overrides from `ripple-symbols`
//! - **Effect building**: one walk creating the effects graph
//! - **Resolution**: override wiring, cached external callees, sweep and
//!   cycle breaking
//! - **Verification**: the graph is checked before any result is published
//! - **Persistence**: escaping effects of every method go to the cache
//!
//! # Usage
//!
//! ```ignore
//! use ripple_optimizer::{analyze, AnalysisSettings};
//! use ripple_cache::RedbCache;
//!
//! let mut cache = RedbCache::new(".ripple/effects.redb")?;
//! let analysis = analyze(&program, &AnalysisSettings::default(), Some(&mut cache))?;
//! if analysis.is_hoistable(expr.id, loop_body.id) {
//!     // move expr in front of the loop
//! }
//! for diagnostic in analysis.diagnostics() {
//!     eprintln!("{}: {}", diagnostic.code(), diagnostic);
//! }
//! ```

mod analysis;
mod error;
mod settings;

pub use analysis::{analyze, AnalysisSummary, EffectAnalysis, MethodSummary};
pub use error::AnalysisError;
pub use settings::{AnalysisSettings, CacheMode};
