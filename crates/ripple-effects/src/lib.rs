//! ripple-effects: Side-effect analysis engine
//!
//! Computes what every statement, expression and method reads, writes,
//! throws, or performs I/O through:
//!
//! - [`EffectSet`] / [`SymbolSet`]: the effect lattice
//! - [`EffectsGraph`]: incrementally updated nodes with fast (union) and
//!   slow (rebuild) propagation
//! - [`EffectBuilder`]: one walk over the program creating the graph
//! - [`Resolver`]: override wiring, external callees, fixpoint sweep and
//!   cycle breaking
//! - [`MethodEffectTable`]: final per-method effects
//!
//! # Example
//!
//! ```ignore
//! use ripple_effects::{EffectBuilder, NoExternalEffects, Resolver};
//!
//! let symbols = ripple_symbols::build_method_graph(&program)?;
//! let build = EffectBuilder::new(&program).build()?;
//! let resolution = Resolver::new(build, &symbols.graph).resolve(&mut NoExternalEffects)?;
//! println!("{}", resolution.table.get_by_key(&key).unwrap());
//! ```

mod builder;
mod diagnostics;
mod effect_set;
mod error;
mod graph;
mod kind;
mod resolver;
mod symbol_set;
mod table;

pub use builder::{EffectBuild, EffectBuilder, MethodEffects};
pub use diagnostics::EffectDiagnostic;
pub use effect_set::EffectSet;
pub use error::{GraphError, ResolveError};
pub use graph::{EffectsGraph, EffectsId};
pub use kind::EffectKind;
pub use resolver::{
    ExternalEffects, ExternalLookup, MethodState, NoExternalEffects, Resolution, Resolver,
};
pub use symbol_set::{Location, SymbolSet};
pub use table::MethodEffectTable;
