//! Ripple IR - the program representation the effect analysis consumes
//!
//! This crate defines the statement/expression tree, variable and method
//! declarations, node identities, and the stable keys and content hashes
//! that tie analysis results to methods across compilations.

mod builder;
mod decl;
mod expr;
mod fingerprint;
pub mod hash;
mod ids;
mod program;
mod span;
mod stmt;
pub mod visit;

pub use builder::ProgramBuilder;
pub use decl::*;
pub use expr::*;
pub use ids::*;
pub use program::Program;
pub use span::*;
pub use stmt::*;
pub use visit::Visitor;
