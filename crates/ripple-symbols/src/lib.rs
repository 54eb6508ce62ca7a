//! ripple-symbols: Method graph builder
//!
//! - Extract methods and forward call references from the program
//! - Compute backward references (called_by) and override relationships
//! - Validate bidirectionality of both relations
//! - Detect recursion groups (strongly connected components)
//!
//! # Example
//!
//! ```ignore
//! use ripple_symbols::build_method_graph;
//!
//! let result = build_method_graph(&program)?;
//! for (overridden, overriding) in result.graph.override_pairs() {
//!     println!("{overriding} overrides {overridden}");
//! }
//! ```

mod cycle;
mod error;
mod extractor;
mod graph;
mod hierarchy;
mod method;
mod resolver;

pub use cycle::CycleDetector;
pub use error::SymbolError;
pub use extractor::CallExtractor;
pub use graph::{InvariantStatus, MethodGraph, SymbolResult};
pub use hierarchy::TypeHierarchy;
pub use method::MethodInfo;
pub use resolver::{BackwardResolver, OverrideResolver};

use ripple_ir::{MethodKey, Program};
use tracing::debug;

/// Build the method graph for a program
///
/// # Returns
/// * `Ok(SymbolResult)` - Method graph with deferred (soft) errors
/// * `Err(Vec<SymbolError>)` - Hard errors that block analysis
pub fn build_method_graph(program: &Program) -> Result<SymbolResult, Vec<SymbolError>> {
    // Pass 1: Extract methods and forward references
    let (mut graph, mut all_errors) = CallExtractor::new().extract(program);

    let hard_errors: Vec<_> = all_errors
        .iter()
        .filter(|e| e.is_hard_error())
        .cloned()
        .collect();
    if !hard_errors.is_empty() {
        return Err(hard_errors);
    }

    // Pass 2: Backward references and overrides
    all_errors.extend(BackwardResolver::resolve(&mut graph));
    let (hierarchy, hierarchy_errors) = TypeHierarchy::build(program);
    all_errors.extend(hierarchy_errors);
    let overrides = OverrideResolver::resolve(&mut graph, &hierarchy);

    graph.invariants = InvariantStatus {
        calls_bidirectional: validate_calls(&graph),
        overrides_bidirectional: validate_overrides(&graph),
    };

    let recursion_groups: Vec<Vec<MethodKey>> = CycleDetector::method_cycles(&graph)
        .into_iter()
        .map(|group| {
            let mut keys: Vec<MethodKey> = group
                .into_iter()
                .filter_map(|id| graph.get(id).map(|m| m.key.clone()))
                .collect();
            keys.sort();
            keys
        })
        .collect();

    debug!(
        methods = graph.len(),
        overrides,
        recursion_groups = recursion_groups.len(),
        deferred = all_errors.len(),
        "method graph built"
    );

    let (deferred, hard): (Vec<_>, Vec<_>) =
        all_errors.into_iter().partition(|e| !e.is_hard_error());
    if !hard.is_empty() {
        return Err(hard);
    }

    Ok(SymbolResult {
        graph,
        hierarchy,
        recursion_groups,
        deferred_errors: deferred,
    })
}

/// If A calls B, B's called_by includes A
fn validate_calls(graph: &MethodGraph) -> bool {
    graph.iter().all(|method| {
        method.calls.iter().all(|callee_key| match graph.get_by_key(callee_key) {
            Some(callee) => callee.called_by.contains(&method.id),
            // Outside the program; tracked as unresolved instead
            None => method.unresolved_calls.contains(callee_key),
        })
    })
}

/// If B overrides A, A's overridden_by includes B, and vice versa
fn validate_overrides(graph: &MethodGraph) -> bool {
    graph.iter().all(|method| {
        method
            .overrides
            .iter()
            .all(|sup| graph.get(*sup).is_some_and(|s| s.overridden_by.contains(&method.id)))
            && method
                .overridden_by
                .iter()
                .all(|sub| graph.get(*sub).is_some_and(|s| s.overrides.contains(&method.id)))
    })
}
