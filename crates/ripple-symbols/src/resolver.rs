//! Pass 2: Backward reference and override resolution
//!
//! Computes called_by from forward call references, and the
//! overrides/overridden_by relation from names, signatures and the type
//! hierarchy.

use crate::{MethodGraph, SymbolError, TypeHierarchy};
use ripple_ir::{MethodId, MethodKey};
use std::collections::{BTreeMap, HashSet};
use tracing::trace;

/// Resolves backward call references (Pass 2)
pub struct BackwardResolver;

impl BackwardResolver {
    /// Compute called_by for all methods; calls to keys outside the program
    /// are recorded as unresolved and reported as soft errors
    pub fn resolve(graph: &mut MethodGraph) -> Vec<SymbolError> {
        let mut errors = Vec::new();

        // Collect first to avoid borrow issues
        let forwards: Vec<(MethodId, MethodKey, HashSet<MethodKey>, ripple_ir::Span)> = graph
            .iter()
            .map(|m| (m.id, m.key.clone(), m.calls.clone(), m.span))
            .collect();

        for (caller_id, caller_key, calls, span) in forwards {
            for callee_key in &calls {
                if let Some(callee_id) = graph.id_of(callee_key) {
                    if let Some(callee) = graph.get_mut(callee_id) {
                        callee.called_by.insert(caller_id);
                    }
                } else {
                    if let Some(caller) = graph.get_mut(caller_id) {
                        caller.unresolved_calls.insert(callee_key.clone());
                    }
                    errors.push(SymbolError::UnresolvedCall {
                        callee: callee_key.clone(),
                        caller: caller_key.clone(),
                        span,
                    });
                }
            }
        }

        errors
    }
}

/// Discovers override relationships between in-program methods
pub struct OverrideResolver;

impl OverrideResolver {
    /// `sub` overrides `sup` when both are virtual, share name and parameter
    /// list, and `sub`'s declaring type is a strict subtype of `sup`'s.
    /// Returns the number of (overridden, overriding) pairs found.
    pub fn resolve(graph: &mut MethodGraph, hierarchy: &TypeHierarchy) -> usize {
        // Group virtual methods by signature; BTreeMap keeps discovery order stable
        let mut by_signature: BTreeMap<(String, Vec<String>), Vec<(MethodId, String)>> =
            BTreeMap::new();
        for method in graph.iter().filter(|m| m.modifiers.is_virtual()) {
            by_signature
                .entry((method.key.name.clone(), method.key.params.clone()))
                .or_default()
                .push((method.id, method.key.declaring_type.clone()));
        }

        let mut pairs = Vec::new();
        for candidates in by_signature.values() {
            for (sup_id, sup_type) in candidates {
                for (sub_id, sub_type) in candidates {
                    if hierarchy.is_strict_subtype(sub_type, sup_type) {
                        pairs.push((*sup_id, *sub_id));
                    }
                }
            }
        }

        for (sup, sub) in &pairs {
            trace!(overridden = %sup, overriding = %sub, "override");
            if let Some(sup_info) = graph.get_mut(*sup) {
                sup_info.overridden_by.insert(*sub);
            }
            if let Some(sub_info) = graph.get_mut(*sub) {
                sub_info.overrides.insert(*sup);
            }
        }

        pairs.len()
    }
}
