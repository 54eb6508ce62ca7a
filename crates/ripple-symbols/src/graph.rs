//! Method graph data structure

use crate::{MethodInfo, SymbolError};
use ripple_ir::{MethodId, MethodKey};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Status of invariant validations
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct InvariantStatus {
    /// If A calls B (in-program), B's called_by includes A
    pub calls_bidirectional: bool,
    /// If B overrides A, A's overridden_by includes B
    pub overrides_bidirectional: bool,
}

/// The method symbol graph for a program
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MethodGraph {
    /// All methods indexed by numeric ID
    methods: Vec<MethodInfo>,

    /// Key to ID mapping for lookup
    by_key: HashMap<MethodKey, MethodId>,

    /// Validated invariants
    pub invariants: InvariantStatus,
}

impl MethodGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a method by ID
    pub fn get(&self, id: MethodId) -> Option<&MethodInfo> {
        let index = self.index_of(id)?;
        self.methods.get(index)
    }

    /// Get a mutable method by ID
    pub fn get_mut(&mut self, id: MethodId) -> Option<&mut MethodInfo> {
        let index = self.index_of(id)?;
        self.methods.get_mut(index)
    }

    fn index_of(&self, id: MethodId) -> Option<usize> {
        let dense = id.0 as usize;
        if self.methods.get(dense).is_some_and(|m| m.id == id) {
            return Some(dense);
        }
        // Ids shift only after a rejected duplicate
        self.methods.iter().position(|m| m.id == id)
    }

    pub fn get_by_key(&self, key: &MethodKey) -> Option<&MethodInfo> {
        self.id_of(key).and_then(|id| self.get(id))
    }

    /// Get the ID for a method key
    pub fn id_of(&self, key: &MethodKey) -> Option<MethodId> {
        self.by_key.get(key).copied()
    }

    pub fn contains(&self, key: &MethodKey) -> bool {
        self.by_key.contains_key(key)
    }

    /// Insert a method, returning error if its key is already taken
    pub fn insert(&mut self, method: MethodInfo) -> Result<MethodId, SymbolError> {
        if self.by_key.contains_key(&method.key) {
            return Err(SymbolError::DuplicateMethod {
                key: method.key.clone(),
                span: method.span,
            });
        }

        let id = method.id;
        self.by_key.insert(method.key.clone(), id);
        self.methods.push(method);
        Ok(id)
    }

    /// Iterate over all methods
    pub fn iter(&self) -> impl Iterator<Item = &MethodInfo> {
        self.methods.iter()
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Get callers of a method (by key)
    pub fn callers_of(&self, key: &MethodKey) -> Vec<MethodKey> {
        self.get_by_key(key)
            .map(|m| {
                m.called_by
                    .iter()
                    .filter_map(|id| self.get(*id).map(|caller| caller.key.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All (overridden, overriding) pairs
    pub fn override_pairs(&self) -> Vec<(MethodId, MethodId)> {
        let mut pairs: Vec<_> = self
            .methods
            .iter()
            .flat_map(|m| m.overridden_by.iter().map(move |sub| (m.id, *sub)))
            .collect();
        pairs.sort();
        pairs
    }

    /// Collect all methods with calls outside the program
    pub fn unresolved_methods(&self) -> Vec<&MethodInfo> {
        self.methods.iter().filter(|m| m.has_unresolved()).collect()
    }
}

/// Result of method graph building
#[derive(Debug)]
pub struct SymbolResult {
    /// The built method graph
    pub graph: crate::MethodGraph,
    /// The type hierarchy used for override discovery
    pub hierarchy: crate::TypeHierarchy,
    /// Methods that reach themselves through calls or overrides
    pub recursion_groups: Vec<Vec<MethodKey>>,
    /// Soft errors (calls outside the program, unknown supertypes)
    pub deferred_errors: Vec<SymbolError>,
}
