//! Per-method symbol information

use ripple_ir::{MethodDecl, MethodId, MethodKey, MethodKind, MethodModifiers, Span};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Information about a method extracted from the program
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodInfo {
    pub id: MethodId,
    pub key: MethodKey,
    pub modifiers: MethodModifiers,
    pub span: Span,

    // === Forward References (Pass 1) ===
    /// Methods this method calls, by key
    pub calls: HashSet<MethodKey>,

    // === Backward References (Pass 2) ===
    /// In-program methods that call this method
    pub called_by: HashSet<MethodId>,

    /// Methods this method overrides
    pub overrides: HashSet<MethodId>,

    /// Methods that override this method
    pub overridden_by: HashSet<MethodId>,

    // === Resolution State ===
    /// Calls to keys with no declaration in the program
    pub unresolved_calls: HashSet<MethodKey>,
}

impl MethodInfo {
    pub fn new(decl: &MethodDecl) -> Self {
        Self {
            id: decl.id,
            key: decl.key.clone(),
            modifiers: decl.modifiers,
            span: decl.span,
            calls: HashSet::new(),
            called_by: HashSet::new(),
            overrides: HashSet::new(),
            overridden_by: HashSet::new(),
            unresolved_calls: HashSet::new(),
        }
    }

    pub fn kind(&self) -> MethodKind {
        self.modifiers.kind
    }

    pub fn has_unresolved(&self) -> bool {
        !self.unresolved_calls.is_empty()
    }
}
