//! Resolver: completes every method's effects after the builder walk
//!
//! 1. Override wiring: an overridden method depends on each override
//! 2. External resolution: callees outside the program get cached effects,
//!    or all effects when nothing trustworthy is cached
//! 3. Sweep: a method whose dependencies are all resolved is resolved and
//!    published to the [`MethodEffectTable`]
//! 4. Cycle breaking: recursion groups the sweep cannot finish are rebuilt
//!    from their children and resolved together, then the sweep resumes
//!
//! A method left unresolved after step 4 is a fatal error.

use crate::builder::{EffectBuild, MethodEffects};
use crate::{EffectDiagnostic, EffectSet, EffectsGraph, EffectsId, MethodEffectTable, ResolveError};
use ripple_ir::{MethodKey, NodeId};
use ripple_symbols::{CycleDetector, MethodGraph};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, trace};

type Result<T> = std::result::Result<T, ResolveError>;

/// Resolution state of a method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MethodState {
    Unresolved,
    /// Member of a recursion group being rebuilt from its children
    Resolving,
    Resolved,
}

/// Answer of an [`ExternalEffects`] source for one callee
#[derive(Debug, Clone, PartialEq)]
pub enum ExternalLookup {
    Found(EffectSet),
    Missing,
    /// Something was stored but cannot be trusted
    Rejected(String),
}

/// Source of effects for methods outside the program
pub trait ExternalEffects {
    fn lookup(&mut self, key: &MethodKey) -> ExternalLookup;
}

/// Knows nothing; every external callee gets all effects
pub struct NoExternalEffects;

impl ExternalEffects for NoExternalEffects {
    fn lookup(&mut self, _key: &MethodKey) -> ExternalLookup {
        ExternalLookup::Missing
    }
}

/// Fully resolved effects of one compilation job
#[derive(Debug)]
pub struct Resolution {
    pub graph: EffectsGraph,
    pub nodes: HashMap<NodeId, EffectsId>,
    pub methods: BTreeMap<MethodKey, MethodEffects>,
    pub externals: BTreeMap<MethodKey, EffectsId>,
    pub table: MethodEffectTable,
    pub states: BTreeMap<MethodKey, MethodState>,
    pub diagnostics: Vec<EffectDiagnostic>,
}

pub struct Resolver<'a> {
    build: EffectBuild,
    symbols: &'a MethodGraph,
    states: BTreeMap<MethodKey, MethodState>,
    /// Dependencies of each method that are not resolved yet
    remaining: BTreeMap<MethodKey, BTreeSet<MethodKey>>,
    dependents: HashMap<MethodKey, BTreeSet<MethodKey>>,
    ready: Vec<MethodKey>,
    table: MethodEffectTable,
}

impl<'a> Resolver<'a> {
    pub fn new(build: EffectBuild, symbols: &'a MethodGraph) -> Self {
        Self {
            build,
            symbols,
            states: BTreeMap::new(),
            remaining: BTreeMap::new(),
            dependents: HashMap::new(),
            ready: Vec::new(),
            table: MethodEffectTable::new(),
        }
    }

    pub fn resolve(mut self, external: &mut dyn ExternalEffects) -> Result<Resolution> {
        self.seed();
        self.wire_overrides()?;
        self.resolve_externals(external)?;
        self.sweep()?;
        self.break_cycles()?;
        self.finish()
    }

    /// Publish the resolution; any method not resolved by now is fatal
    fn finish(self) -> Result<Resolution> {
        let unresolved: Vec<MethodKey> = self
            .states
            .iter()
            .filter(|(_, state)| **state != MethodState::Resolved)
            .map(|(key, _)| key.clone())
            .collect();
        if !unresolved.is_empty() {
            return Err(ResolveError::UnresolvedMethods {
                methods: unresolved,
            });
        }

        debug!(
            methods = self.build.methods.len(),
            externals = self.build.externals.len(),
            "effects resolved"
        );
        Ok(Resolution {
            graph: self.build.graph,
            nodes: self.build.nodes,
            methods: self.build.methods,
            externals: self.build.externals,
            table: self.table,
            states: self.states,
            diagnostics: self.build.diagnostics,
        })
    }

    fn seed(&mut self) {
        for key in self.build.externals.keys() {
            self.states.insert(key.clone(), MethodState::Unresolved);
        }
        for key in self.build.methods.keys() {
            self.states.insert(key.clone(), MethodState::Unresolved);
        }

        let edges: Vec<(MethodKey, MethodKey)> = self
            .build
            .methods
            .iter()
            .flat_map(|(key, method)| {
                method
                    .callees
                    .iter()
                    .map(move |callee| (key.clone(), callee.clone()))
            })
            .collect();
        for key in self.build.methods.keys() {
            self.remaining.insert(key.clone(), BTreeSet::new());
        }
        for (dependent, dependency) in edges {
            self.add_edge(dependent, dependency);
        }
    }

    fn add_edge(&mut self, dependent: MethodKey, dependency: MethodKey) {
        self.dependents
            .entry(dependency.clone())
            .or_default()
            .insert(dependent.clone());
        self.remaining.entry(dependent).or_default().insert(dependency);
    }

    fn node_of(&self, key: &MethodKey) -> Result<EffectsId> {
        self.build
            .methods
            .get(key)
            .map(|method| method.node)
            .or_else(|| self.build.externals.get(key).copied())
            .ok_or_else(|| ResolveError::MissingMethod(key.clone()))
    }

    /// Step 1
    fn wire_overrides(&mut self) -> Result<()> {
        let symbols = self.symbols;
        for (overridden, overriding) in symbols.override_pairs() {
            let (Some(sup), Some(sub)) = (symbols.get(overridden), symbols.get(overriding)) else {
                continue;
            };
            trace!(overridden = %sup.key, overriding = %sub.key, "override edge");
            let sup_node = self.node_of(&sup.key)?;
            let sub_node = self.node_of(&sub.key)?;
            self.build.graph.add_dependency(sup_node, sub_node)?;
            self.add_edge(sup.key.clone(), sub.key.clone());
        }
        Ok(())
    }

    /// Step 2
    fn resolve_externals(&mut self, external: &mut dyn ExternalEffects) -> Result<()> {
        let externals: Vec<(MethodKey, EffectsId)> = self
            .build
            .externals
            .iter()
            .map(|(key, node)| (key.clone(), *node))
            .collect();

        for (key, placeholder) in externals {
            let effects = match external.lookup(&key) {
                ExternalLookup::Found(effects) => {
                    trace!(callee = %key, %effects, "external effects found");
                    effects
                }
                ExternalLookup::Missing => {
                    self.diagnose(EffectDiagnostic::UnknownCallee {
                        callee: key.clone(),
                    });
                    EffectSet::ALL_EFFECTS
                }
                ExternalLookup::Rejected(reason) => {
                    self.diagnose(EffectDiagnostic::CacheMismatch {
                        callee: key.clone(),
                        reason,
                    });
                    EffectSet::ALL_EFFECTS
                }
            };
            self.build.graph.set_effect_set(placeholder, effects)?;
            self.mark_resolved(&key)?;
        }
        Ok(())
    }

    /// Step 3
    fn sweep(&mut self) -> Result<()> {
        for (key, deps) in &self.remaining {
            if deps.is_empty() && self.states.get(key) == Some(&MethodState::Unresolved) {
                self.ready.push(key.clone());
            }
        }

        let mut resolved = 0usize;
        while let Some(key) = self.ready.pop() {
            if self.states.get(&key) == Some(&MethodState::Resolved) {
                continue;
            }
            self.mark_resolved(&key)?;
            resolved += 1;
        }
        trace!(resolved, "sweep finished");
        Ok(())
    }

    /// Step 4
    fn break_cycles(&mut self) -> Result<()> {
        let unresolved: Vec<MethodKey> = self
            .states
            .iter()
            .filter(|(_, state)| **state == MethodState::Unresolved)
            .map(|(key, _)| key.clone())
            .collect();
        if unresolved.is_empty() {
            return Ok(());
        }

        let position: HashMap<&MethodKey, usize> =
            unresolved.iter().enumerate().map(|(i, key)| (key, i)).collect();
        let successors = |i: usize| -> Vec<usize> {
            self.remaining
                .get(&unresolved[i])
                .map(|deps| deps.iter().filter_map(|d| position.get(d).copied()).collect())
                .unwrap_or_default()
        };
        let indices: Vec<usize> = (0..unresolved.len()).collect();
        let cycles: Vec<Vec<MethodKey>> = CycleDetector::cycles(&indices, successors)
            .into_iter()
            .map(|component| component.into_iter().map(|i| unresolved[i].clone()).collect())
            .collect();

        // Components arrive callees first, so each group's outside
        // dependencies are resolved by the time it is broken
        for members in cycles {
            if members
                .iter()
                .any(|key| self.states.get(key) != Some(&MethodState::Unresolved))
            {
                continue;
            }

            for key in &members {
                self.states.insert(key.clone(), MethodState::Resolving);
            }
            for key in &members {
                let node = self.node_of(key)?;
                self.build.graph.rebuild_from_children(node)?;
            }
            self.diagnose(EffectDiagnostic::CycleBroken {
                methods: members.clone(),
            });

            for key in &members {
                self.mark_resolved(key)?;
            }
            self.sweep()?;
        }
        Ok(())
    }

    /// Publish a method's final effects and release its dependents
    fn mark_resolved(&mut self, key: &MethodKey) -> Result<()> {
        let node = self.node_of(key)?;
        let effects = self.build.graph.computed(node)?.clone();
        self.states.insert(key.clone(), MethodState::Resolved);
        self.remaining.remove(key);
        self.table.insert(key.clone(), effects);

        if let Some(dependents) = self.dependents.get(key) {
            for dependent in dependents {
                let Some(deps) = self.remaining.get_mut(dependent) else {
                    continue;
                };
                deps.remove(key);
                if deps.is_empty() && self.states.get(dependent) == Some(&MethodState::Unresolved) {
                    self.ready.push(dependent.clone());
                }
            }
        }
        Ok(())
    }

    fn diagnose(&mut self, diagnostic: EffectDiagnostic) {
        debug!(code = diagnostic.code(), "{diagnostic}");
        self.build.diagnostics.push(diagnostic);
    }
}
