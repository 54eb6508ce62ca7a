//! The incrementally updated effects graph
//!
//! Every statement, expression, block and method owns one node in an arena.
//! A node pairs its own (direct) effects with the computed effects of
//! everything it depends on. Edges are plain handle pairs kept in both
//! directions, so cycles from mutual recursion need no special ownership.
//!
//! Updates take one of two paths:
//! - additive changes bubble up as unions, without touching siblings
//! - changes that remove information make each dependent rebuild from its
//!   children, at most once per update

use crate::{EffectSet, GraphError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::fmt;
use std::mem;

/// Handle of a node in an [`EffectsGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EffectsId(u32);

impl EffectsId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EffectsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct EffectsNode {
    direct: EffectSet,
    computed: EffectSet,
    depends_on: BTreeSet<EffectsId>,
    depended_on_by: BTreeSet<EffectsId>,
    severed: bool,
}

/// Arena of effects nodes
#[derive(Debug, Clone, Default)]
pub struct EffectsGraph {
    nodes: Vec<EffectsNode>,
}

type Result<T> = std::result::Result<T, GraphError>;

impl EffectsGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes ever created, severed ones included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Handles of all nodes that have not been severed
    pub fn live_nodes(&self) -> impl Iterator<Item = EffectsId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| !node.severed)
            .map(|(index, _)| EffectsId(index as u32))
    }

    fn node(&self, id: EffectsId) -> Result<&EffectsNode> {
        let node = self
            .nodes
            .get(id.index())
            .ok_or(GraphError::UnknownNode(id))?;
        if node.severed {
            return Err(GraphError::SeveredNode(id));
        }
        Ok(node)
    }

    fn node_mut(&mut self, id: EffectsId) -> Result<&mut EffectsNode> {
        let node = self
            .nodes
            .get_mut(id.index())
            .ok_or(GraphError::UnknownNode(id))?;
        if node.severed {
            return Err(GraphError::SeveredNode(id));
        }
        Ok(node)
    }

    /// Create a node whose computed effects are `direct` plus the computed
    /// effects of every child
    pub fn create(&mut self, direct: EffectSet, children: &[EffectsId]) -> Result<EffectsId> {
        let mut computed = direct.clone();
        for &child in children {
            computed = computed.union(&self.node(child)?.computed);
        }

        let id = EffectsId(self.nodes.len() as u32);
        self.nodes.push(EffectsNode {
            direct,
            computed,
            depends_on: children.iter().copied().collect(),
            depended_on_by: BTreeSet::new(),
            severed: false,
        });
        for &child in children {
            self.nodes[child.index()].depended_on_by.insert(id);
        }
        Ok(id)
    }

    /// Create a node without children
    pub fn leaf(&mut self, direct: EffectSet) -> EffectsId {
        let id = EffectsId(self.nodes.len() as u32);
        self.nodes.push(EffectsNode {
            computed: direct.clone(),
            direct,
            depends_on: BTreeSet::new(),
            depended_on_by: BTreeSet::new(),
            severed: false,
        });
        id
    }

    pub fn direct(&self, id: EffectsId) -> Result<&EffectSet> {
        Ok(&self.node(id)?.direct)
    }

    pub fn computed(&self, id: EffectsId) -> Result<&EffectSet> {
        Ok(&self.node(id)?.computed)
    }

    pub fn depends_on(&self, id: EffectsId) -> Result<&BTreeSet<EffectsId>> {
        Ok(&self.node(id)?.depends_on)
    }

    pub fn depended_on_by(&self, id: EffectsId) -> Result<&BTreeSet<EffectsId>> {
        Ok(&self.node(id)?.depended_on_by)
    }

    pub fn is_severed(&self, id: EffectsId) -> bool {
        self.nodes.get(id.index()).is_some_and(|node| node.severed)
    }

    /// Add an edge after creation and fold the dependency's effects in
    pub fn add_dependency(&mut self, dependent: EffectsId, dependency: EffectsId) -> Result<()> {
        let value = self.node(dependency)?.computed.clone();
        if !self.node_mut(dependent)?.depends_on.insert(dependency) {
            return Ok(());
        }
        self.nodes[dependency.index()].depended_on_by.insert(dependent);

        let merged = self.node(dependent)?.computed.union(&value);
        self.set_effect_set(dependent, merged)
    }

    /// Replace the computed effects of a node and propagate the change to
    /// everything that depends on it
    pub fn set_effect_set(&mut self, id: EffectsId, new: EffectSet) -> Result<()> {
        let node = self.node_mut(id)?;
        if node.computed == new {
            return Ok(());
        }
        let additive = new.contains(&node.computed);
        node.computed = new;

        if node.depended_on_by.is_empty() {
            return Ok(());
        }
        if additive {
            self.propagate_union(id)
        } else {
            self.propagate_rebuild(id)
        }
    }

    /// Fast path: union the new value into dependents until nothing grows
    fn propagate_union(&mut self, origin: EffectsId) -> Result<()> {
        let mut worklist = vec![origin];
        while let Some(changed) = worklist.pop() {
            let node = self.node(changed)?;
            let value = node.computed.clone();
            let dependents: Vec<EffectsId> = node.depended_on_by.iter().copied().collect();

            for dependent in dependents {
                let node = self.node_mut(dependent)?;
                let merged = node.computed.union(&value);
                if merged != node.computed {
                    node.computed = merged;
                    worklist.push(dependent);
                }
            }
        }
        Ok(())
    }

    /// Slow path: every dependent rebuilds from its children. A rebuild that
    /// turns out additive continues on the fast path.
    fn propagate_rebuild(&mut self, origin: EffectsId) -> Result<()> {
        let mut visited = HashSet::from([origin]);
        let mut worklist: VecDeque<EffectsId> =
            self.node(origin)?.depended_on_by.iter().copied().collect();

        while let Some(id) = worklist.pop_front() {
            if !visited.insert(id) {
                continue;
            }
            let rebuilt = self.recompute(id)?;
            let node = self.node_mut(id)?;
            if rebuilt == node.computed {
                continue;
            }
            let additive = rebuilt.contains(&node.computed);
            node.computed = rebuilt;

            if additive {
                self.propagate_union(id)?;
            } else {
                worklist.extend(node.depended_on_by.iter().copied());
            }
        }
        Ok(())
    }

    /// `direct ∪ children.computed` from current child values
    fn recompute(&self, id: EffectsId) -> Result<EffectSet> {
        let node = self.node(id)?;
        let mut value = node.direct.clone();
        for &child in &node.depends_on {
            value = value.union(&self.node(child)?.computed);
        }
        Ok(value)
    }

    fn is_stale(&self, id: EffectsId) -> Result<bool> {
        Ok(self.recompute(id)? != self.node(id)?.computed)
    }

    /// Recompute a node from its children, first rebuilding any stale
    /// children. Each node is visited at most once, so cycle edges use the
    /// child's current value.
    pub fn rebuild_from_children(&mut self, id: EffectsId) -> Result<()> {
        self.node(id)?;

        let mut visited = HashSet::new();
        let mut order = Vec::new();
        let mut stack = vec![(id, false)];
        while let Some((current, expanded)) = stack.pop() {
            if expanded {
                order.push(current);
                continue;
            }
            if !visited.insert(current) {
                continue;
            }
            stack.push((current, true));
            for &child in &self.node(current)?.depends_on {
                if !visited.contains(&child) && self.is_stale(child)? {
                    stack.push((child, false));
                }
            }
        }

        // Children before parents
        for current in order {
            let rebuilt = self.recompute(current)?;
            self.set_effect_set(current, rebuilt)?;
        }
        Ok(())
    }

    /// Move every edge of `source` onto `target` and sever `source`.
    ///
    /// Former dependents of `source` are rebuilt against `target`, which may
    /// shrink them if `source` held a more pessimistic value.
    pub fn reparent(&mut self, source: EffectsId, target: EffectsId) -> Result<()> {
        if source == target {
            return Ok(());
        }
        self.node(target)?;
        let node = self.node_mut(source)?;
        let dependents = mem::take(&mut node.depended_on_by);
        let children = mem::take(&mut node.depends_on);
        node.severed = true;
        node.computed = EffectSet::NO_EFFECTS;

        for &child in &children {
            self.nodes[child.index()].depended_on_by.remove(&source);
            if child != target {
                self.nodes[child.index()].depended_on_by.insert(target);
                self.nodes[target.index()].depends_on.insert(child);
            }
        }
        for &dependent in &dependents {
            self.nodes[dependent.index()].depends_on.remove(&source);
            if dependent != target {
                self.nodes[dependent.index()].depends_on.insert(target);
                self.nodes[target.index()].depended_on_by.insert(dependent);
            }
        }

        self.rebuild_from_children(target)?;
        for dependent in dependents {
            if dependent != target {
                self.rebuild_from_children(dependent)?;
            }
        }
        Ok(())
    }

    /// Check the structural invariants: every edge has its back edge, no
    /// live node links to a severed one, and computed effects contain the
    /// direct effects and every child's computed effects
    pub fn verify(&self) -> Result<()> {
        for (index, node) in self.nodes.iter().enumerate() {
            let id = EffectsId(index as u32);
            if node.severed {
                if let Some(&other) = node.depends_on.iter().chain(&node.depended_on_by).next() {
                    return Err(GraphError::BrokenEdge { from: id, to: other });
                }
                continue;
            }
            if !node.computed.contains(&node.direct) {
                return Err(GraphError::UnsoundNode(id));
            }

            for &child in &node.depends_on {
                let child_node = self.node(child)?;
                if !child_node.depended_on_by.contains(&id) {
                    return Err(GraphError::BrokenEdge { from: id, to: child });
                }
                if !node.computed.contains(&child_node.computed) {
                    return Err(GraphError::UnsoundNode(id));
                }
            }
            for &parent in &node.depended_on_by {
                if !self.node(parent)?.depends_on.contains(&id) {
                    return Err(GraphError::BrokenEdge { from: parent, to: id });
                }
            }
        }
        Ok(())
    }
}
