//! Cycle detection for the method dependency graph
//!
//! Mutual and self recursion are legal in the source language, so cycles
//! are not errors here. They are reported so the effect resolver can break
//! them explicitly instead of waiting on a dependency that never completes.

use crate::MethodGraph;
use ripple_ir::MethodId;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Strongly-connected-component search (Tarjan, iterative)
pub struct CycleDetector;

struct Frame<N> {
    node: N,
    successors: Vec<N>,
    next: usize,
}

impl CycleDetector {
    /// All strongly connected components of the graph restricted to `nodes`.
    ///
    /// Components come out in reverse topological order: a component is
    /// emitted only after every component it can reach.
    pub fn strongly_connected<N, F, I>(nodes: &[N], successors: F) -> Vec<Vec<N>>
    where
        N: Copy + Eq + Hash,
        F: Fn(N) -> I,
        I: IntoIterator<Item = N>,
    {
        let members: HashSet<N> = nodes.iter().copied().collect();
        let mut index: HashMap<N, usize> = HashMap::new();
        let mut lowlink: HashMap<N, usize> = HashMap::new();
        let mut on_stack: HashSet<N> = HashSet::new();
        let mut stack: Vec<N> = Vec::new();
        let mut components = Vec::new();
        let mut counter = 0usize;

        let restricted = |node: N| -> Vec<N> {
            successors(node)
                .into_iter()
                .filter(|s| members.contains(s))
                .collect()
        };

        for &start in nodes {
            if index.contains_key(&start) {
                continue;
            }

            index.insert(start, counter);
            lowlink.insert(start, counter);
            counter += 1;
            stack.push(start);
            on_stack.insert(start);
            let mut frames = vec![Frame {
                node: start,
                successors: restricted(start),
                next: 0,
            }];

            while let Some(frame) = frames.last_mut() {
                let v = frame.node;
                if frame.next < frame.successors.len() {
                    let w = frame.successors[frame.next];
                    frame.next += 1;
                    if !index.contains_key(&w) {
                        index.insert(w, counter);
                        lowlink.insert(w, counter);
                        counter += 1;
                        stack.push(w);
                        on_stack.insert(w);
                        frames.push(Frame {
                            node: w,
                            successors: restricted(w),
                            next: 0,
                        });
                    } else if on_stack.contains(&w) {
                        let low = lowlink[&v].min(index[&w]);
                        lowlink.insert(v, low);
                    }
                    continue;
                }

                frames.pop();
                if lowlink[&v] == index[&v] {
                    let mut component = Vec::new();
                    while let Some(w) = stack.pop() {
                        on_stack.remove(&w);
                        component.push(w);
                        if w == v {
                            break;
                        }
                    }
                    components.push(component);
                }
                if let Some(parent) = frames.last() {
                    let low = lowlink[&parent.node].min(lowlink[&v]);
                    lowlink.insert(parent.node, low);
                }
            }
        }

        components
    }

    /// Components that are real cycles: more than one member, or a single
    /// member with an edge to itself
    pub fn cycles<N, F, I>(nodes: &[N], successors: F) -> Vec<Vec<N>>
    where
        N: Copy + Eq + Hash,
        F: Fn(N) -> I,
        I: IntoIterator<Item = N>,
    {
        Self::strongly_connected(nodes, &successors)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || successors(component[0])
                        .into_iter()
                        .any(|s| s == component[0])
            })
            .collect()
    }

    /// Recursion groups of the method graph. A method depends on its
    /// in-program callees and on the methods that override it.
    pub fn method_cycles(graph: &MethodGraph) -> Vec<Vec<MethodId>> {
        let nodes: Vec<MethodId> = graph.iter().map(|m| m.id).collect();
        Self::cycles(&nodes, |id| {
            graph
                .get(id)
                .map(|m| {
                    m.calls
                        .iter()
                        .filter_map(|key| graph.id_of(key))
                        .chain(m.overridden_by.iter().copied())
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edges(map: &[(u32, &[u32])]) -> HashMap<u32, Vec<u32>> {
        map.iter().map(|(k, v)| (*k, v.to_vec())).collect()
    }

    #[test]
    fn test_no_cycle() {
        let graph = edges(&[(0, &[1]), (1, &[2]), (2, &[])]);
        let nodes = [0, 1, 2];
        let sccs = CycleDetector::strongly_connected(&nodes, |n| graph[&n].clone());
        assert_eq!(sccs.len(), 3);
        // Reverse topological: the sink comes first
        assert_eq!(sccs[0], vec![2]);
        assert!(CycleDetector::cycles(&nodes, |n| graph[&n].clone()).is_empty());
    }

    #[test]
    fn test_self_recursion_is_a_cycle() {
        let graph = edges(&[(0, &[0]), (1, &[0])]);
        let cycles = CycleDetector::cycles(&[0, 1], |n| graph[&n].clone());
        assert_eq!(cycles, vec![vec![0]]);
    }

    #[test]
    fn test_two_node_cycle() {
        let graph = edges(&[(0, &[1]), (1, &[0])]);
        let cycles = CycleDetector::cycles(&[0, 1], |n| graph[&n].clone());
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].len(), 2);
    }

    #[test]
    fn test_three_node_cycle_with_tail() {
        let graph = edges(&[(0, &[1]), (1, &[2]), (2, &[0, 3]), (3, &[])]);
        let cycles = CycleDetector::cycles(&[0, 1, 2, 3], |n| graph[&n].clone());
        assert_eq!(cycles.len(), 1);
        let mut members = cycles[0].clone();
        members.sort();
        assert_eq!(members, vec![0, 1, 2]);
    }

    #[test]
    fn test_successors_outside_node_set_are_ignored() {
        let graph = edges(&[(0, &[1, 9]), (1, &[0])]);
        let cycles = CycleDetector::cycles(&[0, 1], |n| graph[&n].clone());
        assert_eq!(cycles.len(), 1);
    }

    #[test]
    fn test_long_chain_does_not_overflow() {
        let n = 50_000u32;
        let nodes: Vec<u32> = (0..n).collect();
        let sccs = CycleDetector::strongly_connected(&nodes, |i| {
            if i + 1 < n {
                vec![i + 1]
            } else {
                vec![0]
            }
        });
        assert_eq!(sccs.len(), 1);
        assert_eq!(sccs[0].len(), n as usize);
    }
}
