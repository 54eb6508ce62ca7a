//! Pass 1: Method extraction and forward call references

use crate::{MethodGraph, MethodInfo, SymbolError};
use ripple_ir::visit::{walk_expr, Visitor};
use ripple_ir::{Expr, ExprKind, MethodKey, Program};
use std::collections::HashSet;

/// Extracts methods and the calls their bodies make (Pass 1)
pub struct CallExtractor {
    errors: Vec<SymbolError>,
}

impl CallExtractor {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Extract all methods of the program into a method graph
    pub fn extract(mut self, program: &Program) -> (MethodGraph, Vec<SymbolError>) {
        let mut graph = MethodGraph::new();

        for decl in &program.methods {
            let mut info = MethodInfo::new(decl);
            if let Some(body) = &decl.body {
                let mut calls = CallCollector::default();
                calls.visit_block(body);
                info.calls = calls.calls;
            }
            if let Err(e) = graph.insert(info) {
                self.errors.push(e);
            }
        }

        (graph, self.errors)
    }
}

impl Default for CallExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct CallCollector {
    calls: HashSet<MethodKey>,
}

impl Visitor for CallCollector {
    fn visit_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Call { callee, .. } => {
                self.calls.insert(callee.clone());
            }
            ExprKind::New {
                constructor: Some(constructor),
                ..
            } => {
                self.calls.insert(constructor.clone());
            }
            _ => {}
        }
        walk_expr(self, expr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripple_ir::{MethodModifiers, ProgramBuilder};

    #[test]
    fn collects_nested_calls() {
        let mut builder = ProgramBuilder::new();
        let g = MethodKey::new("A", "g", &[]);
        let h = MethodKey::new("A", "h", &["int"]);

        let inner = builder.call(h.clone(), vec![]);
        let outer = builder.call(g.clone(), vec![inner]);
        let stmt = builder.expr_stmt(outer);
        let body = builder.block(vec![stmt]);
        builder.method(MethodKey::new("A", "f", &[]), MethodModifiers::concrete(), Some(body));

        let (graph, errors) = CallExtractor::new().extract(&builder.finish());
        assert!(errors.is_empty());
        let f = graph.get_by_key(&MethodKey::new("A", "f", &[])).unwrap();
        assert_eq!(f.calls, HashSet::from([g, h]));
    }

    #[test]
    fn duplicate_key_is_reported() {
        let mut builder = ProgramBuilder::new();
        let key = MethodKey::new("A", "f", &[]);
        let b1 = builder.block(vec![]);
        let b2 = builder.block(vec![]);
        builder.method(key.clone(), MethodModifiers::concrete(), Some(b1));
        builder.method(key, MethodModifiers::concrete(), Some(b2));

        let (graph, errors) = CallExtractor::new().extract(&builder.finish());
        assert_eq!(graph.len(), 1);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].is_hard_error());
    }
}
