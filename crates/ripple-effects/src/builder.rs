//! Effect builder: one bottom-up walk over every method body
//!
//! Each statement, expression and block gets an effects node whose direct
//! effects follow from its kind and whose children are its sub-nodes. A call
//! site depends on the callee's method node. When the callee has not been
//! walked yet (forward reference, recursion, or a method outside the
//! program) the call depends on a placeholder, which is reparented onto the
//! real method node once that exists.

use crate::{EffectDiagnostic, EffectSet, EffectsGraph, EffectsId, GraphError, Location};
use ripple_ir::{
    AssignTarget, Block, Expr, ExprKind, MethodDecl, MethodId, MethodKey, MethodKind, NodeId,
    Program, Span, Stmt, StmtKind, VarId,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::mem;
use tracing::{debug, trace};

type Result<T> = std::result::Result<T, GraphError>;

/// Effects node and callees of one in-program method
#[derive(Debug, Clone)]
pub struct MethodEffects {
    pub id: MethodId,
    pub node: EffectsId,
    pub kind: MethodKind,
    /// Every method the body calls
    pub callees: BTreeSet<MethodKey>,
}

/// Output of the builder walk
#[derive(Debug, Default)]
pub struct EffectBuild {
    pub graph: EffectsGraph,
    /// Effects node of every statement, expression and block
    pub nodes: HashMap<NodeId, EffectsId>,
    pub methods: BTreeMap<MethodKey, MethodEffects>,
    /// Placeholder nodes for callees that are not part of the program
    pub externals: BTreeMap<MethodKey, EffectsId>,
    pub diagnostics: Vec<EffectDiagnostic>,
}

pub struct EffectBuilder<'p> {
    program: &'p Program,
    build: EffectBuild,
    placeholders: HashMap<MethodKey, EffectsId>,
    current: Option<MethodKey>,
    callees: BTreeSet<MethodKey>,
}

impl<'p> EffectBuilder<'p> {
    pub fn new(program: &'p Program) -> Self {
        Self {
            program,
            build: EffectBuild::default(),
            placeholders: HashMap::new(),
            current: None,
            callees: BTreeSet::new(),
        }
    }

    /// Walk every method of the program
    pub fn build(mut self) -> Result<EffectBuild> {
        let program = self.program;
        for decl in &program.methods {
            self.method(decl)?;
        }

        // Whatever is still a placeholder was never declared in the program
        self.build.externals = self.placeholders.drain().collect();
        debug!(
            methods = self.build.methods.len(),
            externals = self.build.externals.len(),
            nodes = self.build.graph.len(),
            "effect graph built"
        );
        Ok(self.build)
    }

    fn method(&mut self, decl: &MethodDecl) -> Result<()> {
        if self.build.methods.contains_key(&decl.key) {
            debug!(method = %decl.key, "skipping duplicate method");
            return Ok(());
        }
        self.current = Some(decl.key.clone());

        let node = match (decl.kind(), &decl.body) {
            (MethodKind::Abstract, _) => self.build.graph.leaf(EffectSet::NO_EFFECTS),
            (MethodKind::Concrete, Some(body)) => {
                let body = self.block(body)?;
                self.build.graph.create(EffectSet::NO_EFFECTS, &[body])?
            }
            (MethodKind::Native, _) | (MethodKind::Concrete, None) => {
                self.diagnose(EffectDiagnostic::NativeMethod {
                    method: decl.key.clone(),
                    span: decl.span,
                });
                self.build.graph.leaf(EffectSet::ALL_EFFECTS)
            }
        };

        if let Some(placeholder) = self.placeholders.remove(&decl.key) {
            trace!(method = %decl.key, "resolving forward reference");
            self.build.graph.reparent(placeholder, node)?;
        }

        self.build.methods.insert(
            decl.key.clone(),
            MethodEffects {
                id: decl.id,
                node,
                kind: decl.kind(),
                callees: mem::take(&mut self.callees),
            },
        );
        self.current = None;
        Ok(())
    }

    // ===== Statements =====

    fn block(&mut self, block: &Block) -> Result<EffectsId> {
        let children = block
            .statements
            .iter()
            .map(|stmt| self.stmt(stmt))
            .collect::<Result<Vec<_>>>()?;
        self.record(block.id, EffectSet::NO_EFFECTS, &children)
    }

    fn stmt(&mut self, stmt: &Stmt) -> Result<EffectsId> {
        let (direct, children) = match &stmt.kind {
            StmtKind::Block(block) => (EffectSet::NO_EFFECTS, vec![self.block(block)?]),

            StmtKind::Let { var, init } => match init {
                Some(init) => (
                    self.write_var(*var, stmt.id, stmt.span),
                    vec![self.expr(init)?],
                ),
                None => (EffectSet::NO_EFFECTS, vec![]),
            },

            StmtKind::Expr(expr) => (EffectSet::NO_EFFECTS, vec![self.expr(expr)?]),

            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let mut children = vec![self.expr(condition)?, self.block(then_branch)?];
                if let Some(else_branch) = else_branch {
                    children.push(self.block(else_branch)?);
                }
                (EffectSet::NO_EFFECTS, children)
            }

            StmtKind::While { condition, body } => (
                EffectSet::NO_EFFECTS,
                vec![self.expr(condition)?, self.block(body)?],
            ),

            StmtKind::Return(value) => {
                let children = value
                    .iter()
                    .map(|expr| self.expr(expr))
                    .collect::<Result<Vec<_>>>()?;
                (EffectSet::NO_EFFECTS, children)
            }

            StmtKind::Throw(value) => (EffectSet::exception(), vec![self.expr(value)?]),

            StmtKind::Try {
                body,
                catches,
                finally,
            } => {
                // Caught exceptions still count: the catch body runs instead
                let mut direct = EffectSet::NO_EFFECTS;
                let mut children = vec![self.block(body)?];
                for catch in catches {
                    direct = direct.union(&self.write_var(catch.var, stmt.id, catch.span));
                    children.push(self.block(&catch.body)?);
                }
                if let Some(finally) = finally {
                    children.push(self.block(finally)?);
                }
                (direct, children)
            }

            StmtKind::Break | StmtKind::Continue => (EffectSet::NO_EFFECTS, vec![]),
        };

        self.record(stmt.id, direct, &children)
    }

    // ===== Expressions =====

    fn expr(&mut self, expr: &Expr) -> Result<EffectsId> {
        let (direct, children) = match &expr.kind {
            ExprKind::Literal(_) => (EffectSet::NO_EFFECTS, vec![]),

            ExprKind::Var(var) => (self.read_var(*var, expr.id, expr.span), vec![]),

            ExprKind::Field { object, field } => (
                self.read_var(*field, expr.id, expr.span),
                vec![self.expr(object)?],
            ),

            ExprKind::Index { array, index } => (
                EffectSet::read(Location::ArrayElements, true),
                vec![self.expr(array)?, self.expr(index)?],
            ),

            ExprKind::Assign { target, value } => {
                let (direct, mut children) = self.assign_target(target, expr)?;
                children.push(self.expr(value)?);
                (direct, children)
            }

            ExprKind::Binary { left, right, .. } => (
                EffectSet::NO_EFFECTS,
                vec![self.expr(left)?, self.expr(right)?],
            ),

            ExprKind::Unary { operand, .. } => (EffectSet::NO_EFFECTS, vec![self.expr(operand)?]),

            ExprKind::Call {
                callee,
                receiver,
                args,
            } => {
                let mut children = Vec::with_capacity(args.len() + 2);
                if let Some(receiver) = receiver {
                    children.push(self.expr(receiver)?);
                }
                for arg in args {
                    children.push(self.expr(arg)?);
                }
                children.push(self.callee_node(callee));
                self.callees.insert(callee.clone());
                (EffectSet::NO_EFFECTS, children)
            }

            ExprKind::New {
                constructor, args, ..
            } => {
                let mut children = self.exprs(args)?;
                if let Some(constructor) = constructor {
                    children.push(self.callee_node(constructor));
                    self.callees.insert(constructor.clone());
                }
                (EffectSet::NO_EFFECTS, children)
            }

            ExprKind::Conditional {
                condition,
                then_expr,
                else_expr,
            } => (
                EffectSet::NO_EFFECTS,
                vec![
                    self.expr(condition)?,
                    self.expr(then_expr)?,
                    self.expr(else_expr)?,
                ],
            ),

            // The body may run at any later point, so its effects are
            // charged to the expression that creates the closure
            ExprKind::Lambda { captures, body } => {
                let mut direct = EffectSet::NO_EFFECTS;
                for capture in captures {
                    direct = direct.union(&self.read_var(*capture, expr.id, expr.span));
                }
                (direct, vec![self.block(body)?])
            }

            ExprKind::Io { args, .. } => (EffectSet::io(), self.exprs(args)?),

            ExprKind::Unresolved { name, children } => {
                self.unresolved(name, expr.id, expr.span);
                (EffectSet::read_anything(), self.exprs(children)?)
            }
        };

        self.record(expr.id, direct, &children)
    }

    fn exprs(&mut self, exprs: &[Expr]) -> Result<Vec<EffectsId>> {
        exprs.iter().map(|expr| self.expr(expr)).collect()
    }

    /// Direct effects and child nodes of the left-hand side of `assign`
    fn assign_target(
        &mut self,
        target: &AssignTarget,
        assign: &Expr,
    ) -> Result<(EffectSet, Vec<EffectsId>)> {
        Ok(match target {
            AssignTarget::Var(var) => (self.write_var(*var, assign.id, assign.span), vec![]),
            AssignTarget::Field { object, field } => (
                self.write_var(*field, assign.id, assign.span),
                vec![self.expr(object)?],
            ),
            AssignTarget::Index { array, index } => (
                EffectSet::write(Location::ArrayElements, true),
                vec![self.expr(array)?, self.expr(index)?],
            ),
            AssignTarget::Unresolved(target) => {
                // An unresolved node reports itself when walked
                if !matches!(target.kind, ExprKind::Unresolved { .. }) {
                    self.unresolved("assignment target", assign.id, assign.span);
                }
                (EffectSet::write_anything(), vec![self.expr(target)?])
            }
        })
    }

    // ===== Helpers =====

    fn record(&mut self, id: NodeId, direct: EffectSet, children: &[EffectsId]) -> Result<EffectsId> {
        let node = self.build.graph.create(direct, children)?;
        self.build.nodes.insert(id, node);
        Ok(node)
    }

    fn callee_node(&mut self, callee: &MethodKey) -> EffectsId {
        if let Some(method) = self.build.methods.get(callee) {
            return method.node;
        }
        if let Some(&placeholder) = self.placeholders.get(callee) {
            return placeholder;
        }
        let placeholder = self.build.graph.leaf(EffectSet::NO_EFFECTS);
        self.placeholders.insert(callee.clone(), placeholder);
        placeholder
    }

    fn read_var(&mut self, var: VarId, node: NodeId, span: Span) -> EffectSet {
        match self.program.variable(var) {
            Some(decl) => EffectSet::read(Location::Var(var), decl.is_escaping()),
            None => {
                self.unresolved(&var.to_string(), node, span);
                EffectSet::read_anything()
            }
        }
    }

    fn write_var(&mut self, var: VarId, node: NodeId, span: Span) -> EffectSet {
        match self.program.variable(var) {
            Some(decl) => EffectSet::write(Location::Var(var), decl.is_escaping()),
            None => {
                self.unresolved(&var.to_string(), node, span);
                EffectSet::write_anything()
            }
        }
    }

    fn unresolved(&mut self, name: &str, node: NodeId, span: Span) {
        let method = self.current.clone().unwrap_or_else(|| MethodKey::new("", "", &[]));
        self.diagnose(EffectDiagnostic::UnresolvedTarget {
            method,
            name: name.to_string(),
            node,
            span,
        });
    }

    fn diagnose(&mut self, diagnostic: EffectDiagnostic) {
        debug!(code = diagnostic.code(), "{diagnostic}");
        self.build.diagnostics.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EffectKind;
    use ripple_ir::{MethodModifiers, ProgramBuilder, VarScope};

    fn key(name: &str) -> MethodKey {
        MethodKey::new("A", name, &[])
    }

    #[test]
    fn local_and_field_writes() {
        let mut b = ProgramBuilder::new();
        let x = b.variable("A.f", "x", VarScope::Local);
        let count = b.variable("A", "count", VarScope::Field);

        let one = b.int(1);
        let let_x = b.let_stmt(x, Some(one));
        let read_x = b.read(x);
        let store = b.assign(count, read_x);
        let store_id = store.id;
        let store_stmt = b.expr_stmt(store);
        let body = b.block(vec![let_x, store_stmt]);
        b.method(key("f"), MethodModifiers::concrete(), Some(body));

        let program = b.finish();
        let build = EffectBuilder::new(&program).build().unwrap();

        let store = build.graph.computed(build.nodes[&store_id]).unwrap();
        assert_eq!(
            store.kinds(),
            EffectKind::WRITE_ESCAPING | EffectKind::READ_INTERNAL
        );

        let method = build.graph.computed(build.methods[&key("f")].node).unwrap();
        assert!(method.write_internal().contains(&Location::Var(x)));
        assert!(method.write_escaping().contains(&Location::Var(count)));
        assert!(build.diagnostics.is_empty());
    }

    #[test]
    fn forward_reference_is_reparented() {
        let mut b = ProgramBuilder::new();
        let call = b.call(key("g"), vec![]);
        let call_id = call.id;
        let stmt = b.expr_stmt(call);
        let body = b.block(vec![stmt]);
        b.method(key("f"), MethodModifiers::concrete(), Some(body));

        let io = b.io("print", vec![]);
        let stmt = b.expr_stmt(io);
        let body = b.block(vec![stmt]);
        b.method(key("g"), MethodModifiers::concrete(), Some(body));

        let program = b.finish();
        let build = EffectBuilder::new(&program).build().unwrap();

        assert!(build.externals.is_empty());
        let call_node = build.nodes[&call_id];
        assert!(build.graph.computed(call_node).unwrap().has_io());
        assert!(build
            .graph
            .depends_on(call_node)
            .unwrap()
            .contains(&build.methods[&key("g")].node));
        assert!(build.methods[&key("f")].callees.contains(&key("g")));
        build.graph.verify().unwrap();
    }

    #[test]
    fn unknown_callee_stays_placeholder() {
        let mut b = ProgramBuilder::new();
        let ext = MethodKey::new("Lib", "run", &[]);
        let call = b.call(ext.clone(), vec![]);
        let stmt = b.expr_stmt(call);
        let body = b.block(vec![stmt]);
        b.method(key("f"), MethodModifiers::concrete(), Some(body));

        let program = b.finish();
        let build = EffectBuilder::new(&program).build().unwrap();
        assert!(build.externals.contains_key(&ext));
        assert!(build.graph.computed(build.externals[&ext]).unwrap().is_pure());
    }

    #[test]
    fn native_and_abstract_methods() {
        let mut b = ProgramBuilder::new();
        b.method(key("n"), MethodModifiers::of(MethodKind::Native), None);
        b.method(key("a"), MethodModifiers::of(MethodKind::Abstract), None);

        let program = b.finish();
        let build = EffectBuilder::new(&program).build().unwrap();
        assert_eq!(
            build.graph.computed(build.methods[&key("n")].node).unwrap(),
            &EffectSet::ALL_EFFECTS
        );
        assert!(build.graph.computed(build.methods[&key("a")].node).unwrap().is_pure());
        assert_eq!(build.diagnostics.len(), 1);
        assert_eq!(build.diagnostics[0].code(), "W-EFFECT-001");
    }

    #[test]
    fn unresolved_assignment_writes_everything() {
        let mut b = ProgramBuilder::new();
        let target = b.unresolved("mystery", vec![]);
        let value = b.int(3);
        let assign = b.assign_to(AssignTarget::Unresolved(Box::new(target)), value);
        let assign_id = assign.id;
        let stmt = b.expr_stmt(assign);
        let body = b.block(vec![stmt]);
        b.method(key("f"), MethodModifiers::concrete(), Some(body));

        let program = b.finish();
        let build = EffectBuilder::new(&program).build().unwrap();
        let effects = build.graph.computed(build.nodes[&assign_id]).unwrap();
        assert!(effects.write_escaping().is_universal());
        assert!(effects.write_internal().is_universal());
        assert!(effects.read_escaping().is_universal());
        assert!(effects.read_internal().is_universal());
        assert_eq!(build.diagnostics.len(), 1);
    }

    #[test]
    fn unresolved_read_may_read_locals() {
        let mut b = ProgramBuilder::new();
        let x = b.variable("A.f", "x", VarScope::Local);
        let one = b.int(1);
        let let_x = b.let_stmt(x, Some(one));
        let mystery = b.unresolved("x", vec![]);
        let mystery_id = mystery.id;
        let stmt = b.expr_stmt(mystery);
        let body = b.block(vec![let_x, stmt]);
        b.method(key("f"), MethodModifiers::concrete(), Some(body));

        let program = b.finish();
        let build = EffectBuilder::new(&program).build().unwrap();
        let effects = build.graph.computed(build.nodes[&mystery_id]).unwrap();
        assert!(effects.read_internal().contains(&Location::Var(x)));
        assert!(effects.read_escaping().is_universal());
        assert!(effects.all_writes().is_empty());
        assert_eq!(effects.kinds(), EffectKind::READS);
    }

    #[test]
    fn constructor_effects_reach_allocation() {
        let mut b = ProgramBuilder::new();
        let init = MethodKey::new("Logger", "<init>", &[]);
        let open = b.io("open_file", vec![]);
        let stmt = b.expr_stmt(open);
        let body = b.block(vec![stmt]);
        let mut modifiers = MethodModifiers::concrete();
        modifiers.is_constructor = true;
        b.method(init.clone(), modifiers, Some(body));

        let alloc = b.new_object(init.clone(), vec![]);
        let alloc_id = alloc.id;
        let stmt = b.expr_stmt(alloc);
        let body = b.block(vec![stmt]);
        b.method(key("main"), MethodModifiers::concrete(), Some(body));

        let program = b.finish();
        let build = EffectBuilder::new(&program).build().unwrap();
        let effects = build.graph.computed(build.nodes[&alloc_id]).unwrap();
        assert!(effects.has_io());
        assert!(build.methods[&key("main")].callees.contains(&init));
        build.graph.verify().unwrap();
    }

    #[test]
    fn array_allocation_has_no_constructor() {
        let mut b = ProgramBuilder::new();
        let n = b.int(4);
        let alloc = b.new_array("int", n);
        let alloc_id = alloc.id;
        let stmt = b.expr_stmt(alloc);
        let body = b.block(vec![stmt]);
        b.method(key("f"), MethodModifiers::concrete(), Some(body));

        let program = b.finish();
        let build = EffectBuilder::new(&program).build().unwrap();
        assert!(build.graph.computed(build.nodes[&alloc_id]).unwrap().is_pure());
        assert!(build.externals.is_empty());
    }

    #[test]
    fn array_elements_are_one_location() {
        let mut b = ProgramBuilder::new();
        let items = b.variable("A.f", "items", VarScope::Local);
        let i = b.variable("A.f", "i", VarScope::Local);

        let arr = b.read(items);
        let idx = b.read(i);
        let value = b.int(0);
        let store = b.assign_index(arr, idx, value);
        let store_id = store.id;
        let stmt = b.expr_stmt(store);
        let body = b.block(vec![stmt]);
        b.method(key("f"), MethodModifiers::concrete(), Some(body));

        let program = b.finish();
        let build = EffectBuilder::new(&program).build().unwrap();
        let effects = build.graph.computed(build.nodes[&store_id]).unwrap();
        assert!(effects.write_escaping().contains(&Location::ArrayElements));
        assert!(effects.read_internal().contains(&Location::Var(items)));
        assert!(effects.read_internal().contains(&Location::Var(i)));
    }

    #[test]
    fn try_catch_writes_catch_variable() {
        let mut b = ProgramBuilder::new();
        let e = b.variable("A.f", "e", VarScope::Local);
        let value = b.int(1);
        let throw = b.throw(value);
        let body = b.block(vec![throw]);
        let handler = b.block(vec![]);
        let try_stmt = b.try_stmt(body, vec![(e, handler)], None);
        let try_id = try_stmt.id;
        let body = b.block(vec![try_stmt]);
        b.method(key("f"), MethodModifiers::concrete(), Some(body));

        let program = b.finish();
        let build = EffectBuilder::new(&program).build().unwrap();
        let effects = build.graph.computed(build.nodes[&try_id]).unwrap();
        assert!(effects.may_throw());
        assert!(effects.write_internal().contains(&Location::Var(e)));
    }
}
