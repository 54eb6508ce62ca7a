//! Analysis driver and the read-only query surface for rewrite passes

use crate::{AnalysisError, AnalysisSettings};
use ripple_cache::{CacheEntry, CachedLookup, EffectCache};
use ripple_effects::{
    EffectBuilder, EffectDiagnostic, EffectKind, EffectSet, Location, MethodEffectTable,
    MethodState, NoExternalEffects, Resolution, Resolver,
};
use ripple_ir::{MethodKey, NodeId, Program};
use ripple_symbols::{build_method_graph, SymbolError};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Run the side-effect analysis for one compilation job
///
/// # Arguments
/// * `program` - The whole program being compiled
/// * `settings` - Cache usage and warning settings
/// * `cache` - Persistent effect cache; ignored when the cache mode is disabled
///
/// # Returns
/// An `EffectAnalysis` holding resolved effects for every node and method,
/// or the first error that makes the results unsound
pub fn analyze(
    program: &Program,
    settings: &AnalysisSettings,
    mut cache: Option<&mut dyn EffectCache>,
) -> Result<EffectAnalysis, AnalysisError> {
    let symbols = build_method_graph(program)?;
    for group in &symbols.recursion_groups {
        debug!(methods = ?group, "recursion group");
    }
    let build = EffectBuilder::new(program).build()?;
    debug!(
        nodes = build.nodes.len(),
        methods = build.methods.len(),
        externals = build.externals.len(),
        "effects graph built"
    );

    let resolver = Resolver::new(build, &symbols.graph);
    let resolution = match cache.as_deref() {
        Some(cache) if settings.cache.reads() => {
            let mut lookup = CachedLookup::new(cache, program);
            let resolution = resolver.resolve(&mut lookup)?;
            debug!(hits = lookup.hits(), "external callees answered from cache");
            resolution
        }
        _ => resolver.resolve(&mut NoExternalEffects)?,
    };
    resolution.graph.verify()?;

    if settings.cache.writes() {
        if let Some(cache) = cache.as_deref_mut() {
            let stored = persist(program, &resolution, cache)?;
            cache.compact()?;
            debug!(stored, "method effects written to cache");
        }
    }

    let analysis = EffectAnalysis {
        resolution,
        recursion_groups: symbols.recursion_groups,
        symbol_warnings: symbols.deferred_errors,
    };
    if settings.emit_warnings {
        analysis.log_warnings();
    }
    info!(
        methods = analysis.method_table().len(),
        diagnostics = analysis.diagnostics().len(),
        "effect analysis finished"
    );
    Ok(analysis)
}

/// Store the escaping effects of every method declared in `program`
fn persist(
    program: &Program,
    resolution: &Resolution,
    cache: &mut dyn EffectCache,
) -> Result<usize, AnalysisError> {
    let mut stored = 0;
    for (key, method) in &resolution.methods {
        let (Some(decl), Some(effects)) = (
            program.method(method.id),
            resolution.table.get_by_key(key),
        ) else {
            continue;
        };
        let entry = CacheEntry::for_method(decl, effects, program);
        cache.store(entry.signature_hash(), &entry)?;
        stored += 1;
    }
    Ok(stored)
}

/// Resolved effects of one compilation job.
///
/// Read-only once returned from [`analyze`]; dropped at the end of the job.
#[derive(Debug)]
pub struct EffectAnalysis {
    resolution: Resolution,
    recursion_groups: Vec<Vec<MethodKey>>,
    symbol_warnings: Vec<SymbolError>,
}

impl EffectAnalysis {
    /// Effects of a statement, expression or block
    pub fn effects_of_node(&self, node: NodeId) -> Option<&EffectSet> {
        let id = self.resolution.nodes.get(&node)?;
        self.resolution.graph.computed(*id).ok()
    }

    /// Effects of a method, in the program or resolved as external
    pub fn effects_of_method(&self, key: &MethodKey) -> Option<&EffectSet> {
        self.resolution.table.get_by_key(key)
    }

    pub fn method_table(&self) -> &MethodEffectTable {
        &self.resolution.table
    }

    pub fn state_of(&self, key: &MethodKey) -> Option<MethodState> {
        self.resolution.states.get(key).copied()
    }

    /// Precision-loss events recorded while building and resolving
    pub fn diagnostics(&self) -> &[EffectDiagnostic] {
        &self.resolution.diagnostics
    }

    /// Methods that reach themselves through calls or overrides, each
    /// group sorted by key
    pub fn recursion_groups(&self) -> &[Vec<MethodKey>] {
        &self.recursion_groups
    }

    /// Soft errors from method graph building
    pub fn symbol_warnings(&self) -> &[SymbolError] {
        &self.symbol_warnings
    }

    /// Evaluating the node twice is indistinguishable from evaluating it once
    pub fn is_duplicable(&self, node: NodeId) -> bool {
        self.effects_of_node(node)
            .is_some_and(|effects| effects.is_read_only())
    }

    /// The node can be evaluated once before a loop instead of on every
    /// iteration: it only reads, and nothing in the loop body writes what it
    /// reads, throws or performs IO
    pub fn is_hoistable(&self, node: NodeId, loop_body: NodeId) -> bool {
        match (self.effects_of_node(node), self.effects_of_node(loop_body)) {
            (Some(effects), Some(body)) => {
                effects.is_read_only() && !effects.interferes_with(body)
            }
            _ => false,
        }
    }

    /// Deleting the node is unobservable outside the method. Writes to
    /// locals are allowed; the caller decides whether those locals are dead.
    pub fn is_removable(&self, node: NodeId) -> bool {
        self.effects_of_node(node).is_some_and(|effects| {
            !effects
                .kinds()
                .intersects(EffectKind::WRITE_ESCAPING | EffectKind::EXCEPTION | EffectKind::IO)
        })
    }

    /// The two nodes may be evaluated in either order
    pub fn can_reorder(&self, a: NodeId, b: NodeId) -> bool {
        match (self.effects_of_node(a), self.effects_of_node(b)) {
            (Some(a), Some(b)) => !a.interferes_with(b),
            _ => false,
        }
    }

    /// Serializable per-method report, symbols named against `program`
    pub fn summary(&self, program: &Program) -> AnalysisSummary {
        let mut methods: Vec<MethodSummary> = self
            .resolution
            .table
            .iter()
            .map(|(key, effects)| MethodSummary {
                key: key.to_string(),
                kinds: effects
                    .kinds()
                    .names()
                    .into_iter()
                    .map(String::from)
                    .collect(),
                reads_escaping: symbol_names(effects.read_escaping(), program),
                writes_escaping: symbol_names(effects.write_escaping(), program),
            })
            .collect();
        methods.sort_by(|a, b| a.key.cmp(&b.key));

        AnalysisSummary {
            methods,
            recursion_groups: self
                .recursion_groups
                .iter()
                .map(|group| group.iter().map(|key| key.to_string()).collect())
                .collect(),
            diagnostics: self.diagnostics().len(),
        }
    }

    fn log_warnings(&self) {
        for diagnostic in self.diagnostics() {
            warn!(code = diagnostic.code(), "{diagnostic}");
        }
        for error in &self.symbol_warnings {
            warn!(code = error.code(), "{error}");
        }
    }
}

fn symbol_names(symbols: &ripple_effects::SymbolSet, program: &Program) -> Vec<String> {
    if symbols.is_universal() {
        return vec!["*".to_string()];
    }
    symbols
        .iter()
        .map(|location| match location {
            Location::Var(id) => program
                .variable(*id)
                .map(|decl| decl.stable_name())
                .unwrap_or_else(|| location.to_string()),
            Location::ArrayElements => location.to_string(),
        })
        .collect()
}

/// Report of an analysis job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisSummary {
    pub methods: Vec<MethodSummary>,
    pub recursion_groups: Vec<Vec<String>>,
    /// Number of precision-loss diagnostics
    pub diagnostics: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodSummary {
    pub key: String,
    pub kinds: Vec<String>,
    pub reads_escaping: Vec<String>,
    pub writes_escaping: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CacheMode;
    use ripple_cache::InMemoryCache;
    use ripple_ir::{MethodModifiers, ProgramBuilder, VarScope};

    fn settings(cache: CacheMode) -> AnalysisSettings {
        AnalysisSettings {
            cache,
            emit_warnings: false,
        }
    }

    #[test]
    fn loop_invariant_read_is_hoistable() {
        let mut b = ProgramBuilder::new();
        let limit = b.variable("Loop", "limit", VarScope::Field);
        let total = b.variable("Loop.run", "total", VarScope::Local);

        let invariant = b.read(limit);
        let invariant_id = invariant.id;
        let let_stmt = b.let_stmt(total, Some(invariant));
        let one = b.int(1);
        let bump = b.assign(total, one);
        let bump_id = bump.id;
        let bump_stmt = b.expr_stmt(bump);
        let body = b.block(vec![let_stmt, bump_stmt]);
        let body_id = body.id;
        let condition = b.read(total);
        let loop_stmt = b.while_stmt(condition, body);
        let method_body = b.block(vec![loop_stmt]);
        b.method(MethodKey::new("Loop", "run", &[]), MethodModifiers::concrete(), Some(method_body));

        let program = b.finish();
        let analysis = analyze(&program, &settings(CacheMode::Disabled), None).unwrap();
        assert!(analysis.is_duplicable(invariant_id));
        assert!(analysis.is_hoistable(invariant_id, body_id));
        assert!(!analysis.is_duplicable(bump_id));
        assert!(analysis.is_removable(bump_id));
        assert!(analysis.can_reorder(invariant_id, bump_id));
    }

    #[test]
    fn read_is_not_hoisted_past_a_write_of_the_same_field() {
        let mut b = ProgramBuilder::new();
        let counter = b.variable("Loop", "counter", VarScope::Static);

        let read = b.read(counter);
        let read_id = read.id;
        let read_stmt = b.expr_stmt(read);
        let zero = b.int(0);
        let write = b.assign(counter, zero);
        let write_id = write.id;
        let write_stmt = b.expr_stmt(write);
        let body = b.block(vec![read_stmt, write_stmt]);
        let body_id = body.id;
        let condition = b.int(1);
        let loop_stmt = b.while_stmt(condition, body);
        let method_body = b.block(vec![loop_stmt]);
        b.method(MethodKey::new("Loop", "spin", &[]), MethodModifiers::concrete(), Some(method_body));

        let program = b.finish();
        let analysis = analyze(&program, &settings(CacheMode::Disabled), None).unwrap();
        assert!(!analysis.is_hoistable(read_id, body_id));
        assert!(!analysis.can_reorder(read_id, write_id));
        assert!(!analysis.is_removable(write_id));
    }

    #[test]
    fn allocation_with_side_effecting_constructor_is_kept() {
        let mut b = ProgramBuilder::new();
        let init = MethodKey::new("Logger", "<init>", &[]);
        let open = b.io("open_file", vec![]);
        let stmt = b.expr_stmt(open);
        let body = b.block(vec![stmt]);
        let mut modifiers = MethodModifiers::concrete();
        modifiers.is_constructor = true;
        b.method(init.clone(), modifiers, Some(body));

        let alloc = b.new_object(init, vec![]);
        let alloc_id = alloc.id;
        let stmt = b.expr_stmt(alloc);
        let body = b.block(vec![stmt]);
        let main = MethodKey::new("App", "main", &[]);
        b.method(main.clone(), MethodModifiers::concrete(), Some(body));

        let program = b.finish();
        let analysis = analyze(&program, &settings(CacheMode::Disabled), None).unwrap();
        assert!(analysis.effects_of_node(alloc_id).unwrap().has_io());
        assert!(!analysis.is_removable(alloc_id));
        assert!(!analysis.is_duplicable(alloc_id));
        assert!(analysis.effects_of_method(&main).unwrap().has_io());
    }

    #[test]
    fn unknown_nodes_answer_conservatively() {
        let program = ProgramBuilder::new().finish();
        let analysis = analyze(&program, &settings(CacheMode::Disabled), None).unwrap();
        let missing = NodeId(4242);
        assert!(analysis.effects_of_node(missing).is_none());
        assert!(!analysis.is_duplicable(missing));
        assert!(!analysis.is_removable(missing));
        assert!(!analysis.can_reorder(missing, missing));
    }

    #[test]
    fn read_write_mode_persists_methods() {
        let mut b = ProgramBuilder::new();
        let out = b.io("print", vec![]);
        let stmt = b.expr_stmt(out);
        let body = b.block(vec![stmt]);
        let key = MethodKey::new("Log", "emit", &[]);
        b.method(key.clone(), MethodModifiers::concrete(), Some(body));
        let program = b.finish();

        let mut cache = InMemoryCache::new();
        analyze(&program, &settings(CacheMode::ReadOnly), Some(&mut cache)).unwrap();
        assert!(cache.is_empty().unwrap());

        analyze(&program, &settings(CacheMode::ReadWrite), Some(&mut cache)).unwrap();
        let entry = cache.lookup(key.signature_hash()).unwrap().unwrap();
        assert_eq!(entry.key, key);
        assert_eq!(entry.effects.kinds, EffectKind::IO.bits());
    }

    #[test]
    fn summary_names_escaping_symbols() {
        let mut b = ProgramBuilder::new();
        let balance = b.variable("Account", "balance", VarScope::Field);
        let value = b.int(0);
        let write = b.assign(balance, value);
        let stmt = b.expr_stmt(write);
        let body = b.block(vec![stmt]);
        b.method(MethodKey::new("Account", "reset", &[]), MethodModifiers::concrete(), Some(body));
        let program = b.finish();

        let analysis = analyze(&program, &settings(CacheMode::Disabled), None).unwrap();
        let summary = analysis.summary(&program);
        assert_eq!(summary.methods.len(), 1);
        assert_eq!(summary.methods[0].kinds, vec!["WriteEscaping"]);
        assert_eq!(summary.methods[0].writes_escaping, vec!["Account#balance"]);
        assert!(summary.methods[0].reads_escaping.is_empty());
    }
}
