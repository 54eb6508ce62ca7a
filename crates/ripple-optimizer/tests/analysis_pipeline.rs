//! Driver behavior: fatal errors, diagnostics and cache modes

use ripple_cache::{CacheEntry, EffectCache, InMemoryCache};
use ripple_effects::{EffectDiagnostic, EffectSet, MethodState};
use ripple_ir::{MethodKey, MethodKind, MethodModifiers, NodeId, Program, ProgramBuilder, VarScope};
use ripple_optimizer::{analyze, AnalysisError, AnalysisSettings, CacheMode};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn settings(cache: CacheMode) -> AnalysisSettings {
    AnalysisSettings {
        cache,
        emit_warnings: true,
    }
}

/// `App.main()` calls `Lib.helper()`, which lives outside the program
fn caller_of_external(declared_hash: Option<&str>) -> (Program, MethodKey, MethodKey, NodeId) {
    let mut b = ProgramBuilder::new();
    let main = MethodKey::new("App", "main", &[]);
    let helper = MethodKey::new("Lib", "helper", &[]);
    if let Some(hash) = declared_hash {
        b.external(helper.clone(), hash);
    }
    let call = b.call(helper.clone(), vec![]);
    let call_id = call.id;
    let stmt = b.expr_stmt(call);
    let body = b.block(vec![stmt]);
    b.method(main.clone(), MethodModifiers::concrete(), Some(body));
    (b.finish(), main, helper, call_id)
}

#[test]
fn duplicate_methods_abort_the_job() {
    init_tracing();
    let mut b = ProgramBuilder::new();
    let key = MethodKey::new("S", "m", &[]);
    let first = b.block(vec![]);
    b.method(key.clone(), MethodModifiers::concrete(), Some(first));
    let second = b.block(vec![]);
    b.method(key, MethodModifiers::concrete(), Some(second));

    let err = analyze(&b.finish(), &AnalysisSettings::default(), None).unwrap_err();
    let AnalysisError::Symbols(errors) = &err else {
        panic!("expected symbol errors, got {err}");
    };
    assert_eq!(errors[0].code(), "E-METHOD-001");
    assert!(err.to_string().contains("E-METHOD-001"));
}

#[test]
fn unknown_external_gets_all_effects() {
    init_tracing();
    let (program, main, helper, call_id) = caller_of_external(None);
    let analysis = analyze(&program, &settings(CacheMode::Disabled), None).unwrap();

    assert_eq!(analysis.effects_of_node(call_id), Some(&EffectSet::ALL_EFFECTS));
    assert_eq!(analysis.effects_of_method(&main), Some(&EffectSet::ALL_EFFECTS));
    assert_eq!(analysis.state_of(&helper), Some(MethodState::Resolved));
    assert!(analysis
        .diagnostics()
        .contains(&EffectDiagnostic::UnknownCallee { callee: helper }));
    assert_eq!(analysis.symbol_warnings()[0].code(), "E-METHOD-002");
}

#[test]
fn stale_cache_entry_is_a_mismatch() {
    init_tracing();
    let (program, main, helper, _) = caller_of_external(Some("current"));

    let mut cache = InMemoryCache::new();
    let mut entry = CacheEntry::new(
        helper.clone(),
        "previous",
        ripple_cache::encode(&EffectSet::NO_EFFECTS, &program),
    );
    cache.store(entry.signature_hash(), &entry).unwrap();

    let analysis = analyze(&program, &settings(CacheMode::ReadOnly), Some(&mut cache)).unwrap();
    assert_eq!(analysis.effects_of_method(&main), Some(&EffectSet::ALL_EFFECTS));
    assert!(analysis
        .diagnostics()
        .iter()
        .any(|d| matches!(d, EffectDiagnostic::CacheMismatch { callee, .. } if *callee == helper)));

    // Same entry with the declared hash is trusted
    entry.content_hash = "current".to_string();
    cache.store(entry.signature_hash(), &entry).unwrap();
    let analysis = analyze(&program, &settings(CacheMode::ReadOnly), Some(&mut cache)).unwrap();
    assert_eq!(analysis.effects_of_method(&main), Some(&EffectSet::NO_EFFECTS));
    assert!(analysis.diagnostics().is_empty());
}

#[test]
fn disabled_mode_ignores_the_cache() {
    let (program, main, helper, _) = caller_of_external(Some("current"));
    let mut cache = InMemoryCache::new();
    let entry = CacheEntry::new(
        helper,
        "current",
        ripple_cache::encode(&EffectSet::NO_EFFECTS, &program),
    );
    cache.store(entry.signature_hash(), &entry).unwrap();

    let analysis = analyze(&program, &settings(CacheMode::Disabled), Some(&mut cache)).unwrap();
    assert_eq!(analysis.effects_of_method(&main), Some(&EffectSet::ALL_EFFECTS));
    assert_eq!(cache.len().unwrap(), 1);
}

#[test]
fn native_and_cycle_diagnostics_are_reported() {
    init_tracing();
    let mut b = ProgramBuilder::new();
    let flag = b.variable("Io", "flag", VarScope::Static);
    let ping = MethodKey::new("Io", "ping", &[]);
    let pong = MethodKey::new("Io", "pong", &[]);
    let syscall = MethodKey::new("Io", "syscall", &[]);

    let value = b.int(1);
    let write = b.assign(flag, value);
    let write = b.expr_stmt(write);
    let call = b.call(pong.clone(), vec![]);
    let call = b.expr_stmt(call);
    let body = b.block(vec![write, call]);
    b.method(ping.clone(), MethodModifiers::concrete(), Some(body));

    let call = b.call(ping.clone(), vec![]);
    let call = b.expr_stmt(call);
    let body = b.block(vec![call]);
    b.method(pong.clone(), MethodModifiers::concrete(), Some(body));
    b.method(syscall, MethodModifiers::of(MethodKind::Native), None);

    let analysis = analyze(&b.finish(), &settings(CacheMode::Disabled), None).unwrap();
    let codes: Vec<&str> = analysis.diagnostics().iter().map(|d| d.code()).collect();
    assert!(codes.contains(&"W-EFFECT-001"));
    assert!(codes.contains(&"W-EFFECT-005"));
    assert_eq!(analysis.effects_of_method(&ping), analysis.effects_of_method(&pong));
    assert_eq!(analysis.recursion_groups(), &[vec![ping.clone(), pong.clone()]]);
    assert!(!analysis.effects_of_method(&ping).unwrap().has_io());
}
