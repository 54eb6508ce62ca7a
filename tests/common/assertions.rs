use ripple::effects::{EffectSet, Location};
use ripple::ir::{MethodKey, VarId};
use ripple::EffectAnalysis;

/// Assert the method's effects and return them
pub fn assert_method_effects<'a>(analysis: &'a EffectAnalysis, key: &MethodKey) -> &'a EffectSet {
    analysis
        .effects_of_method(key)
        .unwrap_or_else(|| panic!("no effects recorded for {key}"))
}

/// Assert `var` is the only escaping location written, with no IO or
/// exceptions
pub fn assert_writes_only(effects: &EffectSet, var: VarId) {
    let location = Location::Var(var);
    assert!(
        effects.write_escaping().contains(&location),
        "expected a write of {location} in {effects}"
    );
    assert_eq!(effects.write_escaping().len(), Some(1), "{effects}");
    assert!(!effects.has_io(), "unexpected IO in {effects}");
    assert!(!effects.may_throw(), "unexpected exception in {effects}");
}

pub fn assert_has_code(analysis: &EffectAnalysis, code: &str) {
    assert!(
        analysis.diagnostics().iter().any(|d| d.code() == code),
        "expected diagnostic {code}, got {:?}",
        analysis.diagnostics()
    );
}
