//! Resolved effects per method

use crate::EffectSet;
use ripple_ir::MethodKey;
use std::collections::HashMap;

/// Final effects of every resolved method, keyed by the stable signature
/// hash of its [`MethodKey`].
///
/// Values are plain lattice points detached from the effects graph. The
/// resolver fills the table; afterwards it is only read.
#[derive(Debug, Clone, Default)]
pub struct MethodEffectTable {
    entries: HashMap<u64, (MethodKey, EffectSet)>,
}

impl MethodEffectTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish the effects of a method, replacing any earlier value
    pub fn insert(&mut self, key: MethodKey, effects: EffectSet) {
        self.entries.insert(key.signature_hash(), (key, effects));
    }

    /// Look up by signature hash
    pub fn get(&self, signature_hash: u64) -> Option<(&MethodKey, &EffectSet)> {
        self.entries
            .get(&signature_hash)
            .map(|(key, effects)| (key, effects))
    }

    /// Look up by key; a hash collision with another key is a miss
    pub fn get_by_key(&self, key: &MethodKey) -> Option<&EffectSet> {
        self.entries
            .get(&key.signature_hash())
            .filter(|(stored, _)| stored == key)
            .map(|(_, effects)| effects)
    }

    pub fn contains(&self, key: &MethodKey) -> bool {
        self.get_by_key(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MethodKey, &EffectSet)> {
        self.entries.values().map(|(key, effects)| (key, effects))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_key_and_hash() {
        let key = MethodKey::new("Account", "deposit", &["int"]);
        let mut table = MethodEffectTable::new();
        table.insert(key.clone(), EffectSet::io());

        assert_eq!(table.get_by_key(&key), Some(&EffectSet::io()));
        let (stored, effects) = table.get(key.signature_hash()).unwrap();
        assert_eq!(stored, &key);
        assert!(effects.has_io());
        assert!(!table.contains(&MethodKey::new("Account", "deposit", &["long"])));
        assert_eq!(table.len(), 1);
    }
}
