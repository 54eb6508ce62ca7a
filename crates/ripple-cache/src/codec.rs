//! Conversion between effect sets and their cached form
//!
//! Variable ids are only meaningful inside one compilation, so escaping
//! variables are written as stable hashes of `owner#name` and mapped back
//! through a [`SymbolIndex`] of the reading program. A hash the reader does
//! not know widens the whole set to universal.

use crate::{CachedEffects, CachedSymbols};
use ripple_effects::{EffectKind, EffectSet, Location, SymbolSet};
use ripple_ir::hash::stable_hash;
use ripple_ir::{Program, VarId};
use std::collections::HashMap;

/// Stable hash standing for [`Location::ArrayElements`]
pub fn array_elements_hash() -> u64 {
    stable_hash("<array-elements>")
}

/// Escaping variables of a program by stable hash
#[derive(Debug, Clone, Default)]
pub struct SymbolIndex {
    by_hash: HashMap<u64, VarId>,
    array_hash: u64,
}

impl SymbolIndex {
    pub fn new(program: &Program) -> Self {
        let by_hash = program
            .variables
            .iter()
            .filter(|v| v.is_escaping())
            .map(|v| (v.stable_hash(), v.id))
            .collect();
        Self {
            by_hash,
            array_hash: array_elements_hash(),
        }
    }

    pub fn location(&self, hash: u64) -> Option<Location> {
        if hash == self.array_hash {
            return Some(Location::ArrayElements);
        }
        self.by_hash.get(&hash).map(|id| Location::Var(*id))
    }

    pub fn len(&self) -> usize {
        self.by_hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }
}

/// Encode the escaping part of `effects`; internal detail is dropped
pub fn encode(effects: &EffectSet, program: &Program) -> CachedEffects {
    let escaping = effects.drop_internal();
    CachedEffects {
        kinds: escaping.kinds().bits(),
        read_escaping: encode_symbols(escaping.read_escaping(), program),
        write_escaping: encode_symbols(escaping.write_escaping(), program),
    }
}

fn encode_symbols(symbols: &SymbolSet, program: &Program) -> CachedSymbols {
    if symbols.is_universal() {
        return CachedSymbols::Universal;
    }
    let mut hashes = Vec::new();
    for location in symbols.iter() {
        match location {
            Location::ArrayElements => hashes.push(array_elements_hash()),
            Location::Var(id) => match program.variable(*id) {
                Some(decl) => hashes.push(decl.stable_hash()),
                None => return CachedSymbols::Universal,
            },
        }
    }
    hashes.sort_unstable();
    CachedSymbols::Hashes(hashes)
}

/// Decode cached effects against the reading program
pub fn decode(cached: &CachedEffects, index: &SymbolIndex) -> EffectSet {
    let kinds = EffectKind::from_bits_truncate(cached.kinds) & EffectKind::ESCAPING_ONLY;
    EffectSet::from_parts(
        kinds,
        SymbolSet::EMPTY,
        SymbolSet::EMPTY,
        decode_symbols(&cached.read_escaping, index),
        decode_symbols(&cached.write_escaping, index),
    )
}

fn decode_symbols(cached: &CachedSymbols, index: &SymbolIndex) -> SymbolSet {
    match cached {
        CachedSymbols::Universal => SymbolSet::UNIVERSAL,
        CachedSymbols::Hashes(hashes) => {
            let mut symbols = SymbolSet::empty();
            for hash in hashes {
                match index.location(*hash) {
                    Some(location) => symbols.insert(location),
                    None => return SymbolSet::UNIVERSAL,
                }
            }
            symbols
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripple_ir::{ProgramBuilder, VarScope};

    #[test]
    fn unknown_hash_widens_to_universal() {
        let mut writer = ProgramBuilder::new();
        let field = writer.variable("Account", "balance", VarScope::Field);
        let writer = writer.finish();

        let effects = EffectSet::write(Location::Var(field), true);
        let cached = encode(&effects, &writer);

        // The reader has never heard of Account#balance
        let reader = ProgramBuilder::new().finish();
        let decoded = decode(&cached, &SymbolIndex::new(&reader));
        assert!(decoded.write_escaping().is_universal());
        assert_eq!(decoded.kinds(), EffectKind::WRITE_ESCAPING);
    }

    #[test]
    fn symbols_map_to_reader_ids() {
        let mut writer = ProgramBuilder::new();
        let field = writer.variable("Account", "balance", VarScope::Field);
        let writer = writer.finish();

        let mut reader = ProgramBuilder::new();
        reader.variable("Other", "x", VarScope::Static);
        let balance = reader.variable("Account", "balance", VarScope::Field);
        let reader = reader.finish();
        assert_ne!(field, balance);

        let effects = EffectSet::read(Location::Var(field), true)
            .union(&EffectSet::write(Location::ArrayElements, true));
        let decoded = decode(&encode(&effects, &writer), &SymbolIndex::new(&reader));
        assert!(decoded.read_escaping().contains(&Location::Var(balance)));
        assert!(decoded.write_escaping().contains(&Location::ArrayElements));
        assert_eq!(decoded.read_escaping().len(), Some(1));
    }
}
