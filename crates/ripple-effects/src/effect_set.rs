//! The effect lattice value
//!
//! An [`EffectSet`] records which kinds of effect occur plus the precise
//! locations read and written, split into internal and escaping locations.
//! Sets only ever grow under [`EffectSet::union`]; `NO_EFFECTS` and
//! `ALL_EFFECTS` are the bottom and top of the lattice.

use crate::{EffectKind, Location, SymbolSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An immutable lattice point describing the effects of some code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectSet {
    kinds: EffectKind,
    read_internal: SymbolSet,
    write_internal: SymbolSet,
    read_escaping: SymbolSet,
    write_escaping: SymbolSet,
}

impl Default for EffectSet {
    fn default() -> Self {
        Self::NO_EFFECTS
    }
}

impl EffectSet {
    pub const NO_EFFECTS: EffectSet = EffectSet {
        kinds: EffectKind::empty(),
        read_internal: SymbolSet::EMPTY,
        write_internal: SymbolSet::EMPTY,
        read_escaping: SymbolSet::EMPTY,
        write_escaping: SymbolSet::EMPTY,
    };

    pub const ALL_EFFECTS: EffectSet = EffectSet {
        kinds: EffectKind::all(),
        read_internal: SymbolSet::UNIVERSAL,
        write_internal: SymbolSet::UNIVERSAL,
        read_escaping: SymbolSet::UNIVERSAL,
        write_escaping: SymbolSet::UNIVERSAL,
    };

    /// Build a set from parts, setting the kind bit of every non-empty
    /// symbol set
    pub fn from_parts(
        kinds: EffectKind,
        read_internal: SymbolSet,
        write_internal: SymbolSet,
        read_escaping: SymbolSet,
        write_escaping: SymbolSet,
    ) -> Self {
        let mut kinds = kinds;
        for (set, kind) in [
            (&read_internal, EffectKind::READ_INTERNAL),
            (&write_internal, EffectKind::WRITE_INTERNAL),
            (&read_escaping, EffectKind::READ_ESCAPING),
            (&write_escaping, EffectKind::WRITE_ESCAPING),
        ] {
            if !set.is_empty() {
                kinds |= kind;
            }
        }
        Self {
            kinds,
            read_internal,
            write_internal,
            read_escaping,
            write_escaping,
        }
    }

    /// Read through a symbol that could denote any location, local or not
    pub fn read_anything() -> Self {
        Self::from_parts(
            EffectKind::empty(),
            SymbolSet::UNIVERSAL,
            SymbolSet::EMPTY,
            SymbolSet::UNIVERSAL,
            SymbolSet::EMPTY,
        )
    }

    /// Write through a symbol that could denote any location, local or not
    pub fn write_anything() -> Self {
        Self::from_parts(
            EffectKind::empty(),
            SymbolSet::EMPTY,
            SymbolSet::UNIVERSAL,
            SymbolSet::EMPTY,
            SymbolSet::UNIVERSAL,
        )
    }

    /// Read of one location
    pub fn read(location: Location, escaping: bool) -> Self {
        Self::reads(SymbolSet::singleton(location), escaping)
    }

    /// Write of one location
    pub fn write(location: Location, escaping: bool) -> Self {
        Self::writes(SymbolSet::singleton(location), escaping)
    }

    /// Read of every location in `symbols`
    pub fn reads(symbols: SymbolSet, escaping: bool) -> Self {
        if escaping {
            Self::from_parts(EffectKind::empty(), SymbolSet::EMPTY, SymbolSet::EMPTY, symbols, SymbolSet::EMPTY)
        } else {
            Self::from_parts(EffectKind::empty(), symbols, SymbolSet::EMPTY, SymbolSet::EMPTY, SymbolSet::EMPTY)
        }
    }

    /// Write of every location in `symbols`
    pub fn writes(symbols: SymbolSet, escaping: bool) -> Self {
        if escaping {
            Self::from_parts(EffectKind::empty(), SymbolSet::EMPTY, SymbolSet::EMPTY, SymbolSet::EMPTY, symbols)
        } else {
            Self::from_parts(EffectKind::empty(), SymbolSet::EMPTY, symbols, SymbolSet::EMPTY, SymbolSet::EMPTY)
        }
    }

    pub fn exception() -> Self {
        Self::of_kinds(EffectKind::EXCEPTION)
    }

    pub fn io() -> Self {
        Self::of_kinds(EffectKind::IO)
    }

    /// Exception and IO kinds only; read/write kinds carry no symbols here
    /// and are ignored
    fn of_kinds(kinds: EffectKind) -> Self {
        Self {
            kinds: kinds & (EffectKind::EXCEPTION | EffectKind::IO),
            ..Self::NO_EFFECTS
        }
    }

    pub fn kinds(&self) -> EffectKind {
        self.kinds
    }

    pub fn read_internal(&self) -> &SymbolSet {
        &self.read_internal
    }

    pub fn write_internal(&self) -> &SymbolSet {
        &self.write_internal
    }

    pub fn read_escaping(&self) -> &SymbolSet {
        &self.read_escaping
    }

    pub fn write_escaping(&self) -> &SymbolSet {
        &self.write_escaping
    }

    /// Pairwise union of every field
    pub fn union(&self, other: &EffectSet) -> EffectSet {
        EffectSet {
            kinds: self.kinds | other.kinds,
            read_internal: self.read_internal.union(&other.read_internal),
            write_internal: self.write_internal.union(&other.write_internal),
            read_escaping: self.read_escaping.union(&other.read_escaping),
            write_escaping: self.write_escaping.union(&other.write_escaping),
        }
    }

    /// Keeps this set's internal detail and merges only the escaping part
    /// of `other`
    pub fn union_escaping_only(&self, other: &EffectSet) -> EffectSet {
        EffectSet {
            kinds: self.kinds | (other.kinds & EffectKind::ESCAPING_ONLY),
            read_internal: self.read_internal.clone(),
            write_internal: self.write_internal.clone(),
            read_escaping: self.read_escaping.union(&other.read_escaping),
            write_escaping: self.write_escaping.union(&other.write_escaping),
        }
    }

    /// Project away internal detail, which means nothing outside the
    /// method that declares the locals
    pub fn drop_internal(&self) -> EffectSet {
        Self::NO_EFFECTS.union_escaping_only(self)
    }

    /// Whether every kind and symbol of `other` is also in `self`
    pub fn contains(&self, other: &EffectSet) -> bool {
        self.kinds.contains(other.kinds)
            && other.read_internal.is_subset(&self.read_internal)
            && other.write_internal.is_subset(&self.write_internal)
            && other.read_escaping.is_subset(&self.read_escaping)
            && other.write_escaping.is_subset(&self.write_escaping)
    }

    /// No effects at all
    pub fn is_pure(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Reads only: no writes, no exceptions, no IO
    pub fn is_read_only(&self) -> bool {
        !self
            .kinds
            .intersects(EffectKind::WRITES | EffectKind::EXCEPTION | EffectKind::IO)
    }

    /// Touches a location visible outside the method
    pub fn has_escaping(&self) -> bool {
        self.kinds
            .intersects(EffectKind::READ_ESCAPING | EffectKind::WRITE_ESCAPING)
    }

    pub fn has_io(&self) -> bool {
        self.kinds.contains(EffectKind::IO)
    }

    pub fn may_throw(&self) -> bool {
        self.kinds.contains(EffectKind::EXCEPTION)
    }

    /// Every location written, internal or escaping
    pub fn all_writes(&self) -> SymbolSet {
        self.write_internal.union(&self.write_escaping)
    }

    /// Every location read or written
    pub fn all_touched(&self) -> SymbolSet {
        self.read_internal
            .union(&self.read_escaping)
            .union(&self.all_writes())
    }

    /// Whether executing the two pieces of code in the opposite order may
    /// be observable: one writes what the other reads or writes, or both
    /// have effects and one throws or performs IO.
    pub fn interferes_with(&self, other: &EffectSet) -> bool {
        if self.is_pure() || other.is_pure() {
            return false;
        }
        let ordered = EffectKind::EXCEPTION | EffectKind::IO;
        if self.kinds.intersects(ordered) || other.kinds.intersects(ordered) {
            return true;
        }
        self.all_writes().intersects(&other.all_touched())
            || other.all_writes().intersects(&self.all_touched())
    }
}

impl fmt::Display for EffectSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = [
            (EffectKind::READ_INTERNAL, &self.read_internal),
            (EffectKind::WRITE_INTERNAL, &self.write_internal),
            (EffectKind::READ_ESCAPING, &self.read_escaping),
            (EffectKind::WRITE_ESCAPING, &self.write_escaping),
            (EffectKind::EXCEPTION, &SymbolSet::EMPTY),
            (EffectKind::IO, &SymbolSet::EMPTY),
        ]
        .into_iter()
        .filter(|(kind, _)| self.kinds.contains(*kind))
        .flat_map(|(kind, symbols)| {
            kind.names().into_iter().map(move |name| {
                if symbols.is_empty() {
                    name.to_string()
                } else {
                    format!("{name}({symbols})")
                }
            })
        })
        .collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripple_ir::VarId;

    fn var(n: u32) -> Location {
        Location::Var(VarId(n))
    }

    #[test]
    fn union_is_pairwise() {
        let a = EffectSet::write(var(1), true);
        let b = EffectSet::io().union(&EffectSet::read(var(2), false));
        let both = a.union(&b);
        assert!(both.contains(&a));
        assert!(both.contains(&b));
        assert_eq!(
            both.kinds(),
            EffectKind::WRITE_ESCAPING | EffectKind::IO | EffectKind::READ_INTERNAL
        );
        assert!(both.write_escaping().contains(&var(1)));
        assert!(both.read_internal().contains(&var(2)));
    }

    #[test]
    fn bottom_and_top() {
        let e = EffectSet::write(var(4), false).union(&EffectSet::exception());
        assert!(EffectSet::ALL_EFFECTS.contains(&e));
        assert!(e.contains(&EffectSet::NO_EFFECTS));
        assert_eq!(e.union(&EffectSet::NO_EFFECTS), e);
        assert_eq!(e.union(&EffectSet::ALL_EFFECTS), EffectSet::ALL_EFFECTS);
        assert!(EffectSet::NO_EFFECTS.is_pure());
    }

    #[test]
    fn drop_internal_keeps_escaping() {
        let e = EffectSet::write(var(1), false)
            .union(&EffectSet::read(var(2), true))
            .union(&EffectSet::io());
        let dropped = e.drop_internal();
        assert_eq!(dropped.kinds(), EffectKind::READ_ESCAPING | EffectKind::IO);
        assert!(dropped.write_internal().is_empty());
        assert!(dropped.read_escaping().contains(&var(2)));
        assert!(e.contains(&dropped));
    }

    #[test]
    fn union_escaping_only_keeps_own_internal() {
        let own = EffectSet::read(var(1), false);
        let other = EffectSet::write(var(2), false).union(&EffectSet::write(var(3), true));
        let merged = own.union_escaping_only(&other);
        assert!(merged.read_internal().contains(&var(1)));
        assert!(!merged.write_internal().contains(&var(2)));
        assert!(merged.write_escaping().contains(&var(3)));
        assert!(!merged.kinds().contains(EffectKind::WRITE_INTERNAL));
    }

    #[test]
    fn from_parts_sets_kind_bits() {
        let e = EffectSet::from_parts(
            EffectKind::empty(),
            SymbolSet::EMPTY,
            SymbolSet::EMPTY,
            SymbolSet::UNIVERSAL,
            SymbolSet::EMPTY,
        );
        assert_eq!(e.kinds(), EffectKind::READ_ESCAPING);
    }

    #[test]
    fn interference() {
        let write_x = EffectSet::write(var(1), true);
        let read_x = EffectSet::read(var(1), true);
        let read_y = EffectSet::read(var(2), true);
        assert!(write_x.interferes_with(&read_x));
        assert!(read_x.interferes_with(&write_x));
        assert!(!read_x.interferes_with(&read_y));
        assert!(!write_x.interferes_with(&read_y));
        assert!(EffectSet::io().interferes_with(&read_y));
        assert!(!EffectSet::io().interferes_with(&EffectSet::NO_EFFECTS));
        assert!(EffectSet::writes(SymbolSet::UNIVERSAL, true).interferes_with(&read_y));
    }

    #[test]
    fn display() {
        let e = EffectSet::write(var(3), true).union(&EffectSet::io());
        assert_eq!(e.to_string(), "{WriteEscaping(v3), IO}");
        assert_eq!(EffectSet::NO_EFFECTS.to_string(), "{}");
    }
}
