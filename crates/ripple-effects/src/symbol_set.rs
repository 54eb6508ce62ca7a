//! Sets of abstract memory locations with a universal top element

use ripple_ir::VarId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// An abstract location an effect can touch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Location {
    /// A declared variable (local, parameter, field, static or capture)
    Var(VarId),
    /// Every array element in the program, as one location
    ArrayElements,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Var(id) => write!(f, "{id}"),
            Location::ArrayElements => write!(f, "[]"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
enum Members {
    Finite(BTreeSet<Location>),
    Universal,
}

/// A set of locations, or the universal set standing for "possibly every
/// location". The universal set absorbs every union and contains everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolSet {
    members: Members,
}

impl Default for SymbolSet {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl SymbolSet {
    pub const EMPTY: SymbolSet = SymbolSet {
        members: Members::Finite(BTreeSet::new()),
    };

    pub const UNIVERSAL: SymbolSet = SymbolSet {
        members: Members::Universal,
    };

    pub fn empty() -> Self {
        Self::EMPTY
    }

    pub fn universal() -> Self {
        Self::UNIVERSAL
    }

    pub fn singleton(location: Location) -> Self {
        Self {
            members: Members::Finite(BTreeSet::from([location])),
        }
    }

    pub fn is_universal(&self) -> bool {
        matches!(self.members, Members::Universal)
    }

    /// The universal set is never empty
    pub fn is_empty(&self) -> bool {
        match &self.members {
            Members::Finite(set) => set.is_empty(),
            Members::Universal => false,
        }
    }

    pub fn contains(&self, location: &Location) -> bool {
        match &self.members {
            Members::Finite(set) => set.contains(location),
            Members::Universal => true,
        }
    }

    /// Number of members, or `None` for the universal set
    pub fn len(&self) -> Option<usize> {
        match &self.members {
            Members::Finite(set) => Some(set.len()),
            Members::Universal => None,
        }
    }

    /// Members of a finite set. The universal set yields nothing; check
    /// [`Self::is_universal`] first.
    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        let finite = match &self.members {
            Members::Finite(set) => Some(set.iter()),
            Members::Universal => None,
        };
        finite.into_iter().flatten()
    }

    pub fn insert(&mut self, location: Location) {
        if let Members::Finite(set) = &mut self.members {
            set.insert(location);
        }
    }

    pub fn union(&self, other: &SymbolSet) -> SymbolSet {
        match (&self.members, &other.members) {
            (Members::Finite(a), Members::Finite(b)) => SymbolSet {
                members: Members::Finite(a.union(b).copied().collect()),
            },
            _ => Self::UNIVERSAL,
        }
    }

    pub fn intersection(&self, other: &SymbolSet) -> SymbolSet {
        match (&self.members, &other.members) {
            (Members::Finite(a), Members::Finite(b)) => SymbolSet {
                members: Members::Finite(a.intersection(b).copied().collect()),
            },
            (Members::Universal, _) => other.clone(),
            (_, Members::Universal) => self.clone(),
        }
    }

    pub fn is_subset(&self, other: &SymbolSet) -> bool {
        match (&self.members, &other.members) {
            (_, Members::Universal) => true,
            (Members::Universal, Members::Finite(_)) => false,
            (Members::Finite(a), Members::Finite(b)) => a.is_subset(b),
        }
    }

    /// Whether the two sets share a location. Universal meets every
    /// non-empty set.
    pub fn intersects(&self, other: &SymbolSet) -> bool {
        match (&self.members, &other.members) {
            (Members::Finite(a), Members::Finite(b)) => !a.is_disjoint(b),
            (Members::Universal, _) => !other.is_empty(),
            (_, Members::Universal) => !self.is_empty(),
        }
    }
}

impl FromIterator<Location> for SymbolSet {
    fn from_iter<I: IntoIterator<Item = Location>>(iter: I) -> Self {
        SymbolSet {
            members: Members::Finite(iter.into_iter().collect()),
        }
    }
}

impl fmt::Display for SymbolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.members {
            Members::Universal => write!(f, "*"),
            Members::Finite(set) => {
                let parts: Vec<String> = set.iter().map(|l| l.to_string()).collect();
                write!(f, "{}", parts.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(n: u32) -> Location {
        Location::Var(VarId(n))
    }

    #[test]
    fn universal_absorbs_union() {
        let finite: SymbolSet = [var(1), var(2)].into_iter().collect();
        assert_eq!(SymbolSet::UNIVERSAL.union(&finite), SymbolSet::UNIVERSAL);
        assert_eq!(finite.union(&SymbolSet::UNIVERSAL), SymbolSet::UNIVERSAL);
        assert!(SymbolSet::UNIVERSAL.contains(&var(999)));
        assert!(!SymbolSet::UNIVERSAL.is_empty());
    }

    #[test]
    fn intersection_with_universal_is_identity() {
        let finite: SymbolSet = [var(1), Location::ArrayElements].into_iter().collect();
        assert_eq!(SymbolSet::UNIVERSAL.intersection(&finite), finite);
        assert_eq!(finite.intersection(&SymbolSet::UNIVERSAL), finite);
    }

    #[test]
    fn subset_ordering() {
        let small = SymbolSet::singleton(var(1));
        let big: SymbolSet = [var(1), var(2)].into_iter().collect();
        assert!(small.is_subset(&big));
        assert!(!big.is_subset(&small));
        assert!(big.is_subset(&SymbolSet::UNIVERSAL));
        assert!(!SymbolSet::UNIVERSAL.is_subset(&big));
        assert!(SymbolSet::EMPTY.is_subset(&small));
    }

    #[test]
    fn intersects_ignores_empty() {
        assert!(!SymbolSet::UNIVERSAL.intersects(&SymbolSet::EMPTY));
        assert!(SymbolSet::UNIVERSAL.intersects(&SymbolSet::singleton(var(3))));
        assert!(!SymbolSet::singleton(var(1)).intersects(&SymbolSet::singleton(var(2))));
    }

    #[test]
    fn insert_into_universal_is_noop() {
        let mut set = SymbolSet::universal();
        set.insert(var(1));
        assert!(set.is_universal());
        assert_eq!(set.iter().count(), 0);
        assert_eq!(set.len(), None);
    }

    #[test]
    fn display() {
        let set: SymbolSet = [var(3), Location::ArrayElements, var(1)].into_iter().collect();
        assert_eq!(set.to_string(), "v1, v3, []");
        assert_eq!(SymbolSet::UNIVERSAL.to_string(), "*");
    }
}
