//! Effect kinds

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// The kinds of effect a piece of code may have.
    ///
    /// "Internal" effects touch a method-local variable with no outside
    /// alias; "escaping" effects touch a field, static or captured variable
    /// that other code may observe.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct EffectKind: u8 {
        const READ_INTERNAL = 1 << 0;
        const WRITE_INTERNAL = 1 << 1;
        const READ_ESCAPING = 1 << 2;
        const WRITE_ESCAPING = 1 << 3;
        /// May throw
        const EXCEPTION = 1 << 4;
        /// Uncontrolled I/O (console, file, network, clock)
        const IO = 1 << 5;

        const READS = Self::READ_INTERNAL.bits() | Self::READ_ESCAPING.bits();
        const WRITES = Self::WRITE_INTERNAL.bits() | Self::WRITE_ESCAPING.bits();

        /// Kinds that stay meaningful outside the defining compilation unit
        const ESCAPING_ONLY = Self::READ_ESCAPING.bits()
            | Self::WRITE_ESCAPING.bits()
            | Self::EXCEPTION.bits()
            | Self::IO.bits();
    }
}

const NAMES: [(EffectKind, &str); 6] = [
    (EffectKind::READ_INTERNAL, "ReadInternal"),
    (EffectKind::WRITE_INTERNAL, "WriteInternal"),
    (EffectKind::READ_ESCAPING, "ReadEscaping"),
    (EffectKind::WRITE_ESCAPING, "WriteEscaping"),
    (EffectKind::EXCEPTION, "Exception"),
    (EffectKind::IO, "IO"),
];

impl Default for EffectKind {
    fn default() -> Self {
        EffectKind::empty()
    }
}

impl EffectKind {
    /// Read kind for a variable of the given visibility
    pub fn read(escaping: bool) -> Self {
        if escaping {
            EffectKind::READ_ESCAPING
        } else {
            EffectKind::READ_INTERNAL
        }
    }

    /// Write kind for a variable of the given visibility
    pub fn write(escaping: bool) -> Self {
        if escaping {
            EffectKind::WRITE_ESCAPING
        } else {
            EffectKind::WRITE_INTERNAL
        }
    }

    /// Names of the single kinds set, in declaration order
    pub fn names(self) -> Vec<&'static str> {
        NAMES
            .iter()
            .filter(|(kind, _)| self.contains(*kind))
            .map(|(_, name)| *name)
            .collect()
    }
}
