//! Analysis settings

use serde::{Deserialize, Serialize};

/// How the persistent effect cache is used by one analysis job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheMode {
    /// Never touch the cache; every external callee gets all effects
    Disabled,
    /// Resolve external callees from the cache, never write
    ReadOnly,
    /// Resolve from the cache and store every analyzed method afterwards
    #[default]
    ReadWrite,
}

impl CacheMode {
    pub fn reads(self) -> bool {
        matches!(self, CacheMode::ReadOnly | CacheMode::ReadWrite)
    }

    pub fn writes(self) -> bool {
        self == CacheMode::ReadWrite
    }
}

/// Settings for [`crate::analyze`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub cache: CacheMode,
    /// Log precision-loss diagnostics at warn level
    pub emit_warnings: bool,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            cache: CacheMode::ReadWrite,
            emit_warnings: true,
        }
    }
}

impl AnalysisSettings {
    /// Parse settings from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
