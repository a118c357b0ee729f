//! Lifecycle stage of a plugin or plugin file.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Maturity classification reported by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginStage {
    Planning,
    Alpha,
    Beta,
    Release,
    Mature,
    Inactive,
    Abandoned,
    Deleted,
}

impl PluginStage {
    pub const ALL: [PluginStage; 8] = [
        PluginStage::Planning,
        PluginStage::Alpha,
        PluginStage::Beta,
        PluginStage::Release,
        PluginStage::Mature,
        PluginStage::Inactive,
        PluginStage::Abandoned,
        PluginStage::Deleted,
    ];

    /// Lowercase name, as stored in cache files.
    pub fn name(&self) -> &'static str {
        match self {
            PluginStage::Planning => "planning",
            PluginStage::Alpha => "alpha",
            PluginStage::Beta => "beta",
            PluginStage::Release => "release",
            PluginStage::Mature => "mature",
            PluginStage::Inactive => "inactive",
            PluginStage::Abandoned => "abandoned",
            PluginStage::Deleted => "deleted",
        }
    }

    /// One-letter code the catalog uses as a search filter.
    pub fn code(&self) -> &'static str {
        match self {
            PluginStage::Planning => "p",
            PluginStage::Alpha => "a",
            PluginStage::Beta => "b",
            PluginStage::Release => "r",
            PluginStage::Mature => "m",
            PluginStage::Inactive => "i",
            PluginStage::Abandoned => "x",
            PluginStage::Deleted => "d",
        }
    }

    /// Parse a stage name case-insensitively; blank or unknown input yields `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|stage| stage.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for PluginStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PluginStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("unknown plugin stage: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_is_case_insensitive() {
        assert_eq!(PluginStage::from_name("Release"), Some(PluginStage::Release));
        assert_eq!(PluginStage::from_name(" MATURE "), Some(PluginStage::Mature));
        assert_eq!(PluginStage::from_name("abandoned"), Some(PluginStage::Abandoned));
    }

    #[test]
    fn test_from_name_rejects_unknown() {
        assert_eq!(PluginStage::from_name(""), None);
        assert_eq!(PluginStage::from_name("stable"), None);
        assert!("stable".parse::<PluginStage>().is_err());
    }

    #[test]
    fn test_codes_are_distinct() {
        let codes: std::collections::HashSet<_> =
            PluginStage::ALL.iter().map(|s| s.code()).collect();
        assert_eq!(codes.len(), PluginStage::ALL.len());
        assert_eq!(PluginStage::Abandoned.code(), "x");
    }
}
