//! Engine configuration types and defaults.
//!
//! Everything here is plain data loaded by the host from its configuration
//! source and handed to [`TerritoryManager`](crate::manager::TerritoryManager)
//! and [`DecisionEngine`](crate::decision::DecisionEngine) at startup.

use crate::claims::DEFAULT_CLAIM_LIMIT;
use crate::policy::{ZonePolicy, ZonePolicyTable};
use serde::{Deserialize, Serialize};

/// Limits applied to member-owned territories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerritoryConfig {
    /// Maximum chunks a territory may claim unless overridden per territory
    pub default_claim_limit: usize,

    /// Shortest allowed territory name
    pub min_name_length: usize,

    /// Longest allowed territory name
    pub max_name_length: usize,

    /// Longest allowed description, in characters
    pub max_description_length: usize,
}

impl Default for TerritoryConfig {
    fn default() -> Self {
        Self {
            default_claim_limit: DEFAULT_CLAIM_LIMIT,
            min_name_length: 3,
            max_name_length: 16,
            max_description_length: 120,
        }
    }
}

impl TerritoryConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.min_name_length == 0 {
            return Err("min_name_length must be at least 1".to_string());
        }
        if self.min_name_length > self.max_name_length {
            return Err(format!(
                "min_name_length ({}) exceeds max_name_length ({})",
                self.min_name_length, self.max_name_length
            ));
        }
        Ok(())
    }
}

/// Replacement rows for the default zone policy table.
///
/// Any row left out keeps its built-in default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safe: Option<ZonePolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub war: Option<ZonePolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wild: Option<ZonePolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_owned: Option<ZonePolicy>,
}

impl PolicyOverrides {
    pub fn is_empty(&self) -> bool {
        self.safe.is_none() && self.war.is_none() && self.wild.is_none() && self.member_owned.is_none()
    }

    /// Builds the effective table from the defaults plus these overrides.
    pub fn apply(&self) -> ZonePolicyTable {
        let defaults = ZonePolicyTable::default();
        ZonePolicyTable {
            safe: self.safe.unwrap_or(defaults.safe),
            war: self.war.unwrap_or(defaults.war),
            wild: self.wild.unwrap_or(defaults.wild),
            member_owned: self.member_owned.unwrap_or(defaults.member_owned),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Rule;

    #[test]
    fn test_default_config_is_valid() {
        assert!(TerritoryConfig::default().validate().is_ok());
        assert_eq!(TerritoryConfig::default().default_claim_limit, 16);
    }

    #[test]
    fn test_inverted_name_bounds_rejected() {
        let config = TerritoryConfig {
            min_name_length: 10,
            max_name_length: 4,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_overrides_yield_default_table() {
        let overrides = PolicyOverrides::default();
        assert!(overrides.is_empty());
        assert_eq!(overrides.apply(), ZonePolicyTable::default());
    }

    #[test]
    fn test_override_replaces_single_row() {
        let mut war = ZonePolicy::WAR;
        war.build = Rule::Allow;
        let overrides = PolicyOverrides {
            war: Some(war),
            ..Default::default()
        };

        let table = overrides.apply();

        assert_eq!(table.war.build, Rule::Allow);
        assert_eq!(table.safe, ZonePolicy::SAFE);
        assert_eq!(table.member_owned, ZonePolicy::MEMBER_OWNED);
    }
}
