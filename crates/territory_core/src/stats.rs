//! Counters for decision engine verdicts.

use crate::decision::{Decision, DenyReason};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Running totals of decisions made since startup.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct DecisionStats {
    /// Actions allowed, operator bypasses included
    pub allowed: u64,
    /// Actions denied
    pub denied: u64,
    /// Actions allowed only because the actor was an operator
    pub operator_bypasses: u64,
    /// Explosion blocks removed from blast lists
    pub blast_blocks_filtered: u64,
    /// Denials keyed by reason tag
    pub denied_by_reason: HashMap<String, u64>,
}

impl DecisionStats {
    pub fn record(&mut self, decision: Decision, operator: bool) {
        match decision {
            Decision::Allow => {
                self.allowed += 1;
                if operator {
                    self.operator_bypasses += 1;
                }
            }
            Decision::Deny(reason) => self.record_denial(reason),
        }
    }

    pub fn record_denial(&mut self, reason: DenyReason) {
        self.denied += 1;
        *self.denied_by_reason.entry(reason.tag().to_string()).or_insert(0) += 1;
    }

    pub fn record_blast(&mut self, blocks_removed: usize) {
        self.blast_blocks_filtered += blocks_removed as u64;
    }

    pub fn total(&self) -> u64 {
        self.allowed + self.denied
    }

    /// Share of decisions that were denials, in `0.0..=1.0`.
    pub fn deny_ratio(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.denied as f64 / total as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_counting() {
        let mut stats = DecisionStats::default();
        stats.record(Decision::Allow, false);
        stats.record(Decision::Allow, true);
        stats.record(Decision::Deny(DenyReason::SafeZone), false);
        stats.record(Decision::Deny(DenyReason::SafeZone), false);
        stats.record_blast(3);

        assert_eq!(stats.allowed, 2);
        assert_eq!(stats.operator_bypasses, 1);
        assert_eq!(stats.denied, 2);
        assert_eq!(stats.denied_by_reason.get("SAFE_ZONE"), Some(&2));
        assert_eq!(stats.blast_blocks_filtered, 3);
        assert!((stats.deny_ratio() - 0.5).abs() < f64::EPSILON);
    }
}
