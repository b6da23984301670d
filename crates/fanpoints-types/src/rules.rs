//! Fraud-rule record and its administrative partial update.

use serde::{Deserialize, Serialize};

/// Tunable anti-fraud thresholds. One logical instance exists per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FraudRules {
    /// Max REWARD points a user may earn per UTC day.
    pub daily_reward_cap: u64,
    /// Sessions a user may start in a sliding hour before completions are refused.
    pub max_sessions_per_hour: u32,
    /// Advisory heartbeat spacing handed back to clients.
    pub min_heartbeat_gap_ms: u64,
}

impl Default for FraudRules {
    fn default() -> Self {
        Self {
            daily_reward_cap: 100,
            max_sessions_per_hour: 30,
            min_heartbeat_gap_ms: 5_000,
        }
    }
}

/// Partial update: absent fields keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FraudRulesPatch {
    #[serde(default)]
    pub daily_reward_cap: Option<u64>,
    #[serde(default)]
    pub max_sessions_per_hour: Option<u32>,
    #[serde(default)]
    pub min_heartbeat_gap_ms: Option<u64>,
}

impl FraudRulesPatch {
    pub fn is_empty(&self) -> bool {
        self.daily_reward_cap.is_none()
            && self.max_sessions_per_hour.is_none()
            && self.min_heartbeat_gap_ms.is_none()
    }

    pub fn apply(&self, rules: &FraudRules) -> FraudRules {
        FraudRules {
            daily_reward_cap: self.daily_reward_cap.unwrap_or(rules.daily_reward_cap),
            max_sessions_per_hour: self
                .max_sessions_per_hour
                .unwrap_or(rules.max_sessions_per_hour),
            min_heartbeat_gap_ms: self
                .min_heartbeat_gap_ms
                .unwrap_or(rules.min_heartbeat_gap_ms),
        }
    }
}
