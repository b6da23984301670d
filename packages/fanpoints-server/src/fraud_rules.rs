//! Fraud rule singleton: read by validation, patched by administrators.

use crate::clock::Clock;
use crate::principal::Principal;
use crate::store::{RulesRecord, Store};
use crate::Error;
use fanpoints_types::{FraudRules, FraudRulesPatch};
use std::sync::Arc;
use tracing::info;

pub struct FraudRuleStore {
    store: Arc<Store>,
    defaults: FraudRules,
    clock: Arc<dyn Clock>,
}

impl FraudRuleStore {
    pub fn new(store: Arc<Store>, defaults: FraudRules, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            defaults,
            clock,
        }
    }

    /// The versioned record, created from the configured defaults on first read.
    pub fn record(&self) -> RulesRecord {
        if let Some(record) = self.store.rules() {
            return record;
        }
        let record = self
            .store
            .rules_or_init(|| RulesRecord::initial(self.defaults, self.clock.now()));
        info!(version = record.version, "Fraud rules initialised from defaults");
        record
    }

    /// Value snapshot for one operation. Later updates never reach it.
    pub fn current(&self) -> FraudRules {
        self.record().rules
    }

    /// Apply the fields present in `patch` and bump the version.
    pub fn update(&self, principal: &Principal, patch: FraudRulesPatch) -> Result<RulesRecord, Error> {
        principal.require_admin()?;

        let _gate = self.store.enter();
        let now = self.clock.now();
        let defaults = self.defaults;
        let next = self.store.update_rules(|current| match current {
            Some(record) => RulesRecord {
                rules: patch.apply(&record.rules),
                version: record.version.saturating_add(1),
                updated_at: now,
            },
            None => RulesRecord::initial(patch.apply(&defaults), now),
        });

        info!(
            admin = %principal.user_id,
            version = next.version,
            daily_reward_cap = next.rules.daily_reward_cap,
            max_sessions_per_hour = next.rules.max_sessions_per_hour,
            min_heartbeat_gap_ms = next.rules.min_heartbeat_gap_ms,
            "Fraud rules updated"
        );
        Ok(next)
    }
}
