//! Per-action cooldown bookkeeping.
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::data::{ActionCatalog, ActionDefinition};

/// Action id → last successful use. This is the blob handed to storage.
pub type CooldownMap = BTreeMap<String, DateTime<Utc>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct CooldownTracker {
    last_used: CooldownMap,
}

impl CooldownTracker {
    #[must_use]
    pub const fn from_map(last_used: CooldownMap) -> Self {
        Self { last_used }
    }

    #[must_use]
    pub const fn as_map(&self) -> &CooldownMap {
        &self.last_used
    }

    /// Record a use, starting or refreshing the cooldown for this id only.
    pub fn start(&mut self, action_id: &str, now: DateTime<Utc>) {
        self.last_used.insert(action_id.to_string(), now);
    }

    #[must_use]
    pub fn last_used(&self, action_id: &str) -> Option<DateTime<Utc>> {
        self.last_used.get(action_id).copied()
    }

    fn remaining_delta(&self, action: &ActionDefinition, now: DateTime<Utc>) -> TimeDelta {
        let (Some(cooldown), Some(last)) = (action.cooldown(), self.last_used(&action.id)) else {
            return TimeDelta::zero();
        };
        // A clock that moved backwards never extends the wait past one full cooldown.
        let elapsed = (now - last).max(TimeDelta::zero());
        (cooldown - elapsed).max(TimeDelta::zero())
    }

    /// Non-negative time left before `action` may run again.
    #[must_use]
    pub fn remaining(&self, action: &ActionDefinition, now: DateTime<Utc>) -> Duration {
        self.remaining_delta(action, now)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    #[must_use]
    pub fn is_on_cooldown(&self, action: &ActionDefinition, now: DateTime<Utc>) -> bool {
        self.remaining_delta(action, now) > TimeDelta::zero()
    }

    /// Drop entries for actions no longer in the catalog and entries whose
    /// cooldown expired more than `grace` ago. Returns how many were removed.
    pub fn prune(&mut self, catalog: &ActionCatalog, now: DateTime<Utc>, grace: TimeDelta) -> usize {
        let before = self.last_used.len();
        self.last_used.retain(|id, last| {
            let Some(action) = catalog.get(id) else {
                return false;
            };
            let keep_for = action
                .cooldown()
                .unwrap_or_else(TimeDelta::zero)
                .checked_add(&grace)
                .unwrap_or(TimeDelta::MAX);
            now - *last < keep_for
        });
        before - self.last_used.len()
    }

    pub fn clear(&mut self) {
        self.last_used.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.last_used.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.last_used.is_empty()
    }
}
