//! In-memory [`SessionStorage`] for tests and headless runs.
use chrono::{DateTime, Utc};
use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;

use crate::SessionStorage;
use crate::cooldown::CooldownMap;
use crate::state::SessionState;

#[derive(Debug, Default)]
struct Slots {
    state: Option<SessionState>,
    background_at: Option<DateTime<Utc>>,
    cooldowns: CooldownMap,
}

/// Clones share the same slots, so a test can keep a handle and inspect what
/// the manager wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slots: Rc<RefCell<Slots>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn saved_state(&self) -> Option<SessionState> {
        self.slots.borrow().state.clone()
    }

    #[must_use]
    pub fn saved_background_timestamp(&self) -> Option<DateTime<Utc>> {
        self.slots.borrow().background_at
    }

    #[must_use]
    pub fn saved_cooldowns(&self) -> CooldownMap {
        self.slots.borrow().cooldowns.clone()
    }
}

impl SessionStorage for MemoryStorage {
    type Error = Infallible;

    fn save(&self, state: &SessionState) -> Result<(), Self::Error> {
        self.slots.borrow_mut().state = Some(state.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<SessionState>, Self::Error> {
        Ok(self.saved_state())
    }

    fn delete(&self) -> Result<(), Self::Error> {
        let mut slots = self.slots.borrow_mut();
        slots.state = None;
        slots.background_at = None;
        Ok(())
    }

    fn save_last_background_timestamp(&self, at: DateTime<Utc>) -> Result<(), Self::Error> {
        self.slots.borrow_mut().background_at = Some(at);
        Ok(())
    }

    fn load_last_background_timestamp(&self) -> Result<Option<DateTime<Utc>>, Self::Error> {
        Ok(self.saved_background_timestamp())
    }

    fn save_cooldowns(&self, cooldowns: &CooldownMap) -> Result<(), Self::Error> {
        self.slots.borrow_mut().cooldowns.clone_from(cooldowns);
        Ok(())
    }

    fn load_cooldowns(&self) -> Result<CooldownMap, Self::Error> {
        Ok(self.saved_cooldowns())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::FounderProfile;

    #[test]
    fn clones_share_slots_and_delete_clears_session() {
        let storage = MemoryStorage::default();
        let handle = storage.clone();
        let now = Utc::now();
        storage
            .save(&SessionState::new(FounderProfile::default(), now))
            .unwrap();
        storage.save_last_background_timestamp(now).unwrap();
        let mut cooldowns = CooldownMap::new();
        cooldowns.insert("pitch".to_string(), now);
        storage.save_cooldowns(&cooldowns).unwrap();

        assert!(handle.load().unwrap().is_some());
        assert_eq!(handle.load_last_background_timestamp().unwrap(), Some(now));

        handle.delete().unwrap();
        assert!(storage.load().unwrap().is_none());
        assert!(storage.load_last_background_timestamp().unwrap().is_none());
        assert_eq!(storage.load_cooldowns().unwrap(), cooldowns);
    }
}
