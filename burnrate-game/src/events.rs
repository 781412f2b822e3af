//! Probabilistic random events with anti-repeat memory.
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::VecDeque;

use crate::constants::{EVENT_MEMORY_CAPACITY, TICK_EVENT_PROBABILITY_SCALE};
use crate::data::{EventCatalog, EventDefinition};
use crate::state::SessionState;

/// Rolls events from the catalog. The recent-memory ring lives only as long
/// as the service and is not persisted.
#[derive(Debug, Clone)]
pub struct RandomEventService {
    recent: VecDeque<String>,
    capacity: usize,
    tick_scale: f64,
}

impl Default for RandomEventService {
    fn default() -> Self {
        Self::new(EVENT_MEMORY_CAPACITY, TICK_EVENT_PROBABILITY_SCALE)
    }
}

impl RandomEventService {
    #[must_use]
    pub fn new(capacity: usize, tick_scale: f64) -> Self {
        Self {
            recent: VecDeque::with_capacity(capacity),
            capacity,
            tick_scale: tick_scale.clamp(0.0, 1.0),
        }
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub const fn tick_scale(&self) -> f64 {
        self.tick_scale
    }

    /// Recently triggered ids, oldest first.
    pub fn recent(&self) -> impl Iterator<Item = &str> {
        self.recent.iter().map(String::as_str)
    }

    #[must_use]
    pub fn is_recent(&self, event_id: &str) -> bool {
        self.recent.iter().any(|id| id == event_id)
    }

    pub fn clear_memory(&mut self) {
        self.recent.clear();
    }

    /// Roll after a successful action, at full probability.
    pub fn check_after_action<R: Rng + ?Sized>(
        &mut self,
        catalog: &EventCatalog,
        state: &mut SessionState,
        rng: &mut R,
    ) -> Option<EventDefinition> {
        self.check(catalog, state, 1.0, rng)
    }

    /// Roll on a periodic tick, with each probability scaled down.
    pub fn check_on_tick<R: Rng + ?Sized>(
        &mut self,
        catalog: &EventCatalog,
        state: &mut SessionState,
        rng: &mut R,
    ) -> Option<EventDefinition> {
        let scale = self.tick_scale;
        self.check(catalog, state, scale, rng)
    }

    fn check<R: Rng + ?Sized>(
        &mut self,
        catalog: &EventCatalog,
        state: &mut SessionState,
        scale: f64,
        rng: &mut R,
    ) -> Option<EventDefinition> {
        let mut passed: Vec<&EventDefinition> = Vec::new();
        for event in catalog.eligible_for(state) {
            if self.is_recent(&event.id) {
                continue;
            }
            let chance = (event.probability * scale).clamp(0.0, 1.0);
            if rng.gen_range(0.0..1.0) < chance {
                passed.push(event);
            }
        }

        let candidates = passed.len();
        let event = (*passed.choose(rng)?).clone();
        let applied = state.apply_effects(&event.effects);
        self.remember(&event.id);
        state.record_event(&event.id);
        log::debug!(
            "event {} triggered ({} candidate(s), {} change(s))",
            event.id,
            candidates,
            applied.len()
        );
        Some(event)
    }

    fn remember(&mut self, event_id: &str) {
        if self.capacity == 0 {
            return;
        }
        while self.recent.len() >= self.capacity {
            self.recent.pop_front();
        }
        self.recent.push_back(event_id.to_string());
    }
}
