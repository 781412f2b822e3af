//! Wall-clock decay: foreground ticks and offline catch-up.
//!
//! Rates are fractional per interval. Whatever does not add up to a whole
//! point is carried in the session's decay residue, so a run of ticks and a
//! single catch-up over the same intervals land on identical stats.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::{
    DECAY_BURNOUT, DECAY_ENERGY, DECAY_HAPPINESS, DECAY_HEALTH, DECAY_INTERVAL_SECS,
    DECAY_SOCIAL, OFFLINE_CAP_SECS, RUNWAY_PER_DAY, SECONDS_PER_DAY,
};
use crate::numbers::{i64_to_f64, split_whole};
use crate::state::{AppliedEffects, SessionState};
use crate::stats::{Effects, StatType};

/// Accumulations this close to an integer are treated as that integer.
const RESIDUE_EPSILON: f64 = 1e-9;

/// Signed change per decay interval for each character stat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayRates {
    pub energy: f64,
    pub health: f64,
    pub happiness: f64,
    pub social: f64,
    pub burnout: f64,
}

impl Default for DecayRates {
    fn default() -> Self {
        Self {
            energy: DECAY_ENERGY,
            health: DECAY_HEALTH,
            happiness: DECAY_HAPPINESS,
            social: DECAY_SOCIAL,
            burnout: DECAY_BURNOUT,
        }
    }
}

impl DecayRates {
    /// Rates in canonical stat order.
    #[must_use]
    pub const fn entries(&self) -> [(StatType, f64); 5] {
        [
            (StatType::Energy, self.energy),
            (StatType::Health, self.health),
            (StatType::Happiness, self.happiness),
            (StatType::Social, self.social),
            (StatType::Burnout, self.burnout),
        ]
    }

    #[must_use]
    pub fn all_finite(&self) -> bool {
        self.entries().iter().all(|(_, rate)| rate.is_finite())
    }
}

/// What an offline catch-up did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatchUpReport {
    /// Raw elapsed seconds, negative gaps reported as zero.
    pub elapsed_secs: i64,
    /// The gap exceeded the offline cap and was truncated.
    pub capped: bool,
    pub intervals: i64,
    pub days: i64,
    pub applied: AppliedEffects,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeSimulation {
    rates: DecayRates,
    interval_secs: i64,
    offline_cap_secs: i64,
    runway_per_day: f64,
}

impl Default for TimeSimulation {
    fn default() -> Self {
        Self::new(
            DecayRates::default(),
            DECAY_INTERVAL_SECS,
            OFFLINE_CAP_SECS,
            RUNWAY_PER_DAY,
        )
    }
}

impl TimeSimulation {
    #[must_use]
    pub fn new(
        rates: DecayRates,
        interval_secs: i64,
        offline_cap_secs: i64,
        runway_per_day: f64,
    ) -> Self {
        Self {
            rates,
            interval_secs: interval_secs.max(1),
            offline_cap_secs: offline_cap_secs.max(0),
            runway_per_day,
        }
    }

    #[must_use]
    pub const fn rates(&self) -> &DecayRates {
        &self.rates
    }

    #[must_use]
    pub const fn interval_secs(&self) -> i64 {
        self.interval_secs
    }

    #[must_use]
    pub const fn offline_cap_secs(&self) -> i64 {
        self.offline_cap_secs
    }

    /// One interval of decay.
    pub fn apply_foreground_tick(&self, state: &mut SessionState) -> AppliedEffects {
        let runway = -self.runway_per_day * i64_to_f64(self.interval_secs)
            / i64_to_f64(SECONDS_PER_DAY);
        let applied = self.apply_decay(state, 1, runway);
        log::debug!("foreground tick applied {} change(s)", applied.len());
        applied
    }

    /// Decay for the gap between `last_active` and `now`, capped.
    pub fn apply_offline_catch_up(
        &self,
        state: &mut SessionState,
        last_active: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> CatchUpReport {
        let elapsed_secs = (now - last_active).num_seconds().max(0);
        let capped = elapsed_secs > self.offline_cap_secs;
        let effective = elapsed_secs.min(self.offline_cap_secs);
        let intervals = effective / self.interval_secs;
        let days = effective / SECONDS_PER_DAY;

        let runway = -i64_to_f64(days) * self.runway_per_day;
        let applied = self.apply_decay(state, intervals, runway);
        log::info!(
            "offline catch-up: {elapsed_secs}s away{}, {intervals} interval(s), {days} day(s)",
            if capped { " (capped)" } else { "" }
        );
        CatchUpReport {
            elapsed_secs,
            capped,
            intervals,
            days,
            applied,
        }
    }

    fn apply_decay(&self, state: &mut SessionState, intervals: i64, runway: f64) -> AppliedEffects {
        let scale = i64_to_f64(intervals);
        let mut effects = Effects::new();
        for (stat, rate) in self.rates.entries() {
            let whole = accumulate(&mut state.decay_residue, stat, rate * scale);
            if whole != 0 {
                effects.insert(stat, whole);
            }
        }
        let whole = accumulate(&mut state.decay_residue, StatType::Runway, runway);
        if whole != 0 {
            effects.insert(StatType::Runway, whole);
        }
        state.apply_effects(&effects)
    }
}

/// Add `amount` to the stat's residue and take out the whole part.
fn accumulate(residue: &mut BTreeMap<StatType, f64>, stat: StatType, amount: f64) -> i32 {
    if !amount.is_finite() {
        return 0;
    }
    let mut total = residue.get(&stat).copied().unwrap_or(0.0) + amount;
    let nearest = total.round();
    if (total - nearest).abs() < RESIDUE_EPSILON {
        total = nearest;
    }
    let (whole, rest) = split_whole(total);
    if rest.abs() < RESIDUE_EPSILON {
        residue.remove(&stat);
    } else {
        residue.insert(stat, rest);
    }
    whole
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::FounderProfile;
    use chrono::{TimeDelta, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 5, 18, 0, 0).unwrap()
    }

    fn fresh() -> SessionState {
        SessionState::new(FounderProfile::new("Margaret", "researcher", "Boston"), t0())
    }

    fn flat(energy: f64) -> DecayRates {
        DecayRates {
            energy,
            health: 0.0,
            happiness: 0.0,
            social: 0.0,
            burnout: 0.0,
        }
    }

    #[test]
    fn ten_ticks_equal_one_catch_up() {
        let sim = TimeSimulation::new(flat(-1.0), 60, OFFLINE_CAP_SECS, 0.0);
        let mut ticked = fresh();
        for _ in 0..10 {
            sim.apply_foreground_tick(&mut ticked);
        }
        let mut caught_up = fresh();
        let report =
            sim.apply_offline_catch_up(&mut caught_up, t0(), t0() + TimeDelta::seconds(600));

        assert_eq!(report.intervals, 10);
        assert_eq!(ticked.stats.energy, 70);
        assert_eq!(caught_up.stats.energy, 70);
    }

    #[test]
    fn fractional_rates_agree_between_paths() {
        let sim = TimeSimulation::default();
        let mut ticked = fresh();
        for _ in 0..137 {
            sim.apply_foreground_tick(&mut ticked);
        }
        let mut caught_up = fresh();
        sim.apply_offline_catch_up(&mut caught_up, t0(), t0() + TimeDelta::seconds(137 * 60));

        assert_eq!(ticked.stats, caught_up.stats);
        assert_eq!(ticked.stats.energy, 80 - 68);
    }

    #[test]
    fn default_rates_drain_energy_and_build_burnout() {
        let sim = TimeSimulation::default();
        let mut state = fresh();
        let first = sim.apply_foreground_tick(&mut state);
        assert!(first.is_empty());
        assert_eq!(state.decay_residue.get(&StatType::Energy), Some(&-0.5));

        sim.apply_foreground_tick(&mut state);
        assert_eq!(state.stats.energy, 79);
        assert!(!state.decay_residue.contains_key(&StatType::Energy));

        for _ in 0..8 {
            sim.apply_foreground_tick(&mut state);
        }
        assert_eq!(state.stats.burnout, 11);
    }

    #[test]
    fn catch_up_beyond_cap_matches_exact_cap() {
        let sim = TimeSimulation::default();
        let mut at_cap = fresh();
        let capped = sim.apply_offline_catch_up(
            &mut at_cap,
            t0(),
            t0() + TimeDelta::seconds(OFFLINE_CAP_SECS),
        );
        let mut way_past = fresh();
        let past = sim.apply_offline_catch_up(&mut way_past, t0(), t0() + TimeDelta::days(30));

        assert!(!capped.capped);
        assert!(past.capped);
        assert_eq!(capped.applied, past.applied);
        assert_eq!(at_cap.stats, way_past.stats);
        assert_eq!(at_cap.startup, way_past.startup);
        assert_eq!(past.days, 3);
        assert_eq!(way_past.startup.runway, 87);
    }

    #[test]
    fn negative_gap_is_a_no_op() {
        let sim = TimeSimulation::default();
        let mut state = fresh();
        let before = state.clone();
        let report = sim.apply_offline_catch_up(&mut state, t0(), t0() - TimeDelta::hours(2));
        assert_eq!(report.elapsed_secs, 0);
        assert_eq!(report.intervals, 0);
        assert!(report.applied.is_empty());
        assert_eq!(state, before);
    }

    #[test]
    fn foreground_ticks_consume_runway_per_day() {
        let sim = TimeSimulation::new(flat(0.0), 60, OFFLINE_CAP_SECS, 1.0);
        let mut state = fresh();
        for _ in 0..1_439 {
            sim.apply_foreground_tick(&mut state);
        }
        assert_eq!(state.startup.runway, 90);
        sim.apply_foreground_tick(&mut state);
        assert_eq!(state.startup.runway, 89);
    }

    #[test]
    fn decay_never_leaves_range() {
        let sim = TimeSimulation::new(flat(-1_000.0), 60, OFFLINE_CAP_SECS, 500.0);
        let mut state = fresh();
        sim.apply_offline_catch_up(&mut state, t0(), t0() + TimeDelta::days(3));
        assert_eq!(state.stats.energy, 0);
        assert_eq!(state.startup.runway, 0);
    }
}
