use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;

use crate::archetypes::Archetype;
use crate::constants::{
    MOOD_BURNED_OUT_BURNOUT, MOOD_EXCITED_ENERGY, MOOD_EXCITED_HAPPINESS, MOOD_HAPPY_HAPPINESS,
    MOOD_LONELY_SOCIAL, MOOD_SICK_HEALTH, MOOD_STRESSED_BURNOUT, MOOD_TIRED_ENERGY,
};
use crate::economy::{Stage, StartupStats};
use crate::stats::{CharacterStats, Effects, StatDelta, StatFamily, StatType};

/// Post-clamp changes produced by one effect application.
pub type AppliedEffects = SmallVec<[StatDelta; 8]>;

/// Founder mood, derived from stats and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    BurnedOut,
    Sick,
    Lonely,
    Tired,
    Stressed,
    Excited,
    Happy,
    Neutral,
}

impl Mood {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BurnedOut => "burned_out",
            Self::Sick => "sick",
            Self::Lonely => "lonely",
            Self::Tired => "tired",
            Self::Stressed => "stressed",
            Self::Excited => "excited",
            Self::Happy => "happy",
            Self::Neutral => "neutral",
        }
    }

    /// Severity-ordered evaluation: the first matching condition wins.
    #[must_use]
    pub const fn from_stats(stats: &CharacterStats) -> Self {
        if stats.burnout >= MOOD_BURNED_OUT_BURNOUT {
            Self::BurnedOut
        } else if stats.health < MOOD_SICK_HEALTH {
            Self::Sick
        } else if stats.social < MOOD_LONELY_SOCIAL {
            Self::Lonely
        } else if stats.energy < MOOD_TIRED_ENERGY {
            Self::Tired
        } else if stats.burnout >= MOOD_STRESSED_BURNOUT {
            Self::Stressed
        } else if stats.happiness >= MOOD_EXCITED_HAPPINESS && stats.energy >= MOOD_EXCITED_ENERGY
        {
            Self::Excited
        } else if stats.happiness >= MOOD_HAPPY_HAPPINESS {
            Self::Happy
        } else {
            Self::Neutral
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOverReason {
    BurnedOut,
    HealthCollapse,
    Isolation,
    OutOfRunway,
}

impl GameOverReason {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::BurnedOut => "burned_out",
            Self::HealthCollapse => "health_collapse",
            Self::Isolation => "isolation",
            Self::OutOfRunway => "out_of_runway",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Ending {
    GameOver { reason: GameOverReason },
    Victory,
}

impl Ending {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::GameOver { reason } => reason.key(),
            Self::Victory => "victory",
        }
    }

    #[must_use]
    pub const fn is_victory(self) -> bool {
        matches!(self, Self::Victory)
    }
}

impl fmt::Display for Ending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Who is playing: founder name, archetype id and home city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FounderProfile {
    pub name: String,
    #[serde(default)]
    pub archetype: String,
    #[serde(default)]
    pub city: String,
}

impl FounderProfile {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        archetype: impl Into<String>,
        city: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            archetype: archetype.into(),
            city: city.into(),
        }
    }
}

/// One playthrough. Mutated in place by the executor, event and time
/// services; replaced wholesale on restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub profile: FounderProfile,
    pub stats: CharacterStats,
    pub startup: StartupStats,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    #[serde(default)]
    pub actions_taken: u64,
    /// Every random event seen this playthrough, first occurrence order.
    #[serde(default)]
    pub experienced_events: Vec<String>,
    /// Fractional decay not yet large enough to move a stat.
    #[serde(default)]
    pub decay_residue: BTreeMap<StatType, f64>,
}

impl SessionState {
    /// Fresh defaults for a new playthrough.
    #[must_use]
    pub fn new(profile: FounderProfile, now: DateTime<Utc>) -> Self {
        Self {
            profile,
            stats: CharacterStats::default(),
            startup: StartupStats::default(),
            created_at: now,
            last_active_at: now,
            actions_taken: 0,
            experienced_events: Vec::new(),
            decay_residue: BTreeMap::new(),
        }
    }

    /// Apply archetype starting overrides, then clamp.
    pub fn apply_archetype(&mut self, archetype: &Archetype) {
        for (stat, value) in archetype.start.overrides() {
            let clamped = stat.clamp(value);
            match stat.family() {
                StatFamily::Character => {
                    let current = self.stats.value(stat).unwrap_or_default();
                    let _ = self.stats.apply_delta(stat, clamped - current);
                }
                StatFamily::Startup => {
                    let current = self.startup.value(stat).unwrap_or_default();
                    let _ = self.startup.apply_delta(stat, clamped - current);
                }
            }
        }
        self.profile.archetype.clone_from(&archetype.id);
    }

    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.startup.stage
    }

    /// Current value of any stat.
    #[must_use]
    pub fn value(&self, stat: StatType) -> i32 {
        match stat.family() {
            StatFamily::Character => self.stats.value(stat),
            StatFamily::Startup => self.startup.value(stat),
        }
        .unwrap_or_default()
    }

    /// Route each delta to its block and clamp. Returns the changes that
    /// actually landed, in canonical stat order, omitting zero changes.
    pub fn apply_effects(&mut self, effects: &Effects) -> AppliedEffects {
        let mut applied = AppliedEffects::new();
        for (&stat, &delta) in effects {
            let landed = match stat.family() {
                StatFamily::Character => self.stats.apply_delta(stat, delta),
                StatFamily::Startup => self.startup.apply_delta(stat, delta),
            };
            debug_assert!(landed.is_some(), "stat {stat} routed to the wrong block");
            if let Some(change) = landed
                && change != 0
            {
                applied.push(StatDelta {
                    stat,
                    delta: change,
                });
            }
        }
        applied
    }

    #[must_use]
    pub const fn mood(&self) -> Mood {
        Mood::from_stats(&self.stats)
    }

    /// First failing condition in fixed priority order.
    #[must_use]
    pub fn game_over_reason(&self) -> Option<GameOverReason> {
        if self.stats.burnout >= StatType::Burnout.max_value() {
            Some(GameOverReason::BurnedOut)
        } else if self.stats.health <= 0 {
            Some(GameOverReason::HealthCollapse)
        } else if self.stats.social <= 0 {
            Some(GameOverReason::Isolation)
        } else if self.startup.runway <= 0 {
            Some(GameOverReason::OutOfRunway)
        } else {
            None
        }
    }

    /// Game-over takes precedence over victory.
    #[must_use]
    pub fn ending(&self) -> Option<Ending> {
        if let Some(reason) = self.game_over_reason() {
            return Some(Ending::GameOver { reason });
        }
        self.startup
            .stage
            .is_final()
            .then_some(Ending::Victory)
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.ending().is_some()
    }

    /// Record an event in the permanent history, keeping first-seen order.
    pub fn record_event(&mut self, event_id: &str) {
        if !self.experienced_events.iter().any(|id| id == event_id) {
            self.experienced_events.push(event_id.to_string());
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_active_at = now;
    }

    pub fn clamp_stats(&mut self) {
        self.stats.clamp();
        self.startup.clamp();
    }

    /// Whole days between creation and last activity.
    #[must_use]
    pub fn days_alive(&self) -> i64 {
        (self.last_active_at - self.created_at).num_days().max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetypes::{Archetype, ArchetypeStart};
    use chrono::TimeZone;

    fn fresh() -> SessionState {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
        SessionState::new(FounderProfile::new("Ada", "hacker", "Berlin"), now)
    }

    #[test]
    fn fresh_state_matches_defaults() {
        let state = fresh();
        assert_eq!(state.stats.energy, 80);
        assert_eq!(state.stats.health, 100);
        assert_eq!(state.stats.happiness, 70);
        assert_eq!(state.stats.social, 60);
        assert_eq!(state.stats.burnout, 10);
        assert_eq!(state.startup.funding, 0);
        assert_eq!(state.startup.product, 0);
        assert_eq!(state.startup.runway, 90);
        assert_eq!(state.stage(), Stage::Garage);
        assert_eq!(state.mood(), Mood::Happy);
        assert!(!state.is_terminal());
    }

    #[test]
    fn apply_effects_routes_both_families() {
        let mut state = fresh();
        let effects: Effects = [
            (StatType::Energy, -15),
            (StatType::Product, 10),
            (StatType::Burnout, 10),
            (StatType::Happiness, -5),
        ]
        .into_iter()
        .collect();
        let applied = state.apply_effects(&effects);
        assert_eq!(state.stats.energy, 65);
        assert_eq!(state.startup.product, 10);
        assert_eq!(state.stats.burnout, 20);
        assert_eq!(state.stats.happiness, 65);
        let stats: Vec<_> = applied.iter().map(|d| d.stat).collect();
        assert_eq!(
            stats,
            vec![
                StatType::Energy,
                StatType::Happiness,
                StatType::Burnout,
                StatType::Product
            ]
        );
    }

    #[test]
    fn applied_effects_report_clamped_change() {
        let mut state = fresh();
        let effects: Effects = [(StatType::Health, 25), (StatType::Runway, -500)]
            .into_iter()
            .collect();
        let applied = state.apply_effects(&effects);
        assert_eq!(
            applied.as_slice(),
            &[StatDelta {
                stat: StatType::Runway,
                delta: -90
            }]
        );
    }

    #[test]
    fn every_stat_stays_in_range_under_extreme_deltas() {
        for &delta in &[i32::MIN, -1_000_000, -1, 1, 1_000_000, i32::MAX] {
            let mut state = fresh();
            let effects: Effects = StatType::ALL.iter().map(|&s| (s, delta)).collect();
            state.apply_effects(&effects);
            for &stat in StatType::ALL {
                let value = state.value(stat);
                assert!(
                    (0..=stat.max_value()).contains(&value),
                    "{stat} out of range: {value}"
                );
            }
        }
    }

    #[test]
    fn mood_precedence_is_fixed() {
        let mut state = fresh();
        state.stats.burnout = 95;
        state.stats.health = 5;
        state.stats.social = 5;
        state.stats.energy = 5;
        assert_eq!(state.mood(), Mood::BurnedOut);
        state.stats.burnout = 70;
        assert_eq!(state.mood(), Mood::Sick);
        state.stats.health = 50;
        assert_eq!(state.mood(), Mood::Lonely);
        state.stats.social = 50;
        assert_eq!(state.mood(), Mood::Tired);
        state.stats.energy = 70;
        assert_eq!(state.mood(), Mood::Stressed);
        state.stats.burnout = 10;
        state.stats.happiness = 80;
        assert_eq!(state.mood(), Mood::Excited);
        state.stats.energy = 40;
        assert_eq!(state.mood(), Mood::Happy);
        state.stats.happiness = 30;
        assert_eq!(state.mood(), Mood::Neutral);
    }

    #[test]
    fn burnout_outranks_health_collapse() {
        let mut state = fresh();
        state.stats.burnout = 100;
        state.stats.health = 0;
        for _ in 0..3 {
            assert_eq!(state.game_over_reason(), Some(GameOverReason::BurnedOut));
        }
        assert_eq!(
            state.ending(),
            Some(Ending::GameOver {
                reason: GameOverReason::BurnedOut
            })
        );
    }

    #[test]
    fn terminal_reasons_follow_priority() {
        let mut state = fresh();
        state.stats.social = 0;
        state.startup.runway = 0;
        assert_eq!(state.game_over_reason(), Some(GameOverReason::Isolation));
        state.stats.social = 10;
        assert_eq!(state.game_over_reason(), Some(GameOverReason::OutOfRunway));
    }

    #[test]
    fn victory_only_at_final_stage_and_yields_to_game_over() {
        let mut state = fresh();
        state.startup.stage = Stage::SeriesB;
        assert_eq!(state.ending(), None);
        state.startup.stage = Stage::Ipo;
        assert_eq!(state.ending(), Some(Ending::Victory));
        state.startup.runway = 0;
        assert_eq!(
            state.ending(),
            Some(Ending::GameOver {
                reason: GameOverReason::OutOfRunway
            })
        );
    }

    #[test]
    fn experienced_events_are_deduplicated_in_order() {
        let mut state = fresh();
        state.record_event("viral_tweet");
        state.record_event("server_outage");
        state.record_event("viral_tweet");
        assert_eq!(state.experienced_events, vec!["viral_tweet", "server_outage"]);
    }

    #[test]
    fn archetype_overrides_are_clamped() {
        let mut state = fresh();
        let archetype = Archetype {
            id: "dropout".to_string(),
            name: "Dropout".to_string(),
            desc: String::new(),
            start: ArchetypeStart {
                energy: Some(150),
                runway: Some(30),
                ..ArchetypeStart::default()
            },
        };
        state.apply_archetype(&archetype);
        assert_eq!(state.stats.energy, 100);
        assert_eq!(state.startup.runway, 30);
        assert_eq!(state.stats.health, 100);
        assert_eq!(state.profile.archetype, "dropout");
    }

    #[test]
    fn state_round_trips_through_json() {
        let mut state = fresh();
        state.decay_residue.insert(StatType::Energy, -0.5);
        state.record_event("viral_tweet");
        let json = serde_json::to_string(&state).unwrap();
        let back: SessionState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
