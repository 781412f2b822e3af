//! Action and event catalogs.
//!
//! Catalog content is configuration data loaded from JSON; the engine only
//! queries it.
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;

use crate::archetypes::ArchetypeList;
use crate::economy::Stage;
use crate::state::{Mood, SessionState};
use crate::stats::{Effects, Requirements, StatType};

/// Errors raised when catalog data is malformed or violates invariants.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog JSON is invalid: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate action id '{0}'")]
    DuplicateAction(String),
    #[error("duplicate event id '{0}'")]
    DuplicateEvent(String),
    #[error("event '{id}' probability {value} is outside [0, 1]")]
    InvalidProbability { id: String, value: f64 },
    #[error("event '{id}' stage window invalid (min {min} > max {max})")]
    InvalidStageRange { id: String, min: Stage, max: Stage },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionCategory {
    Work,
    Fundraising,
    SelfCare,
    Social,
    Leisure,
}

impl ActionCategory {
    pub const ALL: &'static [Self] = &[
        Self::Work,
        Self::Fundraising,
        Self::SelfCare,
        Self::Social,
        Self::Leisure,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::Fundraising => "fundraising",
            Self::SelfCare => "self_care",
            Self::Social => "social",
            Self::Leisure => "leisure",
        }
    }
}

impl fmt::Display for ActionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A player action. Two actions are equal iff their ids match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    pub category: ActionCategory,
    #[serde(default)]
    pub effects: Effects,
    #[serde(default)]
    pub requirements: Requirements,
    /// Zero means no cooldown.
    #[serde(default)]
    pub cooldown_secs: u64,
    #[serde(default)]
    pub min_stage: Stage,
    #[serde(default)]
    pub minigame: Option<String>,
}

impl PartialEq for ActionDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ActionDefinition {}

impl Hash for ActionDefinition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl ActionDefinition {
    /// Minimal definition with no gates, useful for tests and tooling.
    #[must_use]
    pub fn new(id: impl Into<String>, category: ActionCategory) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            desc: String::new(),
            category,
            effects: Effects::new(),
            requirements: Requirements::new(),
            cooldown_secs: 0,
            min_stage: Stage::Garage,
            minigame: None,
        }
    }

    #[must_use]
    pub fn with_effect(mut self, stat: StatType, delta: i32) -> Self {
        self.effects.insert(stat, delta);
        self
    }

    #[must_use]
    pub fn with_requirement(mut self, stat: StatType, min: i32) -> Self {
        self.requirements.insert(stat, min);
        self
    }

    #[must_use]
    pub const fn with_cooldown_secs(mut self, secs: u64) -> Self {
        self.cooldown_secs = secs;
        self
    }

    #[must_use]
    pub const fn with_min_stage(mut self, stage: Stage) -> Self {
        self.min_stage = stage;
        self
    }

    /// Configured cooldown, or `None` when the action can be repeated freely.
    #[must_use]
    pub fn cooldown(&self) -> Option<TimeDelta> {
        if self.cooldown_secs == 0 {
            return None;
        }
        let secs = i64::try_from(self.cooldown_secs).unwrap_or(i64::MAX);
        TimeDelta::try_seconds(secs).or(Some(TimeDelta::MAX))
    }

    #[must_use]
    pub fn is_unlocked(&self, stage: Stage) -> bool {
        stage >= self.min_stage
    }

    /// First requirement (canonical stat order) the state fails to meet.
    #[must_use]
    pub fn first_unmet_requirement(&self, state: &SessionState) -> Option<(StatType, i32, i32)> {
        self.requirements.iter().find_map(|(&stat, &required)| {
            let current = state.value(stat);
            (current < required).then_some((stat, required, current))
        })
    }

    #[must_use]
    pub fn meets_requirements(&self, state: &SessionState) -> bool {
        self.first_unmet_requirement(state).is_none()
    }
}

fn default_positive() -> bool {
    true
}

/// A random event that may fire after actions or on ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub effects: Effects,
    /// Chance in `[0, 1]` per opportunity.
    pub probability: f64,
    #[serde(default)]
    pub min_stage: Stage,
    #[serde(default)]
    pub max_stage: Option<Stage>,
    #[serde(default)]
    pub required_mood: Option<Mood>,
    /// Presentation only.
    #[serde(default = "default_positive")]
    pub positive: bool,
}

impl EventDefinition {
    #[must_use]
    pub fn new(id: impl Into<String>, probability: f64) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            desc: String::new(),
            effects: Effects::new(),
            probability,
            min_stage: Stage::Garage,
            max_stage: None,
            required_mood: None,
            positive: true,
        }
    }

    #[must_use]
    pub fn with_effect(mut self, stat: StatType, delta: i32) -> Self {
        self.effects.insert(stat, delta);
        self
    }

    #[must_use]
    pub const fn with_stage_window(mut self, min: Stage, max: Option<Stage>) -> Self {
        self.min_stage = min;
        self.max_stage = max;
        self
    }

    #[must_use]
    pub const fn with_required_mood(mut self, mood: Mood) -> Self {
        self.required_mood = Some(mood);
        self
    }

    #[must_use]
    pub fn stage_eligible(&self, stage: Stage) -> bool {
        stage >= self.min_stage && self.max_stage.is_none_or(|max| stage <= max)
    }

    #[must_use]
    pub fn mood_eligible(&self, mood: Mood) -> bool {
        self.required_mood.is_none_or(|required| required == mood)
    }

    #[must_use]
    pub fn is_eligible(&self, state: &SessionState) -> bool {
        self.stage_eligible(state.stage()) && self.mood_eligible(state.mood())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ActionCatalog {
    pub actions: Vec<ActionDefinition>,
}

impl ActionCatalog {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            actions: Vec::new(),
        }
    }

    #[must_use]
    pub const fn from_actions(actions: Vec<ActionDefinition>) -> Self {
        Self { actions }
    }

    /// Load actions from JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into valid action data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn all(&self) -> &[ActionDefinition] {
        &self.actions
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ActionDefinition> {
        self.actions.iter().find(|action| action.id == id)
    }

    pub fn by_category(
        &self,
        category: ActionCategory,
    ) -> impl Iterator<Item = &ActionDefinition> + '_ {
        self.actions
            .iter()
            .filter(move |action| action.category == category)
    }

    pub fn filter<'a, P>(&'a self, mut predicate: P) -> impl Iterator<Item = &'a ActionDefinition>
    where
        P: FnMut(&ActionDefinition) -> bool + 'a,
    {
        self.actions.iter().filter(move |action| predicate(action))
    }

    /// Actions whose stage gate and requirements the state satisfies.
    /// Cooldowns are tracked by the executor and not considered here.
    pub fn available_for<'a>(
        &'a self,
        state: &'a SessionState,
    ) -> impl Iterator<Item = &'a ActionDefinition> {
        self.filter(move |action| {
            action.is_unlocked(state.stage()) && action.meets_requirements(state)
        })
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EventCatalog {
    pub events: Vec<EventDefinition>,
}

impl EventCatalog {
    #[must_use]
    pub const fn empty() -> Self {
        Self { events: Vec::new() }
    }

    #[must_use]
    pub const fn from_events(events: Vec<EventDefinition>) -> Self {
        Self { events }
    }

    /// Load events from JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into valid event data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn all(&self) -> &[EventDefinition] {
        &self.events
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&EventDefinition> {
        self.events.iter().find(|event| event.id == id)
    }

    pub fn filter<'a, P>(&'a self, mut predicate: P) -> impl Iterator<Item = &'a EventDefinition>
    where
        P: FnMut(&EventDefinition) -> bool + 'a,
    {
        self.events.iter().filter(move |event| predicate(event))
    }

    /// Events whose stage window and mood gate match the state.
    pub fn eligible_for<'a>(
        &'a self,
        state: &'a SessionState,
    ) -> impl Iterator<Item = &'a EventDefinition> {
        self.filter(move |event| event.is_eligible(state))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Everything the engine reads from configuration data.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GameData {
    pub actions: ActionCatalog,
    pub events: EventCatalog,
    pub archetypes: ArchetypeList,
}

impl GameData {
    /// Create empty game data (useful for tests)
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            actions: ActionCatalog::empty(),
            events: EventCatalog::empty(),
            archetypes: ArchetypeList::empty(),
        }
    }

    /// Bundle pre-built catalogs after validating them.
    ///
    /// # Errors
    ///
    /// Returns an error when ids repeat, a probability leaves `[0, 1]`, or an
    /// event's stage window is inverted.
    pub fn new(
        actions: ActionCatalog,
        events: EventCatalog,
        archetypes: ArchetypeList,
    ) -> Result<Self, CatalogError> {
        let data = Self {
            actions,
            events,
            archetypes,
        };
        data.validate()?;
        Ok(data)
    }

    /// Parse and validate the three catalog documents.
    ///
    /// # Errors
    ///
    /// Returns an error if any document fails to parse or the result fails
    /// validation.
    pub fn from_json_parts(
        actions_json: &str,
        events_json: &str,
        archetypes_json: &str,
    ) -> Result<Self, CatalogError> {
        Self::new(
            ActionCatalog::from_json(actions_json)?,
            EventCatalog::from_json(events_json)?,
            ArchetypeList::from_json(archetypes_json)?,
        )
    }

    /// Check catalog invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        for action in &self.actions.actions {
            if !seen.insert(action.id.as_str()) {
                return Err(CatalogError::DuplicateAction(action.id.clone()));
            }
        }

        let mut seen = HashSet::new();
        for event in &self.events.events {
            if !seen.insert(event.id.as_str()) {
                return Err(CatalogError::DuplicateEvent(event.id.clone()));
            }
            if !(0.0..=1.0).contains(&event.probability) {
                return Err(CatalogError::InvalidProbability {
                    id: event.id.clone(),
                    value: event.probability,
                });
            }
            if let Some(max) = event.max_stage
                && event.min_stage > max
            {
                return Err(CatalogError::InvalidStageRange {
                    id: event.id.clone(),
                    min: event.min_stage,
                    max,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::FounderProfile;
    use chrono::Utc;

    fn state() -> SessionState {
        SessionState::new(FounderProfile::default(), Utc::now())
    }

    #[test]
    fn action_catalog_from_json() {
        let json = r#"{
            "actions": [
                {
                    "id": "ship_feature",
                    "name": "Ship a Feature",
                    "category": "work",
                    "effects": { "energy": -15, "product": 10 },
                    "requirements": { "energy": 20 },
                    "cooldown_secs": 300,
                    "minigame": "code_sprint"
                },
                {
                    "id": "pitch_angels",
                    "name": "Pitch Angels",
                    "category": "fundraising",
                    "min_stage": "pre_seed"
                }
            ]
        }"#;

        let catalog = ActionCatalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 2);
        let ship = catalog.get("ship_feature").unwrap();
        assert_eq!(ship.effects.get(&StatType::Product), Some(&10));
        assert_eq!(ship.requirements.get(&StatType::Energy), Some(&20));
        assert_eq!(ship.cooldown(), TimeDelta::try_seconds(300));
        assert_eq!(ship.minigame.as_deref(), Some("code_sprint"));
        let pitch = catalog.get("pitch_angels").unwrap();
        assert_eq!(pitch.min_stage, Stage::PreSeed);
        assert_eq!(pitch.cooldown(), None);
        assert_eq!(catalog.by_category(ActionCategory::Work).count(), 1);
    }

    #[test]
    fn actions_compare_by_id_only() {
        let a = ActionDefinition::new("nap", ActionCategory::SelfCare).with_effect(StatType::Energy, 10);
        let b = ActionDefinition::new("nap", ActionCategory::Leisure);
        assert_eq!(a, b);
        assert_ne!(a, ActionDefinition::new("gym", ActionCategory::SelfCare));
    }

    #[test]
    fn available_for_applies_stage_and_requirements() {
        let catalog = ActionCatalog::from_actions(vec![
            ActionDefinition::new("code", ActionCategory::Work).with_requirement(StatType::Energy, 50),
            ActionDefinition::new("grind", ActionCategory::Work).with_requirement(StatType::Energy, 90),
            ActionDefinition::new("ipo_roadshow", ActionCategory::Fundraising)
                .with_min_stage(Stage::SeriesB),
        ]);
        let state = state();
        let ids: Vec<_> = catalog.available_for(&state).map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["code"]);
    }

    #[test]
    fn first_unmet_requirement_uses_canonical_order() {
        let action = ActionDefinition::new("marathon", ActionCategory::Work)
            .with_requirement(StatType::Social, 99)
            .with_requirement(StatType::Energy, 99);
        let state = state();
        assert_eq!(
            action.first_unmet_requirement(&state),
            Some((StatType::Energy, 99, 80))
        );
    }

    #[test]
    fn event_eligibility_checks_stage_window_and_mood() {
        let event = EventDefinition::new("press_feature", 0.5)
            .with_stage_window(Stage::PreSeed, Some(Stage::SeriesA))
            .with_required_mood(Mood::Happy);
        assert!(!event.stage_eligible(Stage::Garage));
        assert!(event.stage_eligible(Stage::PreSeed));
        assert!(event.stage_eligible(Stage::SeriesA));
        assert!(!event.stage_eligible(Stage::SeriesB));
        assert!(event.mood_eligible(Mood::Happy));
        assert!(!event.mood_eligible(Mood::Tired));
    }

    #[test]
    fn validation_rejects_bad_catalogs() {
        let dup = GameData::new(
            ActionCatalog::from_actions(vec![
                ActionDefinition::new("nap", ActionCategory::SelfCare),
                ActionDefinition::new("nap", ActionCategory::SelfCare),
            ]),
            EventCatalog::empty(),
            ArchetypeList::empty(),
        );
        assert!(matches!(dup, Err(CatalogError::DuplicateAction(id)) if id == "nap"));

        let prob = GameData::new(
            ActionCatalog::empty(),
            EventCatalog::from_events(vec![EventDefinition::new("jackpot", 1.5)]),
            ArchetypeList::empty(),
        );
        assert!(matches!(prob, Err(CatalogError::InvalidProbability { .. })));

        let window = GameData::new(
            ActionCatalog::empty(),
            EventCatalog::from_events(vec![
                EventDefinition::new("late", 0.1).with_stage_window(Stage::Seed, Some(Stage::Garage)),
            ]),
            ArchetypeList::empty(),
        );
        assert!(matches!(window, Err(CatalogError::InvalidStageRange { .. })));
    }

    #[test]
    fn from_json_parts_surfaces_parse_errors() {
        let err = GameData::from_json_parts("{", r#"{"events":[]}"#, "{}").unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }
}
