//! Action validation and execution.
use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

use crate::cooldown::{CooldownMap, CooldownTracker};
use crate::data::{ActionCatalog, ActionCategory, ActionDefinition, EventDefinition};
use crate::economy::Stage;
use crate::state::{AppliedEffects, SessionState};
use crate::stats::StatType;

const WORK_FLAVOR: &[&str] = &[
    "You push another commit before the coffee goes cold.",
    "The bug that haunted you for a week finally dies.",
    "Heads down, headphones on. The roadmap shrinks a little.",
    "You ship it. Nobody claps, but the graph ticks up.",
];
const FUNDRAISING_FLAVOR: &[&str] = &[
    "The partner nods slowly. That is either very good or very bad.",
    "You tell the story one more time, with feeling.",
    "Term sheets are just spreadsheets with opinions.",
    "Another deck, another coffee, another maybe.",
];
const SELF_CARE_FLAVOR: &[&str] = &[
    "You remember that you have a body. It thanks you.",
    "Eight hours of sleep. Revolutionary.",
    "A long walk without a single podcast.",
    "You drink water on purpose.",
];
const SOCIAL_FLAVOR: &[&str] = &[
    "You talk about something other than the startup. Briefly.",
    "Old friends, new stories, the same bad jokes.",
    "Someone asks how it is going and you answer honestly.",
    "The group chat is alive again.",
];
const LEISURE_FLAVOR: &[&str] = &[
    "You close the laptop. The world keeps turning.",
    "A whole afternoon with no metrics in sight.",
    "You play a game you are terrible at and love it.",
    "Somewhere a Slack notification goes unanswered.",
];

/// Flavor line pool for an action category.
#[must_use]
pub const fn flavor_pool(category: ActionCategory) -> &'static [&'static str] {
    match category {
        ActionCategory::Work => WORK_FLAVOR,
        ActionCategory::Fundraising => FUNDRAISING_FLAVOR,
        ActionCategory::SelfCare => SELF_CARE_FLAVOR,
        ActionCategory::Social => SOCIAL_FLAVOR,
        ActionCategory::Leisure => LEISURE_FLAVOR,
    }
}

/// Why an action was refused. Nothing was mutated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionRejection {
    #[error("requires the {required} stage (currently {current})")]
    StageTooLow { required: Stage, current: Stage },
    #[error("needs {stat} of at least {required} (currently {current})")]
    RequirementUnmet {
        stat: StatType,
        required: i32,
        current: i32,
    },
    #[error("on cooldown for another {}s", .remaining.as_secs())]
    OnCooldown { remaining: Duration },
}

/// Result of a successful action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionOutcome {
    pub action: ActionDefinition,
    /// Post-clamp changes in canonical stat order.
    pub applied: AppliedEffects,
    pub flavor: String,
    pub event: Option<EventDefinition>,
    /// New stage if this action pushed the startup up a rank.
    pub stage_advanced: Option<Stage>,
}

impl ActionOutcome {
    #[must_use]
    pub const fn advanced_stage(&self) -> bool {
        self.stage_advanced.is_some()
    }
}

/// Validates and applies actions; owns the cooldown map.
#[derive(Debug, Clone, Default)]
pub struct ActionExecutor {
    cooldowns: CooldownTracker,
}

impl ActionExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_cooldowns(cooldowns: CooldownTracker) -> Self {
        Self { cooldowns }
    }

    #[must_use]
    pub const fn cooldowns(&self) -> &CooldownTracker {
        &self.cooldowns
    }

    #[must_use]
    pub const fn cooldown_map(&self) -> &CooldownMap {
        self.cooldowns.as_map()
    }

    pub fn replace_cooldowns(&mut self, cooldowns: CooldownTracker) {
        self.cooldowns = cooldowns;
    }

    pub fn clear_cooldowns(&mut self) {
        self.cooldowns.clear();
    }

    pub fn prune_cooldowns(
        &mut self,
        catalog: &ActionCatalog,
        now: DateTime<Utc>,
        grace: TimeDelta,
    ) -> usize {
        self.cooldowns.prune(catalog, now, grace)
    }

    #[must_use]
    pub fn is_on_cooldown(&self, action: &ActionDefinition, now: DateTime<Utc>) -> bool {
        self.cooldowns.is_on_cooldown(action, now)
    }

    #[must_use]
    pub fn cooldown_remaining(&self, action: &ActionDefinition, now: DateTime<Utc>) -> Duration {
        self.cooldowns.remaining(action, now)
    }

    /// Check, in order: stage gate, requirements (canonical stat order), cooldown.
    ///
    /// # Errors
    ///
    /// Returns the first failing check.
    pub fn validate(
        &self,
        action: &ActionDefinition,
        state: &SessionState,
        now: DateTime<Utc>,
    ) -> Result<(), ActionRejection> {
        let current = state.stage();
        if !action.is_unlocked(current) {
            return Err(ActionRejection::StageTooLow {
                required: action.min_stage,
                current,
            });
        }
        if let Some((stat, required, current)) = action.first_unmet_requirement(state) {
            return Err(ActionRejection::RequirementUnmet {
                stat,
                required,
                current,
            });
        }
        let remaining = self.cooldowns.remaining(action, now);
        if !remaining.is_zero() {
            return Err(ActionRejection::OnCooldown { remaining });
        }
        Ok(())
    }

    /// Validate, then apply `action` to `state`.
    ///
    /// # Errors
    ///
    /// Returns the rejection reason; the state and cooldowns are untouched.
    pub fn execute<R: Rng + ?Sized>(
        &mut self,
        action: &ActionDefinition,
        state: &mut SessionState,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<ActionOutcome, ActionRejection> {
        self.validate(action, state, now)?;

        let applied = state.apply_effects(&action.effects);
        state.actions_taken = state.actions_taken.saturating_add(1);
        state.touch(now);
        self.cooldowns.start(&action.id, now);
        let stage_advanced = state.startup.try_advance_stage();
        if let Some(stage) = stage_advanced {
            log::info!("{} advanced to {stage}", state.profile.name);
        }

        let flavor = flavor_pool(action.category)
            .choose(rng)
            .copied()
            .unwrap_or_default()
            .to_string();

        log::debug!(
            "action {} applied {} change(s); actions taken {}",
            action.id,
            applied.len(),
            state.actions_taken
        );

        Ok(ActionOutcome {
            action: action.clone(),
            applied,
            flavor,
            event: None,
            stage_advanced,
        })
    }
}
