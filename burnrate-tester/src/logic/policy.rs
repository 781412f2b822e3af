use std::fmt;
use std::str::FromStr;

use burnrate_game::{ActionDefinition, Effects, SessionState, StatType};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha20Rng;
use serde::Serialize;

/// Decision returned by a [`PlayerPolicy`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDecision {
    pub action_id: String,
    pub rationale: Option<String>,
}

impl PolicyDecision {
    #[must_use]
    pub fn new(action_id: impl Into<String>, rationale: Option<String>) -> Self {
        Self {
            action_id: action_id.into(),
            rationale,
        }
    }
}

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Pick one of the currently available actions, or `None` to idle.
    fn pick_action(
        &mut self,
        state: &SessionState,
        available: &[&ActionDefinition],
    ) -> Option<PolicyDecision>;
}

/// Built-in gameplay strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameplayStrategy {
    Grinder,
    Balanced,
    Cautious,
    Random,
}

impl GameplayStrategy {
    pub const ALL: [Self; 4] = [Self::Grinder, Self::Balanced, Self::Cautious, Self::Random];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Grinder => "grinder",
            Self::Balanced => "balanced",
            Self::Cautious => "cautious",
            Self::Random => "random",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Grinder => "Grinder",
            Self::Balanced => "Balanced",
            Self::Cautious => "Cautious",
            Self::Random => "Random",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Grinder => "Always pushes product and funding; rests only near collapse",
            Self::Balanced => "Weighs progress against whatever the founder needs most",
            Self::Cautious => "Keeps every wellbeing stat topped up before working",
            Self::Random => "Uniformly random pick among available actions",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy> {
        match self {
            Self::Grinder => Box::new(GrinderPolicy),
            Self::Balanced => Box::new(BalancedPolicy),
            Self::Cautious => Box::new(CautiousPolicy),
            Self::Random => Box::new(RandomPolicy::new(seed)),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GameplayStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown strategy '{s}'"))
    }
}

struct GrinderPolicy;
struct BalancedPolicy;
struct CautiousPolicy;

struct RandomPolicy {
    rng: ChaCha20Rng,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl PlayerPolicy for GrinderPolicy {
    fn name(&self) -> &'static str {
        "Grinder"
    }

    fn pick_action(
        &mut self,
        state: &SessionState,
        available: &[&ActionDefinition],
    ) -> Option<PolicyDecision> {
        let collapsing = state.stats.energy < 15
            || state.stats.health < 20
            || state.stats.social < 15
            || state.stats.burnout > 85;
        best_by(available, |action| {
            if collapsing {
                wellbeing_value(state, &action.effects)
            } else {
                progress_value(&action.effects) * 4 + wellbeing_value(state, &action.effects)
            }
        })
    }
}

impl PlayerPolicy for BalancedPolicy {
    fn name(&self) -> &'static str {
        "Balanced"
    }

    fn pick_action(
        &mut self,
        state: &SessionState,
        available: &[&ActionDefinition],
    ) -> Option<PolicyDecision> {
        best_by(available, |action| {
            progress_value(&action.effects) + wellbeing_value(state, &action.effects)
        })
    }
}

impl PlayerPolicy for CautiousPolicy {
    fn name(&self) -> &'static str {
        "Cautious"
    }

    fn pick_action(
        &mut self,
        state: &SessionState,
        available: &[&ActionDefinition],
    ) -> Option<PolicyDecision> {
        best_by(available, |action| {
            progress_value(&action.effects) + wellbeing_value(state, &action.effects) * 3
                - risk_value(state, &action.effects)
        })
    }
}

impl PlayerPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn pick_action(
        &mut self,
        _state: &SessionState,
        available: &[&ActionDefinition],
    ) -> Option<PolicyDecision> {
        available
            .choose(&mut self.rng)
            .map(|action| PolicyDecision::new(action.id.as_str(), None))
    }
}

fn best_by<F>(available: &[&ActionDefinition], mut score: F) -> Option<PolicyDecision>
where
    F: FnMut(&ActionDefinition) -> i32,
{
    available
        .iter()
        .map(|action| (*action, score(action)))
        .max_by_key(|(_, score)| *score)
        .map(|(action, score)| {
            PolicyDecision::new(action.id.as_str(), Some(format!("score {score}")))
        })
}

fn effect(effects: &Effects, stat: StatType) -> i32 {
    effects.get(&stat).copied().unwrap_or(0)
}

/// Startup progress an action buys, ignoring what it costs the founder.
fn progress_value(effects: &Effects) -> i32 {
    effect(effects, StatType::Funding) / 1_000
        + effect(effects, StatType::Product) * 2
        + effect(effects, StatType::Runway) * 3
}

/// Character-stat gains weighted by how far each stat is from healthy, so a
/// starving stat pulls harder than a full one.
fn wellbeing_value(state: &SessionState, effects: &Effects) -> i32 {
    StatType::CHARACTER
        .iter()
        .map(|&stat| {
            let delta = effect(effects, stat);
            let current = state.value(stat);
            let (gain, pressure) = if stat.is_inverted() {
                (-delta, current)
            } else {
                (delta, stat.max_value() - current)
            };
            gain * (1 + pressure / 20)
        })
        .sum()
}

/// Penalty for pushing any stat to within ten points of a game-over line.
fn risk_value(state: &SessionState, effects: &Effects) -> i32 {
    StatType::CHARACTER
        .iter()
        .map(|&stat| {
            let projected = state.value(stat) + effect(effects, stat);
            let margin = if stat.is_inverted() {
                stat.max_value() - projected
            } else {
                projected
            };
            (10 - margin).max(0) * 5
        })
        .sum()
}
