//! Stat identities and the founder's personal stat block.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::constants::{
    CHARACTER_STAT_MAX, DEFAULT_BURNOUT, DEFAULT_ENERGY, DEFAULT_HAPPINESS, DEFAULT_HEALTH,
    DEFAULT_SOCIAL, FUNDING_MAX, PRODUCT_MAX, RUNWAY_MAX_DAYS,
};
use crate::numbers::saturating_clamp;

/// Stat deltas keyed by stat. Iteration follows [`StatType`] declaration order.
pub type Effects = BTreeMap<StatType, i32>;

/// Minimum stat values keyed by stat, checked in [`StatType`] declaration order.
pub type Requirements = BTreeMap<StatType, i32>;

/// Which block of the session a stat lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatFamily {
    Character,
    Startup,
}

/// Every tracked quantity. Declaration order is the canonical stat order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum StatType {
    Energy,
    Health,
    Happiness,
    Social,
    Burnout,
    Funding,
    Product,
    Runway,
}

impl StatType {
    pub const ALL: &'static [Self] = &[
        Self::Energy,
        Self::Health,
        Self::Happiness,
        Self::Social,
        Self::Burnout,
        Self::Funding,
        Self::Product,
        Self::Runway,
    ];

    pub const CHARACTER: &'static [Self] = &[
        Self::Energy,
        Self::Health,
        Self::Happiness,
        Self::Social,
        Self::Burnout,
    ];

    #[must_use]
    pub const fn family(self) -> StatFamily {
        match self {
            Self::Energy | Self::Health | Self::Happiness | Self::Social | Self::Burnout => {
                StatFamily::Character
            }
            Self::Funding | Self::Product | Self::Runway => StatFamily::Startup,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Energy => "energy",
            Self::Health => "health",
            Self::Happiness => "happiness",
            Self::Social => "social",
            Self::Burnout => "burnout",
            Self::Funding => "funding",
            Self::Product => "product",
            Self::Runway => "runway",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Energy => "Energy",
            Self::Health => "Health",
            Self::Happiness => "Happiness",
            Self::Social => "Social",
            Self::Burnout => "Burnout",
            Self::Funding => "Funding",
            Self::Product => "Product",
            Self::Runway => "Runway",
        }
    }

    /// Higher is worse.
    #[must_use]
    pub const fn is_inverted(self) -> bool {
        matches!(self, Self::Burnout)
    }

    #[must_use]
    pub const fn max_value(self) -> i32 {
        match self {
            Self::Energy | Self::Health | Self::Happiness | Self::Social | Self::Burnout => {
                CHARACTER_STAT_MAX
            }
            Self::Funding => FUNDING_MAX,
            Self::Product => PRODUCT_MAX,
            Self::Runway => RUNWAY_MAX_DAYS,
        }
    }

    /// Clamp a raw value into this stat's legal range.
    #[must_use]
    pub fn clamp(self, value: i32) -> i32 {
        value.clamp(0, self.max_value())
    }
}

impl fmt::Display for StatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|stat| stat.as_str() == s)
            .ok_or(())
    }
}

/// A single applied change, reported after clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatDelta {
    pub stat: StatType,
    pub delta: i32,
}

/// Personal stats of the founder. Every field stays within `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterStats {
    pub energy: i32,
    pub health: i32,
    pub happiness: i32,
    pub social: i32,
    pub burnout: i32,
}

impl Default for CharacterStats {
    fn default() -> Self {
        Self {
            energy: DEFAULT_ENERGY,
            health: DEFAULT_HEALTH,
            happiness: DEFAULT_HAPPINESS,
            social: DEFAULT_SOCIAL,
            burnout: DEFAULT_BURNOUT,
        }
    }
}

impl CharacterStats {
    /// Current value of a character stat, or `None` for startup stats.
    #[must_use]
    pub const fn value(&self, stat: StatType) -> Option<i32> {
        match stat {
            StatType::Energy => Some(self.energy),
            StatType::Health => Some(self.health),
            StatType::Happiness => Some(self.happiness),
            StatType::Social => Some(self.social),
            StatType::Burnout => Some(self.burnout),
            StatType::Funding | StatType::Product | StatType::Runway => None,
        }
    }

    const fn slot_mut(&mut self, stat: StatType) -> Option<&mut i32> {
        match stat {
            StatType::Energy => Some(&mut self.energy),
            StatType::Health => Some(&mut self.health),
            StatType::Happiness => Some(&mut self.happiness),
            StatType::Social => Some(&mut self.social),
            StatType::Burnout => Some(&mut self.burnout),
            StatType::Funding | StatType::Product | StatType::Runway => None,
        }
    }

    /// Add `delta` to one stat with saturation. Returns the change actually
    /// applied, or `None` when `stat` is not a character stat.
    pub fn apply_delta(&mut self, stat: StatType, delta: i32) -> Option<i32> {
        let max = stat.max_value();
        let slot = self.slot_mut(stat)?;
        let before = *slot;
        *slot = saturating_clamp(before, delta, max);
        Some(*slot - before)
    }

    /// Apply every character-stat entry of `effects`; other stats are untouched.
    pub fn apply(&mut self, effects: &Effects) {
        for (&stat, &delta) in effects {
            let _ = self.apply_delta(stat, delta);
        }
    }

    pub fn clamp(&mut self) {
        for &stat in StatType::CHARACTER {
            if let Some(slot) = self.slot_mut(stat) {
                *slot = stat.clamp(*slot);
            }
        }
    }
}
