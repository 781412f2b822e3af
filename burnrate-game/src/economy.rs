//! Startup stage ladder and the economy block.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{DEFAULT_FUNDING, DEFAULT_PRODUCT, DEFAULT_RUNWAY_DAYS};
use crate::numbers::saturating_clamp;
use crate::stats::{Effects, StatType};

/// Ordered rank on the way from garage to IPO. Only ever increases.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Garage,
    PreSeed,
    Seed,
    SeriesA,
    SeriesB,
    Ipo,
}

impl Stage {
    pub const ALL: &'static [Self] = &[
        Self::Garage,
        Self::PreSeed,
        Self::Seed,
        Self::SeriesA,
        Self::SeriesB,
        Self::Ipo,
    ];

    /// The victory rank.
    pub const FINAL: Self = Self::Ipo;

    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Garage => 0,
            Self::PreSeed => 1,
            Self::Seed => 2,
            Self::SeriesA => 3,
            Self::SeriesB => 4,
            Self::Ipo => 5,
        }
    }

    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Garage => Some(Self::PreSeed),
            Self::PreSeed => Some(Self::Seed),
            Self::Seed => Some(Self::SeriesA),
            Self::SeriesA => Some(Self::SeriesB),
            Self::SeriesB => Some(Self::Ipo),
            Self::Ipo => None,
        }
    }

    /// Funding required to enter this stage.
    #[must_use]
    pub const fn funding_threshold(self) -> i32 {
        match self {
            Self::Garage => 0,
            Self::PreSeed => 25_000,
            Self::Seed => 250_000,
            Self::SeriesA => 2_000_000,
            Self::SeriesB => 10_000_000,
            Self::Ipo => 50_000_000,
        }
    }

    /// Product progress required to enter this stage.
    #[must_use]
    pub const fn product_threshold(self) -> i32 {
        match self {
            Self::Garage => 0,
            Self::PreSeed => 50,
            Self::Seed => 150,
            Self::SeriesA => 350,
            Self::SeriesB => 600,
            Self::Ipo => 900,
        }
    }

    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(self, Self::Ipo)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Garage => "garage",
            Self::PreSeed => "pre_seed",
            Self::Seed => "seed",
            Self::SeriesA => "series_a",
            Self::SeriesB => "series_b",
            Self::Ipo => "ipo",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Garage => "Garage",
            Self::PreSeed => "Pre-Seed",
            Self::Seed => "Seed",
            Self::SeriesA => "Series A",
            Self::SeriesB => "Series B",
            Self::Ipo => "IPO",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Stage {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|stage| stage.as_str() == s)
            .ok_or(())
    }
}

/// Company state: stage plus funding, product and runway (days).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartupStats {
    #[serde(default)]
    pub stage: Stage,
    pub funding: i32,
    pub product: i32,
    pub runway: i32,
}

impl Default for StartupStats {
    fn default() -> Self {
        Self {
            stage: Stage::Garage,
            funding: DEFAULT_FUNDING,
            product: DEFAULT_PRODUCT,
            runway: DEFAULT_RUNWAY_DAYS,
        }
    }
}

impl StartupStats {
    /// Current value of a startup stat, or `None` for character stats.
    #[must_use]
    pub const fn value(&self, stat: StatType) -> Option<i32> {
        match stat {
            StatType::Funding => Some(self.funding),
            StatType::Product => Some(self.product),
            StatType::Runway => Some(self.runway),
            StatType::Energy
            | StatType::Health
            | StatType::Happiness
            | StatType::Social
            | StatType::Burnout => None,
        }
    }

    const fn slot_mut(&mut self, stat: StatType) -> Option<&mut i32> {
        match stat {
            StatType::Funding => Some(&mut self.funding),
            StatType::Product => Some(&mut self.product),
            StatType::Runway => Some(&mut self.runway),
            StatType::Energy
            | StatType::Health
            | StatType::Happiness
            | StatType::Social
            | StatType::Burnout => None,
        }
    }

    /// Add `delta` to one stat with saturation. Returns the change actually
    /// applied, or `None` when `stat` is not a startup stat.
    pub fn apply_delta(&mut self, stat: StatType, delta: i32) -> Option<i32> {
        let max = stat.max_value();
        let slot = self.slot_mut(stat)?;
        let before = *slot;
        *slot = saturating_clamp(before, delta, max);
        Some(*slot - before)
    }

    /// Apply every startup-stat entry of `effects`; other stats are untouched.
    pub fn apply(&mut self, effects: &Effects) {
        for (&stat, &delta) in effects {
            let _ = self.apply_delta(stat, delta);
        }
    }

    pub fn clamp(&mut self) {
        for stat in [StatType::Funding, StatType::Product, StatType::Runway] {
            if let Some(slot) = self.slot_mut(stat) {
                *slot = stat.clamp(*slot);
            }
        }
    }

    /// Whether funding and product both meet the next stage's thresholds.
    #[must_use]
    pub const fn can_advance(&self) -> bool {
        match self.stage.next() {
            Some(next) => {
                self.funding >= next.funding_threshold()
                    && self.product >= next.product_threshold()
            }
            None => false,
        }
    }

    /// Advance one rank when eligible. Returns the new stage on success.
    pub fn try_advance_stage(&mut self) -> Option<Stage> {
        if !self.can_advance() {
            return None;
        }
        let next = self.stage.next()?;
        self.stage = next;
        Some(next)
    }
}
