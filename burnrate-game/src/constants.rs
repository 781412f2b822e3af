//! Centralized balance and tuning constants for Burnrate game logic.
//!
//! These values define the deterministic math for the core simulation.
//! Catalog content (actions, events, archetypes) lives in JSON assets; the
//! numbers that shape how time, stats and stages behave live here.

// Stat ceilings -------------------------------------------------------------
pub const CHARACTER_STAT_MAX: i32 = 100;
pub const FUNDING_MAX: i32 = 100_000_000;
pub const PRODUCT_MAX: i32 = 1_000;
pub const RUNWAY_MAX_DAYS: i32 = 365;

// Fresh session defaults ----------------------------------------------------
pub const DEFAULT_ENERGY: i32 = 80;
pub const DEFAULT_HEALTH: i32 = 100;
pub const DEFAULT_HAPPINESS: i32 = 70;
pub const DEFAULT_SOCIAL: i32 = 60;
pub const DEFAULT_BURNOUT: i32 = 10;
pub const DEFAULT_FUNDING: i32 = 0;
pub const DEFAULT_PRODUCT: i32 = 0;
pub const DEFAULT_RUNWAY_DAYS: i32 = 90;

// Mood thresholds -----------------------------------------------------------
pub(crate) const MOOD_BURNED_OUT_BURNOUT: i32 = 90;
pub(crate) const MOOD_SICK_HEALTH: i32 = 20;
pub(crate) const MOOD_LONELY_SOCIAL: i32 = 15;
pub(crate) const MOOD_TIRED_ENERGY: i32 = 20;
pub(crate) const MOOD_STRESSED_BURNOUT: i32 = 60;
pub(crate) const MOOD_EXCITED_HAPPINESS: i32 = 75;
pub(crate) const MOOD_EXCITED_ENERGY: i32 = 60;
pub(crate) const MOOD_HAPPY_HAPPINESS: i32 = 60;

// Time simulation -----------------------------------------------------------
pub const SECONDS_PER_DAY: i64 = 86_400;
pub const DECAY_INTERVAL_SECS: i64 = 60;
pub const FOREGROUND_TICK_SECS: i64 = 60;
pub const OFFLINE_CAP_SECS: i64 = 72 * 3_600;
pub const RUNWAY_PER_DAY: f64 = 1.0;
pub const DECAY_ENERGY: f64 = -0.5;
pub const DECAY_HEALTH: f64 = -0.05;
pub const DECAY_HAPPINESS: f64 = -0.25;
pub const DECAY_SOCIAL: f64 = -0.2;
pub const DECAY_BURNOUT: f64 = 0.1;

// Random events -------------------------------------------------------------
pub const EVENT_MEMORY_CAPACITY: usize = 10;
pub const TICK_EVENT_PROBABILITY_SCALE: f64 = 0.05;

// Cooldown housekeeping -----------------------------------------------------
pub const COOLDOWN_PRUNE_GRACE_SECS: i64 = SECONDS_PER_DAY;

// Scoring -------------------------------------------------------------------
pub(crate) const SCORE_PER_STAGE_RANK: i64 = 10_000;
pub(crate) const SCORE_PER_PRODUCT_POINT: i64 = 5;
pub(crate) const SCORE_FUNDING_DIVISOR: i64 = 1_000;
pub(crate) const SCORE_VICTORY_BONUS: i64 = 50_000;
