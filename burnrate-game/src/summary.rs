//! End-of-run summary and score.
use serde::{Deserialize, Serialize};

use crate::constants::{
    SCORE_FUNDING_DIVISOR, SCORE_PER_PRODUCT_POINT, SCORE_PER_STAGE_RANK, SCORE_VICTORY_BONUS,
};
use crate::economy::Stage;
use crate::state::{Ending, Mood, SessionState};

/// End-of-run (or mid-run) snapshot used by reports and the tester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub founder: String,
    pub archetype: String,
    pub ending: Option<Ending>,
    pub stage: Stage,
    pub mood: Mood,
    pub funding: i32,
    pub product: i32,
    pub runway: i32,
    pub actions_taken: u64,
    pub distinct_events: usize,
    pub days_survived: i64,
    pub score: i64,
}

impl SessionSummary {
    #[must_use]
    pub fn from_state(state: &SessionState) -> Self {
        let ending = state.ending();
        Self {
            founder: state.profile.name.clone(),
            archetype: state.profile.archetype.clone(),
            ending,
            stage: state.stage(),
            mood: state.mood(),
            funding: state.startup.funding,
            product: state.startup.product,
            runway: state.startup.runway,
            actions_taken: state.actions_taken,
            distinct_events: state.experienced_events.len(),
            days_survived: state.days_alive(),
            score: score(state, ending),
        }
    }

    #[must_use]
    pub fn is_victory(&self) -> bool {
        self.ending.is_some_and(Ending::is_victory)
    }

    /// Stable key for aggregating reports; unfinished runs report `in_progress`.
    #[must_use]
    pub fn ending_key(&self) -> &'static str {
        self.ending.map_or("in_progress", Ending::key)
    }
}

/// Stage rank dominates, then product, then funding, then activity.
#[must_use]
pub fn score(state: &SessionState, ending: Option<Ending>) -> i64 {
    let stage = i64::from(state.stage().rank()) * SCORE_PER_STAGE_RANK;
    let product = i64::from(state.startup.product) * SCORE_PER_PRODUCT_POINT;
    let funding = i64::from(state.startup.funding) / SCORE_FUNDING_DIVISOR;
    let actions = i64::try_from(state.actions_taken).unwrap_or(i64::MAX);
    let bonus = if ending.is_some_and(Ending::is_victory) {
        SCORE_VICTORY_BONUS
    } else {
        0
    };
    stage
        .saturating_add(product)
        .saturating_add(funding)
        .saturating_add(actions)
        .saturating_add(bonus)
}
