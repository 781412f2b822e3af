use std::collections::BTreeMap;

use serde::Serialize;

use crate::logic::policy::GameplayStrategy;
use crate::logic::simulation::SimulationSummary;

/// Per-strategy rollup of many playthroughs.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyAggregate {
    pub strategy: GameplayStrategy,
    pub runs: usize,
    pub victories: usize,
    pub victory_rate: f64,
    pub mean_turns: f64,
    pub std_turns: f64,
    pub mean_score: f64,
    pub best_score: i64,
    pub mean_days: f64,
    pub mean_events: f64,
    pub failed_runs: usize,
    /// Ending key to how many runs finished that way.
    pub endings: BTreeMap<String, usize>,
}

pub fn aggregate_runs(runs: &[SimulationSummary]) -> Vec<StrategyAggregate> {
    let mut builders: BTreeMap<GameplayStrategy, AggregateBuilder> = BTreeMap::new();
    for run in runs {
        builders
            .entry(run.strategy)
            .or_insert_with(|| AggregateBuilder::new(run.strategy))
            .ingest(run);
    }
    builders
        .into_values()
        .map(AggregateBuilder::finish)
        .collect()
}

struct AggregateBuilder {
    strategy: GameplayStrategy,
    runs: u32,
    victories: usize,
    failed_runs: usize,
    turns: RunningStats,
    score: RunningStats,
    days: RunningStats,
    events: RunningStats,
    best_score: i64,
    endings: BTreeMap<String, usize>,
}

impl AggregateBuilder {
    fn new(strategy: GameplayStrategy) -> Self {
        Self {
            strategy,
            runs: 0,
            victories: 0,
            failed_runs: 0,
            turns: RunningStats::default(),
            score: RunningStats::default(),
            days: RunningStats::default(),
            events: RunningStats::default(),
            best_score: i64::MIN,
            endings: BTreeMap::new(),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn ingest(&mut self, run: &SimulationSummary) {
        self.runs = self.runs.saturating_add(1);
        let summary = &run.final_summary;
        if summary.is_victory() {
            self.victories += 1;
        }
        if !run.passed() {
            self.failed_runs += 1;
        }
        self.turns.add(f64::from(run.turns));
        self.score.add(summary.score as f64);
        self.days.add(summary.days_survived as f64);
        self.events.add(f64::from(run.events_triggered));
        self.best_score = self.best_score.max(summary.score);
        *self
            .endings
            .entry(summary.ending_key().to_string())
            .or_default() += 1;
    }

    fn finish(self) -> StrategyAggregate {
        let runs = usize::try_from(self.runs).unwrap_or(usize::MAX);
        let denom = f64::from(self.runs.max(1));
        #[allow(clippy::cast_precision_loss)]
        let victory_rate = self.victories as f64 / denom;
        StrategyAggregate {
            strategy: self.strategy,
            runs,
            victories: self.victories,
            victory_rate,
            mean_turns: self.turns.mean(),
            std_turns: self.turns.std_dev(),
            mean_score: self.score.mean(),
            best_score: if runs == 0 { 0 } else { self.best_score },
            mean_days: self.days.mean(),
            mean_events: self.events.mean(),
            failed_runs: self.failed_runs,
            endings: self.endings,
        }
    }
}

#[derive(Debug, Default)]
struct RunningStats {
    count: u32,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    fn add(&mut self, value: f64) {
        self.count += 1;
        let count = f64::from(self.count);
        let delta = value - self.mean;
        self.mean += delta / count;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    const fn mean(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.mean }
    }

    fn std_dev(&self) -> f64 {
        if self.count > 1 {
            (self.m2 / f64::from(self.count - 1)).sqrt()
        } else {
            0.0
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use burnrate_game::{Ending, GameOverReason, Mood, SessionSummary, Stage};

    pub(crate) fn sample_run(
        strategy: GameplayStrategy,
        seed: u64,
        ending: Option<Ending>,
        turns: u32,
        score: i64,
    ) -> SimulationSummary {
        SimulationSummary {
            seed,
            strategy,
            archetype: "hacker".to_string(),
            turns,
            actions_performed: turns,
            rejected_actions: 0,
            idle_turns: 0,
            ticks: u64::from(turns) * 10,
            offline_gaps: 0,
            events_triggered: 2,
            stage_advances: 1,
            ended: ending.is_some(),
            final_summary: SessionSummary {
                founder: format!("Founder #{seed}"),
                archetype: "hacker".to_string(),
                ending,
                stage: Stage::PreSeed,
                mood: Mood::Neutral,
                funding: 30_000,
                product: 60,
                runway: 80,
                actions_taken: u64::from(turns),
                distinct_events: 2,
                days_survived: 4,
                score,
            },
            failures: Vec::new(),
        }
    }

    #[test]
    fn aggregates_group_by_strategy() {
        let runs = vec![
            sample_run(GameplayStrategy::Grinder, 1, Some(Ending::Victory), 100, 90_000),
            sample_run(
                GameplayStrategy::Grinder,
                2,
                Some(Ending::GameOver {
                    reason: GameOverReason::BurnedOut,
                }),
                300,
                10_000,
            ),
            sample_run(GameplayStrategy::Cautious, 1, None, 500, 20_000),
        ];
        let aggregates = aggregate_runs(&runs);
        assert_eq!(aggregates.len(), 2);

        let grinder = &aggregates[0];
        assert_eq!(grinder.strategy, GameplayStrategy::Grinder);
        assert_eq!(grinder.runs, 2);
        assert_eq!(grinder.victories, 1);
        assert!((grinder.victory_rate - 0.5).abs() < f64::EPSILON);
        assert!((grinder.mean_turns - 200.0).abs() < 1e-9);
        assert!((grinder.std_turns - 141.421_356).abs() < 1e-3);
        assert_eq!(grinder.best_score, 90_000);
        assert_eq!(grinder.endings.get("victory"), Some(&1));
        assert_eq!(grinder.endings.get("burned_out"), Some(&1));

        let cautious = &aggregates[1];
        assert_eq!(cautious.endings.get("in_progress"), Some(&1));
        assert!((cautious.std_turns).abs() < f64::EPSILON);
    }

    #[test]
    fn failed_runs_are_counted() {
        let mut run = sample_run(GameplayStrategy::Random, 4, None, 10, 100);
        run.failures.push("turn 3: broken".to_string());
        let aggregates = aggregate_runs(&[run]);
        assert_eq!(aggregates[0].failed_runs, 1);
    }
}
