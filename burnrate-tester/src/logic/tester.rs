use std::path::PathBuf;

use anyhow::{Context, Result};
use burnrate_game::{GameEngine, MemoryStorage};
use colored::Colorize;

use crate::assets::TesterAssets;
use crate::logic::policy::GameplayStrategy;
use crate::logic::simulation::{SimulationConfig, SimulationSession, SimulationSummary};
use crate::storage::JsonFileStorage;
use crate::util::run_save_dir;

/// Runs every (strategy, seed, iteration) combination against one engine.
pub struct PlaythroughRunner {
    engine: GameEngine<TesterAssets>,
    archetypes: Vec<String>,
    max_turns: u32,
    background_every: u32,
    offline_secs: i64,
    save_dir: Option<PathBuf>,
    verbose: bool,
}

impl PlaythroughRunner {
    /// With no `archetype`, runs rotate through the catalog's archetypes.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalogs fail to load or validate.
    pub fn new(assets: TesterAssets, archetype: Option<String>, verbose: bool) -> Result<Self> {
        let engine = GameEngine::new(assets);
        let data = engine.load_data().context("failed to load game catalogs")?;
        let archetypes = match archetype {
            Some(id) => vec![id],
            None => data.archetypes.iter().map(|a| a.id.clone()).collect(),
        };
        Ok(Self {
            engine,
            archetypes,
            max_turns: 500,
            background_every: 24,
            offline_secs: 2 * 3_600,
            save_dir: None,
            verbose,
        })
    }

    #[must_use]
    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    #[must_use]
    pub fn with_offline_cycle(mut self, every: u32, offline_secs: i64) -> Self {
        self.background_every = every;
        self.offline_secs = offline_secs;
        self
    }

    #[must_use]
    pub fn with_save_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.save_dir = dir;
        self
    }

    fn archetype_for(&self, iteration: usize) -> String {
        if self.archetypes.is_empty() {
            return String::new();
        }
        self.archetypes[iteration % self.archetypes.len()].clone()
    }

    /// # Errors
    ///
    /// Returns an error if any session cannot be built.
    pub fn run(
        &self,
        strategies: &[GameplayStrategy],
        seeds: &[u64],
        iterations: usize,
    ) -> Result<Vec<SimulationSummary>> {
        let mut results = Vec::with_capacity(strategies.len() * seeds.len() * iterations);
        for &strategy in strategies {
            for &seed in seeds {
                for i in 0..iterations {
                    let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
                    let summary = self.run_one(strategy, iteration_seed, i)?;
                    if self.verbose {
                        announce(&summary);
                    }
                    results.push(summary);
                }
            }
        }
        Ok(results)
    }

    fn run_one(
        &self,
        strategy: GameplayStrategy,
        seed: u64,
        iteration: usize,
    ) -> Result<SimulationSummary> {
        let config = SimulationConfig::new(strategy, seed, self.archetype_for(iteration))
            .with_max_turns(self.max_turns)
            .with_offline_cycle(self.background_every, self.offline_secs);
        let outcome = match &self.save_dir {
            Some(base) => {
                let storage = JsonFileStorage::new(run_save_dir(base, strategy.key(), seed));
                SimulationSession::new(&self.engine, storage, config)
                    .and_then(SimulationSession::run)
            }
            None => SimulationSession::new(&self.engine, MemoryStorage::default(), config)
                .and_then(SimulationSession::run),
        };
        outcome.with_context(|| format!("{} run with seed {seed} failed", strategy.label()))
    }
}

fn announce(summary: &SimulationSummary) {
    let status = if summary.passed() {
        "✅".green()
    } else {
        "❌".red()
    };
    println!(
        "{status} [{} seed {}] {} after {} turns ({}, score {})",
        summary.strategy.key(),
        summary.seed,
        summary.archetype.bright_white(),
        summary.turns,
        summary.final_summary.ending_key(),
        summary.final_summary.score
    );
}
