use std::sync::mpsc::Receiver;

use anyhow::{Context, Result};
use burnrate_game::{
    CatalogLoader, CommandError, FounderProfile, GameEngine, ManualClock, SessionManager,
    SessionNotification, SessionStorage, SessionSummary, StatType,
};
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use crate::logic::policy::{GameplayStrategy, PlayerPolicy, PolicyDecision};

/// Configuration for a simulation session.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub seed: u64,
    pub strategy: GameplayStrategy,
    pub archetype: String,
    pub max_turns: u32,
    /// Simulated seconds between two player decisions.
    pub turn_secs: i64,
    /// Background the app after this many turns; zero disables it.
    pub background_every: u32,
    pub offline_secs: i64,
}

impl SimulationConfig {
    #[must_use]
    pub fn new(strategy: GameplayStrategy, seed: u64, archetype: impl Into<String>) -> Self {
        Self {
            seed,
            strategy,
            archetype: archetype.into(),
            max_turns: 500,
            turn_secs: 600,
            background_every: 24,
            offline_secs: 2 * 3_600,
        }
    }

    #[must_use]
    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    #[must_use]
    pub fn with_offline_cycle(mut self, every: u32, offline_secs: i64) -> Self {
        self.background_every = every;
        self.offline_secs = offline_secs.max(0);
        self
    }
}

/// Every run starts at the same wall-clock instant so seeds reproduce.
#[must_use]
pub fn simulation_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Outcome of one automated playthrough.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationSummary {
    pub seed: u64,
    pub strategy: GameplayStrategy,
    pub archetype: String,
    pub turns: u32,
    pub actions_performed: u32,
    pub rejected_actions: u32,
    pub idle_turns: u32,
    pub ticks: u64,
    pub offline_gaps: u32,
    pub events_triggered: u32,
    pub stage_advances: u32,
    pub ended: bool,
    pub final_summary: SessionSummary,
    /// Invariant breaches spotted during the run; empty on a clean run.
    pub failures: Vec<String>,
}

impl SimulationSummary {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Core deterministic simulation harness used by the tester.
pub struct SimulationSession<S>
where
    S: SessionStorage,
{
    manager: SessionManager<S, ManualClock>,
    clock: ManualClock,
    notifications: Receiver<SessionNotification>,
    policy: Box<dyn PlayerPolicy>,
    config: SimulationConfig,
    summary: RunCounters,
}

#[derive(Debug, Default)]
struct RunCounters {
    turns: u32,
    actions_performed: u32,
    rejected_actions: u32,
    idle_turns: u32,
    ticks: u64,
    offline_gaps: u32,
    events_triggered: u32,
    stage_advances: u32,
    sessions_ended: u32,
    failures: Vec<String>,
}

impl<S> SimulationSession<S>
where
    S: SessionStorage,
{
    /// Build a manager over `storage` and start a fresh session for the
    /// configured archetype.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalogs or engine config fail to load.
    pub fn new<L>(engine: &GameEngine<L>, storage: S, config: SimulationConfig) -> Result<Self>
    where
        L: CatalogLoader,
    {
        let clock = ManualClock::new(simulation_epoch());
        let mut manager = engine
            .create_manager(storage, clock.clone(), config.seed)
            .context("failed to build session manager")?;
        let notifications = manager.subscribe();
        let founder = format!("Founder #{}", config.seed);
        manager.start_new_session(FounderProfile::new(
            founder,
            config.archetype.as_str(),
            "Simulation",
        ));
        let policy = config.strategy.create_policy(config.seed);
        Ok(Self {
            manager,
            clock,
            notifications,
            policy,
            config,
            summary: RunCounters::default(),
        })
    }

    /// Play until the session ends or the turn budget runs out.
    ///
    /// # Errors
    ///
    /// Returns an error if the manager loses its session mid-run.
    pub fn run(mut self) -> Result<SimulationSummary> {
        while self.summary.turns < self.config.max_turns && !self.manager.is_terminal() {
            self.advance();
        }
        self.check_final_state();
        let final_summary = self
            .manager
            .summary()
            .context("simulation finished without an active session")?;
        let counters = self.summary;
        Ok(SimulationSummary {
            seed: self.config.seed,
            strategy: self.config.strategy,
            archetype: self.config.archetype,
            turns: counters.turns,
            actions_performed: counters.actions_performed,
            rejected_actions: counters.rejected_actions,
            idle_turns: counters.idle_turns,
            ticks: counters.ticks,
            offline_gaps: counters.offline_gaps,
            events_triggered: counters.events_triggered,
            stage_advances: counters.stage_advances,
            ended: final_summary.ending.is_some(),
            final_summary,
            failures: counters.failures,
        })
    }

    /// One turn: decide, act, let simulated time pass, and periodically
    /// take the app through a background/foreground cycle.
    pub fn advance(&mut self) {
        self.summary.turns += 1;
        let decision = self.decide();
        match decision {
            Some(PolicyDecision {
                action_id,
                rationale,
            }) => match self.manager.perform_action(&action_id) {
                Ok(outcome) => {
                    self.summary.actions_performed += 1;
                    log::debug!(
                        "[{} seed {}] turn {}: {} ({}) {}",
                        self.policy.name(),
                        self.config.seed,
                        self.summary.turns,
                        action_id,
                        rationale.unwrap_or_default(),
                        outcome.flavor
                    );
                }
                Err(err) => self.record_rejection(&action_id, &err),
            },
            None => self.summary.idle_turns += 1,
        }

        self.clock.advance_secs(self.config.turn_secs);
        self.summary.ticks += self.manager.poll_ticks();

        if self.config.background_every > 0
            && self.summary.turns % self.config.background_every == 0
            && !self.manager.is_terminal()
        {
            self.manager.enter_background();
            self.clock.advance_secs(self.config.offline_secs);
            if self.manager.enter_foreground().is_some() {
                self.summary.offline_gaps += 1;
            }
        }

        self.drain_notifications();
        self.check_ranges();
    }

    fn decide(&mut self) -> Option<PolicyDecision> {
        let state = self.manager.state()?;
        let available = self.manager.available_actions();
        self.policy.pick_action(state, &available)
    }

    /// Policies only see the available menu, so any refusal is a bug.
    fn record_rejection(&mut self, action_id: &str, err: &CommandError) {
        self.summary.rejected_actions += 1;
        self.summary.failures.push(format!(
            "turn {}: available action '{action_id}' was rejected: {err}",
            self.summary.turns
        ));
    }

    fn drain_notifications(&mut self) {
        for notification in self.notifications.try_iter() {
            match notification {
                SessionNotification::EventTriggered { .. } => self.summary.events_triggered += 1,
                SessionNotification::StageAdvanced { .. } => self.summary.stage_advances += 1,
                SessionNotification::SessionEnded { .. } => self.summary.sessions_ended += 1,
                SessionNotification::StateUpdated { .. } => {}
            }
        }
    }

    fn check_ranges(&mut self) {
        let Some(state) = self.manager.state() else {
            self.summary
                .failures
                .push(format!("turn {}: session disappeared", self.summary.turns));
            return;
        };
        for &stat in StatType::ALL {
            let value = state.value(stat);
            if !(0..=stat.max_value()).contains(&value) {
                self.summary.failures.push(format!(
                    "turn {}: {stat:?} out of range at {value}",
                    self.summary.turns
                ));
            }
        }
    }

    fn check_final_state(&mut self) {
        if self.summary.sessions_ended > 1 {
            self.summary.failures.push(format!(
                "session end announced {} times",
                self.summary.sessions_ended
            ));
        }
        if !self.manager.is_terminal() {
            return;
        }
        match self.manager.perform_action("nap") {
            Err(CommandError::SessionEnded(_)) => {}
            other => self.summary.failures.push(format!(
                "ended session still accepted commands: {other:?}"
            )),
        }
    }
}
