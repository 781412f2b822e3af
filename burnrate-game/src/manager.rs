//! Session orchestration: one active playthrough, its services, persistence
//! and notifications.
use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::sync::mpsc;
use std::time::Duration;
use thiserror::Error;

use crate::SessionStorage;
use crate::actions::{ActionExecutor, ActionOutcome, ActionRejection};
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::cooldown::{CooldownMap, CooldownTracker};
use crate::data::{ActionDefinition, EventDefinition, GameData};
use crate::decay::{CatchUpReport, TimeSimulation};
use crate::events::RandomEventService;
use crate::observer::{ObserverRegistry, SessionNotification, SessionObserver};
use crate::state::{Ending, FounderProfile, SessionState};
use crate::summary::SessionSummary;
use crate::ticker::Ticker;

/// Why a manager command could not run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("no active session")]
    NoActiveSession,
    #[error("session has ended ({0})")]
    SessionEnded(Ending),
    #[error("unknown action '{0}'")]
    UnknownAction(String),
    #[error("action rejected: {0}")]
    Rejected(#[from] ActionRejection),
}

/// Owns the active [`SessionState`] and sequences every service that touches it.
///
/// Single writer: all mutation goes through `&mut self`, and every committed
/// mutation is persisted and broadcast before the command returns.
pub struct SessionManager<S, C>
where
    S: SessionStorage,
    C: Clock,
{
    data: GameData,
    config: EngineConfig,
    storage: S,
    clock: C,
    rng: ChaCha20Rng,
    executor: ActionExecutor,
    events: RandomEventService,
    time: TimeSimulation,
    ticker: Ticker,
    observers: ObserverRegistry,
    session: Option<SessionState>,
    ending_announced: bool,
}

impl<S, C> SessionManager<S, C>
where
    S: SessionStorage,
    C: Clock,
{
    /// Build a manager with no active session. Persisted cooldowns are loaded
    /// and pruned; call [`Self::resume`] to pick up a saved session.
    pub fn new(data: GameData, config: EngineConfig, storage: S, clock: C, seed: u64) -> Self {
        let cooldowns = match storage.load_cooldowns() {
            Ok(map) => map,
            Err(err) => {
                log::warn!("failed to load cooldowns, starting clean: {err}");
                CooldownMap::new()
            }
        };
        let mut executor = ActionExecutor::with_cooldowns(CooldownTracker::from_map(cooldowns));
        let pruned =
            executor.prune_cooldowns(&data.actions, clock.now(), config.cooldown_prune_grace());
        if pruned > 0 {
            log::debug!("pruned {pruned} stale cooldown(s)");
            save_cooldowns(&storage, executor.cooldown_map());
        }

        Self {
            events: config.event_service(),
            time: config.time_simulation(),
            ticker: config.ticker(),
            data,
            config,
            storage,
            clock,
            rng: ChaCha20Rng::seed_from_u64(seed),
            executor,
            observers: ObserverRegistry::new(),
            session: None,
            ending_announced: false,
        }
    }

    pub fn register_observer(&mut self, observer: Box<dyn SessionObserver>) {
        self.observers.register(observer);
    }

    /// Channel subscriber receiving every notification from now on.
    pub fn subscribe(&mut self) -> mpsc::Receiver<SessionNotification> {
        let (tx, rx) = mpsc::channel();
        self.observers.register(Box::new(tx));
        rx
    }

    #[must_use]
    pub const fn data(&self) -> &GameData {
        &self.data
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    #[must_use]
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    #[must_use]
    pub const fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    #[must_use]
    pub const fn state(&self) -> Option<&SessionState> {
        self.session.as_ref()
    }

    #[must_use]
    pub const fn has_session(&self) -> bool {
        self.session.is_some()
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.session.as_ref().is_some_and(SessionState::is_terminal)
    }

    #[must_use]
    pub fn summary(&self) -> Option<SessionSummary> {
        self.session.as_ref().map(SessionSummary::from_state)
    }

    /// Begin a fresh playthrough, discarding any saved session and cooldowns.
    pub fn start_new_session(&mut self, profile: FounderProfile) -> &SessionState {
        if let Err(err) = self.storage.delete() {
            log::warn!("failed to delete previous session: {err}");
        }
        self.executor.clear_cooldowns();
        save_cooldowns(&self.storage, self.executor.cooldown_map());
        self.events.clear_memory();

        let now = self.clock.now();
        let mut state = SessionState::new(profile, now);
        if !state.profile.archetype.is_empty() {
            match self.data.archetypes.get_by_id(&state.profile.archetype) {
                Some(archetype) => state.apply_archetype(archetype),
                None => log::warn!(
                    "unknown archetype '{}', using default stats",
                    state.profile.archetype
                ),
            }
        }
        log::info!(
            "new session for {} ({})",
            state.profile.name,
            state.profile.archetype
        );

        self.install(state, now)
    }

    /// Load the saved session, applying decay for the time it sat on disk.
    /// Returns whether a session was restored. Unreadable saves count as none.
    pub fn resume(&mut self) -> bool {
        let loaded = match self.storage.load() {
            Ok(state) => state,
            Err(err) => {
                log::warn!("failed to load saved session, treating as none: {err}");
                None
            }
        };
        let Some(mut state) = loaded else {
            return false;
        };

        let now = self.clock.now();
        let since = self.offline_since(&state);
        state.clamp_stats();
        self.events.clear_memory();
        let pruned = self.executor.prune_cooldowns(
            &self.data.actions,
            now,
            self.config.cooldown_prune_grace(),
        );
        if pruned > 0 {
            save_cooldowns(&self.storage, self.executor.cooldown_map());
        }
        if !state.is_terminal() {
            self.time.apply_offline_catch_up(&mut state, since, now);
            state.touch(now);
        }
        log::info!(
            "resumed session for {} at {}",
            state.profile.name,
            state.stage()
        );
        self.install(state, now);
        true
    }

    /// Resume a live saved session, or start a new one when there is none or
    /// the saved one has already ended.
    pub fn resume_or_start(&mut self, profile: FounderProfile) -> &SessionState {
        if self.resume()
            && let Some(state) = self.session.take_if(|state| !state.is_terminal())
        {
            return self.session.insert(state);
        }
        self.start_new_session(profile)
    }

    /// Drop the active session and everything persisted for it.
    pub fn reset_session(&mut self) {
        if let Err(err) = self.storage.delete() {
            log::warn!("failed to delete session: {err}");
        }
        self.executor.clear_cooldowns();
        save_cooldowns(&self.storage, self.executor.cooldown_map());
        self.events.clear_memory();
        self.ticker.stop();
        self.session = None;
        self.ending_announced = false;
        log::info!("session reset");
    }

    /// Run an action by id, then roll for a follow-up event.
    ///
    /// # Errors
    ///
    /// Fails without mutating anything when there is no live session, the id
    /// is not in the catalog, or the executor rejects the action.
    pub fn perform_action(&mut self, action_id: &str) -> Result<ActionOutcome, CommandError> {
        let state = self.session.as_mut().ok_or(CommandError::NoActiveSession)?;
        if let Some(ending) = state.ending() {
            return Err(CommandError::SessionEnded(ending));
        }
        let action = self
            .data
            .actions
            .get(action_id)
            .ok_or_else(|| CommandError::UnknownAction(action_id.to_string()))?;

        let now = self.clock.now();
        let mut outcome = self
            .executor
            .execute(action, state, now, &mut self.rng)
            .inspect_err(|rejection| log::debug!("{action_id} rejected: {rejection}"))?;
        // An ending reached by the action itself is final; no event may undo it.
        if !state.is_terminal() {
            outcome.event = self
                .events
                .check_after_action(&self.data.events, state, &mut self.rng);
        }
        save_cooldowns(&self.storage, self.executor.cooldown_map());

        if let Some(stage) = outcome.stage_advanced {
            self.observers
                .notify(&SessionNotification::StageAdvanced { stage });
        }
        if let Some(event) = &outcome.event {
            self.observers.notify(&SessionNotification::EventTriggered {
                event: Box::new(event.clone()),
            });
        }
        self.commit();
        Ok(outcome)
    }

    /// Whether `action_id` would pass every gate right now.
    #[must_use]
    pub fn can_perform_action(&self, action_id: &str) -> bool {
        let Some(state) = self.session.as_ref() else {
            return false;
        };
        let Some(action) = self.data.actions.get(action_id) else {
            return false;
        };
        !state.is_terminal()
            && self
                .executor
                .validate(action, state, self.clock.now())
                .is_ok()
    }

    /// Time left on an action's cooldown; zero for unknown ids.
    #[must_use]
    pub fn cooldown_remaining(&self, action_id: &str) -> Duration {
        self.data
            .actions
            .get(action_id)
            .map_or(Duration::ZERO, |action| {
                self.executor.cooldown_remaining(action, self.clock.now())
            })
    }

    /// Actions that pass stage, requirement and cooldown gates, in catalog order.
    #[must_use]
    pub fn available_actions(&self) -> Vec<&ActionDefinition> {
        let Some(state) = self.session.as_ref() else {
            return Vec::new();
        };
        if state.is_terminal() {
            return Vec::new();
        }
        let now = self.clock.now();
        self.data
            .actions
            .available_for(state)
            .filter(|action| !self.executor.is_on_cooldown(action, now))
            .collect()
    }

    /// One foreground decay interval plus a scaled event roll.
    ///
    /// # Errors
    ///
    /// Returns an error when there is no session or it has already ended.
    pub fn tick(&mut self) -> Result<Option<EventDefinition>, CommandError> {
        let state = self.session.as_mut().ok_or(CommandError::NoActiveSession)?;
        if let Some(ending) = state.ending() {
            return Err(CommandError::SessionEnded(ending));
        }
        let now = self.clock.now();
        self.time.apply_foreground_tick(state);
        state.touch(now);
        let event = if state.is_terminal() {
            None
        } else {
            self.events
                .check_on_tick(&self.data.events, state, &mut self.rng)
        };
        if let Some(event) = &event {
            self.observers.notify(&SessionNotification::EventTriggered {
                event: Box::new(event.clone()),
            });
        }
        self.commit();
        Ok(event)
    }

    /// Run every tick the schedule says is due. Stops early once the session
    /// ends. Returns how many ticks ran.
    pub fn poll_ticks(&mut self) -> u64 {
        let due = self.ticker.due_ticks(self.clock.now());
        let mut ran = 0;
        for _ in 0..due {
            if self.tick().is_err() {
                break;
            }
            ran += 1;
        }
        ran
    }

    /// Snapshot the time, persist, and stop ticking.
    pub fn enter_background(&mut self) {
        self.ticker.stop();
        let Some(state) = self.session.as_mut() else {
            return;
        };
        let now = self.clock.now();
        state.touch(now);
        if let Err(err) = self.storage.save_last_background_timestamp(now) {
            log::warn!("failed to save background timestamp: {err}");
        }
        save_state(&self.storage, state);
        log::debug!("entered background at {now}");
    }

    /// Catch up on the time spent in the background, then resume ticking if
    /// the session survived. Returns `None` when there was nothing to catch up.
    pub fn enter_foreground(&mut self) -> Option<CatchUpReport> {
        let since = self.session.as_ref().map(|state| self.offline_since(state))?;
        let state = self.session.as_mut()?;
        if state.is_terminal() {
            return None;
        }
        let now = self.clock.now();
        let report = self.time.apply_offline_catch_up(state, since, now);
        state.touch(now);
        self.commit();
        if !self.is_terminal() {
            self.ticker.start(now);
        }
        Some(report)
    }

    /// Later of the persisted background timestamp and the state's own
    /// last activity, so a stale snapshot never decays the same time twice.
    fn offline_since(&self, state: &SessionState) -> DateTime<Utc> {
        let background = match self.storage.load_last_background_timestamp() {
            Ok(stamp) => stamp,
            Err(err) => {
                log::warn!("failed to load background timestamp: {err}");
                None
            }
        };
        background.map_or(state.last_active_at, |stamp| {
            stamp.max(state.last_active_at)
        })
    }

    fn install(&mut self, state: SessionState, now: DateTime<Utc>) -> &SessionState {
        self.ending_announced = false;
        self.ticker.start(now);
        let state = self.session.insert(state);
        commit_state(
            state,
            &self.storage,
            &self.observers,
            &mut self.ticker,
            &mut self.ending_announced,
        );
        state
    }

    fn commit(&mut self) {
        if let Some(state) = self.session.as_ref() {
            commit_state(
                state,
                &self.storage,
                &self.observers,
                &mut self.ticker,
                &mut self.ending_announced,
            );
        }
    }
}

/// Persist, broadcast, and handle a terminal transition once.
fn commit_state<S: SessionStorage>(
    state: &SessionState,
    storage: &S,
    observers: &ObserverRegistry,
    ticker: &mut Ticker,
    ending_announced: &mut bool,
) {
    save_state(storage, state);
    observers.notify(&SessionNotification::StateUpdated {
        state: Box::new(state.clone()),
    });

    let Some(ending) = state.ending() else {
        return;
    };
    ticker.stop();
    if !*ending_announced {
        *ending_announced = true;
        log::info!(
            "session for {} ended: {ending} after {} action(s)",
            state.profile.name,
            state.actions_taken
        );
        observers.notify(&SessionNotification::SessionEnded { ending });
    }
}

fn save_state<S: SessionStorage>(storage: &S, state: &SessionState) {
    if let Err(err) = storage.save(state) {
        log::warn!("failed to persist session: {err}");
    }
}

fn save_cooldowns<S: SessionStorage>(storage: &S, cooldowns: &CooldownMap) {
    if let Err(err) = storage.save_cooldowns(cooldowns) {
        log::warn!("failed to persist cooldowns: {err}");
    }
}
