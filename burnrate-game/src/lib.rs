//! Burnrate Game Engine
//!
//! Platform-agnostic simulation core for Burnrate, a founder life sim.
//! This crate owns stats, actions, random events, time decay and session
//! orchestration; it renders nothing and reads its catalogs from data.

pub mod actions;
pub mod archetypes;
pub mod clock;
pub mod config;
pub mod constants;
pub mod cooldown;
pub mod data;
pub mod decay;
pub mod economy;
pub mod events;
pub mod manager;
pub mod numbers;
pub mod observer;
pub mod state;
pub mod stats;
pub mod storage;
pub mod summary;
pub mod ticker;

use chrono::{DateTime, Utc};
use thiserror::Error;

// Re-export commonly used types
pub use actions::{ActionExecutor, ActionOutcome, ActionRejection};
pub use archetypes::{Archetype, ArchetypeList, ArchetypeStart};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{EngineConfig, EngineConfigError};
pub use cooldown::{CooldownMap, CooldownTracker};
pub use data::{
    ActionCatalog, ActionCategory, ActionDefinition, CatalogError, EventCatalog, EventDefinition,
    GameData,
};
pub use decay::{CatchUpReport, DecayRates, TimeSimulation};
pub use economy::{Stage, StartupStats};
pub use events::RandomEventService;
pub use manager::{CommandError, SessionManager};
pub use observer::{ObserverRegistry, SessionNotification, SessionObserver};
pub use state::{AppliedEffects, Ending, FounderProfile, GameOverReason, Mood, SessionState};
pub use stats::{CharacterStats, Effects, Requirements, StatDelta, StatFamily, StatType};
pub use storage::MemoryStorage;
pub use summary::SessionSummary;
pub use ticker::Ticker;

/// Config name under which [`EngineConfig`] is looked up.
pub const ENGINE_CONFIG_NAME: &str = "engine";

/// Trait for abstracting catalog loading.
/// Platform-specific implementations should provide this
pub trait CatalogLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the action, event and archetype catalogs.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog data cannot be loaded.
    fn load_game_data(&self) -> Result<GameData, Self::Error>;

    /// Load configuration data for a specific system
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or parsed.
    fn load_config<T>(&self, config_name: &str) -> Result<T, Self::Error>
    where
        T: serde::de::DeserializeOwned;
}

/// Trait for abstracting session persistence.
/// Platform-specific implementations should provide this
pub trait SessionStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save the active session
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be saved.
    fn save(&self, state: &SessionState) -> Result<(), Self::Error>;

    /// Load the saved session, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the save exists but cannot be read.
    fn load(&self) -> Result<Option<SessionState>, Self::Error>;

    /// Delete the saved session
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    fn delete(&self) -> Result<(), Self::Error>;

    /// Remember when the app last went to the background
    ///
    /// # Errors
    ///
    /// Returns an error if the timestamp cannot be saved.
    fn save_last_background_timestamp(&self, at: DateTime<Utc>) -> Result<(), Self::Error>;

    /// # Errors
    ///
    /// Returns an error if a stored timestamp cannot be read.
    fn load_last_background_timestamp(&self) -> Result<Option<DateTime<Utc>>, Self::Error>;

    /// Save per-action cooldown timestamps
    ///
    /// # Errors
    ///
    /// Returns an error if the cooldowns cannot be saved.
    fn save_cooldowns(&self, cooldowns: &CooldownMap) -> Result<(), Self::Error>;

    /// Load per-action cooldown timestamps; empty when none were saved
    ///
    /// # Errors
    ///
    /// Returns an error if stored cooldowns cannot be read.
    fn load_cooldowns(&self) -> Result<CooldownMap, Self::Error>;
}

/// Failure to assemble a session manager from a loader.
#[derive(Debug, Error)]
pub enum EngineError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    #[error("failed to load game data: {0}")]
    Load(#[source] E),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Config(#[from] EngineConfigError),
}

/// Entry point wiring a catalog loader into session managers.
pub struct GameEngine<L>
where
    L: CatalogLoader,
{
    loader: L,
}

impl<L> GameEngine<L>
where
    L: CatalogLoader,
{
    /// Create a new game engine with the provided catalog loader
    pub const fn new(loader: L) -> Self {
        Self { loader }
    }

    /// Load and validate the catalogs.
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails or the catalogs violate their invariants.
    pub fn load_data(&self) -> Result<GameData, EngineError<L::Error>> {
        let data = self.loader.load_game_data().map_err(EngineError::Load)?;
        data.validate()?;
        Ok(data)
    }

    /// Load and validate the engine config.
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails or a value is out of bounds.
    pub fn load_engine_config(&self) -> Result<EngineConfig, EngineError<L::Error>> {
        let config: EngineConfig = self
            .loader
            .load_config(ENGINE_CONFIG_NAME)
            .map_err(EngineError::Load)?;
        config.validate()?;
        Ok(config)
    }

    /// Build a session manager over `storage` and `clock`. No session is
    /// active until the caller resumes or starts one.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalogs or config cannot be loaded.
    pub fn create_manager<S, C>(
        &self,
        storage: S,
        clock: C,
        seed: u64,
    ) -> Result<SessionManager<S, C>, EngineError<L::Error>>
    where
        S: SessionStorage,
        C: Clock,
    {
        let data = self.load_data()?;
        let config = self.load_engine_config()?;
        log::debug!(
            "loaded {} action(s), {} event(s), {} archetype(s)",
            data.actions.len(),
            data.events.len(),
            data.archetypes.len()
        );
        Ok(SessionManager::new(data, config, storage, clock, seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde::de::DeserializeOwned;
    use std::convert::Infallible;

    #[derive(Clone, Copy, Default)]
    struct FixtureLoader;

    impl CatalogLoader for FixtureLoader {
        type Error = Infallible;

        fn load_game_data(&self) -> Result<GameData, Self::Error> {
            Ok(GameData {
                actions: ActionCatalog::from_actions(vec![
                    ActionDefinition::new("nap", ActionCategory::SelfCare)
                        .with_effect(StatType::Energy, 10),
                ]),
                ..GameData::empty()
            })
        }

        fn load_config<T>(&self, _config_name: &str) -> Result<T, Self::Error>
        where
            T: DeserializeOwned,
        {
            let parsed = serde_json::from_str("{}").unwrap();
            Ok(parsed)
        }
    }

    struct DuplicateLoader;

    impl CatalogLoader for DuplicateLoader {
        type Error = Infallible;

        fn load_game_data(&self) -> Result<GameData, Self::Error> {
            let nap = ActionDefinition::new("nap", ActionCategory::SelfCare);
            Ok(GameData {
                actions: ActionCatalog::from_actions(vec![nap.clone(), nap]),
                ..GameData::empty()
            })
        }

        fn load_config<T>(&self, _config_name: &str) -> Result<T, Self::Error>
        where
            T: DeserializeOwned,
        {
            Ok(serde_json::from_str(r#"{ "tick_event_scale": 0.5 }"#).unwrap())
        }
    }

    #[test]
    fn engine_builds_manager_and_roundtrips_session() {
        let storage = MemoryStorage::default();
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0).unwrap());
        let engine = GameEngine::new(FixtureLoader);
        let mut manager = engine
            .create_manager(storage.clone(), clock.clone(), 0xABCD)
            .unwrap();
        assert_eq!(manager.config(), &EngineConfig::default());

        manager.start_new_session(FounderProfile::new("Ada", "", "Berlin"));
        manager.perform_action("nap").unwrap();
        let saved = storage.saved_state().expect("session persisted");
        assert_eq!(saved.actions_taken, 1);

        let mut reloaded = engine.create_manager(storage, clock, 1).unwrap();
        assert!(reloaded.resume());
        assert_eq!(reloaded.state(), Some(&saved));
    }

    #[test]
    fn engine_rejects_invalid_catalogs() {
        let engine = GameEngine::new(DuplicateLoader);
        assert!(matches!(
            engine.load_data(),
            Err(EngineError::Catalog(CatalogError::DuplicateAction(_)))
        ));
        let config = engine.load_engine_config().unwrap();
        assert!((config.tick_event_scale - 0.5).abs() < f64::EPSILON);
    }
}
