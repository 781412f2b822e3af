//! Catalog loading for the tester: the bundled JSON by default, or a
//! directory of overrides from `--catalog-dir` / `--config`.
use std::fs;
use std::path::{Path, PathBuf};

use burnrate_game::{CatalogError, CatalogLoader, GameData};
use serde::de::DeserializeOwned;
use thiserror::Error;

const ACTIONS_JSON: &str = include_str!("../../assets/data/actions.json");
const EVENTS_JSON: &str = include_str!("../../assets/data/events.json");
const ARCHETYPES_JSON: &str = include_str!("../../assets/data/archetypes.json");

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("config '{name}' is invalid: {source}")]
    Config {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default)]
pub struct TesterAssets {
    catalog_dir: Option<PathBuf>,
    config_path: Option<PathBuf>,
}

impl TesterAssets {
    /// Bundled catalogs with an all-default engine config.
    #[must_use]
    pub fn embedded() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_catalog_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.catalog_dir = dir;
        self
    }

    #[must_use]
    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    fn catalog_text(&self, file: &str, bundled: &'static str) -> Result<String, AssetError> {
        match &self.catalog_dir {
            Some(dir) => read(&dir.join(file)),
            None => Ok(bundled.to_string()),
        }
    }

    /// `--config` wins; otherwise `<catalog-dir>/<name>.json` when present;
    /// otherwise an empty object so every field takes its default.
    fn config_text(&self, name: &str) -> Result<String, AssetError> {
        if let Some(path) = &self.config_path {
            return read(path);
        }
        if let Some(dir) = &self.catalog_dir {
            let path = dir.join(format!("{name}.json"));
            if path.is_file() {
                return read(&path);
            }
        }
        Ok(String::from("{}"))
    }
}

fn read(path: &Path) -> Result<String, AssetError> {
    fs::read_to_string(path).map_err(|source| AssetError::Read {
        path: path.to_path_buf(),
        source,
    })
}

impl CatalogLoader for TesterAssets {
    type Error = AssetError;

    fn load_game_data(&self) -> Result<GameData, Self::Error> {
        let actions = self.catalog_text("actions.json", ACTIONS_JSON)?;
        let events = self.catalog_text("events.json", EVENTS_JSON)?;
        let archetypes = self.catalog_text("archetypes.json", ARCHETYPES_JSON)?;
        Ok(GameData::from_json_parts(&actions, &events, &archetypes)?)
    }

    fn load_config<T>(&self, config_name: &str) -> Result<T, Self::Error>
    where
        T: DeserializeOwned,
    {
        let text = self.config_text(config_name)?;
        serde_json::from_str(&text).map_err(|source| AssetError::Config {
            name: config_name.to_string(),
            source,
        })
    }
}
