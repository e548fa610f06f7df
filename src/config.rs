//! Runtime configuration: database location, reward tables and media backend.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use deedquest_core::{
    Database, Engine, InMemoryMediaService, LogNotifier, MediaService, RewardTables,
};

use crate::media::HttpMediaService;

#[derive(Debug, Clone, Default)]
pub struct Config {
    /// SQLite file. Defaults to the platform data directory.
    pub db_path: Option<PathBuf>,
    /// JSON reward tables. Defaults to `tables.json` in the config directory,
    /// then to the built-in tables.
    pub tables_path: Option<PathBuf>,
    /// Base URL of the media service. Uploads stay in memory when unset.
    pub media_url: Option<String>,
}

impl Config {
    pub fn open_database(&self) -> anyhow::Result<Database> {
        let db = match &self.db_path {
            Some(path) => Database::open(path),
            None => Database::open_default(),
        }
        .context("opening database")?;
        db.migrate().context("migrating database")?;
        Ok(db)
    }

    pub fn load_tables(&self) -> anyhow::Result<RewardTables> {
        if let Some(path) = &self.tables_path {
            return RewardTables::load(path);
        }
        match default_tables_path() {
            Some(path) if path.exists() => {
                tracing::info!("Loading reward tables from {}", path.display());
                RewardTables::load(&path)
            }
            _ => Ok(RewardTables::default()),
        }
    }

    pub fn media_service(&self) -> anyhow::Result<Arc<dyn MediaService>> {
        match &self.media_url {
            Some(url) => Ok(Arc::new(HttpMediaService::new(url)?)),
            None => {
                tracing::warn!("No media service configured, keeping uploads in memory");
                Ok(Arc::new(InMemoryMediaService::default()))
            }
        }
    }

    pub fn build_engine(&self) -> anyhow::Result<Engine> {
        Ok(Engine::new(
            self.open_database()?,
            Arc::new(self.load_tables()?),
            self.media_service()?,
            Arc::new(LogNotifier),
        ))
    }
}

fn default_tables_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("app", "deedquest", "deedquest")
        .map(|dirs| dirs.config_dir().join("tables.json"))
}

/// Writes the effective tables as pretty JSON, for editing and reloading.
pub fn export_tables(tables: &RewardTables, path: Option<&Path>) -> anyhow::Result<String> {
    let json = serde_json::to_string_pretty(&tables.to_rows())?;
    if let Some(path) = path {
        std::fs::write(path, &json).with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(json)
}
