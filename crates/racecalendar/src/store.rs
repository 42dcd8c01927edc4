use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::types::{Club, Event, Region};

pub const CLUBS_FILE: &str = "clubs.json";
pub const EVENTS_FILE: &str = "events.json";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("Failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("Malformed registry {path}: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to serialize registry: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub fn clubs_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CLUBS_FILE)
}

pub fn events_path(data_dir: &Path, region: Option<Region>) -> PathBuf {
    match region {
        Some(region) => data_dir.join(format!("events-{}.json", region.slug())),
        None => data_dir.join(EVENTS_FILE),
    }
}

pub fn load_clubs(path: &Path) -> Vec<Club> {
    match read_registry(path) {
        Ok(clubs) => clubs,
        Err(StoreError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
            log::info!("No club registry at {}, starting fresh", path.display());
            Vec::new()
        }
        Err(e) => {
            log::warn!("Ignoring existing club registry: {}", e);
            Vec::new()
        }
    }
}

pub fn load_events(path: &Path) -> Result<Vec<Event>, StoreError> {
    read_registry(path)
}

pub fn save_clubs(path: &Path, clubs: &[Club]) -> Result<(), StoreError> {
    write_registry(path, clubs)
}

pub fn save_events(path: &Path, events: &[Event]) -> Result<(), StoreError> {
    write_registry(path, events)
}

fn read_registry<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    let data = fs::read_to_string(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&data).map_err(|source| StoreError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

fn write_registry<T: Serialize>(path: &Path, records: &[T]) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(records)?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }

    fs::write(path, json).map_err(|source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    log::debug!("Wrote {} record(s) to {}", records.len(), path.display());
    Ok(())
}
