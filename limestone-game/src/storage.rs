//! Personal-best persistence.
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

use crate::constants::BEST_SCORE_KEY;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("score file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("score store unavailable: {0}")]
    Unavailable(String),
}

/// Key-value persistence for the best score.
pub trait ScoreStore {
    /// Read the stored best score, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn load_best(&self) -> Result<Option<u32>, StorageError>;

    /// Overwrite the stored best score.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn save_best(&self, score: u32) -> Result<(), StorageError>;
}

impl<T: ScoreStore + ?Sized> ScoreStore for &T {
    fn load_best(&self) -> Result<Option<u32>, StorageError> {
        (**self).load_best()
    }

    fn save_best(&self, score: u32) -> Result<(), StorageError> {
        (**self).save_best(score)
    }
}

/// Process-local store. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryScoreStore {
    best: Arc<Mutex<Option<u32>>>,
}

impl MemoryScoreStore {
    #[must_use]
    pub fn with_best(best: u32) -> Self {
        Self {
            best: Arc::new(Mutex::new(Some(best))),
        }
    }
}

impl ScoreStore for MemoryScoreStore {
    fn load_best(&self) -> Result<Option<u32>, StorageError> {
        Ok(*self.best.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn save_best(&self, score: u32) -> Result<(), StorageError> {
        *self.best.lock().unwrap_or_else(PoisonError::into_inner) = Some(score);
        Ok(())
    }
}

/// JSON object file holding `BEST_SCORE_KEY` alongside any other keys.
/// A missing file reads as no stored value.
#[derive(Debug, Clone)]
pub struct JsonFileScoreStore {
    path: PathBuf,
}

impl JsonFileScoreStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<Map<String, Value>, StorageError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if text.trim().is_empty() {
            return Ok(Map::new());
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Sibling file the next write lands in before replacing `path`.
    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// Stored values may be numbers or numeric strings.
fn parse_score(value: &Value) -> Option<u32> {
    match value {
        Value::Number(number) => number.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

impl ScoreStore for JsonFileScoreStore {
    fn load_best(&self) -> Result<Option<u32>, StorageError> {
        Ok(self.read_map()?.get(BEST_SCORE_KEY).and_then(parse_score))
    }

    fn save_best(&self, score: u32) -> Result<(), StorageError> {
        let mut map = self.read_map().unwrap_or_else(|err| {
            log::warn!("replacing unreadable score file: {err}");
            Map::new()
        });
        map.insert(BEST_SCORE_KEY.to_string(), Value::from(score));
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
        }
        let text = serde_json::to_string_pretty(&Value::Object(map))?;
        let tmp = self.tmp_path();
        fs::write(&tmp, text).map_err(|err| self.io_error(err))?;
        fs::rename(&tmp, &self.path).map_err(|err| self.io_error(err))
    }
}

/// Store wrapper that never fails: reads degrade to zero, writes to a warning.
#[derive(Debug, Clone, Default)]
pub struct BestScore<S> {
    store: S,
}

impl<S: ScoreStore> BestScore<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn get(&self) -> u32 {
        match self.store.load_best() {
            Ok(best) => best.unwrap_or(0),
            Err(err) => {
                log::warn!("best score unavailable, assuming 0: {err}");
                0
            }
        }
    }

    /// Persist `score`. Returns whether the write succeeded.
    pub fn set(&self, score: u32) -> bool {
        match self.store.save_best(score) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("best score {score} not saved: {err}");
                false
            }
        }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }
}
