//! Persistence hooks for computed results.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hash::key_digest;
use crate::types::{CacheKey, CachedResult};
use crate::{ResultsError, ResultsResult};

/// Storage collaborator the engine saves results through.
///
/// The engine never reads or writes storage directly; failures are logged by
/// the caller and otherwise ignored.
pub trait ResultStore: Send + Sync {
    /// Persist a freshly computed result under its key.
    fn save(&self, key: &CacheKey, result: &CachedResult) -> ResultsResult<()>;

    /// Previously saved result for `key`, if any was saved within `max_age`.
    fn load_cached(
        &self,
        key: &CacheKey,
        max_age: Duration,
    ) -> ResultsResult<Option<CachedResult>>;
}

/// On-disk record of one saved result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredResult {
    pub key: CacheKey,
    pub saved_at: DateTime<Utc>,
    pub result: CachedResult,
}

impl StoredResult {
    pub fn new(key: CacheKey, result: CachedResult) -> Self {
        Self {
            key,
            saved_at: Utc::now(),
            result,
        }
    }

    /// Time since the result was saved; zero if `saved_at` lies in the future.
    pub fn age(&self) -> Duration {
        (Utc::now() - self.saved_at).to_std().unwrap_or_default()
    }

    pub fn is_fresh(&self, max_age: Duration) -> bool {
        self.age() <= max_age
    }
}

/// Process-local store.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<CacheKey, StoredResult>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResultStore for MemoryStore {
    fn save(&self, key: &CacheKey, result: &CachedResult) -> ResultsResult<()> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone(), StoredResult::new(key.clone(), result.clone()));
        Ok(())
    }

    fn load_cached(
        &self,
        key: &CacheKey,
        max_age: Duration,
    ) -> ResultsResult<Option<CachedResult>> {
        Ok(self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .filter(|stored| stored.is_fresh(max_age))
            .map(|stored| stored.result.clone()))
    }
}

/// One JSON file per key under a root directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root_dir: PathBuf,
}

impl FileStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        if root_dir.exists() && !root_dir.is_dir() {
            return Err(ResultsError::InvalidPath {
                message: format!("{} is not a directory", root_dir.display()),
            });
        }
        fs::create_dir_all(&root_dir)?;
        Ok(Self { root_dir })
    }

    /// `<project dir>/.hydraflow/results`
    pub fn for_project(project_path: &Path) -> ResultsResult<Self> {
        let project_dir = project_path
            .parent()
            .ok_or_else(|| ResultsError::InvalidPath {
                message: "project path has no parent directory".to_string(),
            })?;
        Self::new(project_dir.join(".hydraflow").join("results"))
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.root_dir.join(format!("{}.json", key_digest(key)))
    }

    pub fn load(&self, key: &CacheKey) -> ResultsResult<StoredResult> {
        let path = self.path_for(key);
        if !path.exists() {
            return Err(ResultsError::NotFound {
                key: key.to_string(),
            });
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Every stored result of one schematic, any version.
    pub fn list_for(&self, schematic_id: &str) -> ResultsResult<Vec<StoredResult>> {
        let mut out = Vec::new();
        for entry in fs::read_dir(&self.root_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Ok(content) = fs::read_to_string(&path) else {
                continue;
            };
            if let Ok(stored) = serde_json::from_str::<StoredResult>(&content)
                && stored.key.schematic_id == schematic_id
            {
                out.push(stored);
            }
        }
        out.sort_by(|a, b| a.saved_at.cmp(&b.saved_at));
        Ok(out)
    }

    /// Remove every stored result of one schematic.
    pub fn delete_schematic(&self, schematic_id: &str) -> ResultsResult<usize> {
        let stored = self.list_for(schematic_id)?;
        for s in &stored {
            let path = self.path_for(&s.key);
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        Ok(stored.len())
    }
}

impl ResultStore for FileStore {
    fn save(&self, key: &CacheKey, result: &CachedResult) -> ResultsResult<()> {
        let stored = StoredResult::new(key.clone(), result.clone());
        let json = serde_json::to_string_pretty(&stored)?;
        fs::write(self.path_for(key), json)?;
        Ok(())
    }

    fn load_cached(
        &self,
        key: &CacheKey,
        max_age: Duration,
    ) -> ResultsResult<Option<CachedResult>> {
        match self.load(key) {
            Ok(stored) if stored.key == *key && stored.is_fresh(max_age) => {
                Ok(Some(stored.result))
            }
            Ok(_) | Err(ResultsError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
