//! JSON-backed routine storage.
//!
//! A single document at `~/.config/rounds/routines.json` holds every saved
//! routine plus user preferences. Writes validate first and reindex exercise
//! order, so the invariants hold for anything that reaches disk. Derived
//! values (cycle/total duration) are never written -- callers recompute them
//! from the [`Routine`] on read.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::data_dir;
use crate::error::{CoreError, Result, StorageError};
use crate::routine::{Exercise, Routine};

/// Data schema version (for future migrations).
pub const STORAGE_VERSION: &str = "1.0.0";

/// User preferences stored alongside the routines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default = "default_true")]
    pub audio_enabled: bool,
    /// Last executed routine, for quick access.
    #[serde(default)]
    pub last_used_routine_id: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            audio_enabled: true,
            last_used_routine_id: None,
        }
    }
}

/// The complete on-disk document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageData {
    pub version: String,
    pub routines: Vec<Routine>,
    #[serde(default)]
    pub preferences: Preferences,
    pub last_modified: DateTime<Utc>,
}

impl Default for StorageData {
    fn default() -> Self {
        Self {
            version: STORAGE_VERSION.into(),
            routines: Vec::new(),
            preferences: Preferences::default(),
            last_modified: Utc::now(),
        }
    }
}

/// Form data for creating or editing a routine, before ids and timestamps
/// are assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutineDraft {
    pub name: String,
    pub exercises: Vec<ExerciseDraft>,
    pub rest_seconds: u32,
    pub total_cycles: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseDraft {
    pub name: String,
    pub duration_seconds: u32,
}

/// Routine persistence.
pub struct RoutineStore {
    path: PathBuf,
    data: StorageData,
}

impl RoutineStore {
    /// Open the store at `~/.config/rounds/routines.json`, creating an empty
    /// document if the file does not exist yet.
    ///
    /// # Errors
    /// Returns an error if an existing file cannot be parsed.
    pub fn open() -> Result<Self> {
        Self::open_at(data_dir()?.join("routines.json"))
    }

    /// Open the store at an explicit path (tests point this at a temp dir).
    ///
    /// # Errors
    /// Returns an error if an existing file cannot be parsed.
    pub fn open_at(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                CoreError::Storage(StorageError::ParseFailed {
                    path: path.clone(),
                    message: e.to_string(),
                })
            })?,
            Err(_) => StorageData::default(),
        };
        Ok(Self { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn list(&self) -> &[Routine] {
        &self.data.routines
    }

    pub fn get(&self, id: &str) -> Option<&Routine> {
        self.data.routines.iter().find(|r| r.id == id)
    }

    pub fn preferences(&self) -> &Preferences {
        &self.data.preferences
    }

    /// Create a routine from a draft. Assigns ids and a gapless exercise
    /// order, validates, then persists.
    ///
    /// # Errors
    /// Returns a validation error for an invalid draft, or a storage error if
    /// the document cannot be written.
    pub fn create(&mut self, draft: RoutineDraft) -> Result<Routine> {
        let now = Utc::now();
        let routine = Routine {
            id: Uuid::new_v4().to_string(),
            name: draft.name,
            exercises: build_exercises(draft.exercises),
            rest_seconds: draft.rest_seconds,
            total_cycles: draft.total_cycles,
            created_at: now,
            updated_at: now,
        };
        routine.validate()?;
        self.data.routines.push(routine.clone());
        self.save()?;
        Ok(routine)
    }

    /// Replace an existing routine's definition, keeping its id and
    /// `created_at`.
    ///
    /// # Errors
    /// Returns `RoutineNotFound` for an unknown id, a validation error for an
    /// invalid draft, or a storage error on write failure.
    pub fn update(&mut self, id: &str, draft: RoutineDraft) -> Result<Routine> {
        let index = self
            .data
            .routines
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| StorageError::RoutineNotFound(id.to_string()))?;

        let mut updated = self.data.routines[index].clone();
        updated.name = draft.name;
        updated.exercises = build_exercises(draft.exercises);
        updated.rest_seconds = draft.rest_seconds;
        updated.total_cycles = draft.total_cycles;
        updated.updated_at = Utc::now();
        updated.validate()?;

        self.data.routines[index] = updated.clone();
        self.save()?;
        Ok(updated)
    }

    /// # Errors
    /// Returns `RoutineNotFound` for an unknown id.
    pub fn delete(&mut self, id: &str) -> Result<()> {
        let before = self.data.routines.len();
        self.data.routines.retain(|r| r.id != id);
        if self.data.routines.len() == before {
            return Err(StorageError::RoutineNotFound(id.to_string()).into());
        }
        if self.data.preferences.last_used_routine_id.as_deref() == Some(id) {
            self.data.preferences.last_used_routine_id = None;
        }
        self.save()
    }

    /// Copy a routine under a new id with fresh exercise ids.
    ///
    /// # Errors
    /// Returns `RoutineNotFound` for an unknown id.
    pub fn duplicate(&mut self, id: &str) -> Result<Routine> {
        let source = self
            .get(id)
            .ok_or_else(|| StorageError::RoutineNotFound(id.to_string()))?;

        let now = Utc::now();
        let mut copy = source.clone();
        copy.id = Uuid::new_v4().to_string();
        copy.name = format!("{} (copy)", copy.name);
        copy.created_at = now;
        copy.updated_at = now;
        for exercise in &mut copy.exercises {
            exercise.id = Uuid::new_v4().to_string();
        }
        copy.validate()?;

        self.data.routines.push(copy.clone());
        self.save()?;
        Ok(copy)
    }

    /// Remember the last routine that was executed.
    ///
    /// # Errors
    /// Returns a storage error if the document cannot be written.
    pub fn set_last_used(&mut self, id: &str) -> Result<()> {
        self.data.preferences.last_used_routine_id = Some(id.to_string());
        self.save()
    }

    fn save(&mut self) -> Result<()> {
        self.data.last_modified = Utc::now();
        let content = serde_json::to_string_pretty(&self.data)?;
        std::fs::write(&self.path, content).map_err(|source| {
            CoreError::Storage(StorageError::WriteFailed {
                path: self.path.clone(),
                source,
            })
        })
    }
}

fn build_exercises(drafts: Vec<ExerciseDraft>) -> Vec<Exercise> {
    drafts
        .into_iter()
        .enumerate()
        .map(|(i, d)| Exercise {
            id: Uuid::new_v4().to_string(),
            name: d.name,
            duration_seconds: d.duration_seconds,
            order: i as u32,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn draft(name: &str, durations: &[u32]) -> RoutineDraft {
        RoutineDraft {
            name: name.into(),
            exercises: durations
                .iter()
                .enumerate()
                .map(|(i, &d)| ExerciseDraft {
                    name: format!("Exercise {i}"),
                    duration_seconds: d,
                })
                .collect(),
            rest_seconds: 10,
            total_cycles: 2,
        }
    }

    fn store(dir: &tempfile::TempDir) -> RoutineStore {
        RoutineStore::open_at(dir.path().join("routines.json")).unwrap()
    }

    #[test]
    fn open_missing_file_yields_empty_store() {
        let dir = tempdir().unwrap();
        let store = store(&dir);
        assert!(store.list().is_empty());
        assert!(store.preferences().audio_enabled);
    }

    #[test]
    fn create_assigns_ids_and_gapless_order() {
        let dir = tempdir().unwrap();
        let mut store = store(&dir);
        let routine = store.create(draft("HIIT", &[30, 45, 60])).unwrap();

        assert!(!routine.id.is_empty());
        let orders: Vec<_> = routine.exercises.iter().map(|e| e.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn created_routines_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("routines.json");
        let id = {
            let mut store = RoutineStore::open_at(&path).unwrap();
            store.create(draft("HIIT", &[30])).unwrap().id
        };
        let store = RoutineStore::open_at(&path).unwrap();
        assert_eq!(store.list().len(), 1);
        assert_eq!(store.get(&id).unwrap().name, "HIIT");
    }

    #[test]
    fn create_rejects_invalid_draft() {
        let dir = tempdir().unwrap();
        let mut store = store(&dir);
        assert!(store.create(draft("No exercises", &[])).is_err());
        assert!(store.list().is_empty());
    }

    #[test]
    fn update_keeps_id_and_reindexes() {
        let dir = tempdir().unwrap();
        let mut store = store(&dir);
        let routine = store.create(draft("HIIT", &[30, 45])).unwrap();

        let updated = store.update(&routine.id, draft("Tabata", &[20])).unwrap();
        assert_eq!(updated.id, routine.id);
        assert_eq!(updated.name, "Tabata");
        assert_eq!(updated.exercises.len(), 1);
        assert_eq!(updated.exercises[0].order, 0);
        assert_eq!(updated.created_at, routine.created_at);
        assert!(updated.updated_at >= routine.updated_at);
    }

    #[test]
    fn update_unknown_id_fails() {
        let dir = tempdir().unwrap();
        let mut store = store(&dir);
        assert!(store.update("nope", draft("X", &[30])).is_err());
    }

    #[test]
    fn delete_removes_routine_and_clears_last_used() {
        let dir = tempdir().unwrap();
        let mut store = store(&dir);
        let routine = store.create(draft("HIIT", &[30])).unwrap();
        store.set_last_used(&routine.id).unwrap();

        store.delete(&routine.id).unwrap();
        assert!(store.list().is_empty());
        assert!(store.preferences().last_used_routine_id.is_none());
        assert!(store.delete(&routine.id).is_err());
    }

    #[test]
    fn duplicate_copies_with_fresh_ids() {
        let dir = tempdir().unwrap();
        let mut store = store(&dir);
        let routine = store.create(draft("HIIT", &[30, 45])).unwrap();

        let copy = store.duplicate(&routine.id).unwrap();
        assert_ne!(copy.id, routine.id);
        assert_eq!(copy.name, "HIIT (copy)");
        assert_eq!(copy.exercises.len(), 2);
        assert!(copy
            .exercises
            .iter()
            .zip(&routine.exercises)
            .all(|(a, b)| a.id != b.id && a.duration_seconds == b.duration_seconds));
        assert_eq!(store.list().len(), 2);
    }

    #[test]
    fn parse_error_is_reported_not_swallowed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("routines.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(RoutineStore::open_at(&path).is_err());
    }
}
