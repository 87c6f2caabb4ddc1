//! Routine and exercise definitions.
//!
//! A [`Routine`] is an ordered list of timed exercises plus a shared rest
//! duration and a repeat-cycle count. Duration totals are always computed on
//! read -- they are never stored alongside the routine, so they cannot go
//! stale when the routine is edited.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FieldError, ValidationError};

/// Exercise name length bounds.
pub const NAME_MIN_LEN: usize = 1;
pub const NAME_MAX_LEN: usize = 50;

/// Exercise duration bounds (seconds).
pub const DURATION_MIN_SECS: u32 = 1;
pub const DURATION_MAX_SECS: u32 = 999;

/// Rest time bounds (seconds).
pub const REST_MIN_SECS: u32 = 0;
pub const REST_MAX_SECS: u32 = 999;

/// Repeat cycle bounds.
pub const CYCLES_MIN: u32 = 1;
pub const CYCLES_MAX: u32 = 99;

/// Maximum exercises per routine.
pub const MAX_EXERCISES: usize = 20;

/// A single timed exercise within a routine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    /// Countdown length in seconds (1..=999).
    pub duration_seconds: u32,
    /// Position within the routine (0-indexed, unique, gapless).
    pub order: u32,
}

/// A complete workout configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Routine {
    pub id: String,
    /// Display name (1..=50 characters).
    pub name: String,
    /// Exercises ordered by their `order` field.
    pub exercises: Vec<Exercise>,
    /// Rest between exercises in seconds (0..=999). No rest after the last
    /// exercise of a cycle.
    pub rest_seconds: u32,
    /// Number of repeat cycles (1..=99).
    pub total_cycles: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Routine {
    /// Duration of one complete cycle in seconds.
    ///
    /// Sum of all exercise durations plus `rest_seconds` between consecutive
    /// exercises. A single-exercise routine has zero internal rest.
    pub fn cycle_duration_secs(&self) -> u64 {
        let exercise_secs: u64 = self
            .exercises
            .iter()
            .map(|e| u64::from(e.duration_seconds))
            .sum();
        let rest_count = self.exercises.len().saturating_sub(1) as u64;
        exercise_secs + u64::from(self.rest_seconds) * rest_count
    }

    /// Duration of the whole workout (all cycles) in seconds.
    pub fn total_duration_secs(&self) -> u64 {
        self.cycle_duration_secs() * u64::from(self.total_cycles)
    }

    pub fn exercise_count(&self) -> usize {
        self.exercises.len()
    }

    /// Re-assign `order` to `0..n` following the current vector order.
    ///
    /// Called after any mutation (create, edit, delete, reorder) so the
    /// sequence stays gapless and duplicate-free.
    pub fn reindex(&mut self) {
        for (i, exercise) in self.exercises.iter_mut().enumerate() {
            exercise.order = i as u32;
        }
    }

    /// Validate all field constraints, collecting every violation.
    ///
    /// # Errors
    /// Returns [`ValidationError::Invalid`] with one [`FieldError`] per
    /// violated constraint.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = Vec::new();

        let trimmed = self.name.trim();
        if trimmed.len() < NAME_MIN_LEN {
            errors.push(FieldError {
                field: "name".into(),
                message: "routine name is required".into(),
            });
        } else if self.name.len() > NAME_MAX_LEN {
            errors.push(FieldError {
                field: "name".into(),
                message: format!("routine name must be {NAME_MAX_LEN} characters or less"),
            });
        }

        if self.exercises.is_empty() {
            errors.push(FieldError {
                field: "exercises".into(),
                message: "at least one exercise is required".into(),
            });
        } else if self.exercises.len() > MAX_EXERCISES {
            errors.push(FieldError {
                field: "exercises".into(),
                message: format!("maximum {MAX_EXERCISES} exercises allowed per routine"),
            });
        }

        for (i, exercise) in self.exercises.iter().enumerate() {
            for mut err in validate_exercise(exercise) {
                err.field = format!("exercises[{i}].{}", err.field);
                err.message = format!("exercise {}: {}", i + 1, err.message);
                errors.push(err);
            }
        }

        if self.rest_seconds > REST_MAX_SECS {
            errors.push(FieldError {
                field: "rest_seconds".into(),
                message: format!("rest time must be {REST_MAX_SECS} seconds or less"),
            });
        }

        if self.total_cycles < CYCLES_MIN {
            errors.push(FieldError {
                field: "total_cycles".into(),
                message: format!("total cycles must be at least {CYCLES_MIN}"),
            });
        } else if self.total_cycles > CYCLES_MAX {
            errors.push(FieldError {
                field: "total_cycles".into(),
                message: format!("total cycles must be {CYCLES_MAX} or less"),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::Invalid(errors))
        }
    }
}

fn validate_exercise(exercise: &Exercise) -> Vec<FieldError> {
    let mut errors = Vec::new();

    let trimmed = exercise.name.trim();
    if trimmed.len() < NAME_MIN_LEN {
        errors.push(FieldError {
            field: "name".into(),
            message: "exercise name is required".into(),
        });
    } else if exercise.name.len() > NAME_MAX_LEN {
        errors.push(FieldError {
            field: "name".into(),
            message: format!("exercise name must be {NAME_MAX_LEN} characters or less"),
        });
    }

    if exercise.duration_seconds < DURATION_MIN_SECS {
        errors.push(FieldError {
            field: "duration_seconds".into(),
            message: format!("duration must be at least {DURATION_MIN_SECS} second"),
        });
    } else if exercise.duration_seconds > DURATION_MAX_SECS {
        errors.push(FieldError {
            field: "duration_seconds".into(),
            message: format!("duration must be {DURATION_MAX_SECS} seconds or less"),
        });
    }

    errors
}
