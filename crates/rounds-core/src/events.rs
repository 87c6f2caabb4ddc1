//! Session events.
//!
//! Every state change in the engine produces an [`Event`]. Frontends consume
//! the stream for display; the audio collaborator reacts to `Warning` and
//! `WorkoutCompleted`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::{Phase, Progress, SessionStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        cycle: u32,
        exercise_index: usize,
        duration_secs: f64,
        at: DateTime<Utc>,
    },
    SessionPaused {
        remaining_secs: f64,
        at: DateTime<Utc>,
    },
    SessionResumed {
        remaining_secs: f64,
        at: DateTime<Utc>,
    },
    /// Session discarded; a fresh ready session now exists for the routine.
    SessionStopped {
        at: DateTime<Utc>,
    },
    /// A new phase began after a countdown reached zero.
    PhaseStarted {
        phase: Phase,
        cycle: u32,
        exercise_index: usize,
        duration_secs: f64,
        at: DateTime<Utc>,
    },
    /// Remaining time first crossed the warning threshold for this phase.
    Warning {
        phase: Phase,
        remaining_secs: f64,
        at: DateTime<Utc>,
    },
    WorkoutCompleted {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        status: SessionStatus,
        phase: Phase,
        cycle: u32,
        exercise_index: usize,
        remaining_secs: f64,
        initial_secs: f64,
        progress: Progress,
        at: DateTime<Utc>,
    },
}
