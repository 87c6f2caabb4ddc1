//! Display-ready progress projection.
//!
//! Pure function of `(Session, Routine)` -- cheap enough to recompute on
//! every state change, so nothing here is ever cached or stored.

use serde::{Deserialize, Serialize};

use super::engine::{Phase, Session, SessionStatus};
use crate::routine::Routine;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    /// 1-indexed current cycle.
    pub current_cycle: u32,
    pub total_cycles: u32,
    /// 0-indexed current exercise.
    pub current_exercise_index: usize,
    /// Exercises per cycle.
    pub total_exercises: usize,
    /// Exercises finished across all cycles. An exercise counts as finished
    /// once its rest phase begins.
    pub completed_exercises: usize,
    /// 0.0 ..= 100.0; pinned to exactly 100 once the session completes (the
    /// final exercise has no rest phase, so the raw count stops one short).
    pub percent_complete: f64,
}

impl Progress {
    pub fn compute(session: &Session, routine: &Routine) -> Self {
        let total_exercises = routine.exercises.len();
        let total = routine.total_cycles as usize * total_exercises;

        let completed_exercises = if session.status == SessionStatus::Completed {
            total
        } else {
            (session.current_cycle as usize - 1) * total_exercises
                + session.current_exercise_index
                + usize::from(session.current_phase == Phase::Rest)
        };

        // total >= 1 because a session is never built for an empty routine.
        let percent_complete = completed_exercises as f64 / total as f64 * 100.0;

        Self {
            current_cycle: session.current_cycle,
            total_cycles: routine.total_cycles,
            current_exercise_index: session.current_exercise_index,
            total_exercises,
            completed_exercises,
            percent_complete,
        }
    }
}
