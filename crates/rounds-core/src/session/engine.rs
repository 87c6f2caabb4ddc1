//! Workout session state machine.
//!
//! The engine owns no clock and no thread. The caller (normally
//! [`TickDriver`](super::TickDriver)) measures real elapsed time between ticks
//! and feeds it in via `tick(delta)`, so the engine can be driven
//! synchronously in tests with fabricated deltas.
//!
//! ## State Transitions
//!
//! ```text
//! Ready -> Running <-> Paused -> Completed
//!          Running/Paused -> stop() -> fresh Ready session
//! ```
//!
//! A tick that lands on zero does not switch phase itself; it marks a
//! transition as pending and the driver applies it after the tick returns.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::cues::{CueKind, CuePlayer, NullCuePlayer};
use super::progress::Progress;
use crate::error::CoreError;
use crate::events::Event;
use crate::routine::Routine;

/// Warning cue threshold in seconds.
const WARNING_SECS: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Ready,
    Running,
    Paused,
    Completed,
    /// Terminal status of an abandoned attempt. The engine's live session
    /// never holds it -- `stop()` swaps in a fresh `Ready` session in the
    /// same call -- but serialized consumers that retain the discarded
    /// attempt record it with this status.
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Exercise,
    Rest,
}

/// One execution attempt of a routine.
///
/// Created fresh on every attempt, discarded on stop; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub routine_id: String,
    pub status: SessionStatus,
    /// 1-indexed (shown as "Round 2 of 3").
    pub current_cycle: u32,
    /// 0-indexed into the routine's exercise list.
    pub current_exercise_index: usize,
    pub current_phase: Phase,
    pub start_time: Option<DateTime<Utc>>,
    /// Set iff status is `Paused`.
    pub paused_at: Option<DateTime<Utc>>,
    /// Accumulated pause time in milliseconds.
    pub total_paused_ms: u64,
    /// Set exactly once, on the transition into `Completed`.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Session {
    fn new(routine_id: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            routine_id: routine_id.to_string(),
            status: SessionStatus::Ready,
            current_cycle: 1,
            current_exercise_index: 0,
            current_phase: Phase::Exercise,
            start_time: None,
            paused_at: None,
            total_paused_ms: 0,
            completed_at: None,
        }
    }
}

/// Ephemeral countdown state, recomputed every tick.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimerState {
    /// Seconds remaining in the current phase, floored at zero.
    pub time_remaining: f64,
    pub is_running: bool,
    pub is_paused: bool,
    /// Full length of the current phase.
    pub initial_time: f64,
}

/// Workout session engine.
///
/// Control methods return `Some(Event)` on a state change and `None` when
/// called from a state where the operation does not apply -- invalid
/// invocations are deliberately silent no-ops.
pub struct SessionEngine {
    routine: Routine,
    session: Session,
    timer: TimerState,
    /// Warning cue already fired for the current phase.
    warning_fired: bool,
    /// A countdown reached zero; the next `advance_phase` call applies it.
    transition_pending: bool,
    cues: Box<dyn CuePlayer + Send>,
}

impl SessionEngine {
    /// Create a ready session for a validated routine.
    ///
    /// # Errors
    /// Returns a validation error for any routine that must never reach
    /// execution (empty exercise list, out-of-range fields).
    pub fn new(routine: Routine) -> Result<Self, CoreError> {
        routine.validate()?;
        let first = f64::from(routine.exercises[0].duration_seconds);
        let session = Session::new(&routine.id);
        Ok(Self {
            routine,
            session,
            timer: TimerState {
                time_remaining: first,
                is_running: false,
                is_paused: false,
                initial_time: first,
            },
            warning_fired: false,
            transition_pending: false,
            cues: Box::new(NullCuePlayer),
        })
    }

    /// Install the audio collaborator.
    pub fn with_cue_player(mut self, cues: Box<dyn CuePlayer + Send>) -> Self {
        self.cues = cues;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn timer(&self) -> &TimerState {
        &self.timer
    }

    pub fn routine(&self) -> &Routine {
        &self.routine
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status
    }

    pub fn is_running(&self) -> bool {
        self.session.status == SessionStatus::Running
    }

    pub fn is_complete(&self) -> bool {
        self.session.status == SessionStatus::Completed
    }

    /// A countdown reached zero and the phase switch has not been applied yet.
    pub fn transition_pending(&self) -> bool {
        self.transition_pending
    }

    pub fn progress(&self) -> Progress {
        Progress::compute(&self.session, &self.routine)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            status: self.session.status,
            phase: self.session.current_phase,
            cycle: self.session.current_cycle,
            exercise_index: self.session.current_exercise_index,
            remaining_secs: self.timer.time_remaining,
            initial_secs: self.timer.initial_time,
            progress: self.progress(),
            at: Utc::now(),
        }
    }

    // ── Controls ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        if self.session.status != SessionStatus::Ready {
            return None;
        }
        self.cues.init();
        self.session.status = SessionStatus::Running;
        if self.session.start_time.is_none() {
            self.session.start_time = Some(Utc::now());
        }
        self.timer.is_running = true;
        self.timer.is_paused = false;
        Some(Event::SessionStarted {
            cycle: self.session.current_cycle,
            exercise_index: self.session.current_exercise_index,
            duration_secs: self.timer.initial_time,
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if self.session.status != SessionStatus::Running {
            return None;
        }
        self.session.status = SessionStatus::Paused;
        self.session.paused_at = Some(Utc::now());
        self.timer.is_running = false;
        self.timer.is_paused = true;
        Some(Event::SessionPaused {
            remaining_secs: self.timer.time_remaining,
            at: Utc::now(),
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        if self.session.status != SessionStatus::Paused {
            return None;
        }
        let now = Utc::now();
        if let Some(paused_at) = self.session.paused_at.take() {
            let paused_ms = (now - paused_at).num_milliseconds().max(0) as u64;
            self.session.total_paused_ms += paused_ms;
        }
        self.session.status = SessionStatus::Running;
        self.timer.is_running = true;
        self.timer.is_paused = false;
        Some(Event::SessionResumed {
            remaining_secs: self.timer.time_remaining,
            at: now,
        })
    }

    /// Discard the current session and construct a fresh ready one for the
    /// same routine. Valid from any non-terminal state.
    pub fn stop(&mut self) -> Option<Event> {
        match self.session.status {
            SessionStatus::Completed | SessionStatus::Stopped => return None,
            _ => {}
        }
        self.session = Session::new(&self.routine.id);
        let first = f64::from(self.routine.exercises[0].duration_seconds);
        self.timer = TimerState {
            time_remaining: first,
            is_running: false,
            is_paused: false,
            initial_time: first,
        };
        self.warning_fired = false;
        self.transition_pending = false;
        Some(Event::SessionStopped { at: Utc::now() })
    }

    // ── Ticking ──────────────────────────────────────────────────────

    /// Apply real elapsed time to the current countdown.
    ///
    /// No-op unless the session is running. Fires the warning cue exactly
    /// once per phase when remaining time first lands in `(0, 3]`. When the
    /// countdown reaches zero a phase transition is marked pending; the
    /// switch itself happens in [`advance_phase`](Self::advance_phase), after
    /// this call returns.
    pub fn tick(&mut self, delta: Duration) -> Option<Event> {
        if self.session.status != SessionStatus::Running || self.transition_pending {
            return None;
        }
        let remaining = (self.timer.time_remaining - delta.as_secs_f64()).max(0.0);
        self.timer.time_remaining = remaining;

        if remaining <= WARNING_SECS && remaining > 0.0 && !self.warning_fired {
            self.warning_fired = true;
            self.cues.play(CueKind::Warning);
            return Some(Event::Warning {
                phase: self.session.current_phase,
                remaining_secs: remaining,
                at: Utc::now(),
            });
        }

        if remaining == 0.0 {
            self.transition_pending = true;
        }
        None
    }

    /// Apply the pending phase transition.
    ///
    /// Exercise -> rest (or completion on the last exercise of the last
    /// cycle); rest -> next exercise (or exercise 0 of the next cycle). The
    /// per-phase warning flag is cleared on every transition.
    pub fn advance_phase(&mut self) -> Option<Event> {
        if !self.transition_pending || self.session.status != SessionStatus::Running {
            return None;
        }
        self.transition_pending = false;
        self.warning_fired = false;

        match self.session.current_phase {
            Phase::Exercise => {
                let last_exercise =
                    self.session.current_exercise_index == self.routine.exercises.len() - 1;
                let last_cycle = self.session.current_cycle == self.routine.total_cycles;

                if last_exercise && last_cycle {
                    self.session.status = SessionStatus::Completed;
                    self.session.completed_at = Some(Utc::now());
                    self.timer.is_running = false;
                    self.timer.time_remaining = 0.0;
                    self.cues.play(CueKind::Complete);
                    return Some(Event::WorkoutCompleted { at: Utc::now() });
                }

                self.session.current_phase = Phase::Rest;
                self.load_phase(f64::from(self.routine.rest_seconds))
            }
            Phase::Rest => {
                let last_exercise =
                    self.session.current_exercise_index == self.routine.exercises.len() - 1;
                if last_exercise {
                    self.session.current_cycle += 1;
                    self.session.current_exercise_index = 0;
                } else {
                    self.session.current_exercise_index += 1;
                }
                self.session.current_phase = Phase::Exercise;
                let duration = f64::from(
                    self.routine.exercises[self.session.current_exercise_index].duration_seconds,
                );
                self.load_phase(duration)
            }
        }
    }

    fn load_phase(&mut self, duration_secs: f64) -> Option<Event> {
        self.timer.time_remaining = duration_secs;
        self.timer.initial_time = duration_secs;
        // A zero-length phase (rest_seconds == 0) falls straight through to
        // the next transition on the following driver pass.
        if duration_secs == 0.0 {
            self.transition_pending = true;
        }
        Some(Event::PhaseStarted {
            phase: self.session.current_phase,
            cycle: self.session.current_cycle,
            exercise_index: self.session.current_exercise_index,
            duration_secs,
            at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routine::Exercise;
    use std::sync::{Arc, Mutex};

    fn routine(durations: &[u32], rest: u32, cycles: u32) -> Routine {
        let now = Utc::now();
        Routine {
            id: "routine-1".into(),
            name: "Test".into(),
            exercises: durations
                .iter()
                .enumerate()
                .map(|(i, &d)| Exercise {
                    id: format!("ex-{i}"),
                    name: format!("Exercise {i}"),
                    duration_seconds: d,
                    order: i as u32,
                })
                .collect(),
            rest_seconds: rest,
            total_cycles: cycles,
            created_at: now,
            updated_at: now,
        }
    }

    fn engine(durations: &[u32], rest: u32, cycles: u32) -> SessionEngine {
        SessionEngine::new(routine(durations, rest, cycles)).unwrap()
    }

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    /// Tick down the current phase and apply the transition, as the driver
    /// would.
    fn run_out_phase(engine: &mut SessionEngine) -> Option<Event> {
        let remaining = engine.timer().time_remaining;
        engine.tick(secs(remaining + 0.5));
        assert!(engine.transition_pending());
        engine.advance_phase()
    }

    #[derive(Default)]
    struct RecordingPlayer {
        played: Arc<Mutex<Vec<CueKind>>>,
    }

    impl CuePlayer for RecordingPlayer {
        fn play(&mut self, kind: CueKind) {
            self.played.lock().unwrap().push(kind);
        }
    }

    #[test]
    fn rejects_routine_with_no_exercises() {
        assert!(SessionEngine::new(routine(&[], 10, 2)).is_err());
    }

    #[test]
    fn new_engine_is_ready_with_first_exercise_loaded() {
        let engine = engine(&[30], 10, 2);
        assert_eq!(engine.status(), SessionStatus::Ready);
        assert_eq!(engine.timer().time_remaining, 30.0);
        assert_eq!(engine.timer().initial_time, 30.0);
        assert_eq!(engine.session().current_cycle, 1);
        assert_eq!(engine.session().current_phase, Phase::Exercise);
    }

    #[test]
    fn full_walkthrough_single_exercise_two_cycles() {
        let mut engine = engine(&[30], 10, 2);

        assert!(engine.start().is_some());
        assert_eq!(engine.status(), SessionStatus::Running);
        assert!(engine.session().start_time.is_some());
        assert_eq!(engine.timer().time_remaining, 30.0);

        // Exercise 1 of cycle 1 runs out -> rest, not completion.
        match run_out_phase(&mut engine) {
            Some(Event::PhaseStarted { phase, .. }) => assert_eq!(phase, Phase::Rest),
            other => panic!("expected PhaseStarted, got {other:?}"),
        }
        assert_eq!(engine.timer().time_remaining, 10.0);
        assert_eq!(engine.status(), SessionStatus::Running);

        // Rest runs out -> cycle 2, exercise 0.
        match run_out_phase(&mut engine) {
            Some(Event::PhaseStarted { phase, cycle, exercise_index, .. }) => {
                assert_eq!(phase, Phase::Exercise);
                assert_eq!(cycle, 2);
                assert_eq!(exercise_index, 0);
            }
            other => panic!("expected PhaseStarted, got {other:?}"),
        }
        assert_eq!(engine.timer().time_remaining, 30.0);

        // Last exercise of last cycle -> completed.
        match run_out_phase(&mut engine) {
            Some(Event::WorkoutCompleted { .. }) => {}
            other => panic!("expected WorkoutCompleted, got {other:?}"),
        }
        assert_eq!(engine.status(), SessionStatus::Completed);
        assert!(engine.session().completed_at.is_some());
        assert_eq!(engine.timer().time_remaining, 0.0);

        // Terminal: nothing moves any more.
        let completed_at = engine.session().completed_at;
        assert!(engine.tick(secs(5.0)).is_none());
        assert!(engine.advance_phase().is_none());
        assert!(engine.start().is_none());
        assert_eq!(engine.session().completed_at, completed_at);
    }

    #[test]
    fn one_exercise_three_cycles_has_no_trailing_rest() {
        let mut engine = engine(&[10], 5, 3);
        engine.start();

        let mut phases = Vec::new();
        loop {
            match run_out_phase(&mut engine) {
                Some(Event::PhaseStarted { phase, .. }) => phases.push(phase),
                Some(Event::WorkoutCompleted { .. }) => break,
                other => panic!("unexpected event: {other:?}"),
            }
        }
        // exercise -> rest -> exercise -> rest -> exercise -> completed
        assert_eq!(phases, vec![Phase::Rest, Phase::Exercise, Phase::Rest, Phase::Exercise]);
    }

    #[test]
    fn multi_exercise_cycle_rests_between_exercises() {
        let mut engine = engine(&[10, 20], 5, 1);
        engine.start();

        match run_out_phase(&mut engine) {
            Some(Event::PhaseStarted { phase: Phase::Rest, .. }) => {}
            other => panic!("unexpected event: {other:?}"),
        }
        match run_out_phase(&mut engine) {
            Some(Event::PhaseStarted { phase: Phase::Exercise, exercise_index: 1, .. }) => {}
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(engine.timer().time_remaining, 20.0);
        match run_out_phase(&mut engine) {
            Some(Event::WorkoutCompleted { .. }) => {}
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn tick_subtracts_wall_clock_delta_not_fixed_increment() {
        let mut engine = engine(&[30], 10, 1);
        engine.start();
        // A delayed tick charges the full elapsed time at once.
        engine.tick(secs(7.3));
        assert!((engine.timer().time_remaining - 22.7).abs() < 1e-9);
    }

    #[test]
    fn remaining_time_clamps_at_zero() {
        let mut engine = engine(&[5], 0, 1);
        engine.start();
        engine.tick(secs(60.0));
        assert_eq!(engine.timer().time_remaining, 0.0);
        assert!(engine.transition_pending());
    }

    #[test]
    fn zero_tick_does_not_transition_inline() {
        let mut engine = engine(&[5, 5], 3, 1);
        engine.start();
        engine.tick(secs(10.0));
        // Still in the exercise phase until advance_phase is called.
        assert_eq!(engine.session().current_phase, Phase::Exercise);
        assert!(engine.transition_pending());
        engine.advance_phase();
        assert_eq!(engine.session().current_phase, Phase::Rest);
    }

    #[test]
    fn warning_fires_once_per_phase() {
        let played = Arc::new(Mutex::new(Vec::new()));
        let player = RecordingPlayer { played: played.clone() };
        let mut engine = SessionEngine::new(routine(&[10], 10, 2))
            .unwrap()
            .with_cue_player(Box::new(player));
        engine.start();

        engine.tick(secs(7.5)); // remaining 2.5 -> warning
        assert_eq!(*played.lock().unwrap(), vec![CueKind::Warning]);

        // More ticks inside the window stay silent.
        engine.tick(secs(0.5));
        engine.tick(secs(0.5));
        assert_eq!(played.lock().unwrap().len(), 1);

        engine.tick(secs(5.0));
        engine.advance_phase(); // -> rest, flag cleared

        engine.tick(secs(8.0)); // rest remaining 2.0 -> warning again
        assert_eq!(*played.lock().unwrap(), vec![CueKind::Warning, CueKind::Warning]);
    }

    #[test]
    fn complete_cue_fires_on_workout_completion() {
        let played = Arc::new(Mutex::new(Vec::new()));
        let player = RecordingPlayer { played: played.clone() };
        let mut engine = SessionEngine::new(routine(&[5], 0, 1))
            .unwrap()
            .with_cue_player(Box::new(player));
        engine.start();
        engine.tick(secs(6.0));
        engine.advance_phase();
        assert!(played.lock().unwrap().contains(&CueKind::Complete));
    }

    #[test]
    fn pause_freezes_remaining_time() {
        let mut engine = engine(&[30], 10, 1);
        engine.start();
        engine.tick(secs(12.0));
        assert_eq!(engine.timer().time_remaining, 18.0);

        assert!(engine.pause().is_some());
        assert_eq!(engine.status(), SessionStatus::Paused);
        assert!(engine.session().paused_at.is_some());
        assert!(engine.timer().is_paused);

        // Ticks while paused charge nothing, however large.
        assert!(engine.tick(secs(600.0)).is_none());
        assert_eq!(engine.timer().time_remaining, 18.0);

        assert!(engine.resume().is_some());
        assert_eq!(engine.status(), SessionStatus::Running);
        assert!(engine.session().paused_at.is_none());
        assert_eq!(engine.timer().time_remaining, 18.0);
    }

    #[test]
    fn invalid_control_calls_are_no_ops() {
        let mut engine = engine(&[30], 10, 1);
        assert!(engine.pause().is_none());
        assert!(engine.resume().is_none());
        assert!(engine.advance_phase().is_none());

        engine.start();
        assert!(engine.start().is_none());
        assert!(engine.resume().is_none());
    }

    #[test]
    fn stop_yields_fresh_ready_session() {
        let mut engine = engine(&[30, 20], 10, 3);
        let original_id = engine.session().id.clone();
        engine.start();
        engine.tick(secs(31.0));
        engine.advance_phase();
        engine.tick(secs(11.0));
        engine.advance_phase();
        assert_eq!(engine.session().current_exercise_index, 1);

        assert!(engine.stop().is_some());
        let session = engine.session();
        assert_eq!(session.status, SessionStatus::Ready);
        assert_eq!(session.current_cycle, 1);
        assert_eq!(session.current_exercise_index, 0);
        assert_eq!(session.current_phase, Phase::Exercise);
        assert_ne!(session.id, original_id);
        assert_eq!(engine.timer().time_remaining, 30.0);
        assert!(!engine.transition_pending());
    }

    #[test]
    fn stop_is_valid_from_paused_but_not_terminal() {
        let mut engine = engine(&[5], 0, 1);
        engine.start();
        engine.pause();
        assert!(engine.stop().is_some());

        let mut engine = self::engine(&[5], 0, 1);
        engine.start();
        engine.tick(secs(6.0));
        engine.advance_phase();
        assert_eq!(engine.status(), SessionStatus::Completed);
        assert!(engine.stop().is_none());
    }

    #[test]
    fn zero_rest_phase_falls_through() {
        let mut engine = engine(&[5, 5], 0, 1);
        engine.start();
        engine.tick(secs(6.0));
        // Exercise -> zero-length rest, immediately pending again.
        engine.advance_phase();
        assert_eq!(engine.session().current_phase, Phase::Rest);
        assert!(engine.transition_pending());
        engine.advance_phase();
        assert_eq!(engine.session().current_phase, Phase::Exercise);
        assert_eq!(engine.session().current_exercise_index, 1);
    }

    #[test]
    fn percent_complete_is_monotonic_and_reaches_100() {
        let mut engine = engine(&[10, 10], 5, 2);
        engine.start();
        let mut last_pct = engine.progress().percent_complete;
        loop {
            let event = run_out_phase(&mut engine);
            let pct = engine.progress().percent_complete;
            assert!(pct >= last_pct, "progress went backwards: {last_pct} -> {pct}");
            last_pct = pct;
            if matches!(event, Some(Event::WorkoutCompleted { .. })) {
                break;
            }
        }
        assert_eq!(last_pct, 100.0);
    }

    #[test]
    fn session_status_uses_lowercase_wire_names() {
        for (status, wire) in [
            (SessionStatus::Ready, "\"ready\""),
            (SessionStatus::Running, "\"running\""),
            (SessionStatus::Paused, "\"paused\""),
            (SessionStatus::Completed, "\"completed\""),
            (SessionStatus::Stopped, "\"stopped\""),
        ] {
            assert_eq!(serde_json::to_string(&status).unwrap(), wire);
            assert_eq!(
                serde_json::from_str::<SessionStatus>(wire).unwrap(),
                status
            );
        }
    }

    #[test]
    fn snapshot_reflects_engine_state() {
        let engine = engine(&[30], 10, 2);
        match engine.snapshot() {
            Event::StateSnapshot { status, phase, cycle, remaining_secs, .. } => {
                assert_eq!(status, SessionStatus::Ready);
                assert_eq!(phase, Phase::Exercise);
                assert_eq!(cycle, 1);
                assert_eq!(remaining_secs, 30.0);
            }
            other => panic!("expected StateSnapshot, got {other:?}"),
        }
    }
}
