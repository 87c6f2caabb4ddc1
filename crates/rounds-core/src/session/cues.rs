//! Audio cue collaborator interface.
//!
//! The engine raises cues as fire-and-forget notifications. State transitions
//! never depend on the player: a missing or failing player changes nothing
//! about timing or progress.

use serde::{Deserialize, Serialize};

/// The two cue kinds the engine emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CueKind {
    /// Remaining time crossed the 3-second threshold for the current phase.
    Warning,
    /// The whole workout finished.
    Complete,
}

/// Injected audio collaborator.
///
/// `init` runs once when a session starts (platforms that need a user gesture
/// to unlock audio hook in here); `play` must not block the caller.
pub trait CuePlayer {
    fn init(&mut self) {}
    fn play(&mut self, kind: CueKind);
}

/// Default player that swallows all cues.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCuePlayer;

impl CuePlayer for NullCuePlayer {
    fn play(&mut self, _kind: CueKind) {}
}
