//! # Rounds Core Library
//!
//! Core business logic for the `rounds` interval workout timer. The CLI binary
//! is a thin layer over this crate; any other frontend (GUI, TUI) is expected
//! to consume the same API.
//!
//! ## Architecture
//!
//! - **Session Engine**: a wall-clock-delta state machine that walks a routine
//!   through exercise/rest phases across repeat cycles. The engine never owns
//!   a clock -- the caller (normally [`TickDriver`]) feeds it elapsed time
//! - **Tick Driver**: periodic tokio task that measures real elapsed time
//!   between ticks and applies it to the engine, so delayed ticks never cause
//!   cumulative drift
//! - **Storage**: JSON routine store and TOML configuration under
//!   `~/.config/rounds`
//! - **Cues**: injected [`CuePlayer`] collaborator for the 3-second warning
//!   and workout-complete signals
//!
//! ## Key Components
//!
//! - [`SessionEngine`]: workout session state machine
//! - [`TickDriver`]: periodic driver with drift-resistant deltas
//! - [`Routine`]: validated routine definition with duration calculators
//! - [`RoutineStore`]: routine persistence
//! - [`Config`]: application configuration

pub mod error;
pub mod events;
pub mod format;
pub mod routine;
pub mod session;
pub mod storage;

pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::Event;
pub use routine::{Exercise, Routine};
pub use session::{
    CueKind, CuePlayer, NullCuePlayer, Phase, Progress, Session, SessionEngine, SessionStatus,
    TickDriver, TimerState,
};
pub use storage::{Config, Preferences, RoutineStore, StorageData};
