mod cues;
mod driver;
mod engine;
mod progress;

pub use cues::{CueKind, CuePlayer, NullCuePlayer};
pub use driver::TickDriver;
pub use engine::{Phase, Session, SessionEngine, SessionStatus, TimerState};
pub use progress::Progress;
