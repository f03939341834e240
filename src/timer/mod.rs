//! the puzzle timer state machine (§3.4–§3.6, §4.3, §4.4).

pub mod blob;
pub mod cue;
pub mod engine;
pub mod stage;
pub mod state;

pub use cue::TimerCue;
pub use engine::{Listeners, PuzzleTimer};
pub use stage::TimerStage;
pub use state::{PendingSolve, TimerConfig, TimerState};
