pub mod clock;
pub mod error;
pub mod penalties;
pub mod solve;
pub mod stats;
pub mod store;
pub mod timer;

/// dimensional analysis types
pub type TimeMs = i64;
pub type WallMs = i64;
pub type MonoMs = i64;
pub type SolveId = i64;

/// no solve has been assigned a store id yet
pub const NO_ID: SolveId = -1;

/// sentinel meaning "no data" for a calculator slot, distinct from a disqualified time
pub const TIME_UNKNOWN: TimeMs = -1;
/// sentinel meaning "disqualified", distinct from absence of data
pub const TIME_DNF: TimeMs = -2;

/// a single "+2" penalty, in milliseconds
pub const PLUS_TWO_MS: TimeMs = 2_000;

/// trait for random generation, used by tests and fixtures
pub trait Arbitrary {
    fn random() -> Self;
}

/// initialize logging for the `drive` binary; library code never does this itself
#[cfg(feature = "cli")]
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
