//! rolling statistics: per-window averages (§4.5) and the process-wide
//! observer registry over them (§5).

pub mod average;
pub mod registry;

pub use average::{AverageCalculator, AverageOfN};
pub use registry::{with_statistics, Statistics, StatisticsObserver, StatisticsUpdate};
