//! rolling average-of-N over a window of solve times (§4.5).

use crate::error::{CoreError, CoreResult};
use crate::solve::round_wca;
use crate::{TimeMs, TIME_DNF, TIME_UNKNOWN};
use std::collections::VecDeque;

/// a window snapshot plus the computed average and which slots were
/// dropped to produce it (§4.5 `AverageOfN` view).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AverageOfN {
    pub window: Vec<TimeMs>,
    pub average: TimeMs,
    pub dropped_best: i32,
    pub dropped_worst: i32,
}

/// rolling `N`-window calculator with a configurable DNF policy and
/// running global stats across every time ever added.
#[derive(Debug, Clone)]
pub struct AverageCalculator {
    n: usize,
    disqualify_on_dnf: bool,
    window: VecDeque<TimeMs>,
    count: u64,
    dnf_count: u64,
    total_ms: TimeMs,
    best: Option<TimeMs>,
    worst: Option<TimeMs>,
    best_average: Option<TimeMs>,
}

impl AverageCalculator {
    pub fn new(n: usize, disqualify_on_dnf: bool) -> CoreResult<Self> {
        if n == 0 {
            return Err(CoreError::invalid_argument("N must be > 0"));
        }
        Ok(Self {
            n,
            disqualify_on_dnf,
            window: VecDeque::with_capacity(n),
            count: 0,
            dnf_count: 0,
            total_ms: 0,
            best: None,
            worst: None,
            best_average: None,
        })
    }

    pub fn n(&self) -> usize {
        self.n
    }
    pub fn count(&self) -> u64 {
        self.count
    }
    pub fn dnf_count(&self) -> u64 {
        self.dnf_count
    }
    pub fn total_ms(&self) -> TimeMs {
        self.total_ms
    }
    pub fn best(&self) -> Option<TimeMs> {
        self.best
    }
    pub fn worst(&self) -> Option<TimeMs> {
        self.worst
    }
    pub fn best_average(&self) -> Option<TimeMs> {
        self.best_average
    }

    /// adds a rounded-at-insertion time to the window and global stats
    /// (§4.5). `t` must be `> 0` or `TIME_DNF`.
    pub fn add_time(&mut self, t: TimeMs) -> CoreResult<()> {
        if t != TIME_DNF && t <= 0 {
            return Err(CoreError::invalid_argument(format!(
                "time must be > 0 or TIME_DNF, got {t}"
            )));
        }
        let rounded = if t == TIME_DNF { TIME_DNF } else { round_wca(t) };

        if self.window.len() == self.n {
            self.window.pop_front();
        }
        self.window.push_back(rounded);

        self.count += 1;
        if rounded == TIME_DNF {
            self.dnf_count += 1;
        } else {
            self.total_ms += rounded;
            self.best = Some(self.best.map_or(rounded, |b| b.min(rounded)));
            self.worst = Some(self.worst.map_or(rounded, |w| w.max(rounded)));
        }

        let view = self.current();
        if view.average != TIME_UNKNOWN && view.average != TIME_DNF {
            self.best_average = Some(self.best_average.map_or(view.average, |b| b.min(view.average)));
        }
        Ok(())
    }

    /// clears the window and every running stat; `N` and the DNF policy
    /// survive the reset.
    pub fn reset(&mut self) {
        self.window.clear();
        self.count = 0;
        self.dnf_count = 0;
        self.total_ms = 0;
        self.best = None;
        self.worst = None;
        self.best_average = None;
    }

    /// computes the current average-of-N view without mutating state.
    pub fn current(&self) -> AverageOfN {
        let window: Vec<TimeMs> = self.window.iter().copied().collect();
        if window.len() < self.n {
            return AverageOfN {
                window,
                average: TIME_UNKNOWN,
                dropped_best: -1,
                dropped_worst: -1,
            };
        }
        average_of(&window, self.n, self.disqualify_on_dnf)
    }
}

/// pure computation of an [`AverageOfN`] over an already-full window.
fn average_of(window: &[TimeMs], n: usize, disqualify_on_dnf: bool) -> AverageOfN {
    let dnf_positions: Vec<usize> = window
        .iter()
        .enumerate()
        .filter(|(_, &t)| t == TIME_DNF)
        .map(|(i, _)| i)
        .collect();

    // n <= 3: plain mean, no drop mechanism exists so any DNF disqualifies.
    if n <= 3 {
        if !dnf_positions.is_empty() {
            return AverageOfN {
                window: window.to_vec(),
                average: TIME_DNF,
                dropped_best: -1,
                dropped_worst: dnf_positions[0] as i32,
            };
        }
        let sum: TimeMs = window.iter().sum();
        let average = round_wca(sum / n as TimeMs);
        return AverageOfN {
            window: window.to_vec(),
            average,
            dropped_best: -1,
            dropped_worst: -1,
        };
    }

    // n >= 4 (n == 4 is treated as n == 5, per spec's open question).
    if disqualify_on_dnf && dnf_positions.len() >= 2 {
        return AverageOfN {
            window: window.to_vec(),
            average: TIME_DNF,
            dropped_best: -1,
            dropped_worst: dnf_positions[0] as i32,
        };
    }

    let worst_idx = if let Some(&first_dnf) = dnf_positions.first() {
        first_dnf
    } else {
        index_of_max(window)
    };

    let candidates: Vec<usize> = (0..window.len())
        .filter(|&i| i != worst_idx && window[i] != TIME_DNF)
        .collect();

    if candidates.is_empty() {
        return AverageOfN {
            window: window.to_vec(),
            average: TIME_DNF,
            dropped_best: -1,
            dropped_worst: worst_idx as i32,
        };
    }
    if candidates.len() == 1 {
        // non-DNF count after dropping the worst fell to 1: best is not
        // additionally dropped.
        return AverageOfN {
            window: window.to_vec(),
            average: round_wca(window[candidates[0]]),
            dropped_best: -1,
            dropped_worst: worst_idx as i32,
        };
    }

    let best_idx = index_of_min(window, &candidates);
    let sum: TimeMs = candidates
        .iter()
        .filter(|&&i| i != best_idx)
        .map(|&i| window[i])
        .sum();
    let average = round_wca(sum / (candidates.len() - 1) as TimeMs);
    AverageOfN {
        window: window.to_vec(),
        average,
        dropped_best: best_idx as i32,
        dropped_worst: worst_idx as i32,
    }
}

/// first occurrence of the minimal value among `indices` ("first
/// occurrence wins best", §4.5).
fn index_of_min(window: &[TimeMs], indices: &[usize]) -> usize {
    *indices
        .iter()
        .min_by_key(|&&i| (window[i], i))
        .expect("non-empty")
}

/// index of the maximal value; if every value in the window is tied
/// (so the minimal value is also the maximal), the *next* occurrence
/// after the best index wins worst rather than re-using it.
fn index_of_max(window: &[TimeMs]) -> usize {
    let best_idx = *window
        .iter()
        .enumerate()
        .min_by_key(|&(i, &t)| (t, i))
        .map(|(i, _)| i)
        .expect("non-empty");
    let max_val = *window.iter().max().expect("non-empty");
    let max_indices: Vec<usize> = window
        .iter()
        .enumerate()
        .filter(|&(_, &t)| t == max_val)
        .map(|(i, _)| i)
        .collect();
    if let Some(pos) = max_indices.iter().position(|&i| i == best_idx) {
        if max_indices.len() > 1 {
            return max_indices[(pos + 1) % max_indices.len()];
        }
    }
    max_indices[0]
}

#[cfg(test)]
mod average_tests {
    use super::*;

    fn calc(n: usize, disqualify: bool) -> AverageCalculator {
        AverageCalculator::new(n, disqualify).unwrap()
    }

    #[test]
    fn below_window_size_is_unknown() {
        let mut c = calc(5, false);
        c.add_time(1_000).unwrap();
        assert_eq!(c.current().average, TIME_UNKNOWN);
    }

    #[test]
    fn plain_mean_for_n_le_three() {
        let mut c = calc(3, false);
        for t in [1_000, 2_000, 3_000] {
            c.add_time(t).unwrap();
        }
        assert_eq!(c.current().average, 2_000);
    }

    #[test]
    fn n_le_three_any_dnf_disqualifies() {
        let mut c = calc(3, false);
        c.add_time(1_000).unwrap();
        c.add_time(TIME_DNF).unwrap();
        c.add_time(2_000).unwrap();
        assert_eq!(c.current().average, TIME_DNF);
    }

    #[test]
    fn ao5_truncated_mean_matches_scenario() {
        let mut c = calc(5, false);
        for t in [500, 250, 150, 400, 200] {
            c.add_time(t).unwrap();
        }
        let view = c.current();
        assert_eq!(view.average, 280);
    }

    #[test]
    fn ao5_one_dnf_disqualify_false_drops_dnf_and_best() {
        let mut c = calc(5, false);
        for t in [500, 250, 150, 400, 200] {
            c.add_time(t).unwrap();
        }
        c.add_time(TIME_DNF).unwrap();
        c.add_time(800).unwrap();
        let view = c.current();
        assert_eq!(view.window, vec![150, 400, 200, TIME_DNF, 800]);
        assert_eq!(view.average, 460);
    }

    #[test]
    fn disqualify_on_dnf_true_two_dnfs_is_dnf() {
        let mut c = calc(5, true);
        for t in [500, 250, 150, 400] {
            c.add_time(t).unwrap();
        }
        c.add_time(TIME_DNF).unwrap();
        c.add_time(TIME_DNF).unwrap();
        assert_eq!(c.current().average, TIME_DNF);
    }

    #[test]
    fn disqualify_on_dnf_false_all_dnf_is_dnf() {
        let mut c = calc(5, false);
        for _ in 0..5 {
            c.add_time(TIME_DNF).unwrap();
        }
        assert_eq!(c.current().average, TIME_DNF);
    }

    #[test]
    fn best_average_tracks_smallest_non_dnf_average() {
        let mut c = calc(3, false);
        for t in [3_000, 2_000, 1_000] {
            c.add_time(t).unwrap();
        }
        assert_eq!(c.best_average(), Some(2_000));
        c.add_time(TIME_DNF).unwrap();
        assert_eq!(c.best_average(), Some(2_000));
    }

    #[test]
    fn reset_clears_window_and_stats_but_keeps_n() {
        let mut c = calc(3, false);
        c.add_time(1_000).unwrap();
        c.reset();
        assert_eq!(c.n(), 3);
        assert_eq!(c.count(), 0);
        assert_eq!(c.current().average, TIME_UNKNOWN);
    }

    #[test]
    fn rejects_non_positive_non_dnf_time() {
        let mut c = calc(3, false);
        assert!(c.add_time(0).is_err());
        assert!(c.add_time(-5).is_err());
    }

    #[test]
    fn rejects_zero_window_size() {
        assert!(AverageCalculator::new(0, false).is_err());
    }

    #[test]
    fn global_best_worst_total_track_every_add_not_just_window() {
        let mut c = calc(3, false);
        for t in [5_000, 1_000, 9_000, 2_000] {
            c.add_time(t).unwrap();
        }
        assert_eq!(c.best(), Some(1_000));
        assert_eq!(c.worst(), Some(9_000));
        assert_eq!(c.total_ms(), 17_000);
        assert_eq!(c.count(), 4);
    }
}
