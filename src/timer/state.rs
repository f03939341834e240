//! [`TimerState`]: the data carrier owned and mutated by
//! [`super::engine::PuzzleTimer`] (§3.6, §4.3).

use crate::error::{CoreError, CoreResult};
use crate::penalties::{Penalty, NO_PENALTIES};
use crate::solve::{PuzzleType, Solve};
use crate::timer::cue::{CueTracker, TimerCue};
use crate::timer::stage::TimerStage;
use crate::{MonoMs, TimeMs, WallMs};

/// sentinel accepted by [`TimerState::stop_inspection`] meaning "stop
/// exactly at the end of the overrun period" (§4.3.1).
pub const STOP_AT_OVERRUN_END: MonoMs = -1;

/// additional time after `inspection_duration_ms` during which a pre-start
/// "+2" is in effect before the automatic DNF (§4.3.1).
pub const OVERRUN_WINDOW_MS: TimeMs = 2_000;

pub const DEFAULT_INSPECTION_REFRESH_MS: TimeMs = 1_000;
pub const DEFAULT_SOLVE_REFRESH_MS: TimeMs = 31;

/// sentinel accepted by configuration setters meaning "restore the default".
pub const RESTORE_DEFAULT_REFRESH: TimeMs = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TimerConfig {
    /// 0 disables inspection entirely.
    pub inspection_duration_ms: TimeMs,
    pub hold_to_start_enabled: bool,
    pub inspection_refresh_period_ms: TimeMs,
    pub solve_refresh_period_ms: TimeMs,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            inspection_duration_ms: 0,
            hold_to_start_enabled: false,
            inspection_refresh_period_ms: DEFAULT_INSPECTION_REFRESH_MS,
            solve_refresh_period_ms: DEFAULT_SOLVE_REFRESH_MS,
        }
    }
}

impl TimerConfig {
    pub fn inspection_enabled(&self) -> bool {
        self.inspection_duration_ms > 0
    }
}

/// the puzzle-type/category/scramble a not-yet-committed attempt will carry
/// once [`TimerState::commit_solve`] produces a [`Solve`] (§4.3.2).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PendingSolve {
    pub puzzle_type: PuzzleType,
    pub category: String,
    pub scramble: String,
}

#[derive(Debug, Clone)]
pub struct TimerState {
    config: TimerConfig,
    stage: TimerStage,
    cues: CueTracker,
    in_progress_penalties: crate::penalties::Penalties,
    inspection: Option<(MonoMs, Option<MonoMs>)>,
    solve_phase: Option<(MonoMs, Option<MonoMs>, Option<MonoMs>, TimeMs)>,
    mark: MonoMs,
    pending: Option<PendingSolve>,
    solve: Option<Solve>,
    refresh_period_ms: TimeMs,
}

impl TimerState {
    pub fn new(config: TimerConfig) -> Self {
        let refresh_period_ms = if config.inspection_enabled() {
            config.inspection_refresh_period_ms
        } else {
            config.solve_refresh_period_ms
        };
        Self {
            cues: CueTracker::new(&config),
            config,
            stage: TimerStage::Unused,
            in_progress_penalties: NO_PENALTIES,
            inspection: None,
            solve_phase: None,
            mark: 0,
            pending: None,
            solve: None,
            refresh_period_ms,
        }
    }

    pub fn config(&self) -> TimerConfig {
        self.config
    }
    pub fn stage(&self) -> TimerStage {
        self.stage
    }
    pub fn set_stage(&mut self, stage: TimerStage) {
        self.stage = stage;
    }
    pub fn cues(&self) -> &CueTracker {
        &self.cues
    }
    pub fn fire(&mut self, cue: TimerCue) -> bool {
        self.cues.fire(cue)
    }
    pub fn reload(&mut self, cue: TimerCue) {
        self.cues.reload(cue)
    }
    pub fn refresh_period_ms(&self) -> TimeMs {
        self.refresh_period_ms
    }
    pub fn attached_solve(&self) -> Option<&Solve> {
        self.solve.as_ref()
    }
    pub fn set_pending(&mut self, pending: PendingSolve) {
        self.pending = Some(pending);
    }
    pub fn take_attached_solve(&mut self) -> Option<Solve> {
        self.solve.take()
    }
    pub fn set_attached_solve(&mut self, solve: Option<Solve>) {
        self.solve = solve;
    }

    pub fn is_reset(&self) -> bool {
        self.stage.is_reset()
    }
    pub fn is_stopped(&self) -> bool {
        self.stage.is_stopped()
    }
    pub fn is_running(&self) -> bool {
        self.stage.is_running()
    }
    pub fn is_inspection_running(&self) -> bool {
        self.stage.is_inspection_running()
    }
    pub fn is_solve_running(&self) -> bool {
        self.stage.is_solve_running()
    }
    pub fn is_solve_paused(&self) -> bool {
        matches!(self.solve_phase, Some((_, _, Some(_), _)))
    }

    /// while running, penalties come from the in-progress field; once
    /// stopped with a solve attached, they come from that solve — UI edits
    /// after stop happen on the solve, not on the live timer (§4.3).
    pub fn penalties(&self) -> crate::penalties::Penalties {
        if self.stage.is_stopped() {
            if let Some(solve) = &self.solve {
                return solve.penalties();
            }
        }
        self.in_progress_penalties
    }

    pub fn set_in_progress_penalties(&mut self, penalties: crate::penalties::Penalties) {
        self.in_progress_penalties = penalties;
    }
    pub fn in_progress_penalties(&self) -> crate::penalties::Penalties {
        self.in_progress_penalties
    }

    fn phase_start(&self) -> Option<MonoMs> {
        if self.stage.is_inspection_running() {
            self.inspection.map(|(start, _)| start)
        } else if self.stage.is_solve_running() {
            self.solve_phase.map(|(start, ..)| start)
        } else {
            None
        }
    }

    /// §4.3.3: establishes "now" for elapsed-time queries. Guards against a
    /// monotonic regression or a stale callback reintroducing a past value.
    pub fn mark(&mut self, t: MonoMs) {
        match self.phase_start() {
            None => {
                if t > self.mark {
                    self.mark = t;
                }
            }
            Some(phase_start) => {
                self.mark = t.max(self.mark).max(phase_start);
            }
        }
    }

    fn reset_mark(&mut self, t: MonoMs) {
        self.mark = t;
    }

    pub fn current_mark(&self) -> MonoMs {
        self.mark
    }

    // ---- inspection timer (§4.3.1) ----

    pub fn start_inspection(&mut self, t: MonoMs) -> CoreResult<()> {
        if !self.config.inspection_enabled() {
            return Err(CoreError::illegal_state(
                "start_inspection",
                "inspection disabled",
            ));
        }
        if self.inspection.is_some() {
            return Err(CoreError::illegal_state(
                "start_inspection",
                format!("{:?}", self.stage),
            ));
        }
        self.inspection = Some((t, None));
        self.reset_mark(t);
        Ok(())
    }

    fn inspection_elapsed_raw(&self) -> TimeMs {
        let (start, stop) = self.inspection.expect("inspection started");
        stop.unwrap_or(self.mark) - start
    }

    /// elapsed inspection time, capped at `duration + overrun window`
    /// regardless of wall-clock (§4.3.1).
    pub fn inspection_elapsed_ms(&self) -> TimeMs {
        let cap = self.config.inspection_duration_ms + OVERRUN_WINDOW_MS;
        self.inspection_elapsed_raw().min(cap).max(0)
    }

    pub fn inspection_remaining_before_overrun_ms(&self) -> TimeMs {
        self.config.inspection_duration_ms - self.inspection_elapsed_ms()
    }

    pub fn inspection_in_overrun(&self) -> bool {
        self.inspection_elapsed_raw() >= self.config.inspection_duration_ms
    }

    pub fn inspection_timed_out(&self) -> bool {
        self.inspection_elapsed_raw() >= self.config.inspection_duration_ms + OVERRUN_WINDOW_MS
    }

    pub fn stop_inspection(&mut self, t: MonoMs) -> CoreResult<()> {
        let (start, stop) = self
            .inspection
            .ok_or_else(|| CoreError::illegal_state("stop_inspection", "not running"))?;
        if stop.is_some() {
            return Err(CoreError::illegal_state("stop_inspection", "already stopped"));
        }
        let at = if t == STOP_AT_OVERRUN_END {
            start + self.config.inspection_duration_ms + OVERRUN_WINDOW_MS
        } else {
            t
        };
        self.mark(at);
        self.inspection = Some((start, Some(at)));
        Ok(())
    }

    // ---- solve timer (§4.3.2) ----

    pub fn start_solve(&mut self, t: MonoMs) -> CoreResult<()> {
        if self.config.inspection_enabled() {
            let stopped = self.inspection.is_some_and(|(_, stop)| stop.is_some());
            if !stopped {
                return Err(CoreError::illegal_state(
                    "start_solve",
                    "inspection has not stopped",
                ));
            }
        }
        if self.solve_phase.is_some() {
            return Err(CoreError::illegal_state("start_solve", "already started"));
        }
        self.solve_phase = Some((t, None, None, 0));
        self.reset_mark(t);
        Ok(())
    }

    pub fn solve_elapsed_ms(&self) -> TimeMs {
        let Some((start, stop, paused_at, pause_accum)) = self.solve_phase else {
            return 0;
        };
        let wall = stop.unwrap_or(paused_at.unwrap_or(self.mark));
        (wall - start) - pause_accum
    }

    pub fn pause_solve(&mut self, t: MonoMs) -> CoreResult<()> {
        let (start, stop, paused_at, pause_accum) = self
            .solve_phase
            .ok_or_else(|| CoreError::illegal_state("pause_solve", "not running"))?;
        if stop.is_some() {
            return Err(CoreError::illegal_state("pause_solve", "already stopped"));
        }
        if paused_at.is_some() {
            return Err(CoreError::illegal_state("pause_solve", "already paused"));
        }
        self.mark(t);
        self.solve_phase = Some((start, stop, Some(t), pause_accum));
        Ok(())
    }

    pub fn resume_solve(&mut self, t: MonoMs) -> CoreResult<()> {
        let (start, stop, paused_at, pause_accum) = self
            .solve_phase
            .ok_or_else(|| CoreError::illegal_state("resume_solve", "not running"))?;
        let paused_at =
            paused_at.ok_or_else(|| CoreError::illegal_state("resume_solve", "not paused"))?;
        let extra_pause = (t - paused_at).max(0);
        self.solve_phase = Some((start, stop, None, pause_accum + extra_pause));
        self.reset_mark(t);
        Ok(())
    }

    pub fn stop_solve(&mut self, t: MonoMs) -> CoreResult<()> {
        let (start, stop, paused_at, pause_accum) = self
            .solve_phase
            .ok_or_else(|| CoreError::illegal_state("stop_solve", "not running"))?;
        if stop.is_some() {
            return Err(CoreError::illegal_state("stop_solve", "already stopped"));
        }
        self.mark(t);
        self.solve_phase = Some((start, Some(t), paused_at, pause_accum));
        Ok(())
    }

    /// produces a new [`Solve`] from the final state. Fails if no
    /// in-progress solve reference was set (§4.3.2).
    pub fn commit_solve(&mut self, date_ms: WallMs) -> CoreResult<Solve> {
        let pending = self
            .pending
            .take()
            .ok_or_else(|| CoreError::illegal_state("commit_solve", "no pending solve reference"))?;
        let pre_time_penalty_ms =
            self.in_progress_penalties.pre_plus_twos() as TimeMs * crate::PLUS_TWO_MS;
        let total_ms = self.solve_elapsed_ms() + pre_time_penalty_ms;
        let solve = Solve::new(
            pending.puzzle_type,
            pending.category,
            total_ms,
            date_ms,
            pending.scramble,
            self.in_progress_penalties,
        );
        Ok(solve)
    }

    // ---- refresh-origin time (§4.3, §4.4) ----

    /// notional phase-zero instant, in the current monotonic base, that a UI
    /// refresher phase-aligns tick updates to. Zero while solving-paused.
    pub fn refresh_origin_time(&self) -> MonoMs {
        if self.is_solve_paused() {
            return 0;
        }
        if self.stage.is_inspection_running() {
            return self.inspection.map(|(start, _)| start).unwrap_or(0);
        }
        if self.stage.is_solve_running() {
            if let Some((start, _, _, pause_accum)) = self.solve_phase {
                return start + pause_accum;
            }
        }
        0
    }

    pub fn set_refresh_period_ms(&mut self, period_ms: TimeMs) -> CoreResult<()> {
        if period_ms == RESTORE_DEFAULT_REFRESH {
            self.refresh_period_ms = if self.config.inspection_enabled() {
                self.config.inspection_refresh_period_ms
            } else {
                self.config.solve_refresh_period_ms
            };
            return Ok(());
        }
        if period_ms <= 0 {
            return Err(CoreError::invalid_argument(format!(
                "refresh period must be > 0 or {RESTORE_DEFAULT_REFRESH}, got {period_ms}"
            )));
        }
        self.refresh_period_ms = period_ms;
        Ok(())
    }

    // ---- accessors used by persistence (§4.3.4) ----

    pub fn pending(&self) -> Option<&PendingSolve> {
        self.pending.as_ref()
    }
    pub fn inspection_started(&self) -> bool {
        self.inspection.is_some()
    }
    pub fn inspection_stopped(&self) -> bool {
        self.inspection.is_some_and(|(_, stop)| stop.is_some())
    }
    pub fn solve_started(&self) -> bool {
        self.solve_phase.is_some()
    }
    pub fn solve_stopped(&self) -> bool {
        self.solve_phase.is_some_and(|(_, stop, _, _)| stop.is_some())
    }
    pub fn cues_mut(&mut self) -> &mut CueTracker {
        &mut self.cues
    }

    /// rebuilds the inspection/solve segment bookkeeping against a new
    /// monotonic time base. Used only by [`crate::timer::blob`] restoration.
    pub fn restore_segments(
        &mut self,
        inspection: Option<(MonoMs, Option<MonoMs>)>,
        solve_phase: Option<(MonoMs, Option<MonoMs>, Option<MonoMs>, TimeMs)>,
        mark: MonoMs,
    ) {
        self.inspection = inspection;
        self.solve_phase = solve_phase;
        self.mark = mark;
    }

    pub fn penalty_incur_pre_start(&mut self, p: Penalty) {
        self.in_progress_penalties = self.in_progress_penalties.incur_pre_start(p);
    }
    pub fn penalty_incur_post_start(&mut self, p: Penalty) {
        self.in_progress_penalties = self.in_progress_penalties.incur_post_start(p);
    }
}

#[cfg(test)]
mod state_tests {
    use super::*;

    fn inspecting(duration_ms: TimeMs) -> TimerState {
        let mut ts = TimerState::new(TimerConfig {
            inspection_duration_ms: duration_ms,
            ..TimerConfig::default()
        });
        ts.set_stage(TimerStage::InspectionStarted);
        ts.start_inspection(0).unwrap();
        ts
    }

    #[test]
    fn mark_is_nondecreasing_while_running() {
        let mut ts = inspecting(15_000);
        ts.mark(100);
        assert_eq!(ts.current_mark(), 100);
        ts.mark(50); // earlier than previous mark: clamped
        assert_eq!(ts.current_mark(), 100);
        ts.mark(200);
        assert_eq!(ts.current_mark(), 200);
    }

    #[test]
    fn mark_before_phase_start_is_replaced_by_phase_start() {
        let mut ts = TimerState::new(TimerConfig {
            inspection_duration_ms: 15_000,
            ..TimerConfig::default()
        });
        ts.set_stage(TimerStage::InspectionStarted);
        ts.start_inspection(1_000).unwrap();
        ts.mark(500);
        assert_eq!(ts.current_mark(), 1_000);
    }

    #[test]
    fn inspection_elapsed_caps_at_duration_plus_overrun() {
        let mut ts = inspecting(15_000);
        ts.mark(25_000);
        assert_eq!(ts.inspection_elapsed_ms(), 17_000);
    }

    #[test]
    fn inspection_overrun_and_timeout_thresholds() {
        let mut ts = inspecting(15_000);
        ts.mark(15_500);
        assert!(ts.inspection_in_overrun());
        assert!(!ts.inspection_timed_out());
        ts.mark(17_001);
        assert!(ts.inspection_timed_out());
    }

    #[test]
    fn stop_inspection_sentinel_stops_at_overrun_end() {
        let mut ts = inspecting(15_000);
        ts.stop_inspection(STOP_AT_OVERRUN_END).unwrap();
        assert_eq!(ts.inspection_elapsed_ms(), 17_000);
    }

    #[test]
    fn pause_resume_freezes_and_shifts_elapsed() {
        let mut ts = TimerState::new(TimerConfig::default());
        ts.set_stage(TimerStage::SolveStarted);
        ts.start_solve(0).unwrap();
        ts.mark(1_000);
        ts.pause_solve(1_000).unwrap();
        assert_eq!(ts.solve_elapsed_ms(), 1_000);
        assert_eq!(ts.refresh_origin_time(), 0);
        ts.mark(5_000); // ignored while paused in real engine, but harmless here
        ts.resume_solve(3_000).unwrap();
        ts.mark(4_000);
        assert_eq!(ts.solve_elapsed_ms(), 2_000); // 1s before pause + 1s after resume
    }

    #[test]
    fn commit_solve_requires_pending_reference() {
        let mut ts = TimerState::new(TimerConfig::default());
        ts.set_stage(TimerStage::SolveStarted);
        ts.start_solve(0).unwrap();
        ts.mark(1_000);
        assert!(ts.commit_solve(0).is_err());
    }

    #[test]
    fn stopped_state_reports_penalties_from_attached_solve() {
        let mut ts = TimerState::new(TimerConfig::default());
        ts.set_stage(TimerStage::SolveStarted);
        ts.start_solve(0).unwrap();
        ts.mark(12_300);
        ts.penalty_incur_post_start(Penalty::PlusTwo);
        ts.set_pending(PendingSolve {
            puzzle_type: PuzzleType::ThreeByThree,
            category: "Normal".into(),
            scramble: String::new(),
        });
        let solve = ts.commit_solve(0).unwrap();
        ts.set_stage(TimerStage::Stopped);
        ts.set_attached_solve(Some(solve));
        assert_eq!(ts.penalties().post_plus_twos(), 1);
    }
}
