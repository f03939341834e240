//! `PuzzleTimer`: the state machine driving [`TimerState`] from touch input
//! (§4.4). The only polymorphism in this crate is the listener capability
//! set, consumed here as three optional closures (§9 "Observer callbacks").

use crate::clock::Clock;
use crate::error::CoreResult;
use crate::penalties::{Penalty, NO_PENALTIES};
use crate::solve::Solve;
use crate::store::{SolveEvent, SolveStore};
use crate::timer::cue::TimerCue;
use crate::timer::stage::TimerStage;
use crate::timer::state::{PendingSolve, TimerConfig, TimerState};
use crate::MonoMs;

/// time a touch must be held before a hold-to-start gate promotes from
/// "holding" to "ready" (§4.4). Not given a concrete value by the spec;
/// chosen to match typical speedcubing timer apps.
pub const HOLD_DURATION_MS: MonoMs = 300;

/// the capability set of listener callbacks a `PuzzleTimer` may drive.
/// Any subset may be populated; absent callbacks are simply skipped.
#[derive(Default)]
pub struct Listeners {
    pub on_cue: Option<Box<dyn FnMut(TimerCue)>>,
    pub on_state: Option<Box<dyn FnMut(&TimerState)>>,
    pub on_refresh: Option<Box<dyn FnMut(MonoMs)>>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("on_cue", &self.on_cue.is_some())
            .field("on_state", &self.on_state.is_some())
            .field("on_refresh", &self.on_refresh.is_some())
            .finish()
    }
}

/// stage/cue pair a holding gate promotes into once the hold duration
/// elapses. `cue` is `None` for the inspection-then-solve gate, which has
/// no dedicated `TimerCue` variant (§4.4 table, "—").
struct ReadyTarget {
    stage: TimerStage,
    cue: Option<TimerCue>,
}

fn root_holding_and_ready(config: &TimerConfig) -> (TimerStage, Option<TimerCue>, ReadyTarget) {
    if config.inspection_enabled() {
        (
            TimerStage::InspectionHoldingForStart,
            Some(TimerCue::InspectionHoldingForStart),
            ReadyTarget {
                stage: TimerStage::InspectionReadyToStart,
                cue: Some(TimerCue::InspectionReadyToStart),
            },
        )
    } else {
        (
            TimerStage::SolveHoldingForStart,
            Some(TimerCue::SolveHoldingForStart),
            ReadyTarget {
                stage: TimerStage::SolveReadyToStart,
                cue: Some(TimerCue::SolveReadyToStart),
            },
        )
    }
}

fn post_inspection_holding_and_ready() -> (TimerStage, Option<TimerCue>, ReadyTarget) {
    (
        TimerStage::InspectionSolveHoldingForStart,
        None,
        ReadyTarget {
            stage: TimerStage::InspectionSolveReadyToStart,
            cue: None,
        },
    )
}

/// drives a [`TimerState`] through its full life cycle from touch/lifecycle
/// input, dispatching cue/state/refresh callbacks through `listeners`
/// (§4.4). Not safe for concurrent mutation — all calls are expected from a
/// single dispatcher thread (§5).
pub struct PuzzleTimer<C: Clock, S: SolveStore> {
    state: TimerState,
    clock: C,
    store: S,
    listeners: Listeners,
    sleeping: bool,
    previous_stable_stage: TimerStage,
    hold_started_at: Option<MonoMs>,
    pending_promo: Option<ReadyTarget>,
    pending_config: Option<TimerConfig>,
    last_refresh_slot: Option<i64>,
}

impl<C: Clock, S: SolveStore> PuzzleTimer<C, S> {
    pub fn new(config: TimerConfig, clock: C, store: S) -> Self {
        Self {
            state: TimerState::new(config),
            clock,
            store,
            listeners: Listeners::new(),
            sleeping: false,
            previous_stable_stage: TimerStage::Unused,
            hold_started_at: None,
            pending_promo: None,
            pending_config: None,
            last_refresh_slot: None,
        }
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }
    pub fn listeners_mut(&mut self) -> &mut Listeners {
        &mut self.listeners
    }
    pub fn store(&self) -> &S {
        &self.store
    }

    /// attaches the puzzle/category/scramble that the next committed
    /// [`Solve`] should carry (§4.3.2). Must be set before the run that
    /// commits reaches `Stopped`.
    pub fn attach_pending(&mut self, pending: PendingSolve) {
        self.state.set_pending(pending);
    }

    fn fire(&mut self, cue: TimerCue) -> bool {
        let fired = self.state.fire(cue);
        if fired {
            log::debug!("cue fired: {cue:?}");
            if let Some(cb) = self.listeners.on_cue.as_mut() {
                cb(cue);
            }
        }
        fired
    }

    fn emit_state(&mut self) {
        log::debug!("stage -> {:?}", self.state.stage());
        if let Some(cb) = self.listeners.on_state.as_mut() {
            cb(&self.state);
        }
    }

    fn set_stage(&mut self, stage: TimerStage) {
        self.state.set_stage(stage);
    }

    fn reset_refresh_tracking(&mut self) {
        self.last_refresh_slot = None;
    }

    /// re-enters `Unused`, applying any configuration change queued while a
    /// run was in progress (§4.4 "Failure semantics").
    fn enter_unused(&mut self) {
        let config = self.pending_config.take().unwrap_or_else(|| self.state.config());
        self.state = TimerState::new(config);
        self.previous_stable_stage = TimerStage::Unused;
        self.hold_started_at = None;
        self.pending_promo = None;
        self.reset_refresh_tracking();
        self.emit_state();
    }

    // ---- touch input (§4.4) ----

    pub fn on_touch_down(&mut self, t: MonoMs) -> CoreResult<()> {
        let before = self.state.stage();
        match before {
            TimerStage::Unused | TimerStage::Stopped => {
                self.previous_stable_stage = before;
                let config = self.state.config();
                let (holding, holding_cue, ready) = root_holding_and_ready(&config);
                if config.hold_to_start_enabled {
                    self.hold_started_at = Some(t);
                    self.pending_promo = Some(ready);
                    self.set_stage(holding);
                    if let Some(cue) = holding_cue {
                        self.fire(cue);
                    }
                    self.emit_state();
                } else {
                    self.set_stage(ready.stage);
                    if let Some(cue) = ready.cue {
                        self.fire(cue);
                    }
                    self.emit_state();
                }
            }
            TimerStage::InspectionStarted => {
                self.previous_stable_stage = before;
                let config = self.state.config();
                let (holding, _, ready) = post_inspection_holding_and_ready();
                if config.hold_to_start_enabled {
                    self.hold_started_at = Some(t);
                    self.pending_promo = Some(ready);
                    self.set_stage(holding);
                } else {
                    self.set_stage(ready.stage);
                }
                self.emit_state();
            }
            TimerStage::SolveStarted => {
                self.stop_and_commit(t)?;
            }
            _ => {
                log::debug!("touch_down ignored in stage {before:?}");
            }
        }
        Ok(())
    }

    pub fn on_touch_up(&mut self, t: MonoMs) -> CoreResult<()> {
        let stage = self.state.stage();
        if stage.is_holding() {
            // released before the hold duration elapsed: revert.
            self.set_stage(self.previous_stable_stage);
            self.hold_started_at = None;
            self.pending_promo = None;
            self.emit_state();
            return Ok(());
        }
        match stage {
            TimerStage::InspectionReadyToStart => {
                self.set_stage(TimerStage::InspectionStarted);
                self.state.start_inspection(t)?;
                self.fire(TimerCue::InspectionStarted);
                self.emit_state();
                self.reset_refresh_tracking();
            }
            TimerStage::InspectionSolveReadyToStart | TimerStage::SolveReadyToStart => {
                self.set_stage(TimerStage::SolveStarted);
                self.state.start_solve(t)?;
                self.fire(TimerCue::SolveStarted);
                self.emit_state();
                self.reset_refresh_tracking();
            }
            _ => {
                log::debug!("touch_up ignored in stage {stage:?}");
            }
        }
        Ok(())
    }

    pub fn on_touch_cancelled(&mut self, _t: MonoMs) {
        let stage = self.state.stage();
        let revertable = stage.is_holding()
            || matches!(
                stage,
                TimerStage::InspectionReadyToStart
                    | TimerStage::InspectionSolveReadyToStart
                    | TimerStage::SolveReadyToStart
            );
        if revertable {
            self.set_stage(self.previous_stable_stage);
            self.hold_started_at = None;
            self.pending_promo = None;
            self.emit_state();
        } else {
            // SolveStarted and other running stages: no revert, keep running.
            log::debug!("touch_cancelled ignored in stage {stage:?}");
        }
    }

    fn stop_and_commit(&mut self, t: MonoMs) -> CoreResult<()> {
        self.set_stage(TimerStage::Stopping);
        self.fire(TimerCue::Stopping);
        self.emit_state();

        self.state.stop_solve(t)?;
        let solve = self.state.commit_solve(self.clock.wall())?;
        let id = self.store.add(solve.clone());
        self.state.set_attached_solve(Some(solve.with_id(id)));
        self.set_stage(TimerStage::Stopped);
        self.emit_state();
        Ok(())
    }

    /// aborts any running inspection or solve with no commit, returning to
    /// `Unused` (§5 "Cancellation"). Idempotent.
    pub fn cancel(&mut self, t: MonoMs) {
        if matches!(self.state.stage(), TimerStage::Unused | TimerStage::Stopped) {
            return;
        }
        self.set_stage(TimerStage::Cancelling);
        self.fire(TimerCue::Cancelling);
        self.emit_state();

        self.state.set_in_progress_penalties(NO_PENALTIES);
        self.state.restore_segments(None, None, t);
        self.state.take_attached_solve();
        self.enter_unused();
    }

    /// unconditional reset back to a fresh `Unused` state, applying any
    /// queued configuration change.
    pub fn reset(&mut self, _t: MonoMs) {
        self.enter_unused();
    }

    pub fn sleep(&mut self) {
        self.sleeping = true;
    }

    pub fn wake(&mut self, _t: MonoMs) {
        self.sleeping = false;
        self.emit_state();
    }

    // ---- configuration (queued while running, §4.4) ----

    fn with_pending_or_current(&self) -> TimerConfig {
        self.pending_config.unwrap_or_else(|| self.state.config())
    }

    pub fn set_inspection_duration_ms(&mut self, ms: crate::TimeMs) {
        let mut config = self.with_pending_or_current();
        config.inspection_duration_ms = ms;
        self.apply_or_queue(config);
    }

    pub fn set_hold_to_start_enabled(&mut self, enabled: bool) {
        let mut config = self.with_pending_or_current();
        config.hold_to_start_enabled = enabled;
        self.apply_or_queue(config);
    }

    fn apply_or_queue(&mut self, config: TimerConfig) {
        if self.state.is_reset() {
            self.state = TimerState::new(config);
            self.pending_config = None;
        } else {
            self.pending_config = Some(config);
        }
    }

    // ---- SolveStore callbacks (§6) ----

    pub fn on_solve_changed(&mut self, event: SolveEvent) {
        match event {
            SolveEvent::OneSolveAdded(solve) | SolveEvent::OneSolveUpdated(solve) => {
                if let Some(current) = self.state.attached_solve() {
                    if current.id() == crate::NO_ID || current.id() == solve.id() {
                        self.state.set_attached_solve(Some(solve));
                    }
                }
            }
            SolveEvent::OneSolveDeleted(id) => {
                if self.state.attached_solve().is_some_and(|s| s.id() == id) {
                    self.state.set_attached_solve(None);
                }
            }
            SolveEvent::ManySolvesDeleted(ids) => {
                if self
                    .state
                    .attached_solve()
                    .is_some_and(|s| ids.contains(&s.id()))
                {
                    self.state.set_attached_solve(None);
                }
            }
            SolveEvent::SolveVerified(id) => log::debug!("solve {id} verified"),
            SolveEvent::SolveNotVerified(id) => log::debug!("solve {id} failed verification"),
            SolveEvent::ManySolvesAdded(_) | SolveEvent::SolvesMovedToHistory(_) => {
                log::debug!("batch solve event, no attached-solve change");
            }
        }
    }

    // ---- scheduled cues and the refresh loop (§4.4) ----

    /// advances scheduled inspection cues, the hold-to-start promotion
    /// timer, and the phase-aligned refresh loop to `now`. Must be called
    /// periodically by the host while a run is in progress.
    pub fn poll(&mut self, now: MonoMs) -> CoreResult<()> {
        self.poll_hold_promotion(now);
        self.poll_inspection_schedule(now)?;
        self.poll_refresh(now);
        Ok(())
    }

    fn poll_hold_promotion(&mut self, now: MonoMs) {
        let Some(hold_start) = self.hold_started_at else {
            return;
        };
        if !self.state.stage().is_holding() {
            return;
        }
        if now - hold_start < HOLD_DURATION_MS {
            return;
        }
        if let Some(target) = self.pending_promo.take() {
            self.set_stage(target.stage);
            if let Some(cue) = target.cue {
                self.fire(cue);
            }
            self.emit_state();
        }
        self.hold_started_at = None;
    }

    fn poll_inspection_schedule(&mut self, now: MonoMs) -> CoreResult<()> {
        if self.state.stage() != TimerStage::InspectionStarted {
            return Ok(());
        }
        self.state.mark(now);

        let duration = self.state.config().inspection_duration_ms;
        let elapsed = self.state.inspection_elapsed_ms();

        if elapsed >= duration.saturating_sub(7_000).max(0) && duration > 7_000 {
            self.fire(TimerCue::Inspection7sRemaining);
        }
        if elapsed >= duration.saturating_sub(3_000).max(0) && duration > 3_000 {
            self.fire(TimerCue::Inspection3sRemaining);
        }
        if self.state.inspection_in_overrun() && self.fire(TimerCue::InspectionOverrun) {
            self.state.penalty_incur_pre_start(Penalty::PlusTwo);
            self.emit_state();
        }
        if self.state.inspection_timed_out() && self.fire(TimerCue::InspectionTimeOut) {
            self.state.stop_inspection(crate::timer::state::STOP_AT_OVERRUN_END)?;
            self.state.penalty_incur_pre_start(Penalty::Dnf);
            self.emit_state();
            self.auto_stop_on_inspection_dnf(now)?;
        }
        Ok(())
    }

    fn auto_stop_on_inspection_dnf(&mut self, now: MonoMs) -> CoreResult<()> {
        self.set_stage(TimerStage::Stopping);
        self.fire(TimerCue::Stopping);
        self.emit_state();

        let solve = self.state.commit_solve(self.clock.wall())?;
        let id = self.store.add(solve.clone());
        self.state.set_attached_solve(Some(solve.with_id(id)));
        self.set_stage(TimerStage::Stopped);
        self.emit_state();
        let _ = now;
        Ok(())
    }

    fn poll_refresh(&mut self, now: MonoMs) {
        if self.sleeping || !self.state.is_running() || self.state.is_solve_paused() {
            return;
        }
        let period = self.state.refresh_period_ms().max(1);
        let rot = self.state.refresh_origin_time();
        let slot = (now - rot) / period;
        if self.last_refresh_slot != Some(slot) {
            self.last_refresh_slot = Some(slot);
            if let Some(cb) = self.listeners.on_refresh.as_mut() {
                cb(now);
            }
        }
    }

    // ---- solve-timer pause/resume pass-through (not gated by touch input) ----

    pub fn pause_solve(&mut self, t: MonoMs) -> CoreResult<()> {
        self.state.pause_solve(t)?;
        self.fire(TimerCue::SolvePaused);
        self.emit_state();
        Ok(())
    }

    pub fn resume_solve(&mut self, t: MonoMs) -> CoreResult<()> {
        self.state.resume_solve(t)?;
        self.fire(TimerCue::SolveResumed);
        self.emit_state();
        self.reset_refresh_tracking();
        Ok(())
    }
}
