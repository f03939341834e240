//! persistence across process death, including a monotonic-clock reset such
//! as a device reboot (§4.3.4).

use crate::error::{CoreError, CoreResult};
use crate::penalties::Penalties;
use crate::solve::Solve;
use crate::timer::cue::{CueTracker, TimerCue};
use crate::timer::stage::TimerStage;
use crate::timer::state::{PendingSolve, TimerConfig, TimerState};
use crate::{MonoMs, TimeMs, WallMs};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct SegmentSnapshot {
    started: bool,
    stopped: bool,
    paused: bool,
    elapsed_ms: TimeMs,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct TimerStateBlob {
    config: TimerConfig,
    stage: TimerStage,
    cues: Vec<(TimerCue, u8)>,
    in_progress_penalties: Penalties,
    pending: Option<PendingSolve>,
    solve: Option<Solve>,
    inspection: Option<SegmentSnapshot>,
    solve_phase: Option<SegmentSnapshot>,
    wall_at_save_ms: WallMs,
}

impl TimerState {
    /// serialises the full state, capturing elapsed-and-running segment
    /// state at this instant and the wall-clock at serialisation (§4.3.4).
    pub fn to_blob(&self, _now_mono: MonoMs, now_wall: WallMs) -> Vec<u8> {
        let inspection = self.inspection_started().then(|| SegmentSnapshot {
            started: true,
            stopped: self.inspection_stopped(),
            paused: false,
            elapsed_ms: self.inspection_elapsed_ms(),
        });
        let solve_phase = self.solve_started().then(|| SegmentSnapshot {
            started: true,
            stopped: self.solve_stopped(),
            paused: self.is_solve_paused(),
            elapsed_ms: self.solve_elapsed_ms(),
        });
        let blob = TimerStateBlob {
            config: self.config(),
            stage: self.stage(),
            cues: self.cues().snapshot(),
            in_progress_penalties: self.in_progress_penalties(),
            pending: self.pending().cloned(),
            solve: self.attached_solve().cloned(),
            inspection,
            solve_phase,
            wall_at_save_ms: now_wall,
        };
        serde_json::to_vec(&blob).expect("TimerState blob is always serialisable")
    }

    /// restores from a blob produced by [`Self::to_blob`], reconstructing a
    /// fresh monotonic time base so that a running segment's elapsed time
    /// advances by the wall-clock delta since save, while a paused segment's
    /// elapsed time is left exactly as it was (§4.3.4, invariant 5).
    pub fn from_blob(bytes: &[u8], now_mono: MonoMs, now_wall: WallMs) -> CoreResult<Self> {
        let blob: TimerStateBlob = serde_json::from_slice(bytes)
            .map_err(|e| CoreError::invalid_encoding(format!("corrupt timer blob: {e}")))?;
        let delta = (now_wall - blob.wall_at_save_ms).max(0);

        let mut state = TimerState::new(blob.config);
        state.set_stage(blob.stage);
        state.set_in_progress_penalties(blob.in_progress_penalties);
        if let Some(pending) = blob.pending {
            state.set_pending(pending);
        }
        state.set_attached_solve(blob.solve);
        *state.cues_mut() = CueTracker::from_snapshot(&blob.cues);

        let inspection = blob.inspection.map(|seg| {
            let continued = if seg.stopped { seg.elapsed_ms } else { seg.elapsed_ms + delta };
            let start = now_mono - continued;
            let stop = seg.stopped.then_some(now_mono);
            (start, stop)
        });
        let solve_phase = blob.solve_phase.map(|seg| {
            let continued = if seg.stopped || seg.paused {
                seg.elapsed_ms
            } else {
                seg.elapsed_ms + delta
            };
            let start = now_mono - continued;
            let stop = seg.stopped.then_some(now_mono);
            let paused_at = seg.paused.then_some(now_mono);
            (start, stop, paused_at, 0)
        });
        state.restore_segments(inspection, solve_phase, now_mono);

        if inspection_still_running(&state) {
            state.cues_mut().reload(TimerCue::InspectionResumed);
        }

        Ok(state)
    }
}

fn inspection_still_running(state: &TimerState) -> bool {
    state.inspection_started() && !state.inspection_stopped()
}
