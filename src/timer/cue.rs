//! one-shot notifications fired during a run (§3.5, §4.3.5).

use crate::timer::state::TimerConfig;
use std::collections::HashMap;

/// closed enum of cues a [`super::engine::PuzzleTimer`] can fire exactly once
/// per eligible window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum TimerCue {
    InspectionHoldingForStart,
    InspectionReadyToStart,
    InspectionStarted,
    Inspection7sRemaining,
    Inspection3sRemaining,
    InspectionOverrun,
    InspectionTimeOut,
    InspectionResumed,
    SolveHoldingForStart,
    SolveReadyToStart,
    SolveStarted,
    SolvePaused,
    SolveResumed,
    Cancelling,
    Stopping,
}

impl TimerCue {
    pub const ALL: [TimerCue; 15] = [
        Self::InspectionHoldingForStart,
        Self::InspectionReadyToStart,
        Self::InspectionStarted,
        Self::Inspection7sRemaining,
        Self::Inspection3sRemaining,
        Self::InspectionOverrun,
        Self::InspectionTimeOut,
        Self::InspectionResumed,
        Self::SolveHoldingForStart,
        Self::SolveReadyToStart,
        Self::SolveStarted,
        Self::SolvePaused,
        Self::SolveResumed,
        Self::Cancelling,
        Self::Stopping,
    ];

    fn is_inspection_cue(&self) -> bool {
        matches!(
            self,
            Self::InspectionHoldingForStart
                | Self::InspectionReadyToStart
                | Self::InspectionStarted
                | Self::Inspection7sRemaining
                | Self::Inspection3sRemaining
                | Self::InspectionOverrun
                | Self::InspectionTimeOut
                | Self::InspectionResumed
        )
    }

    /// whether this cue starts out fireable for the given configuration
    /// (§4.3.5). `InspectionResumed` is never default-eligible; it is
    /// reloaded explicitly by a restore from a persisted blob.
    fn default_eligible(&self, config: &TimerConfig) -> bool {
        match self {
            Self::SolveReadyToStart | Self::SolveStarted | Self::Cancelling | Self::Stopping => {
                true
            }
            Self::SolveHoldingForStart => config.hold_to_start_enabled,
            Self::SolvePaused | Self::SolveResumed => true,
            Self::InspectionResumed => false,
            Self::Inspection7sRemaining => {
                config.inspection_enabled() && config.inspection_duration_ms > 7_000
            }
            Self::Inspection3sRemaining => {
                config.inspection_enabled() && config.inspection_duration_ms > 3_000
            }
            other if other.is_inspection_cue() => config.inspection_enabled(),
            _ => unreachable!("all cues classified above"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CueState {
    Eligible,
    Fired,
    Ineligible,
}

/// tracks the fire-state of every [`TimerCue`] for one timer run.
#[derive(Debug, Clone)]
pub struct CueTracker {
    states: HashMap<TimerCue, CueState>,
}

impl CueTracker {
    pub fn new(config: &TimerConfig) -> Self {
        let states = TimerCue::ALL
            .into_iter()
            .map(|cue| {
                let state = if cue.default_eligible(config) {
                    CueState::Eligible
                } else {
                    CueState::Ineligible
                };
                (cue, state)
            })
            .collect();
        Self { states }
    }

    fn state(&self, cue: TimerCue) -> CueState {
        *self.states.get(&cue).expect("all cues tracked")
    }

    pub fn is_eligible(&self, cue: TimerCue) -> bool {
        self.state(cue) == CueState::Eligible
    }

    pub fn has_fired(&self, cue: TimerCue) -> bool {
        self.state(cue) == CueState::Fired
    }

    /// fires `cue` if eligible, returning whether it actually fired.
    /// Once fired, further attempts are ignored until [`Self::reload`].
    pub fn fire(&mut self, cue: TimerCue) -> bool {
        if self.state(cue) != CueState::Eligible {
            return false;
        }
        self.states.insert(cue, CueState::Fired);
        true
    }

    /// resets `cue` back to eligible, regardless of its current state.
    pub fn reload(&mut self, cue: TimerCue) {
        self.states.insert(cue, CueState::Eligible);
    }

    /// serialisable snapshot for persistence (§4.3.4): one `(cue, tag)` pair
    /// per tracked cue, `tag` being 0=eligible, 1=fired, 2=ineligible.
    pub fn snapshot(&self) -> Vec<(TimerCue, u8)> {
        TimerCue::ALL
            .into_iter()
            .map(|cue| {
                let tag = match self.state(cue) {
                    CueState::Eligible => 0,
                    CueState::Fired => 1,
                    CueState::Ineligible => 2,
                };
                (cue, tag)
            })
            .collect()
    }

    /// rebuilds a tracker from a [`Self::snapshot`].
    pub fn from_snapshot(entries: &[(TimerCue, u8)]) -> Self {
        let states = entries
            .iter()
            .map(|(cue, tag)| {
                let state = match tag {
                    0 => CueState::Eligible,
                    1 => CueState::Fired,
                    _ => CueState::Ineligible,
                };
                (*cue, state)
            })
            .collect();
        Self { states }
    }
}

#[cfg(test)]
mod cue_tests {
    use super::*;

    fn config(inspection_ms: crate::TimeMs, hold: bool) -> TimerConfig {
        TimerConfig {
            inspection_duration_ms: inspection_ms,
            hold_to_start_enabled: hold,
            ..TimerConfig::default()
        }
    }

    #[test]
    fn fire_once_then_ignored() {
        let mut tracker = CueTracker::new(&config(15_000, false));
        assert!(tracker.fire(TimerCue::SolveStarted));
        assert!(tracker.has_fired(TimerCue::SolveStarted));
        assert!(!tracker.fire(TimerCue::SolveStarted));
    }

    #[test]
    fn reload_restores_eligibility() {
        let mut tracker = CueTracker::new(&config(15_000, false));
        tracker.fire(TimerCue::Stopping);
        tracker.reload(TimerCue::Stopping);
        assert!(tracker.is_eligible(TimerCue::Stopping));
    }

    #[test]
    fn hold_to_start_gates_solve_holding_cue() {
        let enabled = CueTracker::new(&config(15_000, true));
        let disabled = CueTracker::new(&config(15_000, false));
        assert!(enabled.is_eligible(TimerCue::SolveHoldingForStart));
        assert!(!disabled.is_eligible(TimerCue::SolveHoldingForStart));
    }

    #[test]
    fn inspection_disabled_gates_all_inspection_cues() {
        let tracker = CueTracker::new(&config(0, false));
        assert!(!tracker.is_eligible(TimerCue::InspectionStarted));
        assert!(!tracker.is_eligible(TimerCue::Inspection7sRemaining));
        assert!(!tracker.is_eligible(TimerCue::Inspection3sRemaining));
    }

    #[test]
    fn short_inspection_gates_remaining_cues_independently() {
        let tracker = CueTracker::new(&config(5_000, false));
        assert!(!tracker.is_eligible(TimerCue::Inspection7sRemaining));
        assert!(tracker.is_eligible(TimerCue::Inspection3sRemaining));
    }

    #[test]
    fn inspection_resumed_never_default_eligible() {
        let tracker = CueTracker::new(&config(15_000, false));
        assert!(!tracker.is_eligible(TimerCue::InspectionResumed));
        assert!(!tracker.has_fired(TimerCue::InspectionResumed));
    }
}
