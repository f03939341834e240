//! the 13 stages a [`super::state::TimerState`] can occupy (§3.4).

/// closed enum of stages driving the timer state machine. See §4.4 for the
/// full transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum TimerStage {
    Unused,
    Starting,
    InspectionHoldingForStart,
    InspectionReadyToStart,
    InspectionStarted,
    InspectionSolveHoldingForStart,
    InspectionSolveReadyToStart,
    SolveHoldingForStart,
    SolveReadyToStart,
    SolveStarted,
    Cancelling,
    Stopping,
    Stopped,
}

impl TimerStage {
    /// stages in which the timer is actively ticking towards a commit:
    /// inspection running, the post-inspection hold/ready gate, or the
    /// solve itself (§4.3).
    pub fn is_running(&self) -> bool {
        matches!(
            self,
            Self::InspectionStarted
                | Self::InspectionSolveHoldingForStart
                | Self::InspectionSolveReadyToStart
                | Self::SolveStarted
        )
    }

    pub fn is_inspection_running(&self) -> bool {
        matches!(
            self,
            Self::InspectionStarted
                | Self::InspectionSolveHoldingForStart
                | Self::InspectionSolveReadyToStart
        )
    }

    pub fn is_solve_running(&self) -> bool {
        matches!(self, Self::SolveStarted)
    }

    pub fn is_reset(&self) -> bool {
        matches!(self, Self::Unused)
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    pub fn is_holding(&self) -> bool {
        matches!(
            self,
            Self::InspectionHoldingForStart
                | Self::InspectionSolveHoldingForStart
                | Self::SolveHoldingForStart
        )
    }
}

impl std::fmt::Display for TimerStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}
