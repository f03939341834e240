/// error taxonomy for the core: every kind here is a caller bug, never a
/// runtime condition the state machine itself recovers from (§7).
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid encoding: {reason}")]
    InvalidEncoding { reason: String },

    #[error("illegal state: {action} is not valid while {stage}")]
    IllegalState {
        action: &'static str,
        stage: String,
    },

    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },
}

impl CoreError {
    pub fn invalid_encoding(reason: impl Into<String>) -> Self {
        Self::InvalidEncoding {
            reason: reason.into(),
        }
    }
    pub fn illegal_state(action: &'static str, stage: impl Into<String>) -> Self {
        Self::IllegalState {
            action,
            stage: stage.into(),
        }
    }
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
