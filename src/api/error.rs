use crate::raft::SubmitError;

/// CmgError separates three kinds of failure: rejections agreed on by the whole cluster (they came
/// out of the replicated log), transport failures (the log never saw the command), and protocol
/// invariant violations.
#[derive(Debug, thiserror::Error)]
pub enum CmgError {
    #[error("Init CMG request denied, reason: {0}")]
    IllegalInitArgument(String),

    #[error("{request} request denied, reason: {reason}")]
    JoinDenied { request: &'static str, reason: String },

    #[error("{0} must be submitted by the CMG leader")]
    NotLeader(&'static str),

    #[error("Failed to submit command to the CMG: {0}")]
    Submission(#[from] SubmitError),

    // Caller and state machine disagree about the protocol. Never retried.
    #[error("Unexpected response to {command}: {response}")]
    UnexpectedResponse { command: &'static str, response: String },

    // The raft session can't name the voting peers of the group it belongs to.
    #[error("CMG voting peers are unknown")]
    UnknownPeers,
}

impl CmgError {
    /// True if the command may not have reached the state machine and resubmitting it is safe.
    pub fn is_transient(&self) -> bool {
        matches!(self, CmgError::Submission(_))
    }

    /// True if the replicated state machine refused the request.
    pub fn is_rejection(&self) -> bool {
        matches!(self, CmgError::IllegalInitArgument(_) | CmgError::JoinDenied { .. })
    }
}
