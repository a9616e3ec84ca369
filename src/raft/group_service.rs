use crate::state_machine::StateMachineOutput;
use bytes::Bytes;
use std::fmt;
use std::io;
use tokio::time::Duration;

/// A voting member of the CMG raft group, identified by the consistent ID (node name) of the node
/// hosting it.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct Peer {
    consistent_id: String,
}

impl Peer {
    pub fn new(consistent_id: impl Into<String>) -> Self {
        Peer {
            consistent_id: consistent_id.into(),
        }
    }

    pub fn consistent_id(&self) -> &str {
        &self.consistent_id
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.consistent_id)
    }
}

/// RaftGroupService is a client session to the raft group that replicates the CMG log. It is
/// injected into the CMG service, one per node.
#[async_trait::async_trait]
pub trait RaftGroupService: Send + Sync {
    /// Appends `command` to the replicated log and resolves with the output of the state machine
    /// once the entry is committed and applied.
    async fn run(&self, command: Bytes) -> Result<StateMachineOutput, SubmitError>;

    /// The leader as currently known by this session. `None` if it isn't known (yet).
    fn leader(&self) -> Option<Peer>;

    /// Asks the group who the leader is and updates what `leader()` returns.
    async fn refresh_leader(&self) -> Result<(), SubmitError>;

    /// Voting peers of the group. `None` if the session hasn't learned them.
    fn peers(&self) -> Option<Vec<Peer>>;
}

/// The log could not accept or commit a command. None of these are validation rejections: the
/// state machine never saw the command, so retrying is safe.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    // Can be retried with exponential backoff. Likely an election is in progress.
    #[error("Raft group has no leader")]
    NoLeader,

    #[error("Node {0} is disconnected from the raft group")]
    Disconnected(String),

    #[error("Command was not committed within {0:?}")]
    Timeout(Duration),

    #[error("Failed to persist log entry")]
    LocalIoError(io::Error),

    // Group logic runs on a background task. This error is returned if the task has exited.
    #[error("Raft group task has exited")]
    GroupExited,
}
