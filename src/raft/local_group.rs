use crate::actor::{self, ActorClient};
use crate::commitlog::InMemoryLog;
use crate::raft::group_service::{Peer, RaftGroupService, SubmitError};
use crate::raft::shared_option::SharedOption;
use crate::state_machine::{LocalStateMachineApplier, StateMachineOutput};
use bytes::Bytes;
use std::collections::HashSet;
use std::io;

// Reads go through the log too, so without a bound a long-lived group would grow forever.
const RETAINED_LOG_ENTRIES: usize = 1024;

#[derive(Debug, thiserror::Error)]
pub enum LocalRaftGroupError {
    #[error("Raft group must have at least one voting peer")]
    NoPeers,
    #[error("Peer {0} is listed more than once")]
    DuplicatePeer(String),
    #[error("Unknown peer {0}")]
    UnknownPeer(String),
    #[error("Log initialization failure")]
    LogInitialization(io::Error),
    #[error("Raft group task has exited")]
    GroupExited,
}

/// LocalRaftGroup is an in-process stand-in for the consensus engine: a fixed set of voting peers,
/// each with its own replica of the state machine, sharing one totally ordered commit log.
///
/// Leadership and connectivity are controlled explicitly, which makes it possible to exercise
/// leader discovery and transport failures deterministically.
#[derive(Clone)]
pub struct LocalRaftGroup {
    logger: slog::Logger,
    actor_client: ActorClient,
    peers: Vec<Peer>,
}

impl LocalRaftGroup {
    /// Spawns the group's event loop on the current tokio runtime. The group starts without a
    /// leader.
    pub fn start<M>(logger: slog::Logger, replicas: Vec<(String, M)>) -> Result<Self, LocalRaftGroupError>
    where
        M: LocalStateMachineApplier + Send + 'static,
    {
        if replicas.is_empty() {
            return Err(LocalRaftGroupError::NoPeers);
        }

        let mut seen = HashSet::with_capacity(replicas.len());
        for (name, _) in replicas.iter() {
            if !seen.insert(name.clone()) {
                return Err(LocalRaftGroupError::DuplicatePeer(name.clone()));
            }
        }

        let log =
            InMemoryLog::with_retention(RETAINED_LOG_ENTRIES).map_err(LocalRaftGroupError::LogInitialization)?;
        let replicas: Vec<(Peer, M)> = replicas
            .into_iter()
            .map(|(name, state_machine)| (Peer::new(name), state_machine))
            .collect();
        let peers = replicas.iter().map(|(peer, _)| peer.clone()).collect();

        let (actor_client, group_actor) = actor::create(logger.clone(), 32, replicas, log);
        tokio::spawn(group_actor.run_event_loop());

        Ok(LocalRaftGroup {
            logger,
            actor_client,
            peers,
        })
    }

    /// Opens a client session for the node with the given name. The node doesn't need to be a
    /// voting peer: every cluster node talks to the CMG through such a session.
    pub fn service_for(&self, node_name: impl Into<String>) -> LocalRaftGroupService {
        let node_name = node_name.into();

        LocalRaftGroupService {
            logger: self.logger.new(slog::o!("session" => node_name.clone())),
            node_name,
            actor_client: self.actor_client.clone(),
            peers: self.peers.clone(),
            cached_leader: SharedOption::new(),
        }
    }

    pub fn peers(&self) -> &[Peer] {
        &self.peers
    }

    /// Makes `name` the leader of a new term and returns that term.
    pub async fn elect(&self, name: impl Into<String>) -> Result<u64, LocalRaftGroupError> {
        self.actor_client.elect(name.into()).await
    }

    /// Leaves the group without a leader until the next `elect()`.
    pub async fn step_down(&self) -> Result<(), LocalRaftGroupError> {
        self.actor_client.step_down().await
    }

    /// Commands submitted by `name` fail with a transport error until `reconnect()`.
    pub async fn disconnect(&self, name: impl Into<String>) -> Result<(), LocalRaftGroupError> {
        self.actor_client.set_connected(name.into(), false).await
    }

    pub async fn reconnect(&self, name: impl Into<String>) -> Result<(), LocalRaftGroupError> {
        self.actor_client.set_connected(name.into(), true).await
    }
}

/// LocalRaftGroupService is one node's client session to a `LocalRaftGroup`.
pub struct LocalRaftGroupService {
    logger: slog::Logger,
    node_name: String,
    actor_client: ActorClient,
    peers: Vec<Peer>,
    // Leader as last observed by this session. Stale until refreshed, like with a remote group.
    cached_leader: SharedOption<Peer>,
}

#[async_trait::async_trait]
impl RaftGroupService for LocalRaftGroupService {
    async fn run(&self, command: Bytes) -> Result<StateMachineOutput, SubmitError> {
        let result = self.actor_client.submit(self.node_name.clone(), command).await;

        if let Err(SubmitError::NoLeader) = result {
            slog::debug!(self.logger, "Submission found no leader. Forgetting cached leader.");
            self.cached_leader.take();
        }

        result
    }

    fn leader(&self) -> Option<Peer> {
        self.cached_leader.get()
    }

    async fn refresh_leader(&self) -> Result<(), SubmitError> {
        let leader = self.actor_client.current_leader().await?;
        slog::debug!(self.logger, "Refreshed leader: {:?}", leader);
        self.cached_leader.replace(leader);

        Ok(())
    }

    fn peers(&self) -> Option<Vec<Peer>> {
        Some(self.peers.clone())
    }
}
