use crate::api::error::CmgError;
use crate::api::options::CmgOptionsValidated;
use crate::api::topology_service::TopologyService;
use crate::api::watchdog::ValidationWatchdog;
use crate::cluster::{ClusterNode, ClusterState, ClusterTag, ValidationToken};
use crate::command::{CmgCommand, CmgResponse};
use crate::raft::{RaftGroupService, SubmitError};
use rand::Rng;
use std::collections::BTreeSet;
use std::convert::TryFrom;
use std::sync::Arc;
use tokio::time::Duration;

/// Product version of this build. Nodes can only join a cluster initialized with the same version.
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// CmgRaftService is a wrapper around a CMG raft group session providing the operations of the
/// join protocol and of the cluster administration tooling.
///
/// Every mutation is a command on the replicated log. The state machine, not this service, decides
/// whether it is accepted; this service only translates the committed outcome into a result.
pub struct CmgRaftService {
    logger: slog::Logger,
    raft: Arc<dyn RaftGroupService>,
    topology: Arc<dyn TopologyService>,
    options: CmgOptionsValidated,
}

impl CmgRaftService {
    pub(super) fn new(
        logger: slog::Logger,
        raft: Arc<dyn RaftGroupService>,
        topology: Arc<dyn TopologyService>,
        options: CmgOptionsValidated,
    ) -> Self {
        CmgRaftService {
            logger,
            raft,
            topology,
            options,
        }
    }

    pub fn product_version(&self) -> &str {
        &self.options.product_version
    }

    /// Returns true if the current node is the CMG leader, as last observed by this session. An
    /// unknown leader is refreshed first. A known one may be stale right after an election.
    pub async fn is_current_node_leader(&self) -> Result<bool, CmgError> {
        let local_name = self.topology.local_member().name;
        let mut refreshes = 0;

        loop {
            if let Some(leader) = self.raft.leader() {
                return Ok(leader.consistent_id() == local_name);
            }

            if refreshes == self.options.leader_refresh_attempts {
                slog::warn!(self.logger, "CMG leader still unknown after {} refreshes.", refreshes);
                return Err(CmgError::Submission(SubmitError::NoLeader));
            }
            if refreshes > 0 {
                tokio::time::sleep(self.refresh_backoff()).await;
            }

            self.raft.refresh_leader().await?;
            refreshes += 1;
        }
    }

    /// Retrieves the cluster state, or `None` if the cluster has not been initialized.
    pub async fn read_cluster_state(&self) -> Result<Option<ClusterState>, CmgError> {
        let command = CmgCommand::ReadClusterState;
        let name = command.name();

        match self.run(command).await? {
            CmgResponse::ClusterState(state) => Ok(Some(state)),
            CmgResponse::Empty => Ok(None),
            response @ CmgResponse::ValidationError(_)
            | response @ CmgResponse::LogicalTopology(_)
            | response @ CmgResponse::ValidatedNodes(_) => Err(self.unexpected(name, response)),
        }
    }

    /// Saves the given cluster state, unless one already exists. Resolves to the state the CMG holds
    /// afterwards, which is the existing one if this call raced with another initialization of the
    /// same cluster.
    pub async fn init_cluster_state(&self, cluster_state: ClusterState) -> Result<ClusterState, CmgError> {
        let command = CmgCommand::InitCmgState {
            node: self.topology.local_member(),
            cluster_state,
            version: self.options.product_version.clone(),
            issued_at_millis: now_millis(),
        };
        let name = command.name();

        match self.run(command).await? {
            CmgResponse::ClusterState(state) => Ok(state),
            CmgResponse::ValidationError(error) => {
                slog::warn!(self.logger, "Init CMG request denied: {}", error.reason);
                Err(CmgError::IllegalInitArgument(error.reason))
            }
            response @ CmgResponse::LogicalTopology(_)
            | response @ CmgResponse::ValidatedNodes(_)
            | response @ CmgResponse::Empty => Err(self.unexpected(name, response)),
        }
    }

    /// Sends a JoinRequest, starting the validation procedure of the local node against the given
    /// cluster tag.
    pub async fn start_join_cluster(&self, cluster_tag: &ClusterTag) -> Result<(), CmgError> {
        let command = CmgCommand::JoinRequest {
            node: self.topology.local_member(),
            version: self.options.product_version.clone(),
            cluster_tag: cluster_tag.clone(),
            issued_at_millis: now_millis(),
        };
        let name = command.name();

        match self.run(command).await? {
            CmgResponse::Empty => {
                slog::info!(self.logger, "JoinRequest command executed successfully");
                Ok(())
            }
            CmgResponse::ValidationError(error) => Err(self.join_denied(name, error.reason)),
            response @ CmgResponse::ClusterState(_)
            | response @ CmgResponse::LogicalTopology(_)
            | response @ CmgResponse::ValidatedNodes(_) => Err(self.unexpected(name, response)),
        }
    }

    /// Sends a JoinReady, adding the local node to the logical topology. Must follow a successful
    /// `start_join_cluster`.
    pub async fn complete_join_cluster(&self) -> Result<(), CmgError> {
        slog::info!(self.logger, "Node is ready to join the logical topology");

        let command = CmgCommand::JoinReady {
            node: self.topology.local_member(),
        };
        let name = command.name();

        match self.run(command).await? {
            CmgResponse::Empty => {
                slog::info!(self.logger, "JoinReady command executed successfully");
                Ok(())
            }
            CmgResponse::ValidationError(error) => Err(self.join_denied(name, error.reason)),
            response @ CmgResponse::ClusterState(_)
            | response @ CmgResponse::LogicalTopology(_)
            | response @ CmgResponse::ValidatedNodes(_) => Err(self.unexpected(name, response)),
        }
    }

    /// Removes the given nodes from the logical topology and discards their validation tokens.
    /// Only the CMG leader may call this, as seen after a leader refresh. Nodes that aren't members
    /// are ignored.
    pub async fn remove_from_cluster<I>(&self, nodes: I) -> Result<(), CmgError>
    where
        I: IntoIterator<Item = ClusterNode>,
    {
        let command = CmgCommand::NodesLeave {
            nodes: nodes.into_iter().collect::<BTreeSet<_>>().into_iter().collect(),
        };
        let name = command.name();

        self.ensure_leader(name).await?;

        match self.run(command).await? {
            CmgResponse::Empty => Ok(()),
            response => Err(self.unexpected(name, response)),
        }
    }

    /// Retrieves the logical topology, ordered by node name. This is a linearizable read through the
    /// log: it reflects every command committed before it.
    pub async fn logical_topology(&self) -> Result<Vec<ClusterNode>, CmgError> {
        let command = CmgCommand::ReadLogicalTopology;
        let name = command.name();

        match self.run(command).await? {
            CmgResponse::LogicalTopology(nodes) => Ok(nodes),
            response => Err(self.unexpected(name, response)),
        }
    }

    /// Retrieves the validation tokens of nodes that passed JoinRequest but haven't sent JoinReady.
    pub async fn validated_nodes(&self) -> Result<Vec<ValidationToken>, CmgError> {
        let command = CmgCommand::ReadValidatedNodes;
        let name = command.name();

        match self.run(command).await? {
            CmgResponse::ValidatedNodes(tokens) => Ok(tokens),
            response => Err(self.unexpected(name, response)),
        }
    }

    /// Discards validation tokens older than `max_age`. Only the CMG leader may call this.
    pub async fn expire_stale_validations(&self, max_age: Duration) -> Result<(), CmgError> {
        let max_age_millis = i64::try_from(max_age.as_millis()).unwrap_or(i64::MAX);
        let command = CmgCommand::ExpireValidations {
            issued_before_millis: now_millis().saturating_sub(max_age_millis),
        };
        let name = command.name();

        self.ensure_leader(name).await?;

        match self.run(command).await? {
            CmgResponse::Empty => Ok(()),
            response => Err(self.unexpected(name, response)),
        }
    }

    /// Returns the consistent IDs of the voting nodes of the CMG. A session that doesn't know any
    /// voting peer is broken, so that is reported as `UnknownPeers` rather than an empty set.
    pub fn node_names(&self) -> Result<BTreeSet<String>, CmgError> {
        let names: BTreeSet<String> = match self.raft.peers() {
            Some(peers) => peers.iter().map(|peer| peer.consistent_id().to_string()).collect(),
            None => BTreeSet::new(),
        };

        if names.is_empty() {
            slog::crit!(self.logger, "Raft session reported no CMG voting peers");
            return Err(CmgError::UnknownPeers);
        }

        Ok(names)
    }

    /// Starts a background task that expires stale validation tokens while this node leads the CMG.
    pub fn start_validation_watchdog(self: &Arc<Self>) -> ValidationWatchdog {
        ValidationWatchdog::spawn(
            self,
            self.options.validation_sweep_interval,
            self.options.validation_timeout,
        )
    }

    // The cached leader can be stale after an election, so it is refreshed before the check.
    async fn ensure_leader(&self, command: &'static str) -> Result<(), CmgError> {
        self.raft.refresh_leader().await?;

        if self.is_current_node_leader().await? {
            Ok(())
        } else {
            Err(CmgError::NotLeader(command))
        }
    }

    pub(super) async fn sweep_stale_validations(&self, max_age: Duration) {
        match self.expire_stale_validations(max_age).await {
            Ok(()) => slog::debug!(self.logger, "Expired validation tokens older than {:?}", max_age),
            Err(CmgError::NotLeader(_)) => {}
            Err(e) => slog::warn!(self.logger, "Failed to expire stale validation tokens: {}", e),
        }
    }

    async fn run(&self, command: CmgCommand) -> Result<CmgResponse, CmgError> {
        let name = command.name();
        let submit_timeout = self.options.submit_timeout;

        let output = tokio::time::timeout(submit_timeout, self.raft.run(command.encode_to_bytes()))
            .await
            .map_err(|_| SubmitError::Timeout(submit_timeout))
            .and_then(|result| result)
            .map_err(|e| {
                slog::warn!(self.logger, "Failed to submit {} command: {}", name, e);
                e
            })?;

        CmgResponse::from_output(output).map_err(|e| {
            slog::crit!(self.logger, "Undecodable response to {} command: {}", name, e);
            CmgError::UnexpectedResponse {
                command: name,
                response: e.to_string(),
            }
        })
    }

    fn join_denied(&self, request: &'static str, reason: String) -> CmgError {
        slog::warn!(self.logger, "{} request denied: {}", request, reason);
        CmgError::JoinDenied { request, reason }
    }

    fn unexpected(&self, command: &'static str, response: CmgResponse) -> CmgError {
        slog::crit!(self.logger, "Unexpected response to {} command: {:?}", command, response);
        CmgError::UnexpectedResponse {
            command,
            response: format!("{:?}", response),
        }
    }

    fn refresh_backoff(&self) -> Duration {
        let backoff = self.options.leader_refresh_backoff;
        let jitter_millis = rand::thread_rng().gen_range(0..=backoff.as_millis() as u64);

        backoff + Duration::from_millis(jitter_millis)
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
