use crate::cluster::{ClusterNode, ClusterState, ValidationToken};
use crate::command::{CmgCommand, CmgResponse, ValidationErrorResponse};
use crate::state_machine::applier::{LocalStateMachineApplier, StateMachineOutput};
use crate::state_machine::events::{create_topology_events, TopologyEventListener};
use crate::state_machine::topology::LogicalTopology;
use crate::state_machine::validation::{JoinRequest, ValidationManager};
use bytes::Bytes;

/// Where a node stands in the join protocol: `Unknown -> Requested -> Member`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JoinState {
    Unknown,
    /// Passed JoinRequest validation, holds a validation token, waits for JoinReady.
    Requested,
    Member,
}

/// CmgStateMachine is the replicated state of the Cluster Management Group: the cluster
/// identity, the validation tokens of joining nodes, and the logical topology.
///
/// It is mutated only by committed log entries, applied one at a time in commit order.
pub struct CmgStateMachine {
    logger: slog::Logger,
    cluster_state: Option<ClusterState>,
    validation: ValidationManager,
    topology: LogicalTopology,
    // Number of entries applied so far. Identical on every replica at the same log position.
    applied_version: u64,
}

impl CmgStateMachine {
    pub fn new(logger: slog::Logger) -> (Self, TopologyEventListener) {
        let (publisher, listener) = create_topology_events();

        let state_machine = CmgStateMachine {
            cluster_state: None,
            validation: ValidationManager::new(logger.clone()),
            topology: LogicalTopology::new(logger.clone(), publisher),
            applied_version: 0,
            logger,
        };

        (state_machine, listener)
    }

    // Local reads below may be stale. Linearizable reads go through the log.

    pub fn cluster_state(&self) -> Option<&ClusterState> {
        self.cluster_state.as_ref()
    }

    pub fn logical_topology(&self) -> Vec<ClusterNode> {
        self.topology.nodes()
    }

    pub fn applied_version(&self) -> u64 {
        self.applied_version
    }

    pub fn join_state(&self, node: &ClusterNode) -> JoinState {
        if self.topology.contains(node) {
            JoinState::Member
        } else if self.validation.is_validated(node) {
            JoinState::Requested
        } else {
            JoinState::Unknown
        }
    }

    fn apply(&mut self, command: CmgCommand) -> CmgResponse {
        match command {
            CmgCommand::InitCmgState {
                node,
                cluster_state,
                version,
                issued_at_millis,
            } => self.on_init(node, cluster_state, &version, issued_at_millis),
            CmgCommand::JoinRequest {
                node,
                version,
                cluster_tag,
                issued_at_millis,
            } => {
                let state = match &self.cluster_state {
                    Some(state) => state,
                    None => {
                        return CmgResponse::ValidationError(ValidationErrorResponse::new(
                            "Cluster state has not been initialized",
                        ))
                    }
                };

                let request = JoinRequest {
                    node: &node,
                    version: &version,
                    cluster_tag: &cluster_tag,
                    issued_at_version: self.applied_version,
                    issued_at_millis,
                };
                match self.validation.validate_node(state, &self.topology, request) {
                    Ok(_) => CmgResponse::Empty,
                    Err(e) => CmgResponse::ValidationError(e),
                }
            }
            CmgCommand::JoinReady { node } => match self.validation.complete_validation(&mut self.topology, &node) {
                Ok(()) => CmgResponse::Empty,
                Err(e) => CmgResponse::ValidationError(e),
            },
            CmgCommand::NodesLeave { nodes } => {
                self.on_nodes_leave(nodes);
                CmgResponse::Empty
            }
            CmgCommand::ReadClusterState => match &self.cluster_state {
                Some(state) => CmgResponse::ClusterState(state.clone()),
                None => CmgResponse::Empty,
            },
            CmgCommand::ReadLogicalTopology => CmgResponse::LogicalTopology(self.topology.nodes()),
            CmgCommand::ReadValidatedNodes => CmgResponse::ValidatedNodes(self.validation.tokens()),
            CmgCommand::ExpireValidations { issued_before_millis } => {
                self.on_expire_validations(issued_before_millis);
                CmgResponse::Empty
            }
        }
    }

    fn on_init(
        &mut self,
        node: ClusterNode,
        candidate: ClusterState,
        version: &str,
        issued_at_millis: i64,
    ) -> CmgResponse {
        let (state, fresh) = match self.cluster_state.clone() {
            None => (candidate, true),
            Some(existing) if existing.cluster_tag == candidate.cluster_tag => (existing, false),
            Some(existing) => {
                return CmgResponse::ValidationError(ValidationErrorResponse::new(format!(
                    "Init CMG request does not match the existing cluster state. Cluster tag: {}, \
                     cluster tag stored in CMG: {}",
                    candidate.cluster_tag, existing.cluster_tag
                )));
            }
        };

        // The initializing node passes the same validation as a JoinRequest, then still has to
        // send JoinReady to enter the logical topology.
        let request = JoinRequest {
            node: &node,
            version,
            cluster_tag: &state.cluster_tag,
            issued_at_version: self.applied_version,
            issued_at_millis,
        };
        if let Err(e) = self.validation.validate_node(&state, &self.topology, request) {
            slog::warn!(self.logger, "Init CMG request from {} denied: {}", node, e.reason);
            return CmgResponse::ValidationError(e);
        }

        if fresh {
            slog::info!(self.logger, "Cluster initialized: {}", state.cluster_tag);
            self.cluster_state = Some(state.clone());
        }

        CmgResponse::ClusterState(state)
    }

    fn on_nodes_leave(&mut self, nodes: Vec<ClusterNode>) {
        for node in nodes {
            let discarded = self.validation.discard(&node).is_some();
            let removed = self.topology.remove(&node);

            if !discarded && !removed {
                slog::debug!(self.logger, "NodesLeave for unknown node {}. Ignoring.", node);
            }
        }
    }

    fn on_expire_validations(&mut self, issued_before_millis: i64) {
        let expired: Vec<ValidationToken> = self.validation.expire(issued_before_millis);
        for token in expired {
            slog::info!(
                self.logger,
                "Validation token of node {} expired (issued at version {}).",
                token.node,
                token.issued_at_version
            );
        }
    }
}

impl LocalStateMachineApplier for CmgStateMachine {
    fn apply_committed_entry(&mut self, entry: Bytes) -> StateMachineOutput {
        self.applied_version += 1;

        let response = match CmgCommand::decode_from_bytes(entry) {
            Ok(command) => {
                slog::debug!(self.logger, "Applying {} at version {}", command.name(), self.applied_version);
                self.apply(command)
            }
            Err(e) => {
                slog::warn!(self.logger, "Committed log entry is not a CMG command: {}", e);
                CmgResponse::ValidationError(ValidationErrorResponse::new(format!("Malformed command: {}", e)))
            }
        };

        response.into_output()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{ClusterTag, NodeAddress};
    use crate::state_machine::TopologyEvent;

    fn node(id: &str, name: &str) -> ClusterNode {
        ClusterNode::new(id, name, NodeAddress::new("localhost", 3344))
    }

    fn cluster_state(tag: ClusterTag) -> ClusterState {
        ClusterState {
            cmg_nodes: vec!["a".to_string()].into_iter().collect(),
            metastorage_nodes: vec!["a".to_string()].into_iter().collect(),
            version: "3.0.0".to_string(),
            cluster_tag: tag,
        }
    }

    fn state_machine() -> (CmgStateMachine, TopologyEventListener) {
        CmgStateMachine::new(slog::Logger::root(slog::Discard, slog::o!()))
    }

    fn apply(sm: &mut CmgStateMachine, command: CmgCommand) -> CmgResponse {
        let output = sm.apply_committed_entry(command.encode_to_bytes());
        CmgResponse::from_output(output).unwrap()
    }

    fn init(sm: &mut CmgStateMachine, node: ClusterNode, state: ClusterState) -> CmgResponse {
        apply(
            sm,
            CmgCommand::InitCmgState {
                node,
                version: state.version.clone(),
                cluster_state: state,
                issued_at_millis: 0,
            },
        )
    }

    fn join_request(sm: &mut CmgStateMachine, node: ClusterNode, tag: ClusterTag) -> CmgResponse {
        apply(
            sm,
            CmgCommand::JoinRequest {
                node,
                version: "3.0.0".to_string(),
                cluster_tag: tag,
                issued_at_millis: 0,
            },
        )
    }

    fn assert_rejected(response: CmgResponse) -> String {
        match response {
            CmgResponse::ValidationError(e) => {
                assert!(!e.reason.is_empty());
                e.reason
            }
            other => panic!("Expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn init_is_idempotent() {
        let (mut sm, _) = state_machine();
        let state = cluster_state(ClusterTag::random("cluster"));

        assert_eq!(init(&mut sm, node("id-a", "a"), state.clone()), CmgResponse::ClusterState(state.clone()));
        assert_eq!(init(&mut sm, node("id-a", "a"), state.clone()), CmgResponse::ClusterState(state.clone()));
        assert_eq!(sm.cluster_state(), Some(&state));
    }

    #[test]
    fn conflicting_init_keeps_committed_state() {
        let (mut sm, _) = state_machine();
        let first = cluster_state(ClusterTag::random("cluster"));
        let second = cluster_state(ClusterTag::random("cluster"));
        init(&mut sm, node("id-a", "a"), first.clone());

        assert_rejected(init(&mut sm, node("id-b", "b"), second));

        assert_eq!(apply(&mut sm, CmgCommand::ReadClusterState), CmgResponse::ClusterState(first));
    }

    #[test]
    fn init_from_node_with_other_version_is_rejected() {
        let (mut sm, _) = state_machine();
        let state = cluster_state(ClusterTag::random("cluster"));
        init(&mut sm, node("id-a", "a"), state.clone());
        let old = node("id-old", "old");

        let reason = assert_rejected(apply(
            &mut sm,
            CmgCommand::InitCmgState {
                node: old.clone(),
                cluster_state: state.clone(),
                version: "0.0.1-legacy".to_string(),
                issued_at_millis: 0,
            },
        ));

        assert!(reason.starts_with("Versions do not match"), "{}", reason);
        assert_eq!(sm.join_state(&old), JoinState::Unknown);
        assert_rejected(apply(&mut sm, CmgCommand::JoinReady { node: old }));
        assert_eq!(sm.cluster_state(), Some(&state));
    }

    #[test]
    fn fresh_init_with_other_version_stores_nothing() {
        let (mut sm, _) = state_machine();
        let state = cluster_state(ClusterTag::random("cluster"));

        assert_rejected(apply(
            &mut sm,
            CmgCommand::InitCmgState {
                node: node("id-a", "a"),
                cluster_state: state,
                version: "0.0.1-legacy".to_string(),
                issued_at_millis: 0,
            },
        ));

        assert_eq!(sm.cluster_state(), None);
    }

    #[test]
    fn member_join_request_with_foreign_tag_is_rejected() {
        let (mut sm, _) = state_machine();
        let tag = ClusterTag::random("cluster");
        let a = node("id-a", "a");
        init(&mut sm, a.clone(), cluster_state(tag));
        apply(&mut sm, CmgCommand::JoinReady { node: a.clone() });

        let reason = assert_rejected(apply(
            &mut sm,
            CmgCommand::JoinRequest {
                node: a.clone(),
                version: "0.0.0".to_string(),
                cluster_tag: ClusterTag::random("imposter"),
                issued_at_millis: 0,
            },
        ));

        assert!(reason.starts_with("Versions do not match"), "{}", reason);
        assert_eq!(sm.join_state(&a), JoinState::Member);
    }

    #[test]
    fn read_before_init_is_empty() {
        let (mut sm, _) = state_machine();

        assert_eq!(apply(&mut sm, CmgCommand::ReadClusterState), CmgResponse::Empty);
    }

    #[test]
    fn join_request_before_init_is_rejected() {
        let (mut sm, _) = state_machine();

        let reason = assert_rejected(join_request(&mut sm, node("id-b", "b"), ClusterTag::random("cluster")));

        assert_eq!(reason, "Cluster state has not been initialized");
    }

    #[test]
    fn initializer_must_send_join_ready() {
        let (mut sm, mut events) = state_machine();
        let a = node("id-a", "a");
        init(&mut sm, a.clone(), cluster_state(ClusterTag::random("cluster")));

        assert_eq!(sm.join_state(&a), JoinState::Requested);
        assert!(sm.logical_topology().is_empty());

        assert_eq!(apply(&mut sm, CmgCommand::JoinReady { node: a.clone() }), CmgResponse::Empty);
        assert_eq!(sm.join_state(&a), JoinState::Member);
        assert_eq!(events.try_next_event(), Some(TopologyEvent::NodeJoined(a)));
    }

    #[test]
    fn join_walks_through_every_state() {
        let (mut sm, _) = state_machine();
        let tag = ClusterTag::random("cluster");
        init(&mut sm, node("id-a", "a"), cluster_state(tag.clone()));
        let b = node("id-b", "b");

        assert_eq!(sm.join_state(&b), JoinState::Unknown);
        assert_eq!(join_request(&mut sm, b.clone(), tag), CmgResponse::Empty);
        assert_eq!(sm.join_state(&b), JoinState::Requested);
        assert_eq!(apply(&mut sm, CmgCommand::JoinReady { node: b.clone() }), CmgResponse::Empty);
        assert_eq!(sm.join_state(&b), JoinState::Member);
        assert_eq!(
            apply(&mut sm, CmgCommand::ReadLogicalTopology),
            CmgResponse::LogicalTopology(vec![b])
        );
    }

    #[test]
    fn join_ready_without_request_is_rejected() {
        let (mut sm, _) = state_machine();
        init(&mut sm, node("id-a", "a"), cluster_state(ClusterTag::random("cluster")));
        let b = node("id-b", "b");

        assert_rejected(apply(&mut sm, CmgCommand::JoinReady { node: b.clone() }));

        assert_eq!(sm.join_state(&b), JoinState::Unknown);
        assert!(sm.logical_topology().is_empty());
    }

    #[test]
    fn removed_node_can_rejoin() {
        let (mut sm, mut events) = state_machine();
        let tag = ClusterTag::random("cluster");
        init(&mut sm, node("id-a", "a"), cluster_state(tag.clone()));
        let b = node("id-b", "b");
        join_request(&mut sm, b.clone(), tag.clone());
        apply(&mut sm, CmgCommand::JoinReady { node: b.clone() });

        apply(&mut sm, CmgCommand::NodesLeave { nodes: vec![b.clone()] });
        assert_eq!(sm.join_state(&b), JoinState::Unknown);

        assert_eq!(join_request(&mut sm, b.clone(), tag), CmgResponse::Empty);
        assert_eq!(apply(&mut sm, CmgCommand::JoinReady { node: b.clone() }), CmgResponse::Empty);

        assert_eq!(events.try_next_event(), Some(TopologyEvent::NodeJoined(b.clone())));
        assert_eq!(events.try_next_event(), Some(TopologyEvent::NodeLeft(b.clone())));
        assert_eq!(events.try_next_event(), Some(TopologyEvent::NodeJoined(b)));
    }

    #[test]
    fn nodes_leave_discards_pending_tokens() {
        let (mut sm, _) = state_machine();
        let tag = ClusterTag::random("cluster");
        init(&mut sm, node("id-a", "a"), cluster_state(tag.clone()));
        let b = node("id-b", "b");
        join_request(&mut sm, b.clone(), tag);

        apply(&mut sm, CmgCommand::NodesLeave { nodes: vec![b.clone()] });

        assert_rejected(apply(&mut sm, CmgCommand::JoinReady { node: b }));
    }

    #[test]
    fn expired_token_blocks_join_ready() {
        let (mut sm, _) = state_machine();
        let tag = ClusterTag::random("cluster");
        init(&mut sm, node("id-a", "a"), cluster_state(tag.clone()));
        let b = node("id-b", "b");
        apply(
            &mut sm,
            CmgCommand::JoinRequest {
                node: b.clone(),
                version: "3.0.0".to_string(),
                cluster_tag: tag,
                issued_at_millis: 100,
            },
        );

        apply(&mut sm, CmgCommand::ExpireValidations { issued_before_millis: 101 });

        assert_eq!(sm.join_state(&b), JoinState::Unknown);
        assert_rejected(apply(&mut sm, CmgCommand::JoinReady { node: b }));
    }

    #[test]
    fn validated_nodes_report_issue_version() {
        let (mut sm, _) = state_machine();
        let tag = ClusterTag::random("cluster");
        init(&mut sm, node("id-a", "a"), cluster_state(tag.clone()));
        join_request(&mut sm, node("id-b", "b"), tag);

        let tokens = match apply(&mut sm, CmgCommand::ReadValidatedNodes) {
            CmgResponse::ValidatedNodes(tokens) => tokens,
            other => panic!("Unexpected response {:?}", other),
        };

        let versions: Vec<(String, u64)> = tokens
            .into_iter()
            .map(|t| (t.node.name, t.issued_at_version))
            .collect();
        assert_eq!(versions, vec![("a".to_string(), 1), ("b".to_string(), 2)]);
    }

    #[test]
    fn malformed_entry_is_rejected_deterministically() {
        let (mut sm, _) = state_machine();

        let output = sm.apply_committed_entry(Bytes::from_static(&[0xFF, 0xFF, 0xFF]));

        let reason = assert_rejected(CmgResponse::from_output(output).unwrap());
        assert!(reason.starts_with("Malformed command"));
        assert_eq!(sm.applied_version(), 1);
    }
}
