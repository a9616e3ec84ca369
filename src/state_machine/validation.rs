use crate::cluster::{ClusterNode, ClusterState, ClusterTag, ValidationToken};
use crate::command::ValidationErrorResponse;
use crate::state_machine::topology::LogicalTopology;
use std::collections::BTreeMap;

/// Outcome of a successful JoinRequest validation.
#[derive(Debug, Eq, PartialEq)]
pub(super) enum Admission {
    /// A fresh validation token was issued.
    TokenIssued,
    /// This node incarnation is already a member. Nothing changed.
    AlreadyMember,
}

/// ValidationManager holds the validation tokens of nodes that passed the JoinRequest step but
/// have not sent JoinReady yet. At most one token exists per node name.
pub(super) struct ValidationManager {
    logger: slog::Logger,
    // Keyed by node ID.
    tokens: BTreeMap<String, ValidationToken>,
}

pub(super) struct JoinRequest<'a> {
    pub(super) node: &'a ClusterNode,
    pub(super) version: &'a str,
    pub(super) cluster_tag: &'a ClusterTag,
    pub(super) issued_at_version: u64,
    pub(super) issued_at_millis: i64,
}

impl ValidationManager {
    pub(super) fn new(logger: slog::Logger) -> Self {
        ValidationManager {
            logger,
            tokens: BTreeMap::new(),
        }
    }

    /// Validates a node against the committed cluster state and issues a token on success.
    ///
    /// Members re-sending a request get `AlreadyMember`, but only after passing the same checks as
    /// any other node.
    pub(super) fn validate_node(
        &mut self,
        state: &ClusterState,
        topology: &LogicalTopology,
        request: JoinRequest<'_>,
    ) -> Result<Admission, ValidationErrorResponse> {
        check_identity(topology, request.node)?;

        if request.version != state.version {
            return Err(ValidationErrorResponse::new(format!(
                "Versions do not match. Version: {}, version stored in CMG: {}",
                request.version, state.version
            )));
        }

        if *request.cluster_tag != state.cluster_tag {
            return Err(ValidationErrorResponse::new(format!(
                "Cluster tags do not match. Cluster tag: {}, cluster tag stored in CMG: {}",
                request.cluster_tag, state.cluster_tag
            )));
        }

        if topology.contains(request.node) {
            return Ok(Admission::AlreadyMember);
        }

        self.issue(request.node, request.issued_at_version, request.issued_at_millis);

        Ok(Admission::TokenIssued)
    }

    /// Consumes the token of the given node, moving it into the logical topology. Completing the
    /// join of a node that already is a member is a no-op.
    pub(super) fn complete_validation(
        &mut self,
        topology: &mut LogicalTopology,
        node: &ClusterNode,
    ) -> Result<(), ValidationErrorResponse> {
        if topology.contains(node) {
            return Ok(());
        }

        let has_token = self
            .tokens
            .get(&node.id)
            .map_or(false, |token| token.node.name == node.name);
        if !has_token {
            return Err(ValidationErrorResponse::new(format!(
                "Node \"{}\" has not yet passed the validation step",
                node.name
            )));
        }

        check_identity(topology, node)?;

        self.tokens.remove(&node.id);
        topology.put(node.clone());

        Ok(())
    }

    /// Discards the token of the given node, if any.
    pub(super) fn discard(&mut self, node: &ClusterNode) -> Option<ValidationToken> {
        self.tokens.remove(&node.id)
    }

    /// Discards every token issued strictly before `issued_before_millis`.
    pub(super) fn expire(&mut self, issued_before_millis: i64) -> Vec<ValidationToken> {
        let expired_ids: Vec<String> = self
            .tokens
            .values()
            .filter(|token| token.issued_at_millis < issued_before_millis)
            .map(|token| token.node.id.clone())
            .collect();

        expired_ids
            .into_iter()
            .filter_map(|id| self.tokens.remove(&id))
            .collect()
    }

    pub(super) fn is_validated(&self, node: &ClusterNode) -> bool {
        self.tokens.contains_key(&node.id)
    }

    pub(super) fn tokens(&self) -> Vec<ValidationToken> {
        self.tokens.values().cloned().collect()
    }

    fn issue(&mut self, node: &ClusterNode, issued_at_version: u64, issued_at_millis: i64) {
        // A previous incarnation with the same name may still hold a token. It can never complete
        // the join now, so drop it.
        self.tokens.retain(|_, token| token.node.name != node.name || token.node.id == node.id);

        slog::info!(self.logger, "Node passed the validation step: {}", node);
        self.tokens.insert(
            node.id.clone(),
            ValidationToken {
                node: node.clone(),
                issued_at_version,
                issued_at_millis,
            },
        );
    }
}

fn check_identity(topology: &LogicalTopology, node: &ClusterNode) -> Result<(), ValidationErrorResponse> {
    match topology.member_named(&node.name) {
        Some(member) if member.id != node.id => Err(ValidationErrorResponse::new(format!(
            "Node \"{}\" is already a member of the logical topology with a different ID: {}",
            node.name, member.id
        ))),
        _ => Ok(()),
    }
}
