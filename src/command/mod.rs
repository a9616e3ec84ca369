//! Commands executed through the CMG replicated log, and the results the state machine produces
//! for them.
mod codec;

pub use codec::CodecError;

use crate::cluster::{ClusterNode, ClusterState, ClusterTag, ValidationToken};

/// CmgCommand is a single state transition (or linearizable read) of the CMG state machine.
/// Every variant is applied by all replicas in log order.
#[derive(Clone, Debug, PartialEq)]
pub enum CmgCommand {
    /// `version` is the product version of the submitting node, which gets validated like a
    /// joining node.
    InitCmgState {
        node: ClusterNode,
        cluster_state: ClusterState,
        version: String,
        issued_at_millis: i64,
    },
    JoinRequest {
        node: ClusterNode,
        version: String,
        cluster_tag: ClusterTag,
        issued_at_millis: i64,
    },
    JoinReady {
        node: ClusterNode,
    },
    NodesLeave {
        nodes: Vec<ClusterNode>,
    },
    ReadClusterState,
    ReadLogicalTopology,
    ReadValidatedNodes,
    ExpireValidations {
        issued_before_millis: i64,
    },
}

impl CmgCommand {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            CmgCommand::InitCmgState { .. } => "InitCmgState",
            CmgCommand::JoinRequest { .. } => "JoinRequest",
            CmgCommand::JoinReady { .. } => "JoinReady",
            CmgCommand::NodesLeave { .. } => "NodesLeave",
            CmgCommand::ReadClusterState => "ReadClusterState",
            CmgCommand::ReadLogicalTopology => "ReadLogicalTopology",
            CmgCommand::ReadValidatedNodes => "ReadValidatedNodes",
            CmgCommand::ExpireValidations { .. } => "ExpireValidations",
        }
    }
}

/// CmgResponse is the closed set of results a committed command can produce. `Empty` stands
/// for "void" on mutations and "absent" on reads.
#[derive(Clone, Debug, PartialEq)]
pub enum CmgResponse {
    ClusterState(ClusterState),
    ValidationError(ValidationErrorResponse),
    LogicalTopology(Vec<ClusterNode>),
    ValidatedNodes(Vec<ValidationToken>),
    Empty,
}

/// ValidationErrorResponse is a rejection that is itself part of the committed log, so every
/// replica agrees on why a request was refused.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ValidationErrorResponse {
    pub reason: String,
}

impl ValidationErrorResponse {
    pub fn new(reason: impl Into<String>) -> Self {
        ValidationErrorResponse { reason: reason.into() }
    }
}
