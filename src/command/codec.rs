//! Conversions between the domain commands/responses and their protobuf representation on the
//! replicated log.

use crate::cluster::{ClusterNode, ClusterState, ClusterTag, NodeAddress, ValidationToken};
use crate::command::{CmgCommand, CmgResponse, ValidationErrorResponse};
use crate::proto::{
    proto_cmg_command, proto_cmg_response, ProtoClusterNode, ProtoClusterState, ProtoClusterTag, ProtoCmgCommand,
    ProtoCmgResponse, ProtoExpireValidationsCmd, ProtoInitCmgStateCmd, ProtoJoinReadyCmd, ProtoJoinRequestCmd,
    ProtoLogicalTopology, ProtoNodesLeaveCmd, ProtoReadClusterStateCmd, ProtoReadLogicalTopologyCmd,
    ProtoReadValidatedNodesCmd, ProtoValidatedNodes, ProtoValidationError, ProtoValidationToken,
};
use crate::state_machine::StateMachineOutput;
use bytes::{Bytes, BytesMut};
use prost::Message;
use std::convert::TryFrom;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Failed to decode protobuf message: {0}")]
    Decode(#[from] prost::DecodeError),
    #[error("Missing required field `{0}`")]
    MissingField(&'static str),
    #[error("Invalid value for field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl CmgCommand {
    pub fn encode_to_bytes(&self) -> Bytes {
        encode_message(&ProtoCmgCommand::from(self))
    }

    pub fn decode_from_bytes(bytes: Bytes) -> Result<Self, CodecError> {
        let proto = ProtoCmgCommand::decode(bytes)?;
        CmgCommand::try_from(proto)
    }
}

impl CmgResponse {
    /// Converts the response into the opaque output handed back through the replicated log.
    pub fn into_output(self) -> StateMachineOutput {
        let response = match self {
            CmgResponse::Empty => return StateMachineOutput::NoData,
            CmgResponse::ClusterState(state) => proto_cmg_response::Response::ClusterState((&state).into()),
            CmgResponse::ValidationError(error) => {
                proto_cmg_response::Response::ValidationError(ProtoValidationError { reason: error.reason })
            }
            CmgResponse::LogicalTopology(nodes) => proto_cmg_response::Response::LogicalTopology(ProtoLogicalTopology {
                nodes: nodes.iter().map(ProtoClusterNode::from).collect(),
            }),
            CmgResponse::ValidatedNodes(tokens) => proto_cmg_response::Response::ValidatedNodes(ProtoValidatedNodes {
                tokens: tokens.iter().map(ProtoValidationToken::from).collect(),
            }),
        };

        StateMachineOutput::Data(encode_message(&ProtoCmgResponse {
            response: Some(response),
        }))
    }

    pub fn from_output(output: StateMachineOutput) -> Result<Self, CodecError> {
        let bytes = match output {
            StateMachineOutput::NoData => return Ok(CmgResponse::Empty),
            StateMachineOutput::Data(bytes) => bytes,
        };

        let response = ProtoCmgResponse::decode(bytes)?
            .response
            .ok_or(CodecError::MissingField("response"))?;

        let decoded = match response {
            proto_cmg_response::Response::ClusterState(state) => CmgResponse::ClusterState(ClusterState::try_from(state)?),
            proto_cmg_response::Response::ValidationError(error) => {
                CmgResponse::ValidationError(ValidationErrorResponse::new(error.reason))
            }
            proto_cmg_response::Response::LogicalTopology(topology) => CmgResponse::LogicalTopology(
                topology
                    .nodes
                    .into_iter()
                    .map(ClusterNode::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            proto_cmg_response::Response::ValidatedNodes(validated) => CmgResponse::ValidatedNodes(
                validated
                    .tokens
                    .into_iter()
                    .map(ValidationToken::try_from)
                    .collect::<Result<_, _>>()?,
            ),
        };

        Ok(decoded)
    }
}

fn encode_message<M: Message>(message: &M) -> Bytes {
    let mut buf = BytesMut::with_capacity(message.encoded_len());
    // BytesMut grows on demand, so the only encode failure (insufficient capacity) can't happen.
    message
        .encode(&mut buf)
        .expect("Encoding into a growable buffer is infallible");

    buf.freeze()
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, CodecError> {
    value.ok_or(CodecError::MissingField(field))
}

// ------- Conversions --------

impl From<&CmgCommand> for ProtoCmgCommand {
    fn from(command: &CmgCommand) -> Self {
        let proto_command = match command {
            CmgCommand::InitCmgState {
                node,
                cluster_state,
                version,
                issued_at_millis,
            } => proto_cmg_command::Command::InitCmgState(ProtoInitCmgStateCmd {
                node: Some(node.into()),
                cluster_state: Some(cluster_state.into()),
                issued_at_millis: *issued_at_millis,
                version: version.clone(),
            }),
            CmgCommand::JoinRequest {
                node,
                version,
                cluster_tag,
                issued_at_millis,
            } => proto_cmg_command::Command::JoinRequest(ProtoJoinRequestCmd {
                node: Some(node.into()),
                version: version.clone(),
                cluster_tag: Some(cluster_tag.into()),
                issued_at_millis: *issued_at_millis,
            }),
            CmgCommand::JoinReady { node } => {
                proto_cmg_command::Command::JoinReady(ProtoJoinReadyCmd { node: Some(node.into()) })
            }
            CmgCommand::NodesLeave { nodes } => proto_cmg_command::Command::NodesLeave(ProtoNodesLeaveCmd {
                nodes: nodes.iter().map(ProtoClusterNode::from).collect(),
            }),
            CmgCommand::ReadClusterState => proto_cmg_command::Command::ReadClusterState(ProtoReadClusterStateCmd {}),
            CmgCommand::ReadLogicalTopology => {
                proto_cmg_command::Command::ReadLogicalTopology(ProtoReadLogicalTopologyCmd {})
            }
            CmgCommand::ReadValidatedNodes => {
                proto_cmg_command::Command::ReadValidatedNodes(ProtoReadValidatedNodesCmd {})
            }
            CmgCommand::ExpireValidations { issued_before_millis } => {
                proto_cmg_command::Command::ExpireValidations(ProtoExpireValidationsCmd {
                    issued_before_millis: *issued_before_millis,
                })
            }
        };

        ProtoCmgCommand {
            command: Some(proto_command),
        }
    }
}

impl TryFrom<ProtoCmgCommand> for CmgCommand {
    type Error = CodecError;

    fn try_from(proto: ProtoCmgCommand) -> Result<Self, Self::Error> {
        let command = match required(proto.command, "command")? {
            proto_cmg_command::Command::InitCmgState(cmd) => CmgCommand::InitCmgState {
                node: required(cmd.node, "node")?.try_into_node()?,
                cluster_state: ClusterState::try_from(required(cmd.cluster_state, "cluster_state")?)?,
                version: cmd.version,
                issued_at_millis: cmd.issued_at_millis,
            },
            proto_cmg_command::Command::JoinRequest(cmd) => CmgCommand::JoinRequest {
                node: required(cmd.node, "node")?.try_into_node()?,
                version: cmd.version,
                cluster_tag: ClusterTag::try_from(required(cmd.cluster_tag, "cluster_tag")?)?,
                issued_at_millis: cmd.issued_at_millis,
            },
            proto_cmg_command::Command::JoinReady(cmd) => CmgCommand::JoinReady {
                node: required(cmd.node, "node")?.try_into_node()?,
            },
            proto_cmg_command::Command::NodesLeave(cmd) => CmgCommand::NodesLeave {
                nodes: cmd
                    .nodes
                    .into_iter()
                    .map(ClusterNode::try_from)
                    .collect::<Result<_, _>>()?,
            },
            proto_cmg_command::Command::ReadClusterState(_) => CmgCommand::ReadClusterState,
            proto_cmg_command::Command::ReadLogicalTopology(_) => CmgCommand::ReadLogicalTopology,
            proto_cmg_command::Command::ReadValidatedNodes(_) => CmgCommand::ReadValidatedNodes,
            proto_cmg_command::Command::ExpireValidations(cmd) => CmgCommand::ExpireValidations {
                issued_before_millis: cmd.issued_before_millis,
            },
        };

        Ok(command)
    }
}

impl ProtoClusterNode {
    fn try_into_node(self) -> Result<ClusterNode, CodecError> {
        ClusterNode::try_from(self)
    }
}

impl From<&ClusterNode> for ProtoClusterNode {
    fn from(node: &ClusterNode) -> Self {
        ProtoClusterNode {
            id: node.id.clone(),
            name: node.name.clone(),
            host: node.address.host.clone(),
            port: u32::from(node.address.port),
        }
    }
}

impl TryFrom<ProtoClusterNode> for ClusterNode {
    type Error = CodecError;

    fn try_from(proto: ProtoClusterNode) -> Result<Self, Self::Error> {
        let port = u16::try_from(proto.port).map_err(|_| CodecError::InvalidField {
            field: "port",
            reason: format!("{} is out of range", proto.port),
        })?;

        Ok(ClusterNode::new(proto.id, proto.name, NodeAddress::new(proto.host, port)))
    }
}

impl From<&ClusterTag> for ProtoClusterTag {
    fn from(tag: &ClusterTag) -> Self {
        ProtoClusterTag {
            cluster_name: tag.cluster_name.clone(),
            cluster_id: tag.cluster_id.to_hyphenated().to_string(),
        }
    }
}

impl TryFrom<ProtoClusterTag> for ClusterTag {
    type Error = CodecError;

    fn try_from(proto: ProtoClusterTag) -> Result<Self, Self::Error> {
        let cluster_id = Uuid::parse_str(&proto.cluster_id).map_err(|e| CodecError::InvalidField {
            field: "cluster_id",
            reason: e.to_string(),
        })?;

        Ok(ClusterTag {
            cluster_name: proto.cluster_name,
            cluster_id,
        })
    }
}

impl From<&ClusterState> for ProtoClusterState {
    fn from(state: &ClusterState) -> Self {
        ProtoClusterState {
            cmg_nodes: state.cmg_nodes.iter().cloned().collect(),
            metastorage_nodes: state.metastorage_nodes.iter().cloned().collect(),
            version: state.version.clone(),
            cluster_tag: Some((&state.cluster_tag).into()),
        }
    }
}

impl TryFrom<ProtoClusterState> for ClusterState {
    type Error = CodecError;

    fn try_from(proto: ProtoClusterState) -> Result<Self, Self::Error> {
        Ok(ClusterState {
            cmg_nodes: proto.cmg_nodes.into_iter().collect(),
            metastorage_nodes: proto.metastorage_nodes.into_iter().collect(),
            version: proto.version,
            cluster_tag: ClusterTag::try_from(required(proto.cluster_tag, "cluster_tag")?)?,
        })
    }
}

impl From<&ValidationToken> for ProtoValidationToken {
    fn from(token: &ValidationToken) -> Self {
        ProtoValidationToken {
            node: Some((&token.node).into()),
            issued_at_version: token.issued_at_version,
            issued_at_millis: token.issued_at_millis,
        }
    }
}

impl TryFrom<ProtoValidationToken> for ValidationToken {
    type Error = CodecError;

    fn try_from(proto: ProtoValidationToken) -> Result<Self, Self::Error> {
        Ok(ValidationToken {
            node: required(proto.node, "node")?.try_into_node()?,
            issued_at_version: proto.issued_at_version,
            issued_at_millis: proto.issued_at_millis,
        })
    }
}
