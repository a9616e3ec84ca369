// Wire format of every entry written to the CMG replicated log, and of every result the CMG
// state machine hands back to the submitter.

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoClusterNode {
    #[prost(string, tag="1")]
    pub id: ::prost::alloc::string::String,
    #[prost(string, tag="2")]
    pub name: ::prost::alloc::string::String,
    #[prost(string, tag="3")]
    pub host: ::prost::alloc::string::String,
    #[prost(uint32, tag="4")]
    pub port: u32,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoClusterTag {
    #[prost(string, tag="1")]
    pub cluster_name: ::prost::alloc::string::String,
    /// Hyphenated UUID.
    #[prost(string, tag="2")]
    pub cluster_id: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoClusterState {
    #[prost(string, repeated, tag="1")]
    pub cmg_nodes: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    #[prost(string, repeated, tag="2")]
    pub metastorage_nodes: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    #[prost(string, tag="3")]
    pub version: ::prost::alloc::string::String,
    #[prost(message, optional, tag="4")]
    pub cluster_tag: ::core::option::Option<ProtoClusterTag>,
}
// ------- Commands --------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoInitCmgStateCmd {
    #[prost(message, optional, tag="1")]
    pub node: ::core::option::Option<ProtoClusterNode>,
    #[prost(message, optional, tag="2")]
    pub cluster_state: ::core::option::Option<ProtoClusterState>,
    #[prost(int64, tag="3")]
    pub issued_at_millis: i64,
    #[prost(string, tag="4")]
    pub version: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoJoinRequestCmd {
    #[prost(message, optional, tag="1")]
    pub node: ::core::option::Option<ProtoClusterNode>,
    #[prost(string, tag="2")]
    pub version: ::prost::alloc::string::String,
    #[prost(message, optional, tag="3")]
    pub cluster_tag: ::core::option::Option<ProtoClusterTag>,
    #[prost(int64, tag="4")]
    pub issued_at_millis: i64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoJoinReadyCmd {
    #[prost(message, optional, tag="1")]
    pub node: ::core::option::Option<ProtoClusterNode>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoNodesLeaveCmd {
    #[prost(message, repeated, tag="1")]
    pub nodes: ::prost::alloc::vec::Vec<ProtoClusterNode>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoReadClusterStateCmd {
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoReadLogicalTopologyCmd {
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoReadValidatedNodesCmd {
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoExpireValidationsCmd {
    #[prost(int64, tag="1")]
    pub issued_before_millis: i64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoCmgCommand {
    #[prost(oneof="proto_cmg_command::Command", tags="1, 2, 3, 4, 5, 6, 7, 8")]
    pub command: ::core::option::Option<proto_cmg_command::Command>,
}
/// Nested message and enum types in `ProtoCmgCommand`.
pub mod proto_cmg_command {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Command {
        #[prost(message, tag="1")]
        InitCmgState(super::ProtoInitCmgStateCmd),
        #[prost(message, tag="2")]
        JoinRequest(super::ProtoJoinRequestCmd),
        #[prost(message, tag="3")]
        JoinReady(super::ProtoJoinReadyCmd),
        #[prost(message, tag="4")]
        NodesLeave(super::ProtoNodesLeaveCmd),
        #[prost(message, tag="5")]
        ReadClusterState(super::ProtoReadClusterStateCmd),
        #[prost(message, tag="6")]
        ReadLogicalTopology(super::ProtoReadLogicalTopologyCmd),
        #[prost(message, tag="7")]
        ReadValidatedNodes(super::ProtoReadValidatedNodesCmd),
        #[prost(message, tag="8")]
        ExpireValidations(super::ProtoExpireValidationsCmd),
    }
}
// ------- Responses --------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoValidationToken {
    #[prost(message, optional, tag="1")]
    pub node: ::core::option::Option<ProtoClusterNode>,
    #[prost(uint64, tag="2")]
    pub issued_at_version: u64,
    #[prost(int64, tag="3")]
    pub issued_at_millis: i64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoValidationError {
    #[prost(string, tag="1")]
    pub reason: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoLogicalTopology {
    #[prost(message, repeated, tag="1")]
    pub nodes: ::prost::alloc::vec::Vec<ProtoClusterNode>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoValidatedNodes {
    #[prost(message, repeated, tag="1")]
    pub tokens: ::prost::alloc::vec::Vec<ProtoValidationToken>,
}
/// An empty log entry result (no `StateMachineOutput` data) means "void"/"absent".
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoCmgResponse {
    #[prost(oneof="proto_cmg_response::Response", tags="1, 2, 3, 4")]
    pub response: ::core::option::Option<proto_cmg_response::Response>,
}
/// Nested message and enum types in `ProtoCmgResponse`.
pub mod proto_cmg_response {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Response {
        #[prost(message, tag="1")]
        ClusterState(super::ProtoClusterState),
        #[prost(message, tag="2")]
        ValidationError(super::ProtoValidationError),
        #[prost(message, tag="3")]
        LogicalTopology(super::ProtoLogicalTopology),
        #[prost(message, tag="4")]
        ValidatedNodes(super::ProtoValidatedNodes),
    }
}
