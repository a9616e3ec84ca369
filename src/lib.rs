mod actor;
mod api;
mod cluster;
mod command;
mod commitlog;
mod raft;
mod state_machine;
mod proto {
    include!("../generated/cmg.rs");
}

pub use api::try_create_cmg_service;
pub use api::CmgError;
pub use api::CmgOptions;
pub use api::CmgRaftService;
pub use api::CmgServiceConfig;
pub use api::CmgServiceCreationError;
pub use api::StaticTopologyService;
pub use api::TopologyService;
pub use api::ValidationWatchdog;
pub use api::CURRENT_VERSION;
pub use cluster::ClusterNode;
pub use cluster::ClusterState;
pub use cluster::ClusterTag;
pub use cluster::NodeAddress;
pub use cluster::ValidationToken;
pub use command::CmgCommand;
pub use command::CmgResponse;
pub use command::CodecError;
pub use command::ValidationErrorResponse;
pub use raft::LocalRaftGroup;
pub use raft::LocalRaftGroupError;
pub use raft::LocalRaftGroupService;
pub use raft::Peer;
pub use raft::RaftGroupService;
pub use raft::SubmitError;
pub use state_machine::CmgStateMachine;
pub use state_machine::JoinState;
pub use state_machine::LocalStateMachineApplier;
pub use state_machine::StateMachineOutput;
pub use state_machine::TopologyEvent;
pub use state_machine::TopologyEventListener;

// `crate::{root_mod}` should not have any code. Just `mod` and `pub use` statements. All `mod`
// statements, anywhere, are private; types are exported via individual `pub use` statements.
