//! The consensus collaborator as seen by the CMG: submit a command and await its committed
//! result, query the current leader, enumerate voting peers.
mod group_service;
mod local_group;
mod log_entry;
mod shared_option;

pub use group_service::Peer;
pub use group_service::RaftGroupService;
pub use group_service::SubmitError;
pub use local_group::LocalRaftGroup;
pub use local_group::LocalRaftGroupError;
pub use local_group::LocalRaftGroupService;

pub(crate) use log_entry::GroupLogEntry;
