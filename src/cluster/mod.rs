//! Value types describing a cluster and its nodes. These are copied by value into commands and
//! never resolved back into live connections.
mod node;
mod state;

pub use node::ClusterNode;
pub use node::NodeAddress;
pub use state::ClusterState;
pub use state::ClusterTag;
pub use state::ValidationToken;
