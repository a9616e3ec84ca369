use crate::cluster::ClusterNode;
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

/// ClusterTag is the logical identity of a cluster. It is assigned once, when the cluster is
/// initialized, and never changes afterwards.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct ClusterTag {
    pub cluster_name: String,
    pub cluster_id: Uuid,
}

impl ClusterTag {
    /// Creates a tag with a freshly generated cluster ID.
    pub fn random(cluster_name: impl Into<String>) -> Self {
        ClusterTag {
            cluster_name: cluster_name.into(),
            cluster_id: Uuid::new_v4(),
        }
    }
}

impl fmt::Display for ClusterTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.cluster_name, self.cluster_id)
    }
}

/// ClusterState is the identity of the cluster as committed by the CMG.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClusterState {
    /// Consistent IDs of the CMG voting nodes.
    pub cmg_nodes: BTreeSet<String>,
    /// Consistent IDs of the metastorage nodes.
    pub metastorage_nodes: BTreeSet<String>,
    /// Product version of the node that initialized the cluster. Joining nodes must match it.
    pub version: String,
    pub cluster_tag: ClusterTag,
}

/// ValidationToken proves that a node passed the JoinRequest validation but has not yet sent
/// JoinReady.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ValidationToken {
    pub node: ClusterNode,
    /// Number of log entries the state machine had applied when the token was issued.
    pub issued_at_version: u64,
    /// Wall clock time of the submitter when the token was requested, in millis since epoch.
    pub issued_at_millis: i64,
}
