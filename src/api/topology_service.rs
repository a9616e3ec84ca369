use crate::cluster::ClusterNode;

/// TopologyService exposes the identity of the local node, as assigned by the network layer.
pub trait TopologyService: Send + Sync {
    fn local_member(&self) -> ClusterNode;
}

/// A TopologyService whose local member never changes.
pub struct StaticTopologyService {
    local_member: ClusterNode,
}

impl StaticTopologyService {
    pub fn new(local_member: ClusterNode) -> Self {
        StaticTopologyService { local_member }
    }
}

impl TopologyService for StaticTopologyService {
    fn local_member(&self) -> ClusterNode {
        self.local_member.clone()
    }
}
