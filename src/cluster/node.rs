use std::fmt;

/// ClusterNode describes a single node as it is known to the CMG.
///
/// `id` is unique per node incarnation, `name` is the consistent ID that stays the same across
/// restarts and is unique within the logical topology.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct ClusterNode {
    pub id: String,
    pub name: String,
    pub address: NodeAddress,
}

impl ClusterNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>, address: NodeAddress) -> Self {
        ClusterNode {
            id: id.into(),
            name: name.into(),
            address,
        }
    }
}

impl fmt::Display for ClusterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [id={}, addr={}]", self.name, self.id, self.address)
    }
}

#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct NodeAddress {
    pub host: String,
    pub port: u16,
}

impl NodeAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        NodeAddress { host: host.into(), port }
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
