use crate::cluster::ClusterNode;
use crate::state_machine::events::{TopologyEvent, TopologyEventPublisher};
use std::collections::BTreeMap;

/// LogicalTopology is the set of nodes currently recognized as cluster members. Node names are
/// unique within it.
pub(super) struct LogicalTopology {
    logger: slog::Logger,
    // Keyed by node name.
    members: BTreeMap<String, ClusterNode>,
    events: TopologyEventPublisher,
}

impl LogicalTopology {
    pub(super) fn new(logger: slog::Logger, events: TopologyEventPublisher) -> Self {
        LogicalTopology {
            logger,
            members: BTreeMap::new(),
            events,
        }
    }

    /// Returns true iff this exact node incarnation (same name and id) is a member.
    pub(super) fn contains(&self, node: &ClusterNode) -> bool {
        self.members
            .get(&node.name)
            .map_or(false, |member| member.id == node.id)
    }

    pub(super) fn member_named(&self, name: &str) -> Option<&ClusterNode> {
        self.members.get(name)
    }

    /// Adds the node. Caller must have checked that no other incarnation holds the same name.
    pub(super) fn put(&mut self, node: ClusterNode) {
        slog::info!(self.logger, "Node joined the logical topology: {}", node);

        let replaced = self.members.insert(node.name.clone(), node.clone());
        debug_assert!(replaced.is_none(), "Node name must be unique within the logical topology");

        self.events.notify(&self.logger, TopologyEvent::NodeJoined(node));
    }

    /// Removes the node if this exact incarnation is a member. Returns true if it was removed.
    pub(super) fn remove(&mut self, node: &ClusterNode) -> bool {
        if !self.contains(node) {
            return false;
        }

        if let Some(removed) = self.members.remove(&node.name) {
            slog::info!(self.logger, "Node left the logical topology: {}", removed);
            self.events.notify(&self.logger, TopologyEvent::NodeLeft(removed));
        }

        true
    }

    pub(super) fn nodes(&self) -> Vec<ClusterNode> {
        self.members.values().cloned().collect()
    }
}
