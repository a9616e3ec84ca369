use crate::cluster::ClusterNode;
use tokio::sync::mpsc;

/// A change of the logical topology, as observed by the local replica of the CMG state machine.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TopologyEvent {
    NodeJoined(ClusterNode),
    NodeLeft(ClusterNode),
}

pub(super) fn create_topology_events() -> (TopologyEventPublisher, TopologyEventListener) {
    let (tx, rx) = mpsc::unbounded_channel();

    let publisher = TopologyEventPublisher { sender: Some(tx) };
    let listener = TopologyEventListener { receiver: rx };

    (publisher, listener)
}

pub(super) struct TopologyEventPublisher {
    // None once the listener went away. Nobody will ever listen again, so we stop trying.
    sender: Option<mpsc::UnboundedSender<TopologyEvent>>,
}

impl TopologyEventPublisher {
    pub(super) fn notify(&mut self, logger: &slog::Logger, event: TopologyEvent) {
        if let Some(sender) = &self.sender {
            if sender.send(event).is_err() {
                slog::debug!(logger, "TopologyEventListener has disconnected.");
                self.sender = None;
            }
        }
    }
}

/// For the application to observe nodes entering and leaving the logical topology. Events are
/// delivered in log commit order and are never clobbered.
pub struct TopologyEventListener {
    receiver: mpsc::UnboundedReceiver<TopologyEvent>,
}

impl TopologyEventListener {
    /// `next_event()` returns the next topology change, or `None` once the state machine that
    /// publishes them has been dropped.
    pub async fn next_event(&mut self) -> Option<TopologyEvent> {
        self.receiver.recv().await
    }

    /// Non-blocking variant of `next_event()`.
    pub fn try_next_event(&mut self) -> Option<TopologyEvent> {
        self.receiver.try_recv().ok()
    }
}
