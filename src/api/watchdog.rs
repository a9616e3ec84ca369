use crate::api::cmg_service::CmgRaftService;
use std::sync::{Arc, Weak};
use tokio::sync::oneshot;
use tokio::time::Duration;

/// ValidationWatchdog periodically expires validation tokens of nodes that never completed their
/// join. Only the node that currently leads the CMG submits expirations.
///
/// The background task stops once this handle is dropped.
pub struct ValidationWatchdog {
    // Never sent on. Dropping it closes the channel, which is the stop signal.
    _stop: oneshot::Sender<()>,
}

impl ValidationWatchdog {
    pub(super) fn spawn(service: &Arc<CmgRaftService>, interval: Duration, max_age: Duration) -> Self {
        let (stop_tx, stop_rx) = oneshot::channel();

        let task = WatchdogTask {
            service: Arc::downgrade(service),
            stop: stop_rx,
            interval,
            max_age,
        };
        tokio::spawn(task.run());

        ValidationWatchdog { _stop: stop_tx }
    }
}

struct WatchdogTask {
    service: Weak<CmgRaftService>,
    stop: oneshot::Receiver<()>,
    interval: Duration,
    max_age: Duration,
}

impl WatchdogTask {
    async fn run(mut self) {
        loop {
            tokio::select! {
                _ = &mut self.stop => return,
                _ = tokio::time::sleep(self.interval) => {}
            }

            let service = match self.service.upgrade() {
                Some(service) => service,
                None => return,
            };

            // A sweep in flight finishes even if the handle drops meanwhile.
            service.sweep_stale_validations(self.max_age).await;
        }
    }
}
