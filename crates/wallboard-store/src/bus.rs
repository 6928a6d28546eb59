use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;
use wallboard_core::Resource;

const CHANNEL_CAPACITY: usize = 64;

/// A change notification for one upstream resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub resource: Resource,
    pub at: DateTime<Utc>,
}

/// Uniform change-event bus: one broadcast channel per watched resource.
///
/// Cloning is cheap (Arc). Publishing with no subscribers is a silent no-op.
#[derive(Clone)]
pub struct ChangeBus {
    channels: Arc<HashMap<Resource, broadcast::Sender<ChangeEvent>>>,
}

impl ChangeBus {
    pub fn new() -> Self {
        let channels = Resource::ALL
            .into_iter()
            .map(|r| (r, broadcast::channel(CHANNEL_CAPACITY).0))
            .collect();
        Self {
            channels: Arc::new(channels),
        }
    }

    pub fn publish(&self, resource: Resource) {
        if let Some(tx) = self.channels.get(&resource) {
            let receivers = tx
                .send(ChangeEvent {
                    resource,
                    at: Utc::now(),
                })
                .unwrap_or(0);
            debug!(%resource, receivers, "change published");
        }
    }

    pub fn subscribe(&self, resource: Resource) -> broadcast::Receiver<ChangeEvent> {
        match self.channels.get(&resource) {
            Some(tx) => tx.subscribe(),
            // Every resource gets a channel in `new`, so this arm only guards
            // against future enum growth.
            None => broadcast::channel(1).1,
        }
    }

    /// Number of live subscribers on `resource`, used by health reporting.
    pub fn subscriber_count(&self, resource: Resource) -> usize {
        self.channels
            .get(&resource)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_only_see_their_resource() {
        let bus = ChangeBus::new();
        let mut jobs = bus.subscribe(Resource::Jobs);
        let mut tours = bus.subscribe(Resource::Tours);

        bus.publish(Resource::Jobs);

        assert_eq!(jobs.recv().await.unwrap().resource, Resource::Jobs);
        assert!(tours.try_recv().is_err());
        assert_eq!(bus.subscriber_count(Resource::Jobs), 1);
    }
}
