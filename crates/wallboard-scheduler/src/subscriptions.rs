use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{StreamExt, StreamMap};
use tracing::{debug, warn};
use wallboard_core::Resource;
use wallboard_store::{ChangeBus, ChangeEvent};

/// One change subscription per watched resource, merged into a single stream.
///
/// Dropping this value unsubscribes from every resource.
pub struct ChangeSubscriptions {
    streams: StreamMap<Resource, BroadcastStream<ChangeEvent>>,
}

impl ChangeSubscriptions {
    pub fn subscribe_all(bus: &ChangeBus) -> Self {
        Self::subscribe(bus, &Resource::ALL)
    }

    pub fn subscribe(bus: &ChangeBus, resources: &[Resource]) -> Self {
        let mut streams = StreamMap::new();
        for resource in resources {
            streams.insert(*resource, BroadcastStream::new(bus.subscribe(*resource)));
        }
        debug!(count = streams.len(), "change subscriptions registered");
        Self { streams }
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Next resource that changed. A lagged receiver still means "something
    /// changed", so it is reported like any other notification.
    pub async fn next(&mut self) -> Option<Resource> {
        let (resource, item) = self.streams.next().await?;
        if let Err(BroadcastStreamRecvError::Lagged(n)) = item {
            warn!(%resource, skipped = n, "change subscription lagged");
        }
        Some(resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn merges_all_resources() {
        let bus = ChangeBus::new();
        let mut subs = ChangeSubscriptions::subscribe_all(&bus);
        assert_eq!(subs.len(), Resource::ALL.len());
        assert_eq!(bus.subscriber_count(Resource::Timesheets), 1);

        bus.publish(Resource::Timesheets);
        assert_eq!(subs.next().await, Some(Resource::Timesheets));

        drop(subs);
        assert_eq!(bus.subscriber_count(Resource::Timesheets), 0);
    }
}
