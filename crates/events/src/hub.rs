//! Topic-keyed in-process pub/sub hub backed by `tokio::sync::broadcast`.
//!
//! [`ProgressHub`] carries one broadcast channel per job id. It is
//! designed to be shared via `Arc<ProgressHub>` between the running
//! pipelines (publishers) and the WebSocket bridge (subscribers).

use std::collections::HashMap;

use tokio::sync::{broadcast, RwLock};

use feedframe_core::types::DbId;

use crate::event::ProgressEvent;

/// Per-topic buffer capacity. A slow subscriber that falls more than
/// this many events behind observes `RecvError::Lagged` and simply
/// misses the dropped events (best-effort delivery).
const TOPIC_CAPACITY: usize = 256;

/// In-process progress fan-out, one topic per job.
///
/// Delivery is at-most-once: there is no backlog or replay, so a
/// subscriber that connects after an event was published never sees it,
/// and publishing to a topic with no subscribers drops the event.
pub struct ProgressHub {
    topics: RwLock<HashMap<DbId, broadcast::Sender<ProgressEvent>>>,
}

impl ProgressHub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
        }
    }

    /// Subscribe to the topic for `job_id`, creating it on demand.
    ///
    /// Dropping the returned receiver removes the subscription; once a
    /// topic has no receivers left it is pruned on the next publish.
    pub async fn subscribe(&self, job_id: DbId) -> broadcast::Receiver<ProgressEvent> {
        let mut topics = self.topics.write().await;
        topics
            .entry(job_id)
            .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0)
            .subscribe()
    }

    /// Publish an event to every current subscriber of `job_id`'s topic.
    ///
    /// A topic that does not exist, or whose subscribers have all
    /// disconnected, swallows the event. Stale topics are pruned here
    /// rather than on disconnect, so subscriber drop stays free.
    pub async fn publish(&self, job_id: DbId, event: ProgressEvent) {
        let delivered = {
            let topics = self.topics.read().await;
            match topics.get(&job_id) {
                // SendError only means there are zero receivers.
                Some(tx) => tx.send(event).is_ok(),
                None => return,
            }
        };

        if !delivered {
            let mut topics = self.topics.write().await;
            // Re-check under the write lock: a new subscriber may have
            // arrived between the failed send and the prune.
            if topics.get(&job_id).is_some_and(|tx| tx.receiver_count() == 0) {
                topics.remove(&job_id);
                tracing::debug!(job_id, "Pruned progress topic with no subscribers");
            }
        }
    }

    /// Number of live topics. Exposed for monitoring and tests.
    pub async fn topic_count(&self) -> usize {
        self.topics.read().await.len()
    }
}

impl Default for ProgressHub {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive_on_topic() {
        let hub = ProgressHub::new();
        let mut rx = hub.subscribe(7).await;

        hub.publish(7, ProgressEvent::entry(1, 3, "sku-1")).await;

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received, ProgressEvent::entry(1, 3, "sku-1"));
    }

    #[tokio::test]
    async fn topics_are_isolated() {
        let hub = ProgressHub::new();
        let mut rx7 = hub.subscribe(7).await;
        let mut rx8 = hub.subscribe(8).await;

        hub.publish(7, ProgressEvent::entry(1, 1, "only-for-7")).await;

        let received = rx7.recv().await.expect("job 7 subscriber should receive");
        assert_eq!(received, ProgressEvent::entry(1, 1, "only-for-7"));

        // Job 8's subscriber must see nothing.
        assert!(matches!(
            rx8.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_noop() {
        let hub = ProgressHub::new();
        // No topic exists -- must not panic or create one.
        hub.publish(42, ProgressEvent::error("dropped")).await;
        assert_eq!(hub.topic_count().await, 0);
    }

    #[tokio::test]
    async fn late_subscriber_misses_earlier_events() {
        let hub = ProgressHub::new();
        let _early = hub.subscribe(7).await;

        hub.publish(7, ProgressEvent::entry(1, 2, "first")).await;

        let mut late = hub.subscribe(7).await;
        hub.publish(7, ProgressEvent::entry(2, 2, "second")).await;

        // The late subscriber only sees what was published after it joined.
        let received = late.recv().await.expect("should receive second event");
        assert_eq!(received, ProgressEvent::entry(2, 2, "second"));
        assert!(matches!(
            late.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn events_arrive_in_publish_order() {
        let hub = ProgressHub::new();
        let mut rx = hub.subscribe(7).await;

        for i in 1..=5 {
            hub.publish(7, ProgressEvent::entry(i, 5, format!("sku-{i}"))).await;
        }

        for i in 1..=5 {
            let received = rx.recv().await.expect("should receive in order");
            assert_eq!(received, ProgressEvent::entry(i, 5, format!("sku-{i}")));
        }
    }

    #[tokio::test]
    async fn abandoned_topic_is_pruned_on_next_publish() {
        let hub = ProgressHub::new();
        let rx = hub.subscribe(7).await;
        assert_eq!(hub.topic_count().await, 1);

        drop(rx);
        hub.publish(7, ProgressEvent::entry(1, 1, "sku")).await;

        assert_eq!(hub.topic_count().await, 0);
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let hub = ProgressHub::new();
        let mut rx1 = hub.subscribe(7).await;
        let mut rx2 = hub.subscribe(7).await;

        hub.publish(7, ProgressEvent::error("fatal")).await;

        assert_eq!(rx1.recv().await.unwrap(), ProgressEvent::error("fatal"));
        assert_eq!(rx2.recv().await.unwrap(), ProgressEvent::error("fatal"));
    }
}
