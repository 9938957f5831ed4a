//! Fan-out of dashboard views to every connected client.
//!
//! A publication is the whole view, never a diff. New subscribers first get
//! the latest publication, then everything published after they joined.
//! Nothing is acknowledged or retried: a subscriber that falls too far behind
//! skips the views it missed, and one that disconnects has to resubscribe.

use std::sync::{Arc, Mutex, PoisonError};

use futures::Stream;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::dashboard::DashboardView;

/// Event name used on every realtime transport.
pub const DASHBOARD_UPDATE: &str = "dashboardUpdate";

#[derive(Debug, Clone)]
pub struct Published {
    pub seq: u64,
    pub view: Arc<DashboardView>,
}

#[derive(Clone)]
pub struct BroadcastChannel {
    inner: Arc<Inner>,
}

struct Inner {
    tx: broadcast::Sender<Published>,
    latest: Mutex<Option<Published>>,
}

impl BroadcastChannel {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            inner: Arc::new(Inner {
                tx,
                latest: Mutex::new(None),
            }),
        }
    }

    /// Sends `view` to all current subscribers and makes it the snapshot for
    /// future ones. Returns the publication's sequence number.
    pub fn publish(&self, view: DashboardView) -> u64 {
        // The lock is held across the send so a concurrent `subscribe` sees
        // either this view as its snapshot or as its first message, never both.
        let mut latest = self
            .inner
            .latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let seq = latest.as_ref().map_or(1, |p| p.seq + 1);
        let published = Published {
            seq,
            view: Arc::new(view),
        };
        *latest = Some(published.clone());

        match self.inner.tx.send(published) {
            Ok(receivers) => debug!(seq, receivers, "dashboard view published"),
            Err(_) => debug!(seq, "dashboard view published with no subscribers"),
        }
        seq
    }

    pub fn subscribe(&self) -> Subscription {
        let latest = self
            .inner
            .latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Subscription {
            pending: latest.clone(),
            rx: self.inner.tx.subscribe(),
        }
    }

    pub fn latest(&self) -> Option<Published> {
        self.inner
            .latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.tx.receiver_count()
    }
}

pub struct Subscription {
    pending: Option<Published>,
    rx: broadcast::Receiver<Published>,
}

impl Subscription {
    /// Next view for this subscriber, or `None` once the channel is gone.
    pub async fn next(&mut self) -> Option<Published> {
        if let Some(snapshot) = self.pending.take() {
            return Some(snapshot);
        }
        loop {
            match self.rx.recv().await {
                Ok(published) => return Some(published),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "realtime subscriber lagged, dropping old views");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub fn into_stream(self) -> impl Stream<Item = Published> + Send + 'static {
        futures::stream::unfold(self, |mut sub| async move {
            sub.next().await.map(|published| (published, sub))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::time::Duration;

    fn view(total: i64) -> DashboardView {
        DashboardView {
            goals: vec![],
            outcomes: vec![],
            records: vec![],
            total_outcome: Decimal::from(total),
            rekap_invest: vec![],
        }
    }

    #[tokio::test]
    async fn late_subscriber_gets_current_snapshot_first() {
        let channel = BroadcastChannel::new(8);
        channel.publish(view(1));
        channel.publish(view(2));

        let mut sub = channel.subscribe();
        let first = sub.next().await.unwrap();
        assert_eq!(first.seq, 2);
        assert_eq!(first.view.total_outcome, Decimal::from(2));

        channel.publish(view(3));
        let next = sub.next().await.unwrap();
        assert_eq!(next.seq, 3);
    }

    #[tokio::test]
    async fn every_publication_arrives_exactly_once() {
        let channel = BroadcastChannel::new(8);
        let mut sub = channel.subscribe();

        for n in 1..=3 {
            channel.publish(view(n));
        }

        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(sub.next().await.unwrap().seq);
        }
        assert_eq!(seen, vec![1, 2, 3]);

        let extra = tokio::time::timeout(Duration::from_millis(50), sub.next()).await;
        assert!(extra.is_err(), "no duplicate delivery expected");
    }

    #[tokio::test]
    async fn lagging_subscriber_skips_ahead() {
        let channel = BroadcastChannel::new(2);
        let mut sub = channel.subscribe();

        for n in 1..=5 {
            channel.publish(view(n));
        }

        let got = sub.next().await.unwrap();
        assert!(got.seq >= 4, "oldest retained view expected, got {}", got.seq);
    }

    #[test]
    fn publish_without_subscribers_keeps_snapshot() {
        let channel = BroadcastChannel::new(4);
        assert!(channel.latest().is_none());
        assert_eq!(channel.publish(view(9)), 1);
        assert_eq!(channel.latest().map(|p| p.seq), Some(1));
        assert_eq!(channel.subscriber_count(), 0);
    }
}
