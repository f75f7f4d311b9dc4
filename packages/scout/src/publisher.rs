//! Fan-out broadcast of progress events to live observers.
//!
//! Each subscriber owns an independent unbounded inbox; publishing iterates a
//! snapshot of the current subscriber set, so subscribe/unsubscribe can happen
//! concurrently with publish. An observer that dropped its subscription is
//! pruned on the next publish that fails to deliver to it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;

use crate::events::ProgressEvent;
use crate::types::RunId;

/// In-process publisher for run progress events.
///
/// Thread-safe, cloneable. All subscribers see events from the moment of
/// subscription onward, in publish order; there is no replay of history.
#[derive(Clone)]
pub struct EventPublisher {
    subscribers: Arc<RwLock<HashMap<u64, mpsc::UnboundedSender<ProgressEvent>>>>,
    next_id: Arc<AtomicU64>,
    heartbeat_interval: Duration,
}

/// Handle for one observer. Dropping it disconnects the observer.
pub struct Subscription {
    id: u64,
    rx: mpsc::UnboundedReceiver<ProgressEvent>,
}

impl Subscription {
    /// Receive the next event; `None` once the publisher is gone.
    pub async fn recv(&mut self) -> Option<ProgressEvent> {
        self.rx.recv().await
    }

    /// Consume the handle, yielding the raw inbox (for stream adapters).
    pub fn into_receiver(self) -> mpsc::UnboundedReceiver<ProgressEvent> {
        self.rx
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl EventPublisher {
    pub fn new(heartbeat_interval: Duration) -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(0)),
            heartbeat_interval,
        }
    }

    /// Register a new observer.
    pub async fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.write().await.insert(id, tx);
        tracing::debug!(subscriber_id = id, "observer subscribed");
        Subscription { id, rx }
    }

    /// Remove an observer explicitly. Dropping the `Subscription` has the
    /// same effect lazily.
    pub async fn unsubscribe(&self, id: u64) {
        self.subscribers.write().await.remove(&id);
    }

    /// Broadcast an event to every currently subscribed observer.
    ///
    /// Never blocks on a slow observer: delivery is a push into that
    /// observer's unbounded inbox. Disconnected observers are removed without
    /// affecting delivery to others.
    pub async fn publish(&self, event: ProgressEvent) {
        let snapshot: Vec<(u64, mpsc::UnboundedSender<ProgressEvent>)> = {
            let subscribers = self.subscribers.read().await;
            subscribers
                .iter()
                .map(|(id, tx)| (*id, tx.clone()))
                .collect()
        };

        let mut dead = Vec::new();
        for (id, tx) in snapshot {
            if tx.send(event.clone()).is_err() {
                dead.push(id);
            }
        }

        if !dead.is_empty() {
            let mut subscribers = self.subscribers.write().await;
            for id in dead {
                subscribers.remove(&id);
                tracing::debug!(subscriber_id = id, "pruned disconnected observer");
            }
        }
    }

    /// Periodically publish a heartbeat for `run_id` until the token is
    /// cancelled, so idle observers can tell liveness from disconnection.
    pub async fn heartbeat_loop(&self, run_id: RunId, token: CancellationToken) {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(self.heartbeat_interval) => {
                    self.publish(ProgressEvent::heartbeat(run_id)).await;
                }
            }
        }
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }
}
