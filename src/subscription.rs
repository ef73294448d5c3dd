use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};
use tokio::sync::mpsc as tokio_mpsc;

type SubscriptionId = u64;

struct Subscription<T> {
    tx: tokio_mpsc::UnboundedSender<T>,
}

/// Fan-out of state updates to any number of UI subscribers
///
/// Subscriptions are removed lazily: the next publish after a receiver
/// is dropped prunes it.
pub struct Subscriptions<T> {
    subscriptions: Arc<Mutex<HashMap<SubscriptionId, Subscription<T>>>>,
    next_id: Arc<AtomicU64>,
}

impl<T> Clone for Subscriptions<T> {
    fn clone(&self) -> Self {
        Self {
            subscriptions: self.subscriptions.clone(),
            next_id: self.next_id.clone(),
        }
    }
}

impl<T> Default for Subscriptions<T> {
    fn default() -> Self {
        Self {
            subscriptions: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl<T: Clone> Subscriptions<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to all updates published after this call
    /// Subscription is automatically removed when receiver is dropped
    pub fn subscribe(&self) -> tokio_mpsc::UnboundedReceiver<T> {
        let (tx, rx) = tokio_mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        if let Ok(mut subs) = self.subscriptions.lock() {
            subs.insert(id, Subscription { tx });
        }
        rx
    }

    /// Dispatch an update to every live subscriber
    pub fn publish(&self, update: T) {
        let Ok(mut subs) = self.subscriptions.lock() else {
            return;
        };

        // If send fails, receiver was dropped
        subs.retain(|_, subscription| subscription.tx.send(update.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.lock().map(|subs| subs.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropped_receivers_are_pruned_on_publish() {
        let subs: Subscriptions<u32> = Subscriptions::new();
        let mut kept = subs.subscribe();
        let dropped = subs.subscribe();
        assert_eq!(subs.subscriber_count(), 2);

        drop(dropped);
        subs.publish(7);

        assert_eq!(subs.subscriber_count(), 1);
        assert_eq!(kept.try_recv().ok(), Some(7));
    }

    #[test]
    fn late_subscribers_only_see_later_updates() {
        let subs: Subscriptions<&'static str> = Subscriptions::new();
        subs.publish("before");
        let mut rx = subs.subscribe();
        subs.publish("after");

        assert_eq!(rx.try_recv().ok(), Some("after"));
        assert!(rx.try_recv().is_err());
    }
}
