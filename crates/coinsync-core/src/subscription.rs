//! Cancellable event subscriptions.
//!
//! Producers (identity provider, live query) hold a [`SubscriptionSink`]
//! and push events into it whenever the transport delivers one. Consumers
//! hold the matching [`Subscription`] and pull events in order. Both sides
//! share one liveness flag: once [`Subscription::unsubscribe`] runs, the
//! sink refuses new events and any event already queued is discarded, so
//! a late transport callback can never reach a torn-down consumer.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;

type CancelHook = Box<dyn FnOnce() + Send>;

/// Create a connected sink/subscription pair.
pub fn channel<T>(label: impl Into<String>) -> (SubscriptionSink<T>, Subscription<T>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let active = Arc::new(AtomicBool::new(true));
    let sink = SubscriptionSink {
        sender,
        active: Arc::clone(&active),
    };
    let subscription = Subscription {
        label: label.into(),
        receiver,
        active,
        on_cancel: None,
    };
    (sink, subscription)
}

/// Producer half of a subscription.
pub struct SubscriptionSink<T> {
    sender: mpsc::UnboundedSender<T>,
    active: Arc<AtomicBool>,
}

impl<T> SubscriptionSink<T> {
    /// Deliver an event. Returns `false` if the consumer has unsubscribed.
    pub fn emit(&self, event: T) -> bool {
        if !self.is_active() {
            return false;
        }
        self.sender.send(event).is_ok()
    }

    /// Whether the consumer is still listening.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst) && !self.sender.is_closed()
    }
}

impl<T> Clone for SubscriptionSink<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            active: Arc::clone(&self.active),
        }
    }
}

impl<T> fmt::Debug for SubscriptionSink<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionSink")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Consumer half of a subscription.
///
/// Dropping it unsubscribes.
pub struct Subscription<T> {
    label: String,
    receiver: mpsc::UnboundedReceiver<T>,
    active: Arc<AtomicBool>,
    on_cancel: Option<CancelHook>,
}

impl<T> Subscription<T> {
    /// Register a hook the producer runs when the consumer unsubscribes.
    pub fn on_cancel(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.on_cancel = Some(Box::new(hook));
        self
    }

    /// Wait for the next event.
    ///
    /// Returns `None` once unsubscribed or when the producer is gone.
    /// Cancel-safe: dropping the future loses no event.
    pub async fn next(&mut self) -> Option<T> {
        if !self.is_active() {
            return None;
        }
        let event = self.receiver.recv().await?;
        if !self.is_active() {
            return None;
        }
        Some(event)
    }

    /// Tear the subscription down.
    ///
    /// Only the first call has an effect; it returns `true`.
    pub fn unsubscribe(&mut self) -> bool {
        if !self.active.swap(false, Ordering::SeqCst) {
            return false;
        }
        self.receiver.close();
        while self.receiver.try_recv().is_ok() {}
        if let Some(hook) = self.on_cancel.take() {
            hook();
        }
        tracing::debug!(subscription = %self.label, "Unsubscribed");
        true
    }

    /// Whether events are still being delivered.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl<T> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("label", &self.label)
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn test_events_arrive_in_order() {
        let (sink, mut sub) = channel::<u32>("numbers");
        assert!(sink.emit(1));
        assert!(sink.emit(2));
        assert_eq!(sub.next().await, Some(1));
        assert_eq!(sub.next().await, Some(2));
    }

    #[tokio::test]
    async fn test_unsubscribe_discards_queued_and_late_events() {
        let (sink, mut sub) = channel::<u32>("numbers");
        sink.emit(1);
        assert!(sub.unsubscribe());
        assert!(!sink.emit(2));
        assert!(!sink.is_active());
        assert_eq!(sub.next().await, None);
    }

    #[test]
    fn test_cancel_hook_runs_exactly_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let (_sink, mut sub) = channel::<()>("hooked");
        sub = sub.on_cancel(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(sub.unsubscribe());
        assert!(!sub.unsubscribe());
        drop(sub);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dropped_producer_ends_stream() {
        let (sink, mut sub) = channel::<u32>("numbers");
        drop(sink);
        assert_eq!(sub.next().await, None);
    }
}
