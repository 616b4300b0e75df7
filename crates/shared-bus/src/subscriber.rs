//! # Event Subscriber
//!
//! The receiving side of the fan-out. Each subscription owns a bounded
//! cursor into the bus; when the producer outruns it, the oldest unread
//! events are discarded and `dropped()` advances by the number lost.

use crate::events::{EngineEvent, EventFilter};
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::Stream;
use tracing::debug;

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The bus was dropped, or this subscription was explicitly closed.
    #[error("event bus closed")]
    Closed,
}

/// A subscription handle for receiving events.
///
/// Dropping the handle unsubscribes; [`Subscription::unsubscribe`] does the
/// same explicitly and is idempotent.
pub struct Subscription {
    /// `None` once explicitly unsubscribed.
    receiver: Option<broadcast::Receiver<EngineEvent>>,

    filter: EventFilter,

    /// Events lost to buffer overflow, visible to the subscriber.
    dropped: AtomicU64,

    /// Reference to subscription tracking (for cleanup).
    subscriptions: Arc<RwLock<HashMap<String, usize>>>,

    topic_key: String,
}

impl Subscription {
    pub(crate) fn new(
        receiver: broadcast::Receiver<EngineEvent>,
        filter: EventFilter,
        subscriptions: Arc<RwLock<HashMap<String, usize>>>,
        topic_key: String,
    ) -> Self {
        Self {
            receiver: Some(receiver),
            filter,
            dropped: AtomicU64::new(0),
            subscriptions,
            topic_key,
        }
    }

    /// Receive the next event that matches the filter.
    ///
    /// # Returns
    ///
    /// - `Some(event)` - the next matching event
    /// - `None` - the bus was dropped or this subscription closed
    pub async fn recv(&mut self) -> Option<EngineEvent> {
        loop {
            let receiver = self.receiver.as_mut()?;
            let event = match receiver.recv().await {
                Ok(e) => e,
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    self.dropped.fetch_add(count, Ordering::Relaxed);
                    debug!(lagged = count, "Subscriber lagged, oldest events dropped");
                    continue;
                }
            };

            if self.filter.matches(&event) {
                return Some(event);
            }
        }
    }

    /// Try to receive the next matching event without blocking.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(event))` - an event was available and matched
    /// - `Ok(None)` - no event available right now
    /// - `Err(SubscriptionError::Closed)` - the bus is gone
    pub fn try_recv(&mut self) -> Result<Option<EngineEvent>, SubscriptionError> {
        loop {
            let receiver = self
                .receiver
                .as_mut()
                .ok_or(SubscriptionError::Closed)?;
            let event = match receiver.try_recv() {
                Ok(e) => e,
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    self.dropped.fetch_add(count, Ordering::Relaxed);
                    continue;
                }
            };

            if self.filter.matches(&event) {
                return Ok(Some(event));
            }
        }
    }

    /// Events this subscription lost to buffer overflow.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// The filter for this subscription.
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    /// Stops receiving events. Safe to call more than once.
    pub fn unsubscribe(&mut self) {
        if self.receiver.take().is_some() {
            self.release_tracking();
        }
    }

    fn release_tracking(&self) {
        let Ok(mut subs) = self.subscriptions.write() else {
            return;
        };
        let Some(count) = subs.get_mut(&self.topic_key) else {
            return;
        };
        *count = count.saturating_sub(1);
        if *count == 0 {
            subs.remove(&self.topic_key);
        }
        debug!(topic = %self.topic_key, "Subscription released");
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// A stream wrapper for subscriptions, for use with stream combinators.
pub struct EventStream {
    subscription: Subscription,
}

impl EventStream {
    /// Wraps a subscription.
    #[must_use]
    pub fn new(subscription: Subscription) -> Self {
        Self { subscription }
    }

    /// Events lost to buffer overflow.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.subscription.dropped()
    }
}

impl Stream for EventStream {
    type Item = EngineEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.subscription.try_recv() {
            Ok(Some(event)) => Poll::Ready(Some(event)),
            Ok(None) => {
                cx.waker().wake_by_ref();
                Poll::Pending
            }
            Err(SubscriptionError::Closed) => Poll::Ready(None),
        }
    }
}
