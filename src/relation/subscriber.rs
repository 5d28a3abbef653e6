//! Subscribers to relation change events.
//!
//! Delivery is best-effort: a subscriber that errors or panics is logged
//! and skipped, the rest still receive the event.

use crate::core::{Error, Result};
use crate::relation::event::ChangeEvent;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, RwLock};
use tracing::warn;

/// Listener for relation changes (permission cache refresh, account push, ...).
pub trait Subscriber: Send + Sync {
    /// Unique subscriber ID.
    fn id(&self) -> &str;

    /// Handle one event.
    fn on_change(&self, event: &ChangeEvent) -> Result<()>;
}

/// Result of delivering one event.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Subscribers that handled the event
    pub delivered: usize,
    /// Subscribers that failed, by ID
    pub failed: Vec<String>,
}

/// Subscriber registry.
#[derive(Default)]
pub struct SubscriberRegistry {
    subscribers: RwLock<Vec<Arc<dyn Subscriber>>>,
}

impl SubscriberRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber.
    pub fn subscribe(&self, subscriber: Arc<dyn Subscriber>) -> Result<()> {
        let mut subscribers = self.subscribers.write().map_err(|_| Error::poisoned("subscribers"))?;
        if subscribers.iter().any(|s| s.id() == subscriber.id()) {
            return Err(Error::Conflict(format!(
                "Subscriber {} is already registered",
                subscriber.id()
            )));
        }
        subscribers.push(subscriber);
        Ok(())
    }

    /// Remove a subscriber. Returns whether it was registered.
    pub fn unsubscribe(&self, id: &str) -> Result<bool> {
        let mut subscribers = self.subscribers.write().map_err(|_| Error::poisoned("subscribers"))?;
        let before = subscribers.len();
        subscribers.retain(|s| s.id() != id);
        Ok(subscribers.len() != before)
    }

    /// Number of subscribers.
    pub fn len(&self) -> usize {
        self.subscribers.read().map(|s| s.len()).unwrap_or(0)
    }

    /// Whether nobody listens.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver an event to every subscriber, in registration order.
    pub fn notify(&self, event: &ChangeEvent) -> DispatchReport {
        let snapshot = match self.subscribers.read() {
            Ok(subscribers) => subscribers.clone(),
            Err(_) => {
                warn!(parent = %event.parent, "subscriber list poisoned, event dropped");
                return DispatchReport::default();
            }
        };

        let mut report = DispatchReport::default();
        for subscriber in snapshot {
            match panic::catch_unwind(AssertUnwindSafe(|| subscriber.on_change(event))) {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(e)) => {
                    warn!(subscriber = subscriber.id(), parent = %event.parent, error = %e, "subscriber failed");
                    report.failed.push(subscriber.id().to_string());
                }
                Err(_) => {
                    warn!(subscriber = subscriber.id(), parent = %event.parent, "subscriber panicked");
                    report.failed.push(subscriber.id().to_string());
                }
            }
        }
        report
    }
}
