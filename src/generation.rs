//! Guards a view against stale responses. Each request takes a [`Ticket`]
//! from [`Latest::begin`]; when its response arrives it is published only if
//! no newer request has started in the meantime.

use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies one request generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Holds the most recently published value for the newest request.
pub struct Latest<T> {
    generation: AtomicU64,
    current: Mutex<Option<(Ticket, T)>>,
}

impl<T> Default for Latest<T> {
    fn default() -> Self {
        Latest {
            generation: AtomicU64::new(0),
            current: Mutex::new(None),
        }
    }
}

impl<T: Clone> Latest<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new generation, superseding every outstanding ticket.
    pub fn begin(&self) -> Ticket {
        Ticket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether `ticket` belongs to the newest generation.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.0
    }

    /// Publishes `value` if `ticket` is still current. Returns whether the
    /// value was accepted; stale values are dropped.
    pub fn publish(&self, ticket: Ticket, value: T) -> bool {
        let mut current = self.current.lock();
        if !self.is_current(ticket) {
            tracing::debug!(?ticket, "discarding stale response");
            return false;
        }
        *current = Some((ticket, value));
        true
    }

    /// Awaits `request` under a fresh ticket and publishes its output.
    /// Returns whether the output was accepted.
    pub async fn track<F: Future<Output = T>>(&self, request: F) -> bool {
        let ticket = self.begin();
        let value = request.await;
        self.publish(ticket, value)
    }

    /// The last accepted value, if any.
    pub fn get(&self) -> Option<T> {
        self.current.lock().as_ref().map(|(_, value)| value.clone())
    }
}
