use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::message::{MessageId, MessageStore};

type Timers = Arc<Mutex<HashMap<MessageId, JoinHandle<()>>>>;

/// Removes messages from the store a fixed time after they were created
///
/// Timers only hold a weak reference to the store: a timer firing after the
/// store is gone, or after its message was already replaced away, does
/// nothing.
#[derive(Debug)]
pub struct ExpiryScheduler {
    store: Weak<MessageStore>,
    ttl: Duration,
    timers: Timers,
}

impl ExpiryScheduler {
    pub fn new(store: &Arc<MessageStore>, ttl: Duration) -> Self {
        Self {
            store: Arc::downgrade(store),
            ttl,
            timers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Arm a one-shot removal of `id` after the TTL
    pub fn schedule(&self, id: MessageId) {
        let store = self.store.clone();
        let timers = Arc::clone(&self.timers);
        let ttl = self.ttl;
        let deadline = Instant::now() + ttl;

        // Hold the lock across spawn so the timer can't deregister before it is registered
        let mut guard = self.timers.lock().unwrap_or_else(PoisonError::into_inner);

        let timer = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;

            match store.upgrade() {
                Some(store) => {
                    if store.remove_by_id(&id) {
                        info!("Message {} expired", id);
                    } else {
                        debug!("Message {} already gone at expiry", id);
                    }
                }
                None => debug!("Store dropped before {} expired", id),
            }

            timers
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&id);
        });

        if let Some(previous) = guard.insert(id, timer) {
            previous.abort();
        }

        debug!("Expiry armed for {} in {:?}", id, ttl);
    }

    /// Number of timers that have not fired yet
    pub fn pending(&self) -> usize {
        self.timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Abort every armed timer
    pub fn shutdown(&self) {
        let mut timers = self.timers.lock().unwrap_or_else(PoisonError::into_inner);
        let count = timers.len();
        for (_, timer) in timers.drain() {
            timer.abort();
        }
        if count > 0 {
            info!("Aborted {} expiry timers", count);
        }
    }
}
