use tokio::sync::watch;
use tracing::debug;

use super::model::{Message, MessageId};

/// Ordered collection of visible messages
///
/// The sequence lives inside a `watch` channel so every mutation is
/// re-emitted to subscribers as a full snapshot. Operations that target a
/// missing id change nothing and notify no one.
///
/// Subscribers observe latest state, not a log of changes: mutations that
/// land before a subscriber looks again coalesce into one notification
/// carrying the newest sequence. A Pending entry that resolves quickly may
/// therefore never be seen as Pending by a slow reader.
#[derive(Debug)]
pub struct MessageStore {
    messages: watch::Sender<Vec<Message>>,
}

impl MessageStore {
    pub fn new() -> Self {
        let (messages, _) = watch::channel(Vec::new());
        Self { messages }
    }

    /// Append a message to the tail
    pub fn insert(&self, message: Message) {
        debug!("Store insert: {}", message.id);
        self.messages.send_modify(|messages| messages.push(message));
    }

    /// Substitute the first entry with `id` in place
    ///
    /// Returns whether an entry was found.
    pub fn replace_by_id(&self, id: &MessageId, message: Message) -> bool {
        let replaced = self.messages.send_if_modified(|messages| {
            match messages.iter_mut().find(|m| &m.id == id) {
                Some(slot) => {
                    *slot = message;
                    true
                }
                None => false,
            }
        });

        debug!("Store replace {}: found={}", id, replaced);
        replaced
    }

    /// Delete the first entry with `id`
    ///
    /// Returns whether an entry was removed.
    pub fn remove_by_id(&self, id: &MessageId) -> bool {
        let removed = self.messages.send_if_modified(|messages| {
            match messages.iter().position(|m| &m.id == id) {
                Some(index) => {
                    messages.remove(index);
                    true
                }
                None => false,
            }
        });

        debug!("Store remove {}: found={}", id, removed);
        removed
    }

    /// Overwrite the whole sequence
    pub fn replace_all(&self, messages: Vec<Message>) {
        debug!("Store replace_all: {} messages", messages.len());
        self.messages.send_replace(messages);
    }

    /// Current ordered contents
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.borrow().clone()
    }

    pub fn get(&self, id: &MessageId) -> Option<Message> {
        self.messages.borrow().iter().find(|m| &m.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.messages.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.borrow().is_empty()
    }

    /// Receive the newest snapshot whenever it changes
    ///
    /// Bursts of mutations between two reads are delivered as one change.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Message>> {
        self.messages.subscribe()
    }
}

impl Default for MessageStore {
    fn default() -> Self {
        Self::new()
    }
}
