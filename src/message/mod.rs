//! Conversation messages and the ordered store that holds the visible ones

mod language;
mod model;
mod store;

pub use language::{Language, LanguageCatalog};
pub use model::{Message, MessageId, MessageKind, MessageStatus, Role, AUDIO_PLACEHOLDER_TEXT};
pub use store::MessageStore;
