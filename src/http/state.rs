use crate::session::ChatSession;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The conversation this server fronts
    pub session: Arc<ChatSession>,
}

impl AppState {
    pub fn new(session: Arc<ChatSession>) -> Self {
        Self { session }
    }
}
