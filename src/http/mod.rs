//! HTTP control surface for presentation front-ends
//!
//! This module exposes a conversation session as a small REST API:
//! - GET /messages, GET /messages/stream (SSE) - Message list
//! - POST /messages - Submit typed text
//! - POST /recording/start, POST /recording/stop - Voice capture
//! - GET /languages, PUT /language, PUT /role - Selection
//! - GET /status - Session statistics
//! - POST /summary, DELETE /history - Persisted history
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use handlers::MessageView;
pub use routes::create_router;
pub use state::AppState;
