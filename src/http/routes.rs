use super::handlers;
use super::state::AppState;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Router exposing the session as a JSON control API
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Conversation
        .route(
            "/messages",
            get(handlers::list_messages).post(handlers::submit_message),
        )
        .route("/messages/stream", get(handlers::stream_messages))
        // Recording control
        .route("/recording/start", post(handlers::start_recording))
        .route("/recording/stop", post(handlers::stop_recording))
        // Selection
        .route("/languages", get(handlers::list_languages))
        .route("/language", put(handlers::select_language))
        .route("/role", put(handlers::select_role))
        // Session queries
        .route("/status", get(handlers::get_status))
        .route("/summary", post(handlers::request_summary))
        .route("/history", delete(handlers::clear_history))
        // Browser front-ends live on another origin
        .layer(CorsLayer::permissive())
        // One span per request
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
