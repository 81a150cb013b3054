use super::state::AppState;
use crate::lifecycle::ChatError;
use crate::message::{Message, MessageId, MessageStatus, Role};
use crate::session::{EventOutcome, PresentationEvent};
use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json, Response,
    },
};
use chrono::{DateTime, Utc};
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SubmitMessageRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectLanguageRequest {
    pub language: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectRoleRequest {
    pub role: String,
}

/// A message as the presentation layer shows it
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: MessageId,
    pub role: Role,
    pub text: String,
    pub translated_text: String,
    pub status: MessageStatus,
    pub timestamp: DateTime<Utc>,
}

impl From<&Message> for MessageView {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id,
            role: message.role,
            text: message.text.clone(),
            translated_text: message.translation_label().to_string(),
            status: message.status,
            timestamp: message.timestamp,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn render(messages: &[Message]) -> Vec<MessageView> {
    messages.iter().map(MessageView::from).collect()
}

fn error_response(err: ChatError) -> Response {
    let status = match &err {
        ChatError::EmptyInput | ChatError::UnsupportedLanguage(_) => StatusCode::BAD_REQUEST,
        ChatError::CaptureDenied(_) => StatusCode::SERVICE_UNAVAILABLE,
        ChatError::TransportFailure(_) => StatusCode::BAD_GATEWAY,
        ChatError::RecordingFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        error!("Request failed: {}", err);
    } else {
        warn!("Request rejected: {}", err);
    }

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

async fn dispatch(state: &AppState, event: PresentationEvent) -> Response {
    match state.session.handle(event).await {
        Ok(outcome) => (StatusCode::OK, Json::<EventOutcome>(outcome)).into_response(),
        Err(e) => error_response(e),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /messages
/// Current message list, oldest first
pub async fn list_messages(State(state): State<AppState>) -> impl IntoResponse {
    Json(render(&state.session.messages()))
}

/// GET /messages/stream
/// Server-sent events: the message list now and after every change
///
/// Each event is the latest list. Changes made faster than the client reads
/// collapse into the next event, so intermediate states can be skipped.
pub async fn stream_messages(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let rx = state.session.subscribe();

    let events = stream::unfold((rx, true), |(mut rx, first)| async move {
        if !first && rx.changed().await.is_err() {
            return None;
        }
        let views = render(&rx.borrow_and_update());
        let event = Event::default().event("messages").json_data(views);
        Some((event, (rx, false)))
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// POST /messages
/// Submit typed text; responds once the message is resolved
pub async fn submit_message(
    State(state): State<AppState>,
    Json(req): Json<SubmitMessageRequest>,
) -> Response {
    dispatch(&state, PresentationEvent::SubmitText(req.text)).await
}

/// POST /recording/start
pub async fn start_recording(State(state): State<AppState>) -> Response {
    dispatch(&state, PresentationEvent::StartRecording).await
}

/// POST /recording/stop
/// Finalize the take; it is sent in the background
pub async fn stop_recording(State(state): State<AppState>) -> Response {
    dispatch(&state, PresentationEvent::StopRecording).await
}

/// PUT /language
pub async fn select_language(
    State(state): State<AppState>,
    Json(req): Json<SelectLanguageRequest>,
) -> Response {
    dispatch(&state, PresentationEvent::SelectLanguage(req.language)).await
}

/// PUT /role
pub async fn select_role(
    State(state): State<AppState>,
    Json(req): Json<SelectRoleRequest>,
) -> Response {
    match req.role.parse::<Role>() {
        Ok(role) => dispatch(&state, PresentationEvent::SelectRole(role)).await,
        Err(e) => (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: e })).into_response(),
    }
}

/// GET /languages
pub async fn list_languages(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.session.catalog().languages().to_vec())
}

/// GET /status
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.session.stats().await)
}

/// POST /summary
pub async fn request_summary(State(state): State<AppState>) -> Response {
    dispatch(&state, PresentationEvent::RequestSummary).await
}

/// DELETE /history
pub async fn clear_history(State(state): State<AppState>) -> Response {
    dispatch(&state, PresentationEvent::ClearHistory).await
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
