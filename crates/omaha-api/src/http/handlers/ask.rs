//! Streaming ask endpoint.
//!
//! POST /ask
//!
//! Validates the question, windows the client history, composes the upstream
//! prompt around the persona, and relays the upstream answer as a chunked
//! `text/plain` body of `data: <json>` lines.
//!
//! Everything that can fail before the first event (bad body, missing
//! provider, refused upstream call) is reported with a JSON error status.
//! After that, failures are `error` events inside the stream.

use std::convert::Infallible;
use std::time::Duration;

use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use futures_util::StreamExt;

use omaha_core::chat::compose::compose;
use omaha_core::chat::window::window;
use omaha_core::relay::RelaySession;
use omaha_types::chat::AskRequest;
use omaha_types::llm::Message;

use crate::http::error::{AppError, QUESTION_REQUIRED};
use crate::state::AppState;

/// Content type of the event stream.
pub const STREAM_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// POST /ask -- relay one question as a stream of events.
pub async fn ask(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!(error = %rejection.body_text(), "Rejected /ask body");
        AppError::Validation(QUESTION_REQUIRED.to_string())
    })?;

    let question = request
        .question
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::Validation(QUESTION_REQUIRED.to_string()))?;

    let provider = state.provider.clone().ok_or_else(|| {
        tracing::error!("Rejecting /ask: no upstream provider configured");
        AppError::Internal("Upstream provider is not configured".to_string())
    })?;

    let windowed = window(&request.conversation_history, state.config.history_limit);
    let persona = state.persona.get().await;
    let messages = compose(persona, &windowed, question)?;

    tracing::info!(
        timestamp = %chrono::Utc::now().to_rfc3339(),
        question_len = question.chars().count(),
        history_len = request.conversation_history.len(),
        windowed_len = windowed.len(),
        persona_injected = messages[0] == Message::system(persona),
        "Relaying question"
    );

    let idle = Duration::from_secs(state.config.upstream_idle_timeout_secs);
    let session = RelaySession::open(&*provider, messages, &state.config.generation, idle)
        .await
        .map_err(|err| {
            tracing::error!(provider = provider.name(), error = %err, "Upstream refused the call");
            AppError::from(err)
        })?;

    let body = Body::from_stream(
        session
            .into_events()
            .map(|event| Ok::<_, Infallible>(event.to_wire())),
    );

    Ok((
        [
            (header::CONTENT_TYPE, STREAM_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        body,
    )
        .into_response())
}

/// Any other method on /ask.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
