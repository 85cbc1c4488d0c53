//! HTTP Endpoints
//!
//! The webhook surface the telephony provider posts call events to.

use axum::{
    extract::{Form, State},
    http::{header, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use call_agent_core::OutboundInstruction;
use call_agent_engine::EngineError;

use crate::auth::require_signature;
use crate::state::AppState;
use crate::twiml;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let webhooks = Router::new()
        .route("/voice", post(voice))
        .route("/process", post(process))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_signature,
        ));

    let mut router = Router::new()
        .merge(webhooks)
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .layer(TraceLayer::new_for_http());

    if state.config.server.cors_enabled {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router.with_state(state)
}

/// Form body the telephony provider posts per call event
#[derive(Debug, Deserialize)]
struct WebhookParams {
    /// Caller identity (phone number)
    #[serde(rename = "From")]
    from: Option<String>,

    /// Transcribed speech; absent on a no-input turn
    #[serde(rename = "SpeechResult")]
    speech_result: Option<String>,
}

/// Respond to an incoming call with the opening prompt
async fn voice(
    State(state): State<AppState>,
    Form(params): Form<WebhookParams>,
) -> impl IntoResponse {
    let result = match &params.from {
        Some(from) => state.handler.on_call_start(from).await,
        None => Err(EngineError::MissingCallerId),
    };

    respond(&state, result)
}

/// Process one turn of the conversation
async fn process(
    State(state): State<AppState>,
    Form(params): Form<WebhookParams>,
) -> impl IntoResponse {
    let result = match &params.from {
        Some(from) => {
            state
                .handler
                .on_turn(from, params.speech_result.as_deref())
                .await
        }
        None => Err(EngineError::MissingCallerId),
    };

    respond(&state, result)
}

/// Render the instruction, mapping a failed turn to apology-and-hangup
fn respond(
    state: &AppState,
    result: Result<OutboundInstruction, EngineError>,
) -> impl IntoResponse {
    let instruction = match result {
        Ok(instruction) => instruction,
        Err(e) => {
            tracing::warn!(error = %e, "Turn failed, ending exchange");
            OutboundInstruction::hangup(state.config.engine.apology.clone())
        }
    };

    let xml = twiml::render(&instruction, &state.config.server.voice);
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/xml")],
        xml,
    )
}

/// Health check
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness check
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ready",
        "sessions": state.handler.sessions().count(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use call_agent_config::Settings;
    use call_agent_core::{Message, ReplyGenerator, Result};
    use call_agent_engine::{CallHandler, SessionStore, TranscriptWriter};
    use call_agent_persistence::MemoryTranscriptStore;

    struct CannedGenerator;

    #[async_trait]
    impl ReplyGenerator for CannedGenerator {
        async fn generate(&self, _history: &[Message]) -> Result<Message> {
            Ok(Message::assistant("canned reply"))
        }
    }

    #[tokio::test]
    async fn test_router_creation() {
        let settings = Settings::default();
        let (writer, _task) = TranscriptWriter::spawn(
            Arc::new(MemoryTranscriptStore::new()),
            settings.engine.persist_queue_depth,
        );
        let handler = Arc::new(CallHandler::new(
            Arc::new(SessionStore::new()),
            Arc::new(CannedGenerator),
            writer,
            settings.engine.clone(),
        ));

        let state = AppState::new(settings, handler);
        let _ = create_router(state);
    }
}
