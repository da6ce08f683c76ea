// src/web/handlers.rs
// HTTP handlers: chat, status, reset, self-test, and the static page

use axum::{
    Json,
    extract::{Form, FromRequest, Multipart, Request, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::chat::{UNAVAILABLE_REPLY, quick_reply};
use crate::intake::StoredArtifact;
use crate::web::state::AppState;
use crate::{BanterError, Result};

/// 400 body when neither a message nor a file arrives
pub const EMPTY_PROMPT_REPLY: &str = "Please say something! 😊";

/// 500 body for anything the handlers did not fold into a reply themselves
pub const OOPS_REPLY: &str =
    "Oops! Something went wrong. Let me reset and try again. What were you saying?";

#[derive(Deserialize)]
struct ChatForm {
    message: Option<String>,
}

fn reply_json(status: StatusCode, reply: impl Into<String>) -> Response {
    (status, Json(json!({ "response": reply.into() }))).into_response()
}

/// Serve the embedded chat page
pub async fn home() -> Html<&'static str> {
    Html(include_str!("../../assets/index.html"))
}

/// One chat request: either a multipart upload (field `file`, with an
/// optional `message` fallback) or a form-encoded `message`. Every error
/// is translated to its fixed user-facing body right here.
pub async fn chat(State(state): State<AppState>, request: Request) -> Response {
    match handle_chat(&state, request).await {
        Ok(response) => response,
        Err(BanterError::InvalidInput(e)) => {
            warn!(error = %e, "unreadable chat request body");
            reply_json(StatusCode::BAD_REQUEST, EMPTY_PROMPT_REPLY)
        }
        Err(e) => {
            error!(error = %e, "chat endpoint failed");
            reply_json(StatusCode::INTERNAL_SERVER_ERROR, OOPS_REPLY)
        }
    }
}

async fn handle_chat(state: &AppState, request: Request) -> Result<Response> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(request, state)
            .await
            .map_err(|e| BanterError::InvalidInput(e.to_string()))?;

        let mut message = String::new();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| BanterError::InvalidInput(e.to_string()))?
        {
            let name = field.name().map(|n| n.to_string());
            match name.as_deref() {
                Some("file") => {
                    let declared = field
                        .file_name()
                        .map(|n| n.to_string())
                        .filter(|n| !n.is_empty());
                    if let Some(declared) = declared {
                        let bytes = field
                            .bytes()
                            .await
                            .map_err(|e| BanterError::InvalidInput(e.to_string()))?;
                        let artifact =
                            StoredArtifact::stage(&state.uploads.dir, &declared, &bytes).await?;
                        let reply = state.intake.handle_upload(artifact).await;
                        return Ok(reply_json(StatusCode::OK, reply));
                    }
                }
                Some("message") => {
                    message = field
                        .text()
                        .await
                        .map_err(|e| BanterError::InvalidInput(e.to_string()))?;
                }
                _ => {}
            }
        }
        Ok(respond_to_message(state, &message).await)
    } else {
        let Form(form) = Form::<ChatForm>::from_request(request, state)
            .await
            .map_err(|e| BanterError::InvalidInput(e.to_string()))?;
        Ok(respond_to_message(state, form.message.as_deref().unwrap_or("")).await)
    }
}

async fn respond_to_message(state: &AppState, message: &str) -> Response {
    let message = message.trim();
    if message.is_empty() {
        return reply_json(StatusCode::BAD_REQUEST, EMPTY_PROMPT_REPLY);
    }

    info!(message = %message, "chat message received");

    // Clock questions, bare greetings, and "how are you" never reach the
    // turn manager
    if let Some(reply) = quick_reply(message) {
        return reply_json(StatusCode::OK, reply);
    }

    let reply = match &state.turns {
        Some(turns) => turns.respond_to(message).await,
        None => UNAVAILABLE_REPLY.to_string(),
    };
    reply_json(StatusCode::OK, reply)
}

/// Model and conversation status
pub async fn status(State(state): State<AppState>) -> Json<serde_json::Value> {
    let conversation_tokens = match &state.turns {
        Some(turns) => turns.context_tokens().await,
        None => 0,
    };

    Json(json!({
        "chat_model": state
            .turns
            .as_ref()
            .map(|t| t.model_name())
            .unwrap_or_else(|| "Not loaded".to_string()),
        "model_loaded": state.turns.is_some(),
        "image_model": if state.intake.classifier_loaded() { "Loaded" } else { "Not loaded" },
        "text_model": if state.intake.summarizer_loaded() { "Loaded" } else { "Not loaded" },
        "conversation_tokens": conversation_tokens,
        "status": if state.turns.is_some() { "ready" } else { "not ready" },
    }))
}

/// Clear the conversation history
pub async fn reset(State(state): State<AppState>) -> Json<serde_json::Value> {
    if let Some(turns) = &state.turns {
        turns.reset().await;
    }
    info!("conversation history reset");
    Json(json!({
        "status": "Conversation history cleared",
        "message": "Let's start fresh! What would you like to talk about?",
    }))
}

/// Run one fixed turn to check the generation path end to end
pub async fn test_generation(State(state): State<AppState>) -> Response {
    match &state.turns {
        Some(turns) => {
            let test_response = turns.respond_to("Hello").await;
            Json(json!({
                "status": "ok",
                "test_response": test_response,
                "model": turns.model_name(),
            }))
            .into_response()
        }
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "error", "message": "Model not loaded" })),
        )
            .into_response(),
    }
}
