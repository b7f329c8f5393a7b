//! HTTP request handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use robata::{PromptTemplate, SubmitError, TextBatcher};

/// Shared application state, injected into every handler.
pub struct AppState {
    pub batcher: Arc<dyn TextBatcher>,
    pub template: PromptTemplate,
    /// Per-request completion-gate wait budget; past it the client gets 408
    /// while the batch keeps running to completion.
    pub wait_timeout: Duration,
}

impl AppState {
    pub fn new(
        batcher: Arc<dyn TextBatcher>,
        template: PromptTemplate,
        wait_timeout: Duration,
    ) -> Self {
        Self {
            batcher,
            template,
            wait_timeout,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct InferenceRequest {
    #[serde(default)]
    pub input_text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InferenceResponse {
    pub generated_text: String,
    pub num_input_tokens: usize,
    pub num_output_tokens: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Single text-inference endpoint.
///
/// Validates the input, enqueues it, then parks on the completion gate up
/// to the configured wait budget.
pub async fn inference(
    State(state): State<Arc<AppState>>,
    Json(request): Json<InferenceRequest>,
) -> Response {
    let input = request.input_text.unwrap_or_default();
    if input.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Please provide input_text");
    }

    let ticket = match state.batcher.submit(&input).await {
        Ok(ticket) => ticket,
        Err(SubmitError::QueueFull { .. }) => {
            return error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "Server overloaded, retry later",
            );
        }
        Err(SubmitError::Closed) => {
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Inference engine stopped");
        }
    };

    match ticket.wait(state.wait_timeout).await {
        Err(_elapsed) => error_response(StatusCode::REQUEST_TIMEOUT, "Inference timeout"),
        Ok(Err(failure)) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &failure.to_string())
        }
        Ok(Ok(generation)) => {
            let generated_text = state.template.extract_response(&generation.text).to_string();
            (
                StatusCode::OK,
                Json(InferenceResponse {
                    generated_text,
                    num_input_tokens: generation.input_tokens,
                    num_output_tokens: generation.output_tokens,
                }),
            )
                .into_response()
        }
    }
}
