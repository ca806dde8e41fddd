use std::time::Instant;

use axum::Json;
use axum::extract::{Query, State};
use ghostwriter_core::SharedState;
use ghostwriter_llm::{build_prompt, default_question};
use ghostwriter_utils::text::log_preview;
use serde::Serialize;
use tracing::debug;

use crate::RouteMeta;
use crate::error::ApiError;

pub const META: RouteMeta = RouteMeta {
    method: "GET",
    path: "/api/bot",
    desc: "Answer `message` in the persona's voice (defaults to a general question)",
};

#[derive(Debug, Serialize)]
pub struct BotResponse {
    pub message: String,
}

/// The first `message` parameter. Repeats are ignored rather than rejected.
pub fn first_message(params: Vec<(String, String)>) -> Option<String> {
    params
        .into_iter()
        .find(|(key, _)| key == "message")
        .map(|(_, value)| value)
}

/// The caller's question, or the default one when it is absent or blank.
pub fn resolve_question(message: Option<String>) -> String {
    message
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(default_question)
}

pub async fn bot(
    State(state): State<SharedState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<BotResponse>, ApiError> {
    let question = resolve_question(first_message(params));
    let messages = build_prompt(&question, &state.system_prompt);

    let started = Instant::now();
    let reply = state.llm.complete(&messages).await?;

    debug!(
        question = %log_preview(&question, 120),
        elapsed_ms = started.elapsed().as_millis() as u64,
        reply_chars = reply.chars().count(),
        "question answered"
    );

    Ok(Json(BotResponse { message: reply }))
}
