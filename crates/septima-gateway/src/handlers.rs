use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use septima_rag::{ChatMessage, GroupedResult, RagError, SourceRef};

use super::backend::ChatBackend;
use super::server::AppState;

#[derive(serde::Deserialize)]
pub(crate) struct ChatRequest {
    pub query: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub top_k_sermons: Option<usize>,
    #[serde(default)]
    pub top_k_paragraphs: Option<usize>,
}

#[derive(serde::Serialize)]
struct ChatResponse {
    success: bool,
    response: String,
    sources: Vec<SourceRef>,
}

#[derive(serde::Serialize)]
struct SearchResponse {
    sermons: Vec<GroupedResult>,
}

#[derive(serde::Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
}

fn error_response(err: &RagError) -> Response {
    let status = match err {
        RagError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        RagError::UpstreamUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        RagError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

pub(crate) async fn chat_handler<B: ChatBackend>(
    State(state): State<AppState<B>>,
    Json(req): Json<ChatRequest>,
) -> Response {
    tracing::info!(history = req.history.len(), "chat request");
    match state.backend.answer(&req.query, &req.history).await {
        Ok(answer) => Json(ChatResponse {
            success: true,
            response: answer.response,
            sources: answer.sources,
        })
        .into_response(),
        Err(e) => error_response(&e),
    }
}

pub(crate) async fn search_handler<B: ChatBackend>(
    State(state): State<AppState<B>>,
    Json(req): Json<SearchRequest>,
) -> Response {
    match state
        .backend
        .search(&req.query, req.top_k_paragraphs, req.top_k_sermons)
        .await
    {
        Ok(sermons) => Json(SearchResponse { sermons }).into_response(),
        Err(e) => error_response(&e),
    }
}

pub(crate) async fn health_handler<B: ChatBackend>(
    State(state): State<AppState<B>>,
) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}
