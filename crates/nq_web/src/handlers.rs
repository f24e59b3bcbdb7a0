use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

pub async fn query(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryRequest>,
) -> Response {
    if request.query.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "query must not be empty" })),
        )
            .into_response();
    }

    match state.processor.process_query(&request.query).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => {
            tracing::error!("❌ Query '{}' failed: {}", request.query, e);
            let primary = e
                .partial
                .as_ref()
                .and_then(|partial| partial.primary.as_ref())
                .map(|hit| hit.article.clone());
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string(), "primary": primary })),
            )
                .into_response()
        }
    }
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "articles": state.processor.index().len(),
    }))
}
