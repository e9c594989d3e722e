use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::shell::http::status_for;
use crate::shell::state::AppState;

pub async fn handle(
    State(state): State<AppState>,
    Path(stream_name): Path<String>,
) -> impl IntoResponse {
    match state.event_store.stream_head(&stream_name).await {
        Ok(Some(head)) => (StatusCode::OK, Json(head)).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(error) => status_for(&error).into_response(),
    }
}
