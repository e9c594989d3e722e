use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::TryStreamExt;
use serde::Deserialize;

use crate::shared::core::event_data::EventData;
use crate::shell::http::status_for;
use crate::shell::state::AppState;

#[derive(Deserialize)]
pub struct LoadEventStreamQuery {
    pub from: Option<u64>,
}

pub async fn handle(
    State(state): State<AppState>,
    Path(stream_name): Path<String>,
    Query(query): Query<LoadEventStreamQuery>,
) -> impl IntoResponse {
    let from = query.from.unwrap_or(1);
    let result: Result<Vec<EventData>, _> = state
        .event_store
        .load_event_stream(&stream_name, from)
        .try_collect()
        .await;
    match result {
        Ok(events) => (StatusCode::OK, Json(events)).into_response(),
        Err(error) => {
            tracing::info!(stream = %stream_name, %error, "load request failed");
            status_for(&error).into_response()
        }
    }
}
