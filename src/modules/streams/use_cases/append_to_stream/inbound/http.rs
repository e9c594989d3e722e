use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::shared::core::event_data::EventData;
use crate::shell::http::status_for;
use crate::shell::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEventBody {
    pub event_name: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendToStreamBody {
    pub expected_version: Option<u64>,
    pub events: Vec<NewEventBody>,
}

#[derive(Serialize)]
pub struct AppendToStreamResponse {
    pub version: u64,
}

pub async fn handle(
    State(state): State<AppState>,
    Path(stream_name): Path<String>,
    body: Result<Json<AppendToStreamBody>, JsonRejection>,
) -> impl IntoResponse {
    let Json(body) = match body {
        Ok(b) => b,
        Err(_) => return StatusCode::UNPROCESSABLE_ENTITY.into_response(),
    };

    let events: Vec<EventData> = body
        .events
        .into_iter()
        .map(|e| EventData::for_stream(e.event_name, stream_name.clone(), e.data))
        .collect();

    let result = match body.expected_version {
        Some(expected) => {
            state
                .event_store
                .append_to_stream_expecting(&stream_name, expected, &events)
                .await
        }
        None => state.event_store.append_to_stream(&stream_name, &events).await,
    };

    match result {
        Ok(version) => (StatusCode::CREATED, Json(AppendToStreamResponse { version })).into_response(),
        Err(error) => {
            tracing::info!(stream = %stream_name, %error, "append request failed");
            status_for(&error).into_response()
        }
    }
}
