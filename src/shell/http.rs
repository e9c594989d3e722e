use axum::{
    Router,
    http::StatusCode,
    routing::{get, post},
};

use crate::modules::streams::use_cases::append_to_stream::inbound::http as append_http;
use crate::modules::streams::use_cases::get_stream_head::inbound::http as head_http;
use crate::modules::streams::use_cases::load_event_stream::inbound::http as load_http;
use crate::shared::core::errors::EventStoreError;
use crate::shell::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/streams/{stream}/events",
            post(append_http::handle).get(load_http::handle),
        )
        .route("/streams/{stream}/head", get(head_http::handle))
        .with_state(state)
}

pub fn status_for(error: &EventStoreError) -> StatusCode {
    match error {
        EventStoreError::ConcurrencyConflict { .. } | EventStoreError::DuplicateAppend { .. } => {
            StatusCode::CONFLICT
        }
        EventStoreError::InvalidStreamName(_) => StatusCode::BAD_REQUEST,
        EventStoreError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod shell_http_tests {
    use super::*;
    use crate::shared::core::errors::Conflict;
    use axum::body::Body;
    use axum::http::Request;
    use rstest::rstest;
    use tower::ServiceExt;

    #[rstest]
    #[case(EventStoreError::ConcurrencyConflict { stream: "s".into(), conflict: Conflict::VersionMismatch { expected: 0, actual: 1 } }, StatusCode::CONFLICT)]
    #[case(EventStoreError::DuplicateAppend { key: "s|1".into(), version: 1 }, StatusCode::CONFLICT)]
    #[case(EventStoreError::InvalidStreamName("".into()), StatusCode::BAD_REQUEST)]
    #[case(EventStoreError::StorageUnavailable("down".into()), StatusCode::SERVICE_UNAVAILABLE)]
    #[case(EventStoreError::Corrupted { key: "s|1".into() }, StatusCode::INTERNAL_SERVER_ERROR)]
    fn it_should_map_errors_to_status_codes(#[case] error: EventStoreError, #[case] status: StatusCode) {
        assert_eq!(status_for(&error), status);
    }

    #[tokio::test]
    async fn it_should_route_appends_and_loads_on_the_same_path() {
        let state = AppState::in_memory(Default::default());
        let app = router(state);
        let response = app
            .clone()
            .oneshot(
                Request::post("/streams/customer/events")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"events":[{"eventName":"CREATE-CUSTOMER"}]}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let response = app
            .oneshot(Request::get("/streams/customer/head").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
