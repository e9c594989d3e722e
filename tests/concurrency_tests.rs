// Concurrent appends race on the head ETag; the store settles who wins.

mod fixtures;

use event_slices::shared::core::concurrency::Concurrency;
use event_slices::shared::core::errors::{Conflict, EventStoreError};
use event_slices::shared::core::event_data::EventData;
use event_slices::shared::core::stream_head::StreamHead;
use event_slices::shared::infrastructure::event_store::slice_mode::SliceMode;
use fixtures::{STORE_NAME, make_customer_events, make_customer_events_from, make_store};
use futures_util::TryStreamExt;
use rstest::rstest;
use tokio::join;

const STREAM: &str = "customer";

#[rstest]
#[tokio::test]
async fn it_should_let_exactly_one_matching_append_win(
    #[values(SliceMode::Off, SliceMode::OffAndSharedAll, SliceMode::TwoPhased, SliceMode::Transactional)]
    mode: SliceMode,
) {
    let (state, store) = make_store(mode, 100);
    state.set_delay_ms(10);
    let first = make_customer_events(2);
    let second = make_customer_events_from(2, 2);
    let (result1, result2) = join!(
        store.append_to_stream_expecting(STREAM, 0, &first),
        store.append_to_stream_expecting(STREAM, 0, &second)
    );
    assert!(
        result1.is_ok() ^ result2.is_ok(),
        "exactly one should fail with conflict"
    );
    let err = result1.as_ref().err().or(result2.as_ref().err()).unwrap();
    match mode {
        // the loser may collide on the slice key in phase 1, before the head is touched
        SliceMode::TwoPhased => assert!(
            matches!(
                err,
                EventStoreError::ConcurrencyConflict { .. } | EventStoreError::DuplicateAppend { .. }
            ),
            "unexpected error: {err:?}"
        ),
        _ => assert!(err.is_concurrency_conflict(), "unexpected error: {err:?}"),
    }

    state.set_delay_ms(0);
    assert_eq!(store.stream_head(STREAM).await.unwrap(), Some(StreamHead::new(2)));
    let loaded: Vec<EventData> = store.load_event_stream(STREAM, 1).try_collect().await.unwrap();
    let winner = if result1.is_ok() { &first } else { &second };
    let ids: Vec<&str> = loaded.iter().map(|e| e.event_id.as_str()).collect();
    let winner_ids: Vec<&str> = winner.iter().map(|e| e.event_id.as_str()).collect();
    assert_eq!(ids, winner_ids);
}

#[rstest]
#[tokio::test]
async fn it_should_reject_a_match_on_a_version_the_caller_did_not_observe(
    #[values(SliceMode::Off, SliceMode::Transactional)] mode: SliceMode,
) {
    let (_, store) = make_store(mode, 100);
    store.append_to_stream(STREAM, &make_customer_events(3)).await.unwrap();
    let result = store
        .append_with_guard(STREAM, &Concurrency::Match(2), &make_customer_events(1))
        .await;
    match result {
        Err(EventStoreError::ConcurrencyConflict { stream, conflict }) => {
            assert_eq!(stream, STREAM);
            assert_eq!(
                conflict,
                Conflict::VersionMismatch {
                    expected: 2,
                    actual: 3
                }
            );
        }
        other => panic!("expected ConcurrencyConflict, got {other:?}"),
    }
}

#[rstest]
#[tokio::test]
async fn it_should_give_blind_appends_successive_ranges(
    #[values(SliceMode::Off, SliceMode::OffAndSharedAll, SliceMode::TwoPhased, SliceMode::Transactional)]
    mode: SliceMode,
) {
    let (_, store) = make_store(mode, 100);
    store.append_to_stream(STREAM, &make_customer_events(1)).await.unwrap();
    let first = store
        .append_with_guard(STREAM, &Concurrency::Ignore, &make_customer_events_from(1, 2))
        .await
        .unwrap();
    let second = store
        .append_with_guard(STREAM, &Concurrency::Ignore, &make_customer_events_from(3, 3))
        .await
        .unwrap();
    assert_eq!(first, 3);
    assert_eq!(second, 6);
    let loaded: Vec<EventData> = store.load_event_stream(STREAM, 1).try_collect().await.unwrap();
    let versions: Vec<u64> = loaded.iter().map(|e| e.version).collect();
    assert_eq!(versions, vec![1, 2, 3, 4, 5, 6]);
}

#[rstest]
#[tokio::test]
async fn it_should_remove_the_orphan_slice_when_the_head_update_loses() {
    let (state, store) = make_store(SliceMode::TwoPhased, 100);
    state.set_delay_ms(10);
    let events1 = make_customer_events(2);
    let events2 = make_customer_events_from(2, 3);
    let (result1, result2) = join!(
        store.append_to_stream(STREAM, &events1),
        store.append_to_stream(STREAM, &events2)
    );
    assert!(result1.is_ok() ^ result2.is_ok());
    let loser = result1.as_ref().err().or(result2.as_ref().err()).unwrap();
    assert!(loser.is_concurrency_conflict(), "unexpected error: {loser:?}");

    state.set_delay_ms(0);
    let winner_version = result1.or(result2).unwrap();
    assert_eq!(
        state.keys(STORE_NAME).await,
        vec![format!("{STREAM}|{winner_version}"), format!("{STREAM}|head")]
    );
    let loaded: Vec<EventData> = store.load_event_stream(STREAM, 1).try_collect().await.unwrap();
    assert_eq!(loaded.len() as u64, winner_version);
}

#[rstest]
#[tokio::test]
async fn it_should_leave_the_stream_untouched_when_a_transaction_loses(
    #[values(SliceMode::Off, SliceMode::OffAndSharedAll, SliceMode::Transactional)] mode: SliceMode,
) {
    let (state, store) = make_store(mode, 100);
    state.set_delay_ms(10);
    let events1 = make_customer_events(2);
    let events2 = make_customer_events_from(2, 3);
    let (result1, result2) = join!(
        store.append_to_stream(STREAM, &events1),
        store.append_to_stream(STREAM, &events2)
    );
    assert!(result1.is_ok() ^ result2.is_ok());
    let loser = result1.as_ref().err().or(result2.as_ref().err()).unwrap();
    assert!(loser.is_concurrency_conflict(), "unexpected error: {loser:?}");

    state.set_delay_ms(0);
    let winner_version = result1.or(result2).unwrap();
    let loaded: Vec<EventData> = store.load_event_stream(STREAM, 1).try_collect().await.unwrap();
    assert_eq!(loaded.len() as u64, winner_version);
    // the head plus only the winner's records
    let expected_keys = match mode {
        SliceMode::Transactional => 2,
        _ => winner_version as usize + 1,
    };
    assert_eq!(state.keys(STORE_NAME).await.len(), expected_keys);
}
