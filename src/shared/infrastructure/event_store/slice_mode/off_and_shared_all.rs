// One key per event addressed by event id. Nothing positional is written besides the
// head, so reads ask the store for the records whose `streamName` matches and whose
// version lies in [from, head], sorted by version and paged by the store's
// continuation token.

use super::{EventStream, PersistRequest, StoreContext, decode};
use crate::shared::core::errors::EventStoreError;
use crate::shared::core::event_data::EventData;
use crate::shared::core::naming;
use crate::shared::core::stream_head::StreamHead;
use crate::shared::infrastructure::state_store::{
    Expected, QueryFilter, QuerySort, SortOrder, StateOperation, StateQuery, StateStore,
};
use futures_util::{StreamExt, TryStreamExt, stream};
use serde_json::Value;

pub(super) async fn persist<S: StateStore>(
    ctx: &StoreContext<S>,
    request: PersistRequest,
) -> Result<(), EventStoreError> {
    let mut operations = Vec::with_capacity(request.events.len() + 1);
    operations.push(request.head_operation(&ctx.head_key)?);
    for event in &request.events {
        operations.push(StateOperation::Upsert {
            key: naming::shared_event_key(&ctx.stream_name, &event.event_id)?,
            value: serde_json::to_value(event)?,
            expected: Expected::Absent,
        });
    }
    ctx.client
        .execute_transaction(&ctx.store_name, operations, &ctx.metadata)
        .await
        .map_err(|error| ctx.write_error(error, request.head.version))
}

enum Cursor {
    Start,
    Next(String),
    Done,
}

pub(super) fn read<S: StateStore + 'static>(
    ctx: StoreContext<S>,
    head: StreamHead,
    from_version: u64,
) -> EventStream {
    stream::try_unfold((ctx, Cursor::Start), move |(ctx, cursor)| {
        next_page(ctx, cursor, head, from_version.max(1))
    })
    .map_ok(|events| stream::iter(events.into_iter().map(Ok::<_, EventStoreError>)))
    .try_flatten()
    .boxed()
}

fn stream_query<S>(
    ctx: &StoreContext<S>,
    head: StreamHead,
    from_version: u64,
    token: Option<String>,
) -> StateQuery {
    StateQuery {
        // records past the head belong to an append this read did not observe
        filter: QueryFilter::And(vec![
            QueryFilter::Eq {
                field: "streamName".into(),
                value: Value::String(ctx.stream_name.clone()),
            },
            QueryFilter::Gte {
                field: "version".into(),
                value: Value::from(from_version),
            },
            QueryFilter::Lte {
                field: "version".into(),
                value: Value::from(head.version),
            },
        ]),
        sort: vec![QuerySort {
            field: "version".into(),
            order: SortOrder::Asc,
        }],
        limit: Some(ctx.read_page_size.max(1)),
        token,
    }
}

type Page<S> = Option<(Vec<EventData>, (StoreContext<S>, Cursor))>;

async fn next_page<S: StateStore>(
    ctx: StoreContext<S>,
    cursor: Cursor,
    head: StreamHead,
    from_version: u64,
) -> Result<Page<S>, EventStoreError> {
    let token = match cursor {
        Cursor::Done => return Ok(None),
        Cursor::Start => None,
        Cursor::Next(token) => Some(token),
    };
    let response = ctx
        .client
        .query_state(
            &ctx.store_name,
            &stream_query(&ctx, head, from_version, token),
            &ctx.metadata,
        )
        .await?;
    let events = response
        .results
        .into_iter()
        .map(|item| decode::<EventData>(&item.key, item.value))
        .collect::<Result<Vec<_>, _>>()?;
    let cursor = match response.token {
        Some(token) => Cursor::Next(token),
        None => Cursor::Done,
    };
    Ok(Some((events, (ctx, cursor))))
}
