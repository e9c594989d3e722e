// One key per event, `<stream>|<version>`, committed in the same transaction as the head.
// Reads are bulk point lookups, one page of versions at a time.

use super::{EventStream, PersistRequest, StoreContext, decode};
use crate::shared::core::errors::EventStoreError;
use crate::shared::core::event_data::EventData;
use crate::shared::core::naming;
use crate::shared::core::stream_head::StreamHead;
use crate::shared::infrastructure::state_store::{Expected, StateOperation, StateStore};
use futures_util::{StreamExt, TryStreamExt, stream};

pub(super) async fn persist<S: StateStore>(
    ctx: &StoreContext<S>,
    request: PersistRequest,
) -> Result<(), EventStoreError> {
    let mut operations = Vec::with_capacity(request.events.len() + 1);
    operations.push(request.head_operation(&ctx.head_key)?);
    for event in &request.events {
        operations.push(StateOperation::Upsert {
            key: naming::stream_key(&ctx.stream_name, event.version)?,
            value: serde_json::to_value(event)?,
            expected: Expected::Absent,
        });
    }
    ctx.client
        .execute_transaction(&ctx.store_name, operations, &ctx.metadata)
        .await
        .map_err(|error| ctx.write_error(error, request.head.version))
}

pub(super) fn read<S: StateStore + 'static>(
    ctx: StoreContext<S>,
    head: StreamHead,
    from_version: u64,
) -> EventStream {
    stream::try_unfold((ctx, from_version.max(1)), move |(ctx, next)| {
        next_page(ctx, next, head)
    })
    .map_ok(|events| stream::iter(events.into_iter().map(Ok::<_, EventStoreError>)))
    .try_flatten()
    .boxed()
}

type Page<S> = Option<(Vec<EventData>, (StoreContext<S>, u64))>;

async fn next_page<S: StateStore>(
    ctx: StoreContext<S>,
    next: u64,
    head: StreamHead,
) -> Result<Page<S>, EventStoreError> {
    if next > head.version {
        return Ok(None);
    }
    let page = ctx.read_page_size.max(1) as u64;
    let last = next.saturating_add(page - 1).min(head.version);
    let keys = (next..=last)
        .map(|version| naming::stream_key(&ctx.stream_name, version))
        .collect::<Result<Vec<_>, _>>()?;
    let items = ctx
        .client
        .get_bulk_state(&ctx.store_name, &keys, &ctx.metadata)
        .await?;
    let events = items
        .into_iter()
        .map(|item| match item.value {
            Some(value) => decode::<EventData>(&item.key, value),
            None => Err(EventStoreError::Corrupted { key: item.key }),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some((events, (ctx, last + 1))))
}
