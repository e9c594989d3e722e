// Reader for the sliced modes (Transactional, TwoPhased).
//
// Slices are keyed by their ending version only, so their boundaries are discovered
// walking backward from the head: the slice ending at `v` starts at `a`, the next one
// ends at `a - 1`. The walk stops at the slice covering `from_version`, then events
// are yielded forward. Nothing is fetched until the stream is first polled.

use super::{EventStream, StoreContext, decode};
use crate::shared::core::errors::EventStoreError;
use crate::shared::core::event_data::EventData;
use crate::shared::core::naming;
use crate::shared::core::stream_head::StreamHead;
use crate::shared::infrastructure::state_store::StateStore;
use futures_util::{StreamExt, TryStreamExt, stream};

pub(super) fn read<S: StateStore + 'static>(
    ctx: StoreContext<S>,
    head: StreamHead,
    from_version: u64,
) -> EventStream {
    stream::once(resolve(ctx, head, from_version.max(1)))
        .map_ok(|events| stream::iter(events.into_iter().map(Ok::<_, EventStoreError>)))
        .try_flatten()
        .boxed()
}

async fn resolve<S: StateStore>(
    ctx: StoreContext<S>,
    head: StreamHead,
    from_version: u64,
) -> Result<Vec<EventData>, EventStoreError> {
    let mut slices: Vec<Vec<EventData>> = Vec::new();
    let mut ending = head.version;
    while ending >= from_version {
        let key = naming::stream_key(&ctx.stream_name, ending)?;
        let (value, _) = ctx
            .client
            .get_state_and_etag(&ctx.store_name, &key, &ctx.metadata)
            .await?;
        let value = value.ok_or_else(|| EventStoreError::Corrupted { key: key.clone() })?;
        let slice: Vec<EventData> = decode(&key, value)?;
        let (first, last) = match (slice.first(), slice.last()) {
            (Some(first), Some(last)) => (first.version, last.version),
            _ => return Err(EventStoreError::Corrupted { key }),
        };
        if first == 0 || first > ending || last != ending {
            return Err(EventStoreError::Corrupted { key });
        }
        tracing::trace!(stream = %ctx.stream_name, first, last, "resolved slice");
        slices.push(slice);
        ending = first - 1;
    }
    Ok(slices
        .into_iter()
        .rev()
        .flatten()
        .filter(|event| event.version >= from_version)
        .collect())
}
