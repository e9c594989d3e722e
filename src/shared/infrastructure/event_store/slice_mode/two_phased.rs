// For stores that cannot put a slice key and the head key in one transaction.
//
// Phase 1 writes the slice (write-once), phase 2 moves the head past it. When phase 2
// loses the head race, the slice is orphaned: readers never reach it because the head
// did not move. One conditional delete is attempted to remove it; if that fails too it
// stays behind. Any other phase 2 failure may have committed the head, so the slice is
// kept.

use super::{PersistRequest, StoreContext};
use crate::shared::core::errors::EventStoreError;
use crate::shared::infrastructure::state_store::{ETag, Expected, StateStore, StateStoreError};

pub(super) async fn persist<S: StateStore>(
    ctx: &StoreContext<S>,
    request: PersistRequest,
) -> Result<(), EventStoreError> {
    let version = request.head.version;
    let slice_etag = ctx
        .client
        .save_state(
            &ctx.store_name,
            &request.slice_key,
            serde_json::to_value(&request.events)?,
            Expected::from_token(request.slice_etag.clone()),
            &ctx.metadata,
        )
        .await
        .map_err(|error| ctx.write_error(error, version))?;

    let head_value = serde_json::to_value(request.head)?;
    match ctx
        .client
        .save_state(
            &ctx.store_name,
            &ctx.head_key,
            head_value,
            Expected::from_token(request.head_etag),
            &ctx.metadata,
        )
        .await
    {
        Ok(_) => Ok(()),
        Err(StateStoreError::ETagMismatch { key }) if key == ctx.head_key => {
            remove_orphan(ctx, &request.slice_key, slice_etag).await;
            Err(ctx.write_error(StateStoreError::ETagMismatch { key }, version))
        }
        Err(error) => {
            tracing::warn!(
                stream = %ctx.stream_name,
                slice_key = %request.slice_key,
                %error,
                "head update outcome unknown, keeping slice"
            );
            Err(ctx.write_error(error, version))
        }
    }
}

async fn remove_orphan<S: StateStore>(ctx: &StoreContext<S>, slice_key: &str, etag: ETag) {
    match ctx
        .client
        .delete_state(&ctx.store_name, slice_key, Expected::ETag(etag), &ctx.metadata)
        .await
    {
        Ok(()) => tracing::debug!(stream = %ctx.stream_name, %slice_key, "removed orphan slice"),
        Err(error) => tracing::warn!(
            stream = %ctx.stream_name,
            %slice_key,
            %error,
            "orphan slice left behind after head update failed"
        ),
    }
}
