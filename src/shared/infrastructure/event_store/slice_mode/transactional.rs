// The whole batch goes under one slice key, committed in the same transaction as the head.

use super::{PersistRequest, StoreContext};
use crate::shared::core::errors::EventStoreError;
use crate::shared::infrastructure::state_store::{Expected, StateOperation, StateStore};

pub(super) async fn persist<S: StateStore>(
    ctx: &StoreContext<S>,
    request: PersistRequest,
) -> Result<(), EventStoreError> {
    let operations = vec![
        request.head_operation(&ctx.head_key)?,
        StateOperation::Upsert {
            key: request.slice_key.clone(),
            value: serde_json::to_value(&request.events)?,
            expected: Expected::from_token(request.slice_etag.clone()),
        },
    ];
    ctx.client
        .execute_transaction(&ctx.store_name, operations, &ctx.metadata)
        .await
        .map_err(|error| ctx.write_error(error, request.head.version))
}
