use async_trait::async_trait;
use payloadscan_types::Slot;

use crate::{
    error::BeaconClientError,
    types::{BeaconHeader, SyncStatus},
};

#[async_trait]
#[auto_impl::auto_impl(Arc)]
pub trait BeaconClientTrait: Send + Sync {
    async fn sync_status(&self) -> Result<SyncStatus, BeaconClientError>;

    /// Header of the block proposed at `slot`. Fails with an error for which
    /// [`BeaconClientError::is_not_found`] holds if the slot was missed.
    async fn header_for_slot(&self, slot: Slot) -> Result<BeaconHeader, BeaconClientError>;

    fn get_uri(&self) -> String;
}
