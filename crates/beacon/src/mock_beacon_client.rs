use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use parking_lot::RwLock;
use payloadscan_types::Slot;

use crate::{
    error::{ApiError, BeaconClientError},
    traits::BeaconClientTrait,
    types::{BeaconBlockHeader, BeaconHeader, SignedBeaconBlockHeader, SyncStatus},
};

/// In-memory beacon client. Every slot has a block unless marked missed or failing.
#[derive(Clone, Default)]
pub struct MockBeaconClient {
    sync_status: SyncStatus,
    missed_slots: Arc<RwLock<HashSet<Slot>>>,
    failing_slots: Arc<RwLock<HashSet<Slot>>>,
    header_calls: Arc<AtomicUsize>,
}

impl MockBeaconClient {
    pub fn new() -> Self {
        Self {
            sync_status: SyncStatus { head_slot: 10, sync_distance: 0, is_syncing: false },
            ..Default::default()
        }
    }

    pub fn with_sync_status(mut self, sync_status: SyncStatus) -> Self {
        self.sync_status = sync_status;
        self
    }

    pub fn with_missed_slot(self, slot: Slot) -> Self {
        self.missed_slots.write().insert(slot);
        self
    }

    /// Requests for `slot` fail with an internal error that isn't a missed slot.
    pub fn with_failing_slot(self, slot: Slot) -> Self {
        self.failing_slots.write().insert(slot);
        self
    }

    pub fn header_calls(&self) -> usize {
        self.header_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl BeaconClientTrait for MockBeaconClient {
    async fn sync_status(&self) -> Result<SyncStatus, BeaconClientError> {
        Ok(self.sync_status.clone())
    }

    async fn header_for_slot(&self, slot: Slot) -> Result<BeaconHeader, BeaconClientError> {
        self.header_calls.fetch_add(1, Ordering::Relaxed);

        if self.missed_slots.read().contains(&slot) {
            return Err(BeaconClientError::BlockNotFound { slot })
        }
        if self.failing_slots.read().contains(&slot) {
            return Err(BeaconClientError::Api(ApiError::ErrorMessage {
                code: 500,
                message: "internal error".to_string(),
            }))
        }

        Ok(BeaconHeader {
            canonical: true,
            header: SignedBeaconBlockHeader {
                message: BeaconBlockHeader { slot, ..Default::default() },
                ..Default::default()
            },
            ..Default::default()
        })
    }

    fn get_uri(&self) -> String {
        "mock://beacon".to_string()
    }
}
