use async_trait::async_trait;
use payloadscan_types::{DeliveredPayloadRecord, PayloadVerdict, SelectionPolicy};

use crate::error::DatabaseError;

#[async_trait]
#[auto_impl::auto_impl(Arc)]
pub trait DatabaseService: Send + Sync {
    /// Delivered payloads picked by `selection`, most recent slot first.
    async fn get_unverified_payloads(
        &self,
        selection: &SelectionPolicy,
    ) -> Result<Vec<DeliveredPayloadRecord>, DatabaseError>;

    /// Writes the verdict columns and the block number of the record identified by its relay
    /// and slot.
    async fn save_payload_verdict(
        &self,
        record: &DeliveredPayloadRecord,
        verdict: &PayloadVerdict,
    ) -> Result<(), DatabaseError>;
}
