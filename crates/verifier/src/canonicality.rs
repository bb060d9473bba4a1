use std::sync::Arc;

use alloy_primitives::B256;
use payloadscan_beacon::BeaconClientTrait;
use payloadscan_execution::ExecutionClientTrait;
use payloadscan_types::{DeliveredPayloadRecord, ExecutionBlock};
use tracing::{debug, info, warn};

use crate::error::VerificationError;

/// Number of blocks after an orphaned block searched for an uncle reference to it.
pub const UNCLE_SCAN_DEPTH: u64 = 7;

/// Where the claimed block ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonResult {
    /// The beacon node has no block for the slot.
    SlotMissed,
    /// No execution node knows the claimed block hash.
    NotFound,
    /// The claimed block exists but another block is canonical at its height.
    Reorged { block: ExecutionBlock, canonical_hash: B256, was_uncled: bool },
    Canonical { block: ExecutionBlock },
}

pub struct CanonicalityChecker<B: BeaconClientTrait, E: ExecutionClientTrait> {
    beacon: Arc<B>,
    execution: Arc<E>,
}

impl<B: BeaconClientTrait, E: ExecutionClientTrait> CanonicalityChecker<B, E> {
    pub fn new(beacon: Arc<B>, execution: Arc<E>) -> Self {
        Self { beacon, execution }
    }

    pub async fn check(
        &self,
        record: &DeliveredPayloadRecord,
    ) -> Result<CanonResult, VerificationError> {
        if let Err(err) = self.beacon.header_for_slot(record.slot).await {
            if err.is_not_found() {
                warn!(slot = record.slot, "no block in beacon node, proposal probably missed");
                return Ok(CanonResult::SlotMissed)
            }
            return Err(err.into())
        }

        let Some(block) = self.execution.get_block_by_hash(record.block_hash, true).await? else {
            warn!(slot = record.slot, block_hash = %record.block_hash, "block not found on chain");
            return Ok(CanonResult::NotFound)
        };

        let block_number = block.number;
        if let Some(stored) = record.block_number.filter(|stored| *stored != block_number) {
            warn!(
                slot = record.slot,
                stored,
                block_number,
                "stored block number differs from the fetched block, using the block's"
            );
        }

        let canonical_hash = self
            .execution
            .get_block_by_number(block_number, false)
            .await?
            .map(|canonical| canonical.hash)
            .ok_or(VerificationError::CanonicalBlockNotFound {
                block_number,
                block_hash: record.block_hash,
            })?;

        if canonical_hash == block.hash {
            return Ok(CanonResult::Canonical { block })
        }

        warn!(
            slot = record.slot,
            block_number,
            block_hash = %block.hash,
            %canonical_hash,
            "block hash mismatch, checking for uncling"
        );
        let was_uncled = self.was_uncled(&block.hash, block_number).await;

        Ok(CanonResult::Reorged { block, canonical_hash, was_uncled })
    }

    /// Looks for `hash` in the uncle lists of the blocks following `block_number`. Blocks that
    /// can't be fetched are skipped.
    async fn was_uncled(&self, hash: &B256, block_number: u64) -> bool {
        for number in block_number + 1..=block_number + UNCLE_SCAN_DEPTH {
            match self.execution.get_block_by_number(number, false).await {
                Ok(Some(next)) => {
                    debug!(number, uncles = next.uncles.len(), "checking uncles");
                    if next.has_uncle(hash) {
                        info!(number, %hash, "block was uncled");
                        return true
                    }
                }
                Ok(None) => debug!(number, "block not available yet"),
                Err(err) => warn!(number, ?err, "failed to get block by number"),
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use payloadscan_beacon::MockBeaconClient;
    use payloadscan_execution::MockExecutionClient;
    use payloadscan_types::test_utils::{
        get_block_hash, get_delivered_payload_record, get_execution_block,
        get_fixed_builder_coinbase,
    };

    use super::*;

    const SLOT: u64 = 7283130;
    const NUMBER: u64 = 18_000_000;

    fn block(number: u64, hash: u8) -> ExecutionBlock {
        get_execution_block(number, get_block_hash(hash), get_fixed_builder_coinbase(), &[])
    }

    fn checker(
        beacon: MockBeaconClient,
        execution: MockExecutionClient,
    ) -> CanonicalityChecker<MockBeaconClient, MockExecutionClient> {
        CanonicalityChecker::new(Arc::new(beacon), Arc::new(execution))
    }

    #[tokio::test]
    async fn test_missed_slot_skips_execution_calls() {
        let execution = MockExecutionClient::new().with_canonical_block(block(NUMBER, 1));
        let checker = checker(MockBeaconClient::new().with_missed_slot(SLOT), execution.clone());
        let record = get_delivered_payload_record(SLOT, NUMBER, get_block_hash(1), "1");

        assert_eq!(checker.check(&record).await.unwrap(), CanonResult::SlotMissed);
        assert_eq!(execution.block_calls(), 0);
    }

    #[tokio::test]
    async fn test_beacon_failure_is_an_error() {
        let checker =
            checker(MockBeaconClient::new().with_failing_slot(SLOT), MockExecutionClient::new());
        let record = get_delivered_payload_record(SLOT, NUMBER, get_block_hash(1), "1");

        assert!(matches!(checker.check(&record).await, Err(VerificationError::Beacon(_))));
    }

    #[tokio::test]
    async fn test_block_not_found() {
        let checker = checker(MockBeaconClient::new(), MockExecutionClient::new());
        let record = get_delivered_payload_record(SLOT, NUMBER, get_block_hash(1), "1");

        assert_eq!(checker.check(&record).await.unwrap(), CanonResult::NotFound);
    }

    #[tokio::test]
    async fn test_canonical_block_without_stored_number() {
        let execution = MockExecutionClient::new().with_canonical_block(block(NUMBER, 1));
        let checker = checker(MockBeaconClient::new(), execution);
        let mut record = get_delivered_payload_record(SLOT, NUMBER, get_block_hash(1), "1");
        record.block_number = None;

        match checker.check(&record).await.unwrap() {
            CanonResult::Canonical { block } => {
                assert_eq!(block.number, NUMBER);
                assert_eq!(block.hash, get_block_hash(1));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_stored_block_number_is_not_trusted() {
        // the record is one block off, the chain is queried at the fetched block's number
        let record = get_delivered_payload_record(SLOT, NUMBER + 1, get_block_hash(1), "1");

        let execution = MockExecutionClient::new().with_canonical_block(block(NUMBER, 1));
        let result = checker(MockBeaconClient::new(), execution).check(&record).await.unwrap();
        assert_eq!(result, CanonResult::Canonical { block: block(NUMBER, 1) });

        let execution = MockExecutionClient::new()
            .with_canonical_block(block(NUMBER, 1))
            .with_canonical_block(block(NUMBER + 1, 2));
        let result = checker(MockBeaconClient::new(), execution).check(&record).await.unwrap();
        assert_eq!(result, CanonResult::Canonical { block: block(NUMBER, 1) });
    }

    #[tokio::test]
    async fn test_missing_canonical_block_is_an_error() {
        let execution = MockExecutionClient::new().with_block(block(NUMBER, 1));
        let checker = checker(MockBeaconClient::new(), execution);
        let record = get_delivered_payload_record(SLOT, NUMBER, get_block_hash(1), "1");

        assert!(matches!(
            checker.check(&record).await,
            Err(VerificationError::CanonicalBlockNotFound { block_number: NUMBER, .. })
        ));
    }

    #[tokio::test]
    async fn test_reorged_block_found_in_uncles() {
        let mut uncle_ref = block(NUMBER + 3, 13);
        uncle_ref.uncles = vec![get_block_hash(1)];

        let execution = MockExecutionClient::new()
            .with_block(block(NUMBER, 1))
            .with_canonical_block(block(NUMBER, 2))
            .with_canonical_block(block(NUMBER + 1, 11))
            .with_failing_block_number(NUMBER + 2)
            .with_canonical_block(uncle_ref);
        let checker = checker(MockBeaconClient::new(), execution.clone());
        let record = get_delivered_payload_record(SLOT, NUMBER, get_block_hash(1), "1");

        match checker.check(&record).await.unwrap() {
            CanonResult::Reorged { canonical_hash, was_uncled, .. } => {
                assert_eq!(canonical_hash, get_block_hash(2));
                assert!(was_uncled);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        // by hash, by number, then +1 ..= +3
        assert_eq!(execution.block_calls(), 5);
    }

    #[tokio::test]
    async fn test_uncle_scan_is_bounded() {
        let mut late_uncle_ref = block(NUMBER + UNCLE_SCAN_DEPTH + 1, 20);
        late_uncle_ref.uncles = vec![get_block_hash(1)];

        let mut execution = MockExecutionClient::new()
            .with_block(block(NUMBER, 1))
            .with_canonical_block(block(NUMBER, 2))
            .with_canonical_block(late_uncle_ref);
        for i in 1..=UNCLE_SCAN_DEPTH {
            execution = execution.with_canonical_block(block(NUMBER + i, 100 + i as u8));
        }
        let checker = checker(MockBeaconClient::new(), execution.clone());
        let record = get_delivered_payload_record(SLOT, NUMBER, get_block_hash(1), "1");

        match checker.check(&record).await.unwrap() {
            CanonResult::Reorged { was_uncled, .. } => assert!(!was_uncled),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(execution.block_calls(), 2 + UNCLE_SCAN_DEPTH as usize);
    }
}
