use std::sync::Arc;

use alloy_primitives::U256;
use payloadscan_beacon::MockBeaconClient;
use payloadscan_common::VerifierConfig;
use payloadscan_database::MockDatabaseService;
use payloadscan_execution::{MockExecutionClient, MultiExecutionClient};
use payloadscan_types::{
    test_utils::{
        get_block_hash, get_execution_block, get_fixed_builder_coinbase, get_fixed_fee_recipient,
    },
    ExecutionBlock,
};

use crate::orchestrator::{PayloadValueChecker, RecordVerifier};

pub const NUMBER: u64 = 18_000_000;
pub const ONE_ETH: &str = "1000000000000000000";

pub fn wei(s: &str) -> U256 {
    U256::from_str_radix(s, 10).unwrap()
}

/// A block with hash `get_block_hash(hash)` that isn't canonical at `number`.
pub fn orphan_block(number: u64, hash: u8) -> ExecutionBlock {
    get_execution_block(number, get_block_hash(hash), get_fixed_builder_coinbase(), &[])
}

/// Canonical block `number` built by the proposer itself, whose fee recipient balance grows by
/// `delivered` wei in it. The block carries one unrelated transaction.
pub fn paid_execution(number: u64, hash: u8, delivered: &str) -> MockExecutionClient {
    let base = wei("5000000000000000000");
    MockExecutionClient::new()
        .with_canonical_block(get_execution_block(
            number,
            get_block_hash(hash),
            get_fixed_fee_recipient(),
            &[U256::from(21_000)],
        ))
        .with_balance(get_fixed_fee_recipient(), number - 1, base)
        .with_balance(get_fixed_fee_recipient(), number, base + wei(delivered))
}

fn multi_execution(execution: MockExecutionClient) -> Arc<MultiExecutionClient<MockExecutionClient>> {
    Arc::new(MultiExecutionClient::new(vec![Arc::new(execution)]).unwrap())
}

pub fn record_verifier(
    beacon: MockBeaconClient,
    execution: MockExecutionClient,
) -> RecordVerifier<MockBeaconClient, MockExecutionClient> {
    RecordVerifier::new(Arc::new(beacon), multi_execution(execution))
}

pub fn value_checker(
    db: MockDatabaseService,
    beacon: MockBeaconClient,
    execution: MockExecutionClient,
    config: VerifierConfig,
) -> PayloadValueChecker<MockDatabaseService, MockBeaconClient, MockExecutionClient> {
    PayloadValueChecker::new(Arc::new(db), Arc::new(beacon), multi_execution(execution), config)
}
