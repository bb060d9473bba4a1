use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
};

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use parking_lot::RwLock;
use payloadscan_types::ExecutionBlock;

use crate::{error::ExecutionClientError, traits::ExecutionClientTrait};

/// In-memory execution node.
///
/// Blocks added with [`Self::with_block`] are only reachable by hash, canonical blocks are
/// reachable by hash and by number. Unknown balances are zero.
#[derive(Clone, Default)]
pub struct MockExecutionClient {
    blocks: Arc<RwLock<HashMap<B256, ExecutionBlock>>>,
    canonical: Arc<RwLock<HashMap<u64, B256>>>,
    balances: Arc<RwLock<HashMap<(Address, u64), U256>>>,
    failing_block_numbers: Arc<RwLock<HashSet<u64>>>,
    fail_blocks: Arc<AtomicBool>,
    fail_balances: Arc<AtomicBool>,
    block_calls: Arc<AtomicUsize>,
    balance_calls: Arc<AtomicUsize>,
}

impl MockExecutionClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_block(self, block: ExecutionBlock) -> Self {
        self.blocks.write().insert(block.hash, block);
        self
    }

    pub fn with_canonical_block(self, block: ExecutionBlock) -> Self {
        self.canonical.write().insert(block.number, block.hash);
        self.with_block(block)
    }

    pub fn with_balance(self, address: Address, number: u64, balance: U256) -> Self {
        self.balances.write().insert((address, number), balance);
        self
    }

    /// `eth_getBlockByNumber` for `number` fails.
    pub fn with_failing_block_number(self, number: u64) -> Self {
        self.failing_block_numbers.write().insert(number);
        self
    }

    pub fn with_failing_blocks(self) -> Self {
        self.fail_blocks.store(true, Ordering::Relaxed);
        self
    }

    pub fn with_failing_balances(self) -> Self {
        self.fail_balances.store(true, Ordering::Relaxed);
        self
    }

    pub fn block_calls(&self) -> usize {
        self.block_calls.load(Ordering::Relaxed)
    }

    pub fn balance_calls(&self) -> usize {
        self.balance_calls.load(Ordering::Relaxed)
    }

    fn rpc_error() -> ExecutionClientError {
        ExecutionClientError::Rpc { code: -32000, message: "mock failure".to_string() }
    }

    fn with_transactions(block: &ExecutionBlock, full_transactions: bool) -> ExecutionBlock {
        let mut block = block.clone();
        if !full_transactions {
            block.transactions.clear();
        }
        block
    }
}

#[async_trait]
impl ExecutionClientTrait for MockExecutionClient {
    async fn get_block_by_hash(
        &self,
        hash: B256,
        full_transactions: bool,
    ) -> Result<Option<ExecutionBlock>, ExecutionClientError> {
        self.block_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_blocks.load(Ordering::Relaxed) {
            return Err(Self::rpc_error())
        }

        Ok(self.blocks.read().get(&hash).map(|b| Self::with_transactions(b, full_transactions)))
    }

    async fn get_block_by_number(
        &self,
        number: u64,
        full_transactions: bool,
    ) -> Result<Option<ExecutionBlock>, ExecutionClientError> {
        self.block_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_blocks.load(Ordering::Relaxed) ||
            self.failing_block_numbers.read().contains(&number)
        {
            return Err(Self::rpc_error())
        }

        let Some(hash) = self.canonical.read().get(&number).copied() else { return Ok(None) };
        Ok(self.blocks.read().get(&hash).map(|b| Self::with_transactions(b, full_transactions)))
    }

    async fn get_balance(&self, address: Address, number: u64) -> Result<U256, ExecutionClientError> {
        self.balance_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_balances.load(Ordering::Relaxed) {
            return Err(Self::rpc_error())
        }

        Ok(self.balances.read().get(&(address, number)).copied().unwrap_or_default())
    }

    fn get_uri(&self) -> String {
        "mock://execution".to_string()
    }
}
