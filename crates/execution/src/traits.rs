use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use payloadscan_types::ExecutionBlock;

use crate::error::ExecutionClientError;

#[async_trait]
#[auto_impl::auto_impl(Arc)]
pub trait ExecutionClientTrait: Send + Sync {
    /// `Ok(None)` if the node doesn't know the block.
    async fn get_block_by_hash(
        &self,
        hash: B256,
        full_transactions: bool,
    ) -> Result<Option<ExecutionBlock>, ExecutionClientError>;

    /// Canonical block at `number`, `Ok(None)` if the chain isn't that long yet.
    async fn get_block_by_number(
        &self,
        number: u64,
        full_transactions: bool,
    ) -> Result<Option<ExecutionBlock>, ExecutionClientError>;

    /// Balance of `address` after block `number` was applied.
    async fn get_balance(&self, address: Address, number: u64) -> Result<U256, ExecutionClientError>;

    fn get_uri(&self) -> String;
}
