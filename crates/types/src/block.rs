use alloy_primitives::{Address, B256, U256};

/// The subset of an execution block the payload value check reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionBlock {
    pub number: u64,
    pub hash: B256,
    /// Coinbase / fee recipient of the block.
    pub miner: Address,
    pub uncles: Vec<B256>,
    /// Empty when the block was fetched without transaction bodies.
    pub transactions: Vec<ExecutionTransaction>,
}

impl ExecutionBlock {
    pub fn has_uncle(&self, hash: &B256) -> bool {
        self.uncles.contains(hash)
    }

    /// Last transaction of the block, `None` if the block is empty or was fetched without
    /// transaction bodies.
    pub fn last_transaction(&self) -> Option<&ExecutionTransaction> {
        self.transactions.last()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionTransaction {
    pub hash: B256,
    pub from: Address,
    /// `None` for contract creations.
    pub to: Option<Address>,
    pub value: U256,
}
