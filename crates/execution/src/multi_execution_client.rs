use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use payloadscan_types::ExecutionBlock;
use tracing::warn;

use crate::{error::ExecutionClientError, traits::ExecutionClientTrait};

/// Ordered list of execution endpoints: the primary first, then fallbacks.
///
/// A request moves on to the next endpoint only when the current one fails. A `None` result
/// is an answer and is returned as is.
#[derive(Clone)]
pub struct MultiExecutionClient<C: ExecutionClientTrait> {
    clients: Vec<Arc<C>>,
}

impl<C: ExecutionClientTrait> MultiExecutionClient<C> {
    pub fn new(clients: Vec<Arc<C>>) -> Result<Self, ExecutionClientError> {
        if clients.is_empty() {
            return Err(ExecutionClientError::NoClientAvailable)
        }
        Ok(Self { clients })
    }

    pub fn clients(&self) -> &[Arc<C>] {
        &self.clients
    }
}

#[async_trait]
impl<C: ExecutionClientTrait> ExecutionClientTrait for MultiExecutionClient<C> {
    async fn get_block_by_hash(
        &self,
        hash: B256,
        full_transactions: bool,
    ) -> Result<Option<ExecutionBlock>, ExecutionClientError> {
        let mut last_error = None;
        for client in &self.clients {
            match client.get_block_by_hash(hash, full_transactions).await {
                Ok(block) => return Ok(block),
                Err(err) => {
                    warn!(endpoint = client.get_uri(), %hash, ?err, "eth_getBlockByHash failed");
                    last_error = Some(err);
                }
            }
        }
        Err(last_error.unwrap_or(ExecutionClientError::NoClientAvailable))
    }

    async fn get_block_by_number(
        &self,
        number: u64,
        full_transactions: bool,
    ) -> Result<Option<ExecutionBlock>, ExecutionClientError> {
        let mut last_error = None;
        for client in &self.clients {
            match client.get_block_by_number(number, full_transactions).await {
                Ok(block) => return Ok(block),
                Err(err) => {
                    warn!(endpoint = client.get_uri(), number, ?err, "eth_getBlockByNumber failed");
                    last_error = Some(err);
                }
            }
        }
        Err(last_error.unwrap_or(ExecutionClientError::NoClientAvailable))
    }

    async fn get_balance(&self, address: Address, number: u64) -> Result<U256, ExecutionClientError> {
        let mut last_error = None;
        for client in &self.clients {
            match client.get_balance(address, number).await {
                Ok(balance) => return Ok(balance),
                Err(err) => {
                    warn!(endpoint = client.get_uri(), %address, number, ?err, "eth_getBalance failed");
                    last_error = Some(err);
                }
            }
        }
        Err(last_error.unwrap_or(ExecutionClientError::NoClientAvailable))
    }

    fn get_uri(&self) -> String {
        self.clients.iter().map(|client| client.get_uri()).collect::<Vec<_>>().join(",")
    }
}

#[cfg(test)]
mod tests {
    use payloadscan_types::test_utils::{get_block_hash, get_execution_block, get_fixed_fee_recipient};

    use super::*;
    use crate::mock_execution_client::MockExecutionClient;

    #[tokio::test]
    async fn test_falls_back_on_error() {
        let primary = Arc::new(MockExecutionClient::new().with_failing_balances());
        let secondary = Arc::new(
            MockExecutionClient::new().with_balance(get_fixed_fee_recipient(), 10, U256::from(5)),
        );
        let client = MultiExecutionClient::new(vec![primary.clone(), secondary.clone()]).unwrap();

        let balance = client.get_balance(get_fixed_fee_recipient(), 10).await.unwrap();

        assert_eq!(balance, U256::from(5));
        assert_eq!(primary.balance_calls(), 1);
        assert_eq!(secondary.balance_calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_block_is_not_retried() {
        let primary = Arc::new(MockExecutionClient::new());
        let secondary = Arc::new(MockExecutionClient::new().with_block(get_execution_block(
            1,
            get_block_hash(1),
            get_fixed_fee_recipient(),
            &[],
        )));
        let client = MultiExecutionClient::new(vec![primary, secondary.clone()]).unwrap();

        let block = client.get_block_by_hash(get_block_hash(1), true).await.unwrap();

        assert!(block.is_none());
        assert_eq!(secondary.block_calls(), 0);
    }

    #[tokio::test]
    async fn test_all_endpoints_failing() {
        let client = MultiExecutionClient::new(vec![
            Arc::new(MockExecutionClient::new().with_failing_blocks()),
            Arc::new(MockExecutionClient::new().with_failing_blocks()),
        ])
        .unwrap();

        let err = client.get_block_by_number(1, false).await.unwrap_err();
        assert!(matches!(err, ExecutionClientError::Rpc { .. }));
    }

    #[test]
    fn test_requires_a_client() {
        let clients: Vec<Arc<MockExecutionClient>> = Vec::new();
        assert!(matches!(
            MultiExecutionClient::new(clients),
            Err(ExecutionClientError::NoClientAvailable)
        ));
    }
}
