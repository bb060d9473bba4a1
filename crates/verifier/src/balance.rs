use std::sync::Arc;

use alloy_primitives::{Address, I256, U256};
use payloadscan_execution::{ExecutionClientError, ExecutionClientTrait, MultiExecutionClient};
use payloadscan_types::{signed_wei, AmountError};
use tracing::warn;

use crate::error::VerificationError;

/// Measures how much an account's balance changed within a single block.
#[derive(Clone)]
pub struct BalanceOracle<C: ExecutionClientTrait> {
    execution: Arc<MultiExecutionClient<C>>,
}

impl<C: ExecutionClientTrait> BalanceOracle<C> {
    pub fn new(execution: Arc<MultiExecutionClient<C>>) -> Self {
        Self { execution }
    }

    /// `balance(address, block_number) - balance(address, block_number - 1)`.
    ///
    /// Both balances are read from the same endpoint. If either read fails the whole diff is
    /// retried on the next endpoint, once per endpoint in order.
    pub async fn balance_diff(
        &self,
        address: Address,
        block_number: u64,
    ) -> Result<I256, VerificationError> {
        let mut last_error = ExecutionClientError::NoClientAvailable;

        for client in self.execution.clients() {
            match Self::balances_around(client.as_ref(), address, block_number).await {
                Ok((before, after)) => return signed_diff(after, before),
                Err(err) => {
                    warn!(
                        endpoint = client.get_uri(),
                        %address,
                        block_number,
                        ?err,
                        "failed to get balance diff, trying next endpoint"
                    );
                    last_error = err;
                }
            }
        }

        Err(VerificationError::BalanceUnavailable { address, block_number, error: last_error })
    }

    /// Balances before and after `block_number`. The balance before genesis is zero.
    async fn balances_around(
        client: &C,
        address: Address,
        block_number: u64,
    ) -> Result<(U256, U256), ExecutionClientError> {
        let before = match block_number.checked_sub(1) {
            Some(parent) => client.get_balance(address, parent).await?,
            None => U256::ZERO,
        };
        let after = client.get_balance(address, block_number).await?;
        Ok((before, after))
    }
}

/// `a - b` in the signed domain.
pub(crate) fn signed_diff(a: U256, b: U256) -> Result<I256, VerificationError> {
    let (a, b) = (signed_wei(a)?, signed_wei(b)?);
    a.checked_sub(b)
        .ok_or_else(|| AmountError::OutOfRange(format!("{a} - {b}")).into())
}
