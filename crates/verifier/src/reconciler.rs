use alloy_primitives::I256;
use payloadscan_execution::ExecutionClientTrait;
use payloadscan_types::{
    signed_wei, AmountError, DeliveredPayloadRecord, ExecutionBlock, ValueCheckMethod,
};
use tracing::{debug, warn};

use crate::{balance::BalanceOracle, error::VerificationError};

/// Outcome of comparing the claimed value with what the fee recipient received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueVerdict {
    pub ok: bool,
    pub method: ValueCheckMethod,
    /// Balance change of the proposer fee recipient in the block.
    pub delivered_wei: I256,
    /// Claimed minus delivered.
    pub diff_wei: I256,
    /// Balance change of the block coinbase, set when it isn't the proposer.
    pub builder_diff_wei: Option<I256>,
}

/// Parses the record's claimed value, which must be a plain decimal wei amount.
pub fn claimed_wei(record: &DeliveredPayloadRecord) -> Result<I256, VerificationError> {
    record
        .claimed_value()
        .and_then(signed_wei)
        .map_err(|error| VerificationError::InvalidClaimedValue { slot: record.slot, error })
}

pub struct ValueReconciler<C: ExecutionClientTrait> {
    oracle: BalanceOracle<C>,
}

impl<C: ExecutionClientTrait> ValueReconciler<C> {
    pub fn new(oracle: BalanceOracle<C>) -> Self {
        Self { oracle }
    }

    /// Checks that `claimed` wei reached the proposer in `block`, which must be canonical.
    ///
    /// The fee recipient's balance change is compared first. If it doesn't match, the value of
    /// the last transaction in the block is compared, since payments forwarded through a
    /// contract don't show up in the balance change.
    pub async fn reconcile(
        &self,
        record: &DeliveredPayloadRecord,
        claimed: I256,
        block: &ExecutionBlock,
        coinbase_is_proposer: bool,
    ) -> Result<ValueVerdict, VerificationError> {
        let block_number = block.number;
        let delivered =
            self.oracle.balance_diff(record.proposer_fee_recipient, block_number).await?;
        let diff = checked_diff(claimed, delivered)?;

        let (ok, method, diff) = if diff.is_zero() {
            (true, ValueCheckMethod::BalanceDiffV1, diff)
        } else {
            match block.last_transaction() {
                Some(payment_tx) => {
                    let tx_diff = checked_diff(claimed, signed_wei(payment_tx.value)?)?;
                    if tx_diff.is_zero() {
                        debug!(
                            slot = record.slot,
                            tx_hash = %payment_tx.hash,
                            "payment is in last tx, probably forwarded through a contract"
                        );
                        (true, ValueCheckMethod::TxValue, tx_diff)
                    } else {
                        (false, ValueCheckMethod::TxValue, diff)
                    }
                }
                None => (false, ValueCheckMethod::TxValue, diff),
            }
        };

        if !ok {
            warn!(
                slot = record.slot,
                relay = %record.relay,
                block_number,
                fee_recipient = %record.proposer_fee_recipient,
                %delivered,
                claimed = %record.value_claimed_wei,
                %diff,
                "value delivered differs from claim"
            );
        }

        let builder_diff_wei = if coinbase_is_proposer {
            None
        } else {
            Some(self.oracle.balance_diff(block.miner, block_number).await?)
        };

        Ok(ValueVerdict { ok, method, delivered_wei: delivered, diff_wei: diff, builder_diff_wei })
    }
}

fn checked_diff(a: I256, b: I256) -> Result<I256, VerificationError> {
    a.checked_sub(b).ok_or_else(|| AmountError::OutOfRange(format!("{a} - {b}")).into())
}
