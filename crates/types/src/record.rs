use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

use crate::{parse_wei, AmountError, Slot};

/// A payload a relay reports as delivered to a proposer, as stored by the data API scraper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveredPayloadRecord {
    pub relay: String,
    pub slot: Slot,
    pub parent_hash: B256,
    /// Block hash claimed by the relay.
    pub block_hash: B256,
    pub builder_pubkey: String,
    pub proposer_pubkey: String,
    pub proposer_fee_recipient: Address,
    pub gas_limit: u64,
    pub gas_used: u64,
    /// Decimal wei string, kept verbatim from the relay response.
    pub value_claimed_wei: String,
    pub block_number: Option<u64>,
}

impl DeliveredPayloadRecord {
    pub fn claimed_value(&self) -> Result<U256, AmountError> {
        parse_wei(&self.value_claimed_wei)
    }
}
