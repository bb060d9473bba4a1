use std::{fmt, str::FromStr};

use alloy_primitives::{Address, B256, I256};
use serde::{Deserialize, Serialize};

use crate::{format_wei_as_eth, AmountError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueCheckMethod {
    /// Balance of the fee recipient after the block minus before it.
    #[serde(rename = "balanceDiffV1")]
    BalanceDiffV1,
    /// Value of the last transaction in the block.
    #[serde(rename = "txValue")]
    TxValue,
}

impl ValueCheckMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BalanceDiffV1 => "balanceDiffV1",
            Self::TxValue => "txValue",
        }
    }
}

impl fmt::Display for ValueCheckMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueCheckMethod {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "balanceDiffV1" => Ok(Self::BalanceDiffV1),
            "txValue" => Ok(Self::TxValue),
            other => Err(AmountError::UnknownCheckMethod(other.to_string())),
        }
    }
}

/// Verification result for one delivered payload. `None` means "not computed".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadVerdict {
    /// Block number from the record, or taken from the fetched block if the record had none.
    pub block_number: Option<u64>,
    pub slot_was_missed: Option<bool>,
    pub found_on_chain: Option<bool>,
    pub block_coinbase_address: Option<Address>,
    pub block_coinbase_is_proposer: Option<bool>,
    /// Hash of the canonical block at the payload's height.
    pub block_hash_on_chain: Option<B256>,
    pub block_hash_on_chain_diffs: Option<bool>,
    pub was_uncled: Option<bool>,
    pub value_check_ok: Option<bool>,
    pub value_check_method: Option<ValueCheckMethod>,
    pub value_delivered_wei: Option<I256>,
    /// Claimed minus delivered.
    pub value_delivered_diff_wei: Option<I256>,
    /// Balance change of the block coinbase, only when it isn't the proposer.
    pub coinbase_diff_wei: Option<I256>,
}

impl PayloadVerdict {
    pub fn value_delivered_eth(&self) -> Option<String> {
        self.value_delivered_wei.map(format_wei_as_eth)
    }

    pub fn value_delivered_diff_eth(&self) -> Option<String> {
        self.value_delivered_diff_wei.map(format_wei_as_eth)
    }

    pub fn coinbase_diff_eth(&self) -> Option<String> {
        self.coinbase_diff_wei.map(format_wei_as_eth)
    }

    pub fn outcome(&self) -> VerdictOutcome {
        if self.slot_was_missed == Some(true) {
            return VerdictOutcome::SlotMissed
        }
        if self.found_on_chain != Some(true) {
            return VerdictOutcome::NotFoundOnChain
        }
        if self.block_hash_on_chain_diffs == Some(true) {
            return VerdictOutcome::HashMismatch { was_uncled: self.was_uncled == Some(true) }
        }
        match self.value_check_ok {
            Some(true) => VerdictOutcome::ValueOk,
            _ => VerdictOutcome::ValueMismatch,
        }
    }
}

/// Terminal state a record reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictOutcome {
    SlotMissed,
    NotFoundOnChain,
    HashMismatch { was_uncled: bool },
    ValueOk,
    ValueMismatch,
}
