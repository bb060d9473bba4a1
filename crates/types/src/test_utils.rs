use alloy_primitives::{Address, B256, U256};

use crate::{DeliveredPayloadRecord, ExecutionBlock, ExecutionTransaction, Slot};

pub fn get_fixed_fee_recipient() -> Address {
    Address::repeat_byte(0xfe)
}

pub fn get_fixed_builder_coinbase() -> Address {
    Address::repeat_byte(0xbb)
}

pub fn get_block_hash(n: u8) -> B256 {
    B256::repeat_byte(n)
}

/// A record claiming `value_claimed_wei` was paid in block `block_number` with hash
/// `block_hash`.
pub fn get_delivered_payload_record(
    slot: Slot,
    block_number: u64,
    block_hash: B256,
    value_claimed_wei: &str,
) -> DeliveredPayloadRecord {
    DeliveredPayloadRecord {
        relay: "relay.example.com".to_string(),
        slot,
        parent_hash: B256::repeat_byte(0x01),
        block_hash,
        builder_pubkey: format!("0x{}", "aa".repeat(48)),
        proposer_pubkey: format!("0x{}", "cc".repeat(48)),
        proposer_fee_recipient: get_fixed_fee_recipient(),
        gas_limit: 30_000_000,
        gas_used: 12_000_000,
        value_claimed_wei: value_claimed_wei.to_string(),
        block_number: Some(block_number),
    }
}

pub fn get_execution_block(
    number: u64,
    hash: B256,
    miner: Address,
    tx_values: &[U256],
) -> ExecutionBlock {
    let transactions = tx_values
        .iter()
        .enumerate()
        .map(|(i, value)| ExecutionTransaction {
            hash: B256::with_last_byte(i as u8),
            from: miner,
            to: Some(get_fixed_fee_recipient()),
            value: *value,
        })
        .collect();

    ExecutionBlock {
        number,
        hash,
        miner,
        uncles: Vec::new(),
        transactions,
    }
}
