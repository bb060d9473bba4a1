use std::str::FromStr;

use alloy_primitives::{Address, B256};
use payloadscan_types::DeliveredPayloadRecord;

use crate::error::DatabaseError;

pub trait FromRow {
    fn from_row(row: &tokio_postgres::Row) -> Result<Self, DatabaseError>
    where
        Self: Sized;
}

/// Expects `value_claimed_wei` to be selected as text.
impl FromRow for DeliveredPayloadRecord {
    fn from_row(row: &tokio_postgres::Row) -> Result<Self, DatabaseError> {
        Ok(DeliveredPayloadRecord {
            relay: row.try_get::<&str, String>("relay")?,
            slot: parse_i64_to_u64(row.try_get::<&str, i64>("slot")?)?,
            parent_hash: parse_text_to_hash(row.try_get::<&str, &str>("parent_hash")?)?,
            block_hash: parse_text_to_hash(row.try_get::<&str, &str>("block_hash")?)?,
            builder_pubkey: row.try_get::<&str, String>("builder_pubkey")?,
            proposer_pubkey: row.try_get::<&str, String>("proposer_pubkey")?,
            proposer_fee_recipient: parse_text_to_address(
                row.try_get::<&str, &str>("proposer_fee_recipient")?,
            )?,
            gas_limit: parse_i64_to_u64(row.try_get::<&str, i64>("gas_limit")?)?,
            gas_used: parse_i64_to_u64(row.try_get::<&str, i64>("gas_used")?)?,
            value_claimed_wei: row.try_get::<&str, String>("value_claimed_wei")?,
            block_number: row
                .try_get::<&str, Option<i64>>("block_number")?
                .map(parse_i64_to_u64)
                .transpose()?,
        })
    }
}

pub fn parse_i64_to_u64(value: i64) -> Result<u64, DatabaseError> {
    u64::try_from(value).map_err(|e| DatabaseError::RowParsingError(Box::new(e)))
}

pub fn parse_u64_to_i64(value: u64) -> Result<i64, DatabaseError> {
    i64::try_from(value).map_err(|e| DatabaseError::RowParsingError(Box::new(e)))
}

pub fn parse_text_to_hash(hash: &str) -> Result<B256, DatabaseError> {
    B256::from_str(hash.trim()).map_err(|e| DatabaseError::RowParsingError(Box::new(e)))
}

pub fn parse_text_to_address(address: &str) -> Result<Address, DatabaseError> {
    Address::from_str(address.trim()).map_err(|e| DatabaseError::RowParsingError(Box::new(e)))
}

pub fn parse_rows<T: FromRow>(rows: Vec<tokio_postgres::Row>) -> Result<Vec<T>, DatabaseError> {
    rows.iter().map(|row| T::from_row(row)).collect()
}
