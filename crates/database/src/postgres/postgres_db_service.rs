use std::ops::DerefMut;

use async_trait::async_trait;
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod};
use payloadscan_common::PostgresConfig;
use payloadscan_types::{DeliveredPayloadRecord, PayloadVerdict, SelectionPolicy};
use tokio_postgres::{types::ToSql, NoTls};
use tracing::{debug, info};

use crate::{
    error::DatabaseError,
    postgres::{
        postgres_db_init::run_migrations_async,
        postgres_db_row_parsing::{parse_rows, parse_u64_to_i64},
    },
    DatabaseService,
};

const SELECT_DELIVERED_PAYLOADS: &str = "
    SELECT
        relay, slot, parent_hash, block_hash, builder_pubkey, proposer_pubkey,
        proposer_fee_recipient, gas_limit, gas_used,
        value_claimed_wei::text AS value_claimed_wei, block_number
    FROM data_api_payload_delivered
";

const UPDATE_PAYLOAD_VERDICT: &str = "
    UPDATE data_api_payload_delivered SET
        block_number = $3,
        slot_missed = $4,
        value_check_ok = $5,
        value_check_method = $6,
        value_delivered_wei = $7::text::numeric,
        value_delivered_eth = $8::text::numeric,
        value_delivered_diff_wei = $9::text::numeric,
        value_delivered_diff_eth = $10::text::numeric,
        block_coinbase_addr = $11,
        block_coinbase_is_proposer = $12,
        coinbase_diff_wei = $13::text::numeric,
        coinbase_diff_eth = $14::text::numeric,
        found_onchain = $15,
        was_uncled = $16,
        block_hash_onchain = $17,
        block_hash_onchain_diffs = $18
    WHERE relay = $1 AND slot = $2
";

#[derive(Clone)]
pub struct PostgresDatabaseService {
    pool: Pool,
}

impl PostgresDatabaseService {
    pub fn new(cfg: &Config) -> Result<Self, DatabaseError> {
        let pool = cfg.create_pool(None, NoTls)?;
        Ok(Self { pool })
    }

    pub fn from_config(config: &PostgresConfig) -> Result<Self, DatabaseError> {
        let mut cfg = Config::new();
        cfg.host = Some(config.hostname.clone());
        cfg.port = Some(config.port);
        cfg.dbname = Some(config.db_name.clone());
        cfg.user = Some(config.user.clone());
        cfg.password = Some(config.password.clone());
        cfg.manager = Some(ManagerConfig { recycling_method: RecyclingMethod::Fast });
        Self::new(&cfg)
    }

    pub async fn run_migrations(&self) -> Result<(), DatabaseError> {
        let mut conn = self.pool.get().await?;
        let client = conn.deref_mut().deref_mut();
        let report = run_migrations_async(client)
            .await
            .map_err(|err| DatabaseError::Migration(err.to_string()))?;

        info!(applied = report.applied_migrations().len(), "applied migrations");
        Ok(())
    }
}

#[async_trait]
impl DatabaseService for PostgresDatabaseService {
    async fn get_unverified_payloads(
        &self,
        selection: &SelectionPolicy,
    ) -> Result<Vec<DeliveredPayloadRecord>, DatabaseError> {
        let client = self.pool.get().await?;

        let rows = match selection {
            SelectionPolicy::BySlot(slot) => {
                let query = format!("{SELECT_DELIVERED_PAYLOADS} WHERE slot = $1 ORDER BY relay");
                client.query(&query, &[&parse_u64_to_i64(*slot)?]).await?
            }
            SelectionPolicy::FailedOnly => {
                let query = format!(
                    "{SELECT_DELIVERED_PAYLOADS} WHERE value_check_ok = false ORDER BY slot DESC"
                );
                client.query(&query, &[]).await?
            }
            SelectionPolicy::RecentUnchecked(limit) => {
                let query = format!(
                    "{SELECT_DELIVERED_PAYLOADS} WHERE value_check_ok IS NULL ORDER BY slot DESC LIMIT $1"
                );
                client.query(&query, &[&parse_u64_to_i64(*limit)?]).await?
            }
        };

        debug!(%selection, rows = rows.len(), "loaded delivered payloads");
        parse_rows(rows)
    }

    async fn save_payload_verdict(
        &self,
        record: &DeliveredPayloadRecord,
        verdict: &PayloadVerdict,
    ) -> Result<(), DatabaseError> {
        let client = self.pool.get().await?;

        let slot = parse_u64_to_i64(record.slot)?;
        let block_number =
            verdict.block_number.or(record.block_number).map(parse_u64_to_i64).transpose()?;
        let value_check_method = verdict.value_check_method.map(|method| method.as_str());
        let value_delivered_wei = verdict.value_delivered_wei.map(|wei| wei.to_string());
        let value_delivered_eth = verdict.value_delivered_eth();
        let value_delivered_diff_wei = verdict.value_delivered_diff_wei.map(|wei| wei.to_string());
        let value_delivered_diff_eth = verdict.value_delivered_diff_eth();
        let block_coinbase_addr =
            verdict.block_coinbase_address.map(|address| format!("{address:#x}"));
        let coinbase_diff_wei = verdict.coinbase_diff_wei.map(|wei| wei.to_string());
        let coinbase_diff_eth = verdict.coinbase_diff_eth();
        let block_hash_onchain = verdict.block_hash_on_chain.map(|hash| format!("{hash:#x}"));

        let params: [&(dyn ToSql + Sync); 18] = [
            &record.relay,
            &slot,
            &block_number,
            &verdict.slot_was_missed,
            &verdict.value_check_ok,
            &value_check_method,
            &value_delivered_wei,
            &value_delivered_eth,
            &value_delivered_diff_wei,
            &value_delivered_diff_eth,
            &block_coinbase_addr,
            &verdict.block_coinbase_is_proposer,
            &coinbase_diff_wei,
            &coinbase_diff_eth,
            &verdict.found_on_chain,
            &verdict.was_uncled,
            &block_hash_onchain,
            &verdict.block_hash_on_chain_diffs,
        ];

        let updated = client.execute(UPDATE_PAYLOAD_VERDICT, &params).await?;
        if updated == 0 {
            return Err(DatabaseError::PayloadNotFound {
                relay: record.relay.clone(),
                slot: record.slot,
            })
        }

        Ok(())
    }
}
