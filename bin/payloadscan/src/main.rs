use std::sync::Arc;

use eyre::eyre;
use payloadscan_beacon::{BeaconClient, BeaconClientError, BeaconClientTrait};
use payloadscan_common::{utils::init_tracing_log, ScanConfig};
use payloadscan_database::{start_db_service, DatabaseService};
use payloadscan_execution::{ExecutionRpcClient, MultiExecutionClient};
use payloadscan_verifier::PayloadValueChecker;
use tracing::{error, info};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() {
    let config = match ScanConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to load config: {err}");
            std::process::exit(1);
        }
    };

    let _guard = match init_tracing_log(&config.logging) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("failed to init logging: {err}");
            std::process::exit(1);
        }
    };

    match run(config).await {
        Ok(_) => info!("payloadscan exited"),
        Err(err) => {
            error!(%err, "payloadscan exited with error");
            std::process::exit(1);
        }
    }
}

async fn run(config: ScanConfig) -> eyre::Result<()> {
    let timeout = config.request_timeout();

    let beacon = Arc::new(BeaconClient::with_timeout(config.beacon_client.url.clone(), timeout)?);
    let sync_status = beacon
        .sync_status()
        .await
        .map_err(|err| eyre!("beacon node {} unreachable: {err}", beacon.get_uri()))?;
    if sync_status.is_syncing {
        error!(
            head_slot = sync_status.head_slot,
            sync_distance = sync_status.sync_distance,
            "beacon node is syncing"
        );
        return Err(BeaconClientError::BeaconNodeSyncing.into())
    }
    info!(head_slot = sync_status.head_slot, beacon = beacon.get_uri(), "beacon node synced");

    let execution_clients = config
        .execution_clients
        .iter()
        .map(|client| ExecutionRpcClient::with_timeout(client.url.clone(), timeout).map(Arc::new))
        .collect::<Result<Vec<_>, _>>()?;
    let execution = Arc::new(MultiExecutionClient::new(execution_clients)?);

    let db = start_db_service(&config).await?;

    let verifier_config = config.check_payload_value.clone();
    let records = db.get_unverified_payloads(&verifier_config.selection).await?;
    info!(
        selection = %verifier_config.selection,
        num_records = records.len(),
        "selected delivered payloads"
    );
    if records.is_empty() {
        return Ok(())
    }

    let checker = PayloadValueChecker::new(db, beacon, execution, verifier_config);
    let summary = checker.run(records).await?;

    if !summary.failed_records.is_empty() {
        info!(failed_records = ?summary.failed_records, "payloads left unverified");
    }

    Ok(())
}
