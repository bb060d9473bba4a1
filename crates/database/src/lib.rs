pub mod error;
pub mod mock_database_service;
pub mod postgres;
pub mod traits;

use std::sync::Arc;

use payloadscan_common::ScanConfig;
use postgres::postgres_db_service::PostgresDatabaseService;
use tracing::info;

pub use error::DatabaseError;
pub use mock_database_service::MockDatabaseService;
pub use traits::*;

/// Connects to postgres and brings the schema up to date.
pub async fn start_db_service(config: &ScanConfig) -> eyre::Result<Arc<PostgresDatabaseService>> {
    let postgres_db = PostgresDatabaseService::from_config(&config.postgres)?;
    postgres_db.run_migrations().await?;

    info!(host = %config.postgres.hostname, db = %config.postgres.db_name, "database ready");
    Ok(Arc::new(postgres_db))
}
