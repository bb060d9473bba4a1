use refinery::{AsyncMigrate, Report};

/// embeds the migrations folder into the binary
/// note: this macro cannot see if the migrations folder has changed
/// therefore cargo build will usually just use the cached version of the migrations
mod embedded_migrations {
    use refinery::embed_migrations;
    embed_migrations!("src/postgres/migrations");
}

/// Run the migrations defined in the /src/postgres/migrations folder, in order of their version
/// number. Refinery tracks applied migrations in the refinery_schema_history table.
pub async fn run_migrations_async<C>(conn: &'_ mut C) -> Result<Report, refinery::Error>
where
    C: AsyncMigrate + Send,
{
    embedded_migrations::migrations::runner().run_async(conn).await
}
