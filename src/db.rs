use anyhow::{Context, Result};
use diesel::{Connection, PgConnection};
use diesel_async::{
    AsyncPgConnection,
    pooled_connection::{AsyncDieselConnectionManager, bb8::Pool},
};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

pub type DbPool = Pool<AsyncPgConnection>;

/// Migrations embedded into the binary which helps with streamlining image building process
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub async fn create_pool(url: &str, max_connections: u32) -> Result<DbPool> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(url);
    Pool::builder()
        .max_size(max_connections)
        .build(manager)
        .await
        .context("Failed to build the DB connection pool")
}

/// Runs pending migrations on a blocking connection and returns how many were applied.
pub async fn run_migrations(url: &str) -> Result<usize> {
    let url = url.to_string();
    tokio::task::spawn_blocking(move || {
        let mut conn =
            PgConnection::establish(&url).context("Failed to connect for migrations")?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|err| anyhow::anyhow!("Failed to run migrations: {}", err))?;
        Ok(applied.len())
    })
    .await
    .context("Migration task panicked")?
}
