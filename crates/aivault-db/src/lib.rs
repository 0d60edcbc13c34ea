pub mod errors;
pub mod models;
pub mod pagination;
pub mod pool;
pub mod schema;

pub use errors::{DatabaseError, ErrorKind};
pub use pagination::Pagination;
pub use pool::AivaultPool;

use deadpool_diesel::Runtime;
use deadpool_diesel::postgres::{Manager, Pool};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

const MAX_POOL_SIZE: usize = 16;

/// Character limits of the bounded text columns.
pub mod limits {
    pub const STRATEGY_NAME: usize = 255;
    pub const PROTOCOL: usize = 64;
    pub const TOKEN_SYMBOL: usize = 32;
    pub const TOKEN_NAME: usize = 128;
}

/// Builds the connection pool. Connections are opened lazily, so this does
/// not touch the database.
pub fn init_pool(app_name: &str, database_url: &str) -> Result<Pool, ErrorKind> {
    let separator = if database_url.contains('?') { '&' } else { '?' };
    let url = format!("{database_url}{separator}application_name={app_name}");

    let manager = Manager::new(url, Runtime::Tokio1);
    Pool::builder(manager)
        .max_size(MAX_POOL_SIZE)
        .build()
        .map_err(|e| ErrorKind::Pool(e.to_string()))
}

/// Applies every embedded migration that has not run yet.
pub async fn run_migrations(pool: &Pool) -> Result<(), ErrorKind> {
    let conn = pool
        .get()
        .await
        .map_err(|e| ErrorKind::Pool(e.to_string()))?;

    let applied = conn
        .interact(|conn| {
            conn.run_pending_migrations(MIGRATIONS)
                .map(|versions| versions.len())
                .map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| ErrorKind::Migration(e.to_string()))?
        .map_err(ErrorKind::Migration)?;

    tracing::info!(applied, "Database migrations up to date");
    Ok(())
}
