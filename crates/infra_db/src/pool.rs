//! Connection pool and schema migrations

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;

use crate::error::DatabaseError;
use crate::settings::DatabaseSettings;

/// Type alias for the PostgreSQL connection pool
pub type DatabasePool = PgPool;

/// Pool options derived from the `database` settings section
pub fn pool_options(settings: &DatabaseSettings) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.connect_timeout_secs))
        .max_lifetime(Duration::from_secs(settings.max_lifetime_secs))
        .idle_timeout(Duration::from_secs(settings.idle_timeout_secs))
}

/// Connects a pool to `settings.url`
///
/// # Errors
///
/// Returns `DatabaseError::ConnectionFailed` if no connection can be opened
pub async fn create_pool(settings: &DatabaseSettings) -> Result<DatabasePool, DatabaseError> {
    info!(
        max_connections = settings.max_connections,
        min_connections = settings.min_connections,
        "connecting billing database pool"
    );

    let pool = pool_options(settings)
        .connect(&settings.url)
        .await
        .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

    info!("billing database pool ready");
    Ok(pool)
}

/// Applies the embedded migrations under `crates/infra_db/migrations`
pub async fn run_migrations(pool: &DatabasePool) -> Result<(), DatabaseError> {
    info!("running billing migrations");
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("billing migrations applied");
    Ok(())
}
