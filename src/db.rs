use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::NoTls;
use crate::error::{AppError, Result};

/// The schema is applied idempotently at startup; every statement is
/// `CREATE ... IF NOT EXISTS`.
const SCHEMA: &str = include_str!("../schema.sql");

/// Creates a new database connection pool.
///
/// # Arguments
///
/// * `database_url` - The URL of the PostgreSQL database.
///
/// # Returns
///
/// A `Result` containing the `Pool`.
pub fn create_pool(database_url: &str) -> Result<Pool> {
    let pg_config: tokio_postgres::Config = database_url.parse()?;

    let manager = Manager::from_config(
        pg_config,
        NoTls,
        ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        },
    );

    Pool::builder(manager)
        .max_size(16)
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to build connection pool: {}", e)))
}

/// Ensures the tables and constraints the service relies on exist.
///
/// The unique indexes created here carry the core invariants: one session
/// per identity tuple, one live token per unit, one ledger entry per
/// student per session.
pub async fn ensure_schema(pool: &Pool) -> Result<()> {
    let client = pool.get().await?;
    client.batch_execute(SCHEMA).await?;
    Ok(())
}
