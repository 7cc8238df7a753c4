use deadpool_postgres::Pool;
use crate::config::Config;
use crate::crypto::envelope::Envelope;
use crate::error::Result;

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The database connection pool.
    pub db: Pool,
    /// The application's configuration.
    pub config: Config,
    /// The transport envelope codec, keyed once at startup.
    pub envelope: Envelope,
}

impl AppState {
    /// Creates a new `AppState`.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`.
    pub fn new(config: &Config) -> Result<Self> {
        let db = crate::db::create_pool(&config.database_url)?;
        tracing::info!("✅ PostgreSQL pool initialized with deadpool-postgres");

        let envelope = Envelope::new(&config.secret_key)?;
        tracing::info!("✅ Transport envelope codec initialized");

        Ok(AppState {
            db,
            config: config.clone(),
            envelope,
        })
    }
}
