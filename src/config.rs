use std::env;
use anyhow::{Context, Result};
use zeroize::{Zeroize, Zeroizing};

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The URL of the PostgreSQL database.
    pub database_url: String,
    /// The port the HTTP listener binds to.
    pub port: u16,
    /// The transport secret every envelope is sealed and opened with.
    pub secret_key: Zeroizing<Vec<u8>>,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// A missing or malformed `SECRET_KEY` is fatal here, before the
    /// listener binds, so the service never accepts traffic it cannot seal.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        let mut secret_key_hex = env::var("SECRET_KEY")
            .context("SECRET_KEY must be set (generate with: openssl rand -hex 32)")?;

        let secret_key_bytes = hex::decode(&secret_key_hex)
            .context("SECRET_KEY must be valid hexadecimal")?;

        secret_key_hex.zeroize();

        if secret_key_bytes.len() != 32 {
            anyhow::bail!("SECRET_KEY must be exactly 32 bytes (64 hex characters)");
        }

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("Invalid PORT")?,
            secret_key: Zeroizing::new(secret_key_bytes),
        })
    }
}
