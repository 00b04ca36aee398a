use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Report-log store (ignition messages, unit fixes).
    pub database_url: String,
    /// Time-series store (engine duration and speed metrics). May be the
    /// same server as `database_url`.
    pub metrics_database_url: String,
}

impl TrackerConfig {
    pub fn from_env() -> Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let metrics_database_url = std::env::var("METRICS_DATABASE_URL")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| database_url.clone());

        Ok(Self {
            database_url,
            metrics_database_url,
        })
    }
}
