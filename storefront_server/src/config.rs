use log::*;
use storefront_common::env_number;
use storefront_engine::{config::StorefrontConfig, sqlite_db::db_url};

const DEFAULT_SF_DB_MAX_CONNECTIONS: u32 = 5;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// Timeouts, TTLs and intervals used by the engine.
    pub storefront: StorefrontConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: String::default(),
            max_connections: DEFAULT_SF_DB_MAX_CONNECTIONS,
            storefront: StorefrontConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env_or_default() -> Self {
        let database_url = db_url();
        let max_connections = match env_number("SF_DB_MAX_CONNECTIONS", DEFAULT_SF_DB_MAX_CONNECTIONS) {
            0 => {
                warn!("🪛️ SF_DB_MAX_CONNECTIONS cannot be zero. Using {DEFAULT_SF_DB_MAX_CONNECTIONS} instead.");
                DEFAULT_SF_DB_MAX_CONNECTIONS
            },
            n => n,
        };
        let storefront = StorefrontConfig::from_env_or_default();
        Self { database_url, max_connections, storefront }
    }
}
