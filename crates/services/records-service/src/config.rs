//! Records service configuration.

use std::env;

use common::{DatabaseConfig, JwtConfig, ServiceConfig};

/// Records service configuration.
#[derive(Debug, Clone, Default)]
pub struct RecordsServiceConfig {
    pub service: ServiceConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
}

impl RecordsServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            service: ServiceConfig {
                service_name: defaults.service.service_name,
                host: env::var("RECORDS_HOST").unwrap_or(defaults.service.host),
                port: parsed("RECORDS_PORT").unwrap_or(defaults.service.port),
            },
            database: DatabaseConfig {
                url: env::var("RECORDS_DATABASE_URL")
                    .or_else(|_| env::var("DATABASE_URL"))
                    .unwrap_or(defaults.database.url),
                max_connections: parsed("RECORDS_DB_MAX_CONNECTIONS")
                    .unwrap_or(defaults.database.max_connections),
                min_connections: parsed("RECORDS_DB_MIN_CONNECTIONS")
                    .unwrap_or(defaults.database.min_connections),
            },
            jwt: JwtConfig {
                secret: env::var("JWT_SECRET").unwrap_or_default(),
                leeway_seconds: parsed("JWT_LEEWAY_SECONDS").unwrap_or(defaults.jwt.leeway_seconds),
            },
        }
    }
}

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}
