//! Configuration module for tickdown.
//!
//! Loads configuration from environment variables with sensible defaults.

use std::env;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// HTTP port for the web server (default: 8080)
    pub http_port: u16,
    /// Path to the device-scope settings database (default: "tickdown-device.db")
    pub device_db: String,
    /// Path to the instance-scope settings database (default: "tickdown-instance.db")
    pub instance_db: String,
    /// Base URL of the external media API (default: unset, lookups disabled)
    pub media_api: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            http_port: 8080,
            device_db: "tickdown-device.db".to_string(),
            instance_db: "tickdown-instance.db".to_string(),
            media_api: None,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `TICKDOWN_HTTP_PORT`: HTTP port (default: 8080)
    /// - `TICKDOWN_DEVICE_DB`: device-scope database path
    /// - `TICKDOWN_INSTANCE_DB`: instance-scope database path
    /// - `TICKDOWN_MEDIA_API`: media API base URL
    pub fn load() -> Self {
        let mut cfg = Self::default();

        if let Ok(port_str) = env::var("TICKDOWN_HTTP_PORT") {
            if let Ok(port) = port_str.parse() {
                cfg.http_port = port;
            }
        }

        if let Ok(device_db) = env::var("TICKDOWN_DEVICE_DB") {
            cfg.device_db = device_db;
        }

        if let Ok(instance_db) = env::var("TICKDOWN_INSTANCE_DB") {
            cfg.instance_db = instance_db;
        }

        if let Ok(media_api) = env::var("TICKDOWN_MEDIA_API") {
            if !media_api.is_empty() {
                cfg.media_api = Some(media_api);
            }
        }

        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = ServiceConfig::default();
        assert_eq!(cfg.http_port, 8080);
        assert_eq!(cfg.device_db, "tickdown-device.db");
        assert_eq!(cfg.instance_db, "tickdown-instance.db");
        assert!(cfg.media_api.is_none());
    }
}
