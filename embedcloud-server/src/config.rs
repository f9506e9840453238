//! Server-side configuration: bind address, platform API endpoint, and the
//! local artifact mirror directory.

use std::env;
use std::path::PathBuf;

use embedcloud_core::{EmbedCloudError, EmbedCloudResult};

pub const ENV_HOST: &str = "EMBEDCLOUD_HOST";
pub const ENV_PORT: &str = "EMBEDCLOUD_PORT";
pub const ENV_API_URL: &str = "EMBEDCLOUD_API_URL";
pub const ENV_API_TOKEN: &str = "EMBEDCLOUD_API_TOKEN";
pub const ENV_DATA_PATH: &str = "EMBEDCLOUD_DATA_PATH";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Base URL of the data-platform API.
    pub api_url: String,
    pub api_token: String,
    /// Local directory mirroring downloaded and computed artifacts.
    pub data_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            api_url: "http://localhost:8080".to_string(),
            api_token: String::new(),
            data_path: PathBuf::from("./embedcloud_data"),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> EmbedCloudResult<Self> {
        let mut config = ServerConfig::default();
        if let Ok(host) = env::var(ENV_HOST) {
            config.host = host;
        }
        if let Ok(raw) = env::var(ENV_PORT) {
            config.port = raw.parse::<u16>().map_err(|_| {
                EmbedCloudError::Configuration(format!(
                    "{} must be a port number, got '{}'",
                    ENV_PORT, raw
                ))
            })?;
        }
        if let Ok(url) = env::var(ENV_API_URL) {
            config.api_url = url;
        }
        if let Ok(token) = env::var(ENV_API_TOKEN) {
            config.api_token = token;
        }
        if let Ok(path) = env::var(ENV_DATA_PATH) {
            config.data_path = PathBuf::from(path);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3000);
        assert_eq!(config.data_path, PathBuf::from("./embedcloud_data"));
    }
}
