use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::storage::StoragePolicy;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_GUEST_USER: &str = "guest";
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:8080";
const DATA_DIR_NAME: &str = "Parent Concierge";

/// Server configuration loaded from environment variables
///
/// | Env Var                   | Default                               |
/// |---------------------------|---------------------------------------|
/// | `CONCIERGE_DATA_DIR`      | `<Documents>/Parent Concierge`        |
/// | `CONCIERGE_DATABASE_URL`  | `<data dir>/concierge.db`             |
/// | `CONCIERGE_BIND_ADDR`     | `127.0.0.1:3000`                      |
/// | `CONCIERGE_STORAGE`       | `fallback`                            |
/// | `CONCIERGE_GUEST_USER`    | `guest`                               |
/// | `CONCIERGE_CORS_ORIGIN`   | `http://localhost:8080`               |
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Holds the SQLite file and the `local/` directory of the local store
    pub data_dir: PathBuf,
    /// Explicit database URL, overrides `<data dir>/concierge.db`
    pub database_url: Option<String>,
    pub bind_addr: SocketAddr,
    pub storage_policy: StoragePolicy,
    /// User id for requests without an `X-User-Id` header
    pub guest_user_id: String,
    pub cors_origin: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let data_dir = match get("CONCIERGE_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir()?,
        };

        let bind_addr = get("CONCIERGE_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("CONCIERGE_BIND_ADDR must be a socket address such as 127.0.0.1:3000")?;

        let storage_policy = match get("CONCIERGE_STORAGE") {
            Some(policy) => policy.parse()?,
            None => StoragePolicy::default(),
        };

        Ok(Self {
            data_dir,
            database_url: get("CONCIERGE_DATABASE_URL"),
            bind_addr,
            storage_policy,
            guest_user_id: get("CONCIERGE_GUEST_USER").unwrap_or_else(|| DEFAULT_GUEST_USER.to_string()),
            cors_origin: get("CONCIERGE_CORS_ORIGIN").unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string()),
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("concierge.db")
    }

    pub fn local_dir(&self) -> PathBuf {
        self.data_dir.join("local")
    }
}

fn default_data_dir() -> Result<PathBuf> {
    let documents = dirs::document_dir()
        .or_else(dirs::home_dir)
        .context("Could not determine a documents directory, set CONCIERGE_DATA_DIR")?;
    Ok(documents.join(DATA_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("CONCIERGE_DATA_DIR", "/tmp/concierge")]).unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/concierge"));
        assert_eq!(config.database_url, None);
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR.parse().unwrap());
        assert_eq!(config.storage_policy, StoragePolicy::Fallback);
        assert_eq!(config.guest_user_id, "guest");
        assert_eq!(config.cors_origin, "http://localhost:8080");
        assert_eq!(config.database_path(), PathBuf::from("/tmp/concierge/concierge.db"));
        assert_eq!(config.local_dir(), PathBuf::from("/tmp/concierge/local"));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("CONCIERGE_DATA_DIR", "/srv/concierge"),
            ("CONCIERGE_DATABASE_URL", "sqlite::memory:"),
            ("CONCIERGE_BIND_ADDR", "0.0.0.0:8000"),
            ("CONCIERGE_STORAGE", "local"),
            ("CONCIERGE_GUEST_USER", "demo"),
            ("CONCIERGE_CORS_ORIGIN", " "),
        ])
        .unwrap();

        assert_eq!(config.database_url.as_deref(), Some("sqlite::memory:"));
        assert_eq!(config.bind_addr.port(), 8000);
        assert_eq!(config.storage_policy, StoragePolicy::Local);
        assert_eq!(config.guest_user_id, "demo");
        assert_eq!(config.cors_origin, DEFAULT_CORS_ORIGIN);
    }

    #[test]
    fn test_invalid_values() {
        assert!(config_from(&[("CONCIERGE_DATA_DIR", "/tmp/x"), ("CONCIERGE_BIND_ADDR", "nowhere")]).is_err());
        assert!(config_from(&[("CONCIERGE_DATA_DIR", "/tmp/x"), ("CONCIERGE_STORAGE", "cloud")]).is_err());
    }
}
