//! Configuration loader for Strongbox.
//!
//! Reads `config.toml` from the data directory and deserializes it into
//! [`StoreConfig`]. A missing or malformed file yields the defaults.

use std::path::Path;

use strongbox_types::config::StoreConfig;

pub const CONFIG_FILE: &str = "config.toml";

/// Load `{data_dir}/config.toml`, falling back to [`StoreConfig::default()`].
pub async fn load_config(data_dir: &Path) -> StoreConfig {
    let config_path = data_dir.join(CONFIG_FILE);

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return StoreConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return StoreConfig::default();
        }
    };

    match toml::from_str::<StoreConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            StoreConfig::default()
        }
    }
}
