//! Application state: data directory, configuration and the open store.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use console::style;
use dialoguer::Password;
use secrecy::SecretString;
use strongbox_core::crypto::cipher::Sealer;
use strongbox_infra::config::load_config;
use strongbox_infra::crypto::cipher::PasswordCipher;
use strongbox_infra::filesystem::{database_path, resolve_data_dir};
use strongbox_infra::sqlite::store::Store;
use strongbox_types::config::StoreConfig;

/// Data directory and configuration, available without opening the database.
pub struct Environment {
    pub data_dir: PathBuf,
    pub config: StoreConfig,
}

impl Environment {
    pub async fn load() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        let config = load_config(&data_dir).await;
        Ok(Self { data_dir, config })
    }

    /// Bind the cipher to the passphrase from `--passphrase` /
    /// `STRONGBOX_PASSPHRASE`, or prompt for it.
    pub fn sealer(&self, passphrase: Option<&str>) -> anyhow::Result<Sealer> {
        let passphrase = match passphrase {
            Some(p) => p.to_string(),
            None => Password::new()
                .with_prompt(format!("{}", style("Passphrase").bold()))
                .interact()
                .context("no passphrase given and the prompt failed")?,
        };
        let cipher = PasswordCipher::new(self.config.crypto);
        Ok(Sealer::new(Arc::new(cipher), SecretString::from(passphrase)))
    }
}

/// The environment plus a bootstrapped store.
pub struct AppState {
    pub env: Environment,
    pub store: Store,
}

impl AppState {
    /// Create the data directory if needed, open the database and run the
    /// core bootstrap migrations.
    pub async fn init(env: Environment) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&env.data_dir)
            .await
            .with_context(|| format!("failed to create {}", env.data_dir.display()))?;

        let store = Store::open(&database_path(&env.data_dir), &env.config).await?;
        Ok(Self { env, store })
    }

    /// Attach the passphrase so encrypted accessors work.
    pub fn unlock(self, passphrase: Option<&str>) -> anyhow::Result<Self> {
        let sealer = self.env.sealer(passphrase)?;
        Ok(Self {
            store: self.store.unlock(sealer),
            env: self.env,
        })
    }
}
