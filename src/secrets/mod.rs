//! Credential storage.
//!
//! One secret per provider type. The core reads credentials; only the
//! user (through `setApiKey`) writes them.

use async_trait::async_trait;
use keyring::Entry;
use thiserror::Error;

use crate::constants::APP_NAME;
use crate::env::Env;
use crate::models::ProviderType;

#[derive(Error, Debug)]
pub enum SecretError {
    #[error("keyring error for {provider}: {source}")]
    Keyring {
        provider: ProviderType,
        source: keyring::Error,
    },

    #[error("keyring task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[async_trait]
pub trait SecretStore: Send + Sync {
    /// The stored credential, or `None` when nothing usable is stored.
    async fn get(&self, provider: ProviderType) -> Result<Option<String>, SecretError>;

    async fn store(&self, provider: ProviderType, secret: &str) -> Result<(), SecretError>;
}

/// OS keyring, with the provider's API-key environment variable taking
/// precedence when it is set.
#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
    env: Env,
}

impl KeyringStore {
    pub fn new(env: Env) -> Self {
        Self {
            service: APP_NAME.to_string(),
            env,
        }
    }

    fn entry(service: &str, provider: ProviderType) -> Result<Entry, SecretError> {
        Entry::new(service, provider.descriptor().secret_key)
            .map_err(|source| SecretError::Keyring { provider, source })
    }
}

#[async_trait]
impl SecretStore for KeyringStore {
    async fn get(&self, provider: ProviderType) -> Result<Option<String>, SecretError> {
        if let Some(key) = self.env.non_empty(provider.api_key_env_var()) {
            tracing::debug!(%provider, "using API key from environment");
            return Ok(Some(key));
        }

        let service = self.service.clone();
        tokio::task::spawn_blocking(move || {
            let entry = Self::entry(&service, provider)?;
            match entry.get_password() {
                Ok(secret) if secret.trim().is_empty() => Ok(None),
                Ok(secret) => Ok(Some(secret)),
                Err(keyring::Error::NoEntry) => Ok(None),
                Err(source) => Err(SecretError::Keyring { provider, source }),
            }
        })
        .await?
    }

    async fn store(&self, provider: ProviderType, secret: &str) -> Result<(), SecretError> {
        let service = self.service.clone();
        let secret = secret.to_string();
        tokio::task::spawn_blocking(move || {
            Self::entry(&service, provider)?
                .set_password(&secret)
                .map_err(|source| SecretError::Keyring { provider, source })
        })
        .await?
    }
}
