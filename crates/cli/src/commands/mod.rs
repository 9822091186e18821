//! Command implementations and the state they share.

pub mod auth;
pub mod cart;

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use shopfront_cart::cache::StorageError;
use shopfront_cart::{
    AuthSession, AuthState, AuthStore, CartConfig, CartError, CartStore, ConfigError,
    FileStorage, HttpCartApi, LocalStorage,
};
use shopfront_core::QuantityError;
use thiserror::Error;

/// Storage key of the persisted bearer token.
pub const TOKEN_KEY: &str = "authToken";

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// The local cache could not be read or written.
    #[error("Cache error: {0}")]
    Storage(#[from] StorageError),

    /// Invalid quantity argument.
    #[error("Invalid quantity: {0}")]
    Quantity(#[from] QuantityError),
}

impl CommandError {
    /// Message for the shopper, when the error came from the cart.
    #[must_use]
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Cart(e) => Some(e.user_message()),
            _ => None,
        }
    }
}

/// Store, identity and cache for one CLI invocation.
pub struct Session {
    pub store: Arc<CartStore>,
    pub auth: Arc<AuthSession>,
    storage: Arc<FileStorage>,
}

impl Session {
    /// Build a session from environment configuration.
    ///
    /// The token comes from `SHOPFRONT_TOKEN` if set, else from the cache
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration or the stored token cannot be read.
    pub fn open() -> Result<Self, CommandError> {
        let config = CartConfig::from_env()?;
        tracing::debug!(?config, "Loaded configuration");

        let storage = Arc::new(FileStorage::new(&config.cache_dir));
        let api = Arc::new(HttpCartApi::new(&config.api)?);
        Self::with_parts(config.token, api, storage)
    }

    fn with_parts(
        token: Option<SecretString>,
        api: Arc<HttpCartApi>,
        storage: Arc<FileStorage>,
    ) -> Result<Self, CommandError> {
        let token = match token {
            Some(token) => Some(token),
            None => load_token(storage.as_ref())?,
        };
        let initial = token.map_or_else(AuthState::anonymous, AuthState::authenticated);

        let auth = Arc::new(AuthSession::new(initial));
        let store = Arc::new(CartStore::new(api, auth.clone(), storage.clone()));

        Ok(Self {
            store,
            auth,
            storage,
        })
    }

    /// Write the current token to the cache directory, or delete it when
    /// logged out.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be written.
    pub fn persist_identity(&self) -> Result<(), CommandError> {
        save_token(self.storage.as_ref(), &self.auth.current())?;
        Ok(())
    }
}

fn load_token(storage: &dyn LocalStorage) -> Result<Option<SecretString>, StorageError> {
    Ok(storage
        .get(TOKEN_KEY)?
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .map(SecretString::from))
}

fn save_token(storage: &dyn LocalStorage, auth: &AuthState) -> Result<(), StorageError> {
    match auth.token() {
        Some(token) => storage.set(TOKEN_KEY, token.expose_secret()),
        None => storage.remove(TOKEN_KEY),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shopfront_cart::{CartApiConfig, MemoryStorage};

    use super::*;

    fn offline_api() -> Arc<HttpCartApi> {
        let config = CartApiConfig::new("http://127.0.0.1:9/").unwrap();
        Arc::new(HttpCartApi::new(&config).unwrap())
    }

    #[test]
    fn test_token_round_trip() {
        let storage = MemoryStorage::new();
        assert!(load_token(&storage).unwrap().is_none());

        save_token(&storage, &AuthState::authenticated("tok-1")).unwrap();
        assert_eq!(load_token(&storage).unwrap().unwrap().expose_secret(), "tok-1");

        save_token(&storage, &AuthState::anonymous()).unwrap();
        assert!(load_token(&storage).unwrap().is_none());
    }

    #[test]
    fn test_blank_stored_token_is_ignored() {
        let storage = MemoryStorage::new();
        storage.set(TOKEN_KEY, "  \n").unwrap();
        assert!(load_token(&storage).unwrap().is_none());
    }

    #[test]
    fn test_session_prefers_configured_token() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(FileStorage::new(dir.path()));
        storage.set(TOKEN_KEY, "stored").unwrap();
        let api = offline_api();

        let configured = Some(SecretString::from("configured"));
        let session = Session::with_parts(configured, api.clone(), storage.clone()).unwrap();
        assert_eq!(session.auth.current(), AuthState::authenticated("configured"));

        let session = Session::with_parts(None, api, storage).unwrap();
        assert_eq!(session.auth.current(), AuthState::authenticated("stored"));
    }

    #[test]
    fn test_persist_identity_removes_token_after_logout() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(FileStorage::new(dir.path()));
        storage.set(TOKEN_KEY, "stored").unwrap();
        let api = offline_api();

        let session = Session::with_parts(None, api, storage.clone()).unwrap();
        session.auth.logout();
        session.persist_identity().unwrap();
        assert!(storage.get(TOKEN_KEY).unwrap().is_none());
    }
}
