//! Integration tests for the Shopfront cart client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopfront-integration-tests
//! ```
//!
//! Each test starts an in-process mock of the cart API with `httpmock` and
//! a cart store backed by a temporary cache directory, so no external
//! services are needed.
//!
//! # Test Categories
//!
//! - `cart_session` - Add, merge and logout flows against the HTTP client
//! - `cart_cache` - Restoring the cart from the on-disk cache

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::Path;
use std::sync::Arc;

use httpmock::MockServer;
use shopfront_cart::{AuthSession, CartApiConfig, CartStore, FileStorage, HttpCartApi};
use tempfile::TempDir;

/// Path prefix the mock API is mounted under.
pub const API_PREFIX: &str = "/api";

/// A mock cart API plus a store talking to it.
pub struct TestContext {
    pub server: MockServer,
    pub auth: AuthSession,
    pub store: Arc<CartStore>,
    cache_dir: TempDir,
}

impl TestContext {
    /// Start a mock server and an anonymous store with an empty cache.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory or HTTP client cannot be created.
    pub async fn new() -> Self {
        let server = MockServer::start_async().await;
        #[allow(clippy::expect_used)]
        let cache_dir = tempfile::tempdir().expect("Failed to create cache dir");
        let auth = AuthSession::anonymous();
        let store = open_store(&server, &auth, cache_dir.path());

        Self {
            server,
            auth,
            store,
            cache_dir,
        }
    }

    /// Open a second store on the same cache directory and identity, as a
    /// restarted client would.
    #[must_use]
    pub fn reopen(&self) -> Arc<CartStore> {
        open_store(&self.server, &self.auth, self.cache_dir.path())
    }

    /// The cache directory.
    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        self.cache_dir.path()
    }

    /// Full path of an API route on the mock server.
    #[must_use]
    pub fn path(route: &str) -> String {
        format!("{API_PREFIX}/{route}")
    }
}

fn open_store(server: &MockServer, auth: &AuthSession, cache_dir: &Path) -> Arc<CartStore> {
    #[allow(clippy::expect_used)]
    let config =
        CartApiConfig::new(&server.url(format!("{API_PREFIX}/"))).expect("Invalid mock URL");
    #[allow(clippy::expect_used)]
    let api = HttpCartApi::new(&config).expect("Failed to build HTTP client");

    Arc::new(CartStore::new(
        Arc::new(api),
        Arc::new(auth.clone()),
        Arc::new(FileStorage::new(cache_dir)),
    ))
}
