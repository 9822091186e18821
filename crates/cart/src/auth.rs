//! Authentication boundary.
//!
//! Token storage and the login flow belong to the host application. The
//! cart only needs to know which identity is active, to be told when it
//! changes, and to be able to force a logout when the API rejects the token.

use std::fmt;
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tracing::info;

/// The identity the host application currently holds.
#[derive(Clone, Default)]
pub struct AuthState {
    token: Option<SecretString>,
}

impl AuthState {
    /// No logged-in user.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self { token: None }
    }

    /// A user logged in with `token`.
    #[must_use]
    pub fn authenticated(token: impl Into<SecretString>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// Returns `true` if a bearer token is held.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// The bearer token, if authenticated.
    #[must_use]
    pub const fn token(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }
}

impl PartialEq for AuthState {
    fn eq(&self, other: &Self) -> bool {
        match (&self.token, &other.token) {
            (None, None) => true,
            (Some(a), Some(b)) => a.expose_secret() == b.expose_secret(),
            _ => false,
        }
    }
}

impl Eq for AuthState {}

impl fmt::Debug for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthState")
            .field("authenticated", &self.is_authenticated())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Source of the active identity.
pub trait AuthStore: Send + Sync {
    /// The identity right now.
    fn current(&self) -> AuthState;

    /// Drop the authenticated identity. Called by the cart on HTTP 401.
    fn logout(&self);

    /// Receiver that is notified on every identity change.
    fn subscribe(&self) -> watch::Receiver<AuthState>;
}

/// [`AuthStore`] backed by a `tokio::sync::watch` channel.
///
/// Cheap to clone; all clones share the same identity.
#[derive(Clone)]
pub struct AuthSession {
    tx: Arc<watch::Sender<AuthState>>,
}

impl AuthSession {
    /// Start with the given identity.
    #[must_use]
    pub fn new(initial: AuthState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Start anonymous.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::new(AuthState::anonymous())
    }

    /// Switch to an authenticated identity.
    pub fn login(&self, token: impl Into<SecretString>) {
        info!("User logged in");
        self.tx.send_replace(AuthState::authenticated(token));
    }
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl AuthStore for AuthSession {
    fn current(&self) -> AuthState {
        self.tx.borrow().clone()
    }

    fn logout(&self) {
        let changed = self.tx.send_if_modified(|state| {
            if state.is_authenticated() {
                *state = AuthState::anonymous();
                true
            } else {
                false
            }
        });
        if changed {
            info!("User logged out");
        }
    }

    fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.tx.subscribe()
    }
}
