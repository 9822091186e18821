//! Remote cart API boundary.
//!
//! # Architecture
//!
//! - The remote API is the source of truth for cart contents, prices and
//!   totals. The client keeps no authoritative copy.
//! - [`CartApi`] is the seam the store talks to; [`HttpCartApi`] implements
//!   it over HTTP with `reqwest`. Tests substitute their own implementation.
//! - Wire envelopes are private to this module and converted into
//!   [`RemoteCart`] before they leave it.
//!
//! # Endpoints
//!
//! | Operation | Request |
//! |---|---|
//! | Fetch | `GET cart` |
//! | Add | `POST cart/items` |
//! | Update quantity | `PATCH cart/items/{id}?quantity=N` |
//! | Remove | `DELETE cart/items/{id}` |
//! | Merge guest cart | `POST cart/merge` |
//!
//! Paths are relative to the configured base URL. The active identity
//! travels as `Authorization: Bearer <token>` or `X-Cart-Session: <id>`.

mod conversions;
mod http;
mod wire;

use std::fmt;

use async_trait::async_trait;
use secrecy::SecretString;
use shopfront_core::{CartLineId, CartSessionId, Money, ProductId, Quantity};

pub use http::{HttpCartApi, SESSION_HEADER};

use crate::error::Result;
use crate::model::NewCartItem;

// =============================================================================
// Identity
// =============================================================================

/// Credentials attached to a cart request.
#[derive(Clone)]
pub enum Identity {
    /// Logged-in user.
    Authenticated(SecretString),
    /// Guest. `None` only before the server has minted a session id.
    Anonymous(Option<CartSessionId>),
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authenticated(_) => f.write_str("Authenticated([REDACTED])"),
            Self::Anonymous(id) => f.debug_tuple("Anonymous").field(id).finish(),
        }
    }
}

// =============================================================================
// Server Cart Types
// =============================================================================

/// A cart line as the server reports it: no name, no image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteLine {
    pub id: CartLineId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub price: Money,
    pub color: String,
}

/// A full cart as the server reports it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RemoteCart {
    pub lines: Vec<RemoteLine>,
    pub total: Money,
}

/// Result of a cart fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedCart {
    pub cart: RemoteCart,
    /// Session id echoed by the server for guest carts.
    pub session_id: Option<CartSessionId>,
}

/// Result of adding an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedCart {
    pub cart: RemoteCart,
    /// Set when the server minted a session id for a first guest add.
    pub session_id: Option<CartSessionId>,
    /// Confirmation text from the server.
    pub message: Option<String>,
}

/// Body of an add request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddLineRequest {
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub price: Money,
    pub color: String,
}

impl From<&NewCartItem> for AddLineRequest {
    fn from(item: &NewCartItem) -> Self {
        Self {
            product_id: item.product_id,
            quantity: item.quantity,
            price: item.price,
            color: item.color_or_default().to_string(),
        }
    }
}

// =============================================================================
// CartApi
// =============================================================================

/// Operations of the remote cart service.
///
/// Implementations map HTTP 401 to [`crate::CartError::Unauthorized`],
/// other non-success statuses to [`crate::CartError::ServerRejected`] and
/// transport failures to [`crate::CartError::NetworkFailure`]. They never
/// retry.
#[async_trait]
pub trait CartApi: Send + Sync {
    /// Fetch the full cart for `identity`.
    async fn fetch_cart(&self, identity: &Identity) -> Result<FetchedCart>;

    /// Add a line. Returns the full cart after the add.
    async fn add_item(&self, identity: &Identity, line: &AddLineRequest) -> Result<AddedCart>;

    /// Change a line's quantity. The response body is not used.
    async fn update_quantity(
        &self,
        identity: &Identity,
        line_id: CartLineId,
        quantity: Quantity,
    ) -> Result<()>;

    /// Delete a line. Returns the full cart after the removal.
    async fn remove_item(&self, identity: &Identity, line_id: CartLineId) -> Result<RemoteCart>;

    /// Fold the guest cart `session_id` into the cart of the user holding
    /// `token`. Returns the merged cart.
    async fn merge_session(
        &self,
        session_id: &CartSessionId,
        token: &SecretString,
    ) -> Result<RemoteCart>;
}
