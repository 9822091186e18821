//! Cart domain types.
//!
//! These are the types the store publishes to its subscribers and mirrors to
//! the local cache. Wire formats live in [`crate::api`].

use serde::{Deserialize, Serialize};
use shopfront_core::{CartLineId, Money, ProductId, Quantity};

/// Variant key sent when the shopper did not pick a color.
pub const DEFAULT_COLOR: &str = "default";

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

// =============================================================================
// Cart Lines
// =============================================================================

/// A line item in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    /// Server-assigned line ID.
    pub id: CartLineId,
    /// Product this line refers to.
    pub product_id: ProductId,
    /// Number of units.
    pub quantity: Quantity,
    /// Unit price.
    pub price: Money,
    /// Selected variant key.
    #[serde(default = "default_color")]
    pub color: String,
    /// Product name. Display only, never returned by the cart API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Product image URL. Display only, never returned by the cart API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl CartLineItem {
    /// Unit price times quantity, for display next to the line.
    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.price.times(self.quantity)
    }
}

/// An item the shopper wants to add to the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCartItem {
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub price: Money,
    pub color: Option<String>,
    pub name: Option<String>,
    pub image: Option<String>,
}

impl NewCartItem {
    /// Create a new item without display metadata or color.
    #[must_use]
    pub const fn new(product_id: ProductId, quantity: Quantity, price: Money) -> Self {
        Self {
            product_id,
            quantity,
            price,
            color: None,
            name: None,
            image: None,
        }
    }

    /// Set the selected color.
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Set the product name shown in the cart.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the product image shown in the cart.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// The color sent to the server, falling back to [`DEFAULT_COLOR`].
    #[must_use]
    pub fn color_or_default(&self) -> &str {
        self.color
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(DEFAULT_COLOR)
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// Immutable view of the cart at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CartSnapshot {
    /// Line items, in the order the server reported them.
    pub items: Vec<CartLineItem>,
    /// Server-computed total. Never derived from the lines.
    pub total: Money,
}

impl CartSnapshot {
    /// Create an empty cart.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: Money::ZERO,
        }
    }

    /// Returns `true` if the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines (cart badge count).
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items
            .iter()
            .map(|item| u64::from(item.quantity.get()))
            .sum()
    }

    /// Find a line by its server ID.
    #[must_use]
    pub fn line(&self, id: CartLineId) -> Option<&CartLineItem> {
        self.items.iter().find(|item| item.id == id)
    }
}
