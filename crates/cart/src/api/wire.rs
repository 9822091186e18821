//! JSON envelopes of the cart API.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shopfront_core::{CartLineId, ProductId};

/// A line as serialized by the server.
#[derive(Debug, Deserialize)]
pub struct WireLine {
    pub id: CartLineId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub price: Decimal,
    #[serde(default)]
    pub color: Option<String>,
}

/// `{ items, total }`, shared by most responses.
#[derive(Debug, Deserialize)]
pub struct WireCart {
    #[serde(default)]
    pub items: Vec<WireLine>,
    #[serde(default)]
    pub total: Decimal,
}

/// `GET cart` response: `{ data: { items, total, session_id? } }`.
#[derive(Debug, Deserialize)]
pub struct FetchEnvelope {
    pub data: FetchData,
}

#[derive(Debug, Deserialize)]
pub struct FetchData {
    #[serde(flatten)]
    pub cart: WireCart,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// `POST cart/items` response:
/// `{ message, data: { cart: { items, total }, cart_session_id? } }`.
#[derive(Debug, Deserialize)]
pub struct AddEnvelope {
    #[serde(default)]
    pub message: Option<String>,
    pub data: AddData,
}

#[derive(Debug, Deserialize)]
pub struct AddData {
    pub cart: WireCart,
    #[serde(default)]
    pub cart_session_id: Option<String>,
}

/// `DELETE cart/items/{id}` and `POST cart/merge` response:
/// `{ message?, data: { items, total } }`.
#[derive(Debug, Deserialize)]
pub struct CartEnvelope {
    #[serde(default)]
    pub message: Option<String>,
    pub data: WireCart,
}

/// `POST cart/items` request body.
#[derive(Debug, Serialize)]
pub struct AddItemBody<'a> {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub color: &'a str,
}

/// Error body some endpoints return: `{ message }`.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}
