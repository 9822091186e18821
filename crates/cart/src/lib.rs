//! Shopfront cart synchronization client.
//!
//! Keeps a client-side view of the shopper's cart in step with the remote
//! cart API. The server is authoritative for contents, prices and totals;
//! the client adds the display metadata (product name and image) that the
//! API does not return, persists the last known cart locally, and tracks the
//! guest cart session until the shopper logs in.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use shopfront_cart::{
//!     AuthSession, CartConfig, CartStore, FileStorage, HttpCartApi, NewCartItem,
//! };
//! use shopfront_core::{Money, ProductId, Quantity};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CartConfig::from_env()?;
//! let api = Arc::new(HttpCartApi::new(&config.api)?);
//! let auth = Arc::new(AuthSession::anonymous());
//! let storage = Arc::new(FileStorage::new(&config.cache_dir));
//!
//! let store = Arc::new(CartStore::new(api, auth, storage));
//! let _sync = store.spawn_sync();
//!
//! let item = NewCartItem::new(ProductId::new(7), Quantity::new(2)?, Money::from(1500))
//!     .with_name("Mug")
//!     .with_image("mug.png");
//! let cart = store.add_item(item).await?;
//! println!("{} items, total {}", cart.item_count(), cart.total);
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod reconcile;
pub mod sequencer;
pub mod store;

pub use api::{CartApi, HttpCartApi, Identity};
pub use auth::{AuthSession, AuthState, AuthStore};
pub use cache::{CartCache, FileStorage, LocalStorage, MemoryStorage};
pub use config::{CartApiConfig, CartConfig, ConfigError};
pub use error::{CartError, Result};
pub use model::{CartLineItem, CartSnapshot, NewCartItem};
pub use store::CartStore;
