//! Core types for Shopfront.
//!
//! This module provides type-safe wrappers for common cart concepts.

pub mod id;
pub mod money;
pub mod quantity;
pub mod session;

pub use id::*;
pub use money::Money;
pub use quantity::{Quantity, QuantityError};
pub use session::{CartSessionId, CartSessionIdError};
