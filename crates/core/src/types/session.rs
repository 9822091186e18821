//! Anonymous cart session identifier.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`CartSessionId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartSessionIdError {
    /// The input string is empty or only whitespace.
    #[error("cart session id cannot be empty")]
    Empty,
    /// The input contains characters that cannot travel in an HTTP header.
    #[error("cart session id contains invalid characters")]
    InvalidCharacters,
}

/// Opaque, server-issued identifier of an anonymous (guest) cart.
///
/// The server mints it on the first anonymous cart access. It is sent back
/// in the `X-Cart-Session` header until the guest logs in, at which point
/// it is consumed by the merge and forgotten.
///
/// ## Examples
///
/// ```
/// use shopfront_core::CartSessionId;
///
/// assert!(CartSessionId::parse("sess-abc").is_ok());
/// assert!(CartSessionId::parse("").is_err());
/// assert!(CartSessionId::parse("bad\nvalue").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CartSessionId(String);

impl CartSessionId {
    /// Parse a session id from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is blank or contains control or
    /// non-ASCII characters.
    pub fn parse(s: &str) -> Result<Self, CartSessionIdError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CartSessionIdError::Empty);
        }
        if !s.chars().all(|c| c.is_ascii_graphic()) {
            return Err(CartSessionIdError::InvalidCharacters);
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CartSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CartSessionId {
    type Err = CartSessionIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CartSessionId {
    type Error = CartSessionIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CartSessionId> for String {
    fn from(id: CartSessionId) -> Self {
        id.0
    }
}

impl AsRef<str> for CartSessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
