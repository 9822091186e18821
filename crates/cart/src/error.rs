//! Unified cart error type.
//!
//! Every store operation returns `Result<_, CartError>`. The store never
//! shows anything to the shopper; callers decide how to present an error
//! (toast, banner, exit code) using [`CartError::user_message`].

use thiserror::Error;

/// Errors returned by cart operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// The API rejected the credentials (HTTP 401). The store has already
    /// forced a logout when this is returned.
    #[error("Unauthorized: the cart API rejected the current credentials")]
    Unauthorized,

    /// The API answered with a non-success status other than 401.
    #[error("Server rejected request: {status} - {message}")]
    ServerRejected { status: u16, message: String },

    /// The request never produced an HTTP response (connection, DNS, timeout).
    #[error("Network failure: {0}")]
    NetworkFailure(String),

    /// A success response whose body does not match the documented envelope.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl CartError {
    /// Returns `true` for the error that forces a logout.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Short message suitable for showing to the shopper.
    ///
    /// Internal details (status codes, transport errors, bodies) are not
    /// exposed; server-provided messages are, since the API writes them for
    /// shoppers ("Out of stock", ...).
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized => "Your session has expired. Please log in again.".to_string(),
            Self::ServerRejected { message, .. } if !message.trim().is_empty() => message.clone(),
            Self::ServerRejected { .. } | Self::MalformedResponse(_) => {
                "The cart could not be updated. Please try again.".to_string()
            }
            Self::NetworkFailure(_) => {
                "Could not reach the store. Check your connection and try again.".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for CartError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else {
            Self::NetworkFailure(err.to_string())
        }
    }
}

impl From<serde_json::Error> for CartError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_error_display() {
        let err = CartError::ServerRejected {
            status: 422,
            message: "Out of stock".to_string(),
        };
        assert_eq!(err.to_string(), "Server rejected request: 422 - Out of stock");

        let err = CartError::NetworkFailure("connection refused".to_string());
        assert_eq!(err.to_string(), "Network failure: connection refused");
    }

    #[test]
    fn test_user_message_hides_internals() {
        let err = CartError::NetworkFailure("tcp connect error: 10.0.0.1:443".to_string());
        assert!(!err.user_message().contains("10.0.0.1"));

        let err = CartError::MalformedResponse("missing field `data`".to_string());
        assert!(!err.user_message().contains("data"));

        let err = CartError::ServerRejected {
            status: 500,
            message: String::new(),
        };
        assert_eq!(
            err.user_message(),
            "The cart could not be updated. Please try again."
        );
    }

    #[test]
    fn test_user_message_passes_server_message() {
        let err = CartError::ServerRejected {
            status: 422,
            message: "Out of stock".to_string(),
        };
        assert_eq!(err.user_message(), "Out of stock");
    }

    #[test]
    fn test_is_unauthorized() {
        assert!(CartError::Unauthorized.is_unauthorized());
        assert!(!CartError::NetworkFailure(String::new()).is_unauthorized());
    }

    #[test]
    fn test_json_error_is_malformed_response() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(
            CartError::from(err),
            CartError::MalformedResponse(_)
        ));
    }
}
