//! HTTP implementation of the cart API using `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use shopfront_core::{CartLineId, CartSessionId, Quantity};
use tracing::{debug, error, instrument};
use url::Url;

use super::conversions::{convert_cart, convert_session_id};
use super::wire::{AddEnvelope, AddItemBody, CartEnvelope, ErrorBody, FetchEnvelope};
use super::{AddLineRequest, AddedCart, CartApi, FetchedCart, Identity, RemoteCart};
use crate::config::CartApiConfig;
use crate::error::{CartError, Result};

/// Header carrying the guest cart session id.
pub const SESSION_HEADER: &str = "X-Cart-Session";

/// Longest slice of a response body copied into logs and errors.
const MAX_BODY_EXCERPT: usize = 500;

/// Cart API client over HTTP.
#[derive(Clone)]
pub struct HttpCartApi {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpCartApi {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &CartApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout.min(Duration::from_secs(10)))
            .build()?;

        Ok(Self::with_client(client, config.base_url.clone()))
    }

    /// Create a client around an existing `reqwest::Client`.
    #[must_use]
    pub const fn with_client(client: reqwest::Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// The base URL all cart paths are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve path segments against the base URL.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Start a request carrying the identity headers.
    fn request(&self, method: Method, url: Url, identity: &Identity) -> RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json");

        match identity {
            Identity::Authenticated(token) => builder.bearer_auth(token.expose_secret()),
            Identity::Anonymous(Some(session_id)) => {
                builder.header(SESSION_HEADER, session_id.as_str())
            }
            Identity::Anonymous(None) => builder,
        }
    }

    /// Send a request and decode a JSON success body.
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = checked(request.send().await?).await?;
        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| {
            error!(
                error = %e,
                body = %excerpt(&body),
                "Failed to parse cart API response"
            );
            CartError::from(e)
        })
    }
}

/// Map non-success statuses onto the error taxonomy.
async fn checked(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::UNAUTHORIZED {
        return Err(CartError::Unauthorized);
    }

    let body = response.text().await.unwrap_or_default();
    error!(
        status = %status,
        body = %excerpt(&body),
        "Cart API returned non-success status"
    );

    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unexpected response")
                .to_string()
        });

    Err(CartError::ServerRejected {
        status: status.as_u16(),
        message,
    })
}

fn excerpt(body: &str) -> String {
    body.chars().take(MAX_BODY_EXCERPT).collect()
}

#[async_trait]
impl CartApi for HttpCartApi {
    #[instrument(skip(self))]
    async fn fetch_cart(&self, identity: &Identity) -> Result<FetchedCart> {
        let url = self.endpoint(&["cart"]);
        let envelope: FetchEnvelope = self
            .send_json(self.request(Method::GET, url, identity))
            .await?;

        Ok(FetchedCart {
            cart: convert_cart(envelope.data.cart),
            session_id: convert_session_id(envelope.data.session_id),
        })
    }

    #[instrument(skip(self, line), fields(product_id = %line.product_id, quantity = %line.quantity))]
    async fn add_item(&self, identity: &Identity, line: &AddLineRequest) -> Result<AddedCart> {
        let url = self.endpoint(&["cart", "items"]);
        let body = AddItemBody {
            product_id: line.product_id,
            quantity: line.quantity.get(),
            price: line.price.amount(),
            color: &line.color,
        };

        let envelope: AddEnvelope = self
            .send_json(self.request(Method::POST, url, identity).json(&body))
            .await?;

        Ok(AddedCart {
            cart: convert_cart(envelope.data.cart),
            session_id: convert_session_id(envelope.data.cart_session_id),
            message: envelope.message,
        })
    }

    #[instrument(skip(self, line_id, quantity), fields(line_id = %line_id, quantity = %quantity))]
    async fn update_quantity(
        &self,
        identity: &Identity,
        line_id: CartLineId,
        quantity: Quantity,
    ) -> Result<()> {
        let mut url = self.endpoint(&["cart", "items", line_id.to_string().as_str()]);
        url.query_pairs_mut()
            .append_pair("quantity", &quantity.to_string());

        let response = self.request(Method::PATCH, url, identity).send().await?;
        // body is not used; the store re-fetches the cart afterwards
        checked(response).await?;
        Ok(())
    }

    #[instrument(skip(self, line_id), fields(line_id = %line_id))]
    async fn remove_item(&self, identity: &Identity, line_id: CartLineId) -> Result<RemoteCart> {
        let url = self.endpoint(&["cart", "items", line_id.to_string().as_str()]);
        let envelope: CartEnvelope = self
            .send_json(self.request(Method::DELETE, url, identity))
            .await?;

        if let Some(message) = &envelope.message {
            debug!(message = %message, "Cart line removed");
        }
        Ok(convert_cart(envelope.data))
    }

    #[instrument(skip(self, session_id, token))]
    async fn merge_session(
        &self,
        session_id: &CartSessionId,
        token: &SecretString,
    ) -> Result<RemoteCart> {
        let url = self.endpoint(&["cart", "merge"]);
        let request = self
            .request(Method::POST, url, &Identity::Authenticated(token.clone()))
            .header(SESSION_HEADER, session_id.as_str())
            .json(&serde_json::json!({}));

        let envelope: CartEnvelope = self.send_json(request).await?;
        Ok(convert_cart(envelope.data))
    }
}
