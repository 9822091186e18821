//! The cart store: client-side state synchronized with the remote cart API.
//!
//! # Architecture
//!
//! - The remote API is the source of truth. Every mutation goes to the
//!   server first and the store replaces its state with the server's answer,
//!   reconciled with the display metadata only the client knows.
//! - State is held behind a `std::sync::Mutex` that is never held across an
//!   `.await`. Each operation locks once to read what it needs, suspends at
//!   its request, and locks again to apply the response.
//! - Responses are ordered with a [`RequestSequencer`]: every response
//!   carries the whole cart, so one older than a response already applied
//!   is discarded, whichever line it was about.
//! - Every change is written through to the local cache and published to
//!   `watch` subscribers.
//! - An HTTP 401 from any request forces a logout through the [`AuthStore`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shopfront_core::{CartLineId, CartSessionId, Quantity, QuantityError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::api::{AddLineRequest, CartApi, FetchedCart, Identity, RemoteCart};
use crate::auth::{AuthState, AuthStore};
use crate::cache::{CartCache, LocalStorage};
use crate::error::{CartError, Result};
use crate::model::{CartSnapshot, NewCartItem};
use crate::reconcile::{CarryOver, reconcile};
use crate::sequencer::{RequestSequencer, Ticket};

/// Identity last acted on by [`CartStore::sync_identity`].
#[derive(Debug, Clone, PartialEq, Eq)]
struct ObservedIdentity {
    auth: AuthState,
    session_id: Option<CartSessionId>,
}

#[derive(Debug)]
struct StoreState {
    snapshot: CartSnapshot,
    session_id: Option<CartSessionId>,
    sequencer: RequestSequencer,
    observed: Option<ObservedIdentity>,
}

/// Client-side cart synchronized with the remote cart API.
///
/// Construct once and share as `Arc<CartStore>`.
pub struct CartStore {
    api: Arc<dyn CartApi>,
    auth: Arc<dyn AuthStore>,
    cache: CartCache,
    state: Mutex<StoreState>,
    snapshot_tx: watch::Sender<CartSnapshot>,
    session_tx: watch::Sender<Option<CartSessionId>>,
}

impl CartStore {
    /// Create a store seeded from the local cache.
    ///
    /// No request is made; call [`CartStore::spawn_sync`] or
    /// [`CartStore::refresh`] to reconcile with the server.
    #[must_use]
    pub fn new(
        api: Arc<dyn CartApi>,
        auth: Arc<dyn AuthStore>,
        storage: Arc<dyn LocalStorage>,
    ) -> Self {
        let cache = CartCache::new(storage);
        let cached = cache.load();

        let (snapshot_tx, _) = watch::channel(cached.snapshot.clone());
        let (session_tx, _) = watch::channel(cached.session_id.clone());

        Self {
            api,
            auth,
            cache,
            state: Mutex::new(StoreState {
                snapshot: cached.snapshot,
                session_id: cached.session_id,
                sequencer: RequestSequencer::new(),
                observed: None,
            }),
            snapshot_tx,
            session_tx,
        }
    }

    /// The current cart.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        self.lock().snapshot.clone()
    }

    /// The guest cart session id, present only while anonymous.
    #[must_use]
    pub fn session_id(&self) -> Option<CartSessionId> {
        self.lock().session_id.clone()
    }

    /// Receiver notified with every new snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.snapshot_tx.subscribe()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add an item and adopt the server's view of the cart.
    ///
    /// Lines for the added product take the name and image supplied here;
    /// other lines keep the metadata they already had.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the request fails. State is unchanged on error.
    #[instrument(skip(self, item), fields(product_id = %item.product_id, quantity = %item.quantity))]
    pub async fn add_item(&self, item: NewCartItem) -> Result<CartSnapshot> {
        let (identity, ticket) = {
            let mut state = self.lock();
            (self.request_identity(&state), state.sequencer.issue())
        };

        let request = AddLineRequest::from(&item);
        let added = self
            .api
            .add_item(&identity, &request)
            .await
            .map_err(|e| self.on_error(e))?;

        if let Some(message) = added.message.as_deref() {
            debug!(message, "Cart API confirmed add");
        }

        if let Some(session_id) = added.session_id {
            if !self.auth.current().is_authenticated() {
                let mut state = self.lock();
                if state.session_id.as_ref() != Some(&session_id) {
                    info!(session_id = %session_id, "Stored new cart session");
                    self.set_session_id(&mut state, Some(session_id));
                }
            }
        }

        let rule = CarryOver::AddedProduct {
            product_id: item.product_id,
            name: item.name.as_deref(),
            image: item.image.as_deref(),
        };
        Ok(self.apply(ticket, |local| reconcile(added.cart, &local.items, rule)))
    }

    /// Change a line's quantity, then re-fetch the cart.
    ///
    /// A quantity below one is ignored: no request is made and the current
    /// snapshot is returned.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if either request fails.
    #[instrument(skip(self, line_id), fields(line_id = %line_id))]
    pub async fn update_quantity(&self, line_id: CartLineId, quantity: i64) -> Result<CartSnapshot> {
        let quantity = match Quantity::new(quantity) {
            Ok(quantity) => quantity,
            Err(QuantityError::BelowMinimum(_)) => {
                debug!("Ignoring quantity below one");
                return Ok(self.snapshot());
            }
            Err(e) => {
                warn!(error = %e, "Ignoring out-of-range quantity");
                return Ok(self.snapshot());
            }
        };

        let (identity, ticket) = {
            let mut state = self.lock();
            (self.request_identity(&state), state.sequencer.issue())
        };

        self.api
            .update_quantity(&identity, line_id, quantity)
            .await
            .map_err(|e| self.on_error(e))?;

        let fetched = self
            .api
            .fetch_cart(&identity)
            .await
            .map_err(|e| self.on_error(e))?;

        Ok(self.apply_fetched(ticket, fetched))
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the request fails.
    #[instrument(skip(self, line_id), fields(line_id = %line_id))]
    pub async fn remove_item(&self, line_id: CartLineId) -> Result<CartSnapshot> {
        let (identity, ticket) = {
            let mut state = self.lock();
            (self.request_identity(&state), state.sequencer.issue())
        };

        let cart = self
            .api
            .remove_item(&identity, line_id)
            .await
            .map_err(|e| self.on_error(e))?;

        Ok(self.apply(ticket, |local| reconcile(cart, &local.items, CarryOver::ByLineId)))
    }

    /// Empty the cart locally, e.g. after a completed checkout.
    ///
    /// The server is not contacted. Responses to requests still in flight
    /// are discarded.
    pub fn clear(&self) -> CartSnapshot {
        let ticket = self.lock().sequencer.issue();
        info!("Clearing cart");
        self.apply(ticket, |_| CartSnapshot::empty())
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// Fetch the full cart for the active identity.
    ///
    /// With neither a token nor a session id there is no cart to fetch and
    /// the current snapshot is returned.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the request fails.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<CartSnapshot> {
        let (identity, ticket) = {
            let mut state = self.lock();
            let Some(identity) = self.fetch_identity(&state) else {
                debug!("No cart identity, skipping fetch");
                return Ok(state.snapshot.clone());
            };
            (identity, state.sequencer.issue())
        };

        let fetched = self
            .api
            .fetch_cart(&identity)
            .await
            .map_err(|e| self.on_error(e))?;

        Ok(self.apply_fetched(ticket, fetched))
    }

    /// Fold the guest cart into the logged-in user's cart.
    ///
    /// The session id is consumed before the request and never reused. A
    /// failed merge is logged and the authenticated fetch still runs, unless
    /// the merge was rejected with 401.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Unauthorized` if the merge is rejected with 401,
    /// or the error of the follow-up fetch.
    #[instrument(skip(self))]
    pub async fn merge_on_login(&self) -> Result<CartSnapshot> {
        let auth = self.auth.current();
        let Some(token) = auth.token() else {
            return self.refresh().await;
        };

        let claimed = {
            let mut state = self.lock();
            match state.session_id.clone() {
                Some(session_id) => {
                    self.set_session_id(&mut state, None);
                    state.observed = Some(ObservedIdentity {
                        auth: auth.clone(),
                        session_id: None,
                    });
                    Some((session_id, state.sequencer.issue()))
                }
                None => None,
            }
        };
        let Some((session_id, ticket)) = claimed else {
            return self.refresh().await;
        };

        info!(session_id = %session_id, "Merging guest cart into account");
        match self.api.merge_session(&session_id, token).await {
            Ok(cart) => {
                self.apply(ticket, |local| reconcile(cart, &local.items, CarryOver::ByLineId));
            }
            Err(CartError::Unauthorized) => return Err(self.on_error(CartError::Unauthorized)),
            Err(e) => warn!(error = %e, "Guest cart merge failed, guest cart abandoned"),
        }

        self.refresh().await
    }

    /// React to an identity change since the last call.
    ///
    /// A login while a guest session exists merges; any other change of
    /// token or session id re-fetches the cart. Does nothing if the identity
    /// is unchanged.
    ///
    /// # Errors
    ///
    /// Returns the error of the merge or fetch that was triggered.
    pub async fn sync_identity(&self) -> Result<CartSnapshot> {
        let auth = self.auth.current();
        let merge = {
            let mut state = self.lock();
            let current = ObservedIdentity {
                auth,
                session_id: state.session_id.clone(),
            };
            if state.observed.as_ref() == Some(&current) {
                return Ok(state.snapshot.clone());
            }

            let merge = current.auth.is_authenticated() && current.session_id.is_some();
            if !merge {
                debug!(
                    authenticated = current.auth.is_authenticated(),
                    has_session = current.session_id.is_some(),
                    "Cart identity changed"
                );
                state.observed = Some(current);
            }
            merge
        };

        if merge {
            self.merge_on_login().await
        } else {
            self.refresh().await
        }
    }

    /// Run the initial sync, then keep the cart in step with identity
    /// changes until the task is aborted.
    #[must_use]
    pub fn spawn_sync(self: &Arc<Self>) -> JoinHandle<()> {
        let store = Arc::clone(self);
        let mut auth_rx = self.auth.subscribe();
        let mut session_rx = self.session_tx.subscribe();

        tokio::spawn(async move {
            loop {
                if let Err(e) = store.sync_identity().await {
                    warn!(error = %e, "Cart sync failed");
                }

                tokio::select! {
                    changed = auth_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    changed = session_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
                auth_rx.mark_unchanged();
                session_rx.mark_unchanged();
            }
            debug!("Cart sync task stopped");
        })
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Identity for a mutation. A guest without a session id still sends
    /// the request so the server can mint one.
    fn request_identity(&self, state: &StoreState) -> Identity {
        match self.auth.current().token() {
            Some(token) => Identity::Authenticated(token.clone()),
            None => Identity::Anonymous(state.session_id.clone()),
        }
    }

    /// Identity for a fetch, if there is a cart to fetch at all.
    fn fetch_identity(&self, state: &StoreState) -> Option<Identity> {
        match self.auth.current().token() {
            Some(token) => Some(Identity::Authenticated(token.clone())),
            None => state
                .session_id
                .clone()
                .map(|id| Identity::Anonymous(Some(id))),
        }
    }

    /// Take a session id echoed by a fetch if the server rotated it.
    ///
    /// A fetch never mints a session: the id is only replaced when the
    /// store is anonymous and already holds a different one.
    fn adopt_rotated_session(&self, state: &mut StoreState, echoed: CartSessionId) {
        if self.auth.current().is_authenticated() {
            return;
        }
        if state.session_id.as_ref().is_some_and(|held| *held != echoed) {
            info!(session_id = %echoed, "Cart session rotated by server");
            self.set_session_id(state, Some(echoed));
        }
    }

    fn set_session_id(&self, state: &mut StoreState, session_id: Option<CartSessionId>) {
        self.cache.write_session_id(session_id.as_ref());
        state.session_id.clone_from(&session_id);
        self.session_tx.send_replace(session_id);
    }

    /// Install a new snapshot if `ticket` is still current.
    ///
    /// Returns the snapshot in effect afterwards.
    fn apply(
        &self,
        ticket: Ticket,
        build: impl FnOnce(&CartSnapshot) -> CartSnapshot,
    ) -> CartSnapshot {
        let mut state = self.lock();
        self.install(&mut state, ticket, build);
        state.snapshot.clone()
    }

    /// Install a fetched cart, adopting a rotated session id only when the
    /// response is not stale.
    fn apply_fetched(&self, ticket: Ticket, fetched: FetchedCart) -> CartSnapshot {
        let FetchedCart { cart, session_id } = fetched;
        let mut state = self.lock();
        let installed = self.install(&mut state, ticket, |local| {
            reconcile(cart, &local.items, CarryOver::ByLineId)
        });
        if installed {
            if let Some(echoed) = session_id {
                self.adopt_rotated_session(&mut state, echoed);
            }
        }
        state.snapshot.clone()
    }

    fn install(
        &self,
        state: &mut StoreState,
        ticket: Ticket,
        build: impl FnOnce(&CartSnapshot) -> CartSnapshot,
    ) -> bool {
        if !state.sequencer.try_apply(ticket) {
            debug!(ticket = ticket.get(), "Discarding stale cart response");
            return false;
        }

        let next = build(&state.snapshot);
        self.cache.write_snapshot(&next);
        state.snapshot = next.clone();
        self.snapshot_tx.send_replace(next);
        true
    }

    /// Log an error and force a logout on 401.
    fn on_error(&self, err: CartError) -> CartError {
        if err.is_unauthorized() {
            warn!("Cart API rejected credentials, logging out");
            self.auth.logout();
        } else {
            warn!(error = %err, "Cart request failed");
        }
        err
    }
}
