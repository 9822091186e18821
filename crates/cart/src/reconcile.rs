//! Reconciliation of server carts with locally held display metadata.
//!
//! The cart API returns ids, quantities and prices but never the product
//! name or image. Every response is therefore merged with what the client
//! already knows before it replaces the published snapshot.

use std::collections::HashMap;

use shopfront_core::{CartLineId, ProductId};

use crate::api::RemoteCart;
use crate::model::{CartLineItem, CartSnapshot};

/// Which local data a returned line takes its name and image from.
#[derive(Debug, Clone, Copy)]
pub enum CarryOver<'a> {
    /// Lines for the product just added take the metadata supplied with the
    /// add; all other lines fall back to [`CarryOver::ByLineId`].
    AddedProduct {
        product_id: ProductId,
        name: Option<&'a str>,
        image: Option<&'a str>,
    },
    /// Each line takes the metadata of the local line with the same id.
    ByLineId,
}

/// Build a snapshot from a server cart, carrying display metadata over from
/// `local` according to `rule`.
///
/// Quantities, prices, ids, order and the total always come from `remote`.
#[must_use]
pub fn reconcile(remote: RemoteCart, local: &[CartLineItem], rule: CarryOver<'_>) -> CartSnapshot {
    let known: HashMap<CartLineId, &CartLineItem> =
        local.iter().map(|item| (item.id, item)).collect();

    let items = remote
        .lines
        .into_iter()
        .map(|line| {
            let previous = known.get(&line.id);
            let carried_name = previous.and_then(|p| p.name.clone());
            let carried_image = previous.and_then(|p| p.image.clone());

            let (name, image) = match rule {
                CarryOver::AddedProduct {
                    product_id,
                    name,
                    image,
                } if product_id == line.product_id => (
                    name.map(str::to_owned).or(carried_name),
                    image.map(str::to_owned).or(carried_image),
                ),
                _ => (carried_name, carried_image),
            };

            CartLineItem {
                id: line.id,
                product_id: line.product_id,
                quantity: line.quantity,
                price: line.price,
                color: line.color,
                name,
                image,
            }
        })
        .collect();

    CartSnapshot {
        items,
        total: remote.total,
    }
}
