//! Wire-to-domain conversion functions.

use shopfront_core::{CartSessionId, Money, Quantity};
use tracing::warn;

use super::wire::{WireCart, WireLine};
use super::{RemoteCart, RemoteLine};
use crate::model::DEFAULT_COLOR;

/// Convert a wire cart, dropping lines the store cannot represent.
pub fn convert_cart(cart: WireCart) -> RemoteCart {
    RemoteCart {
        lines: cart.items.into_iter().filter_map(convert_line).collect(),
        total: Money::new(cart.total),
    }
}

fn convert_line(line: WireLine) -> Option<RemoteLine> {
    let quantity = match Quantity::new(line.quantity) {
        Ok(q) => q,
        Err(e) => {
            warn!(line_id = %line.id, error = %e, "Skipping cart line with invalid quantity");
            return None;
        }
    };

    Some(RemoteLine {
        id: line.id,
        product_id: line.product_id,
        quantity,
        price: Money::new(line.price),
        color: line
            .color
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_COLOR.to_string()),
    })
}

/// Convert a server-supplied session id, ignoring blank or unusable values.
pub fn convert_session_id(raw: Option<String>) -> Option<CartSessionId> {
    let raw = raw?;
    match CartSessionId::parse(&raw) {
        Ok(id) => Some(id),
        Err(e) => {
            if !raw.is_empty() {
                warn!(error = %e, "Ignoring unusable cart session id from server");
            }
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use shopfront_core::{CartLineId, ProductId};

    use super::*;

    fn wire_line(id: i64, quantity: i64, color: Option<&str>) -> WireLine {
        WireLine {
            id: CartLineId::new(id),
            product_id: ProductId::new(7),
            quantity,
            price: Decimal::from(1500),
            color: color.map(str::to_string),
        }
    }

    #[test]
    fn test_convert_cart_keeps_order_and_total() {
        let cart = convert_cart(WireCart {
            items: vec![wire_line(2, 1, Some("red")), wire_line(1, 3, None)],
            total: Decimal::from(6000),
        });
        assert_eq!(cart.lines[0].id, CartLineId::new(2));
        assert_eq!(cart.lines[0].color, "red");
        assert_eq!(cart.lines[1].color, DEFAULT_COLOR);
        assert_eq!(cart.total, Money::from(6000));
    }

    #[test]
    fn test_zero_quantity_lines_are_dropped() {
        let cart = convert_cart(WireCart {
            items: vec![wire_line(1, 0, None), wire_line(2, 1, None)],
            total: Decimal::from(1500),
        });
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].id, CartLineId::new(2));
    }

    #[test]
    fn test_convert_session_id() {
        assert!(convert_session_id(None).is_none());
        assert!(convert_session_id(Some(String::new())).is_none());
        assert_eq!(
            convert_session_id(Some("sess-abc".to_string()))
                .unwrap()
                .as_str(),
            "sess-abc"
        );
    }
}
