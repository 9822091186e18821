//! Cart commands.

use std::fmt::Write as _;

use shopfront_cart::{CartSnapshot, NewCartItem};
use shopfront_core::{CartLineId, Money, ProductId, Quantity};

use super::{CommandError, Session};

/// Build an item from command-line arguments.
///
/// # Errors
///
/// Returns an error if `quantity` is not a positive count.
pub fn new_item(
    product: ProductId,
    quantity: i64,
    price: Money,
    color: Option<String>,
    name: Option<String>,
    image: Option<String>,
) -> Result<NewCartItem, CommandError> {
    let mut item = NewCartItem::new(product, Quantity::new(quantity)?, price);
    item.color = color;
    item.name = name;
    item.image = image;
    Ok(item)
}

/// Reconcile with the server and print the cart.
///
/// # Errors
///
/// Returns an error if the fetch (or a pending guest cart merge) fails.
pub async fn show(session: &Session) -> Result<(), CommandError> {
    let snapshot = session.store.sync_identity().await?;
    print_cart(&snapshot);
    Ok(())
}

/// Add an item and print the cart.
///
/// # Errors
///
/// Returns an error if the server rejects the item.
pub async fn add(session: &Session, item: NewCartItem) -> Result<(), CommandError> {
    let snapshot = session.store.add_item(item).await?;
    tracing::info!(items = snapshot.item_count(), "Item added");
    print_cart(&snapshot);
    Ok(())
}

/// Change a line's quantity and print the cart.
///
/// # Errors
///
/// Returns an error if the update or the follow-up fetch fails.
pub async fn update(
    session: &Session,
    line: CartLineId,
    quantity: i64,
) -> Result<(), CommandError> {
    let snapshot = session.store.update_quantity(line, quantity).await?;
    print_cart(&snapshot);
    Ok(())
}

/// Remove a line and print the cart.
///
/// # Errors
///
/// Returns an error if the server rejects the removal.
pub async fn remove(session: &Session, line: CartLineId) -> Result<(), CommandError> {
    let snapshot = session.store.remove_item(line).await?;
    print_cart(&snapshot);
    Ok(())
}

/// Empty the local cart.
pub fn clear(session: &Session) {
    let snapshot = session.store.clear();
    print_cart(&snapshot);
}

#[allow(clippy::print_stdout)]
fn print_cart(snapshot: &CartSnapshot) {
    print!("{}", render(snapshot));
}

/// Render the cart as a plain-text table.
fn render(snapshot: &CartSnapshot) -> String {
    if snapshot.is_empty() {
        return "Your cart is empty.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>8}  {:<24} {:<10} {:>4} {:>10} {:>10}",
        "LINE", "PRODUCT", "COLOR", "QTY", "PRICE", "SUBTOTAL"
    );
    for item in &snapshot.items {
        let label = item
            .name
            .clone()
            .unwrap_or_else(|| format!("#{}", item.product_id));
        let _ = writeln!(
            out,
            "{:>8}  {:<24} {:<10} {:>4} {:>10} {:>10}",
            item.id,
            label,
            item.color,
            item.quantity,
            item.price,
            item.subtotal()
        );
    }
    let _ = writeln!(
        out,
        "{} item(s), total {}",
        snapshot.item_count(),
        snapshot.total
    );
    out
}
