//! Restoring the cart from the on-disk cache.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use httpmock::Method::POST;
use serde_json::json;
use shopfront_cart::NewCartItem;
use shopfront_core::{Money, ProductId, Quantity};
use shopfront_integration_tests::TestContext;

async fn add_mug(ctx: &TestContext) {
    ctx.server
        .mock_async(|when, then| {
            when.method(POST).path(TestContext::path("cart/items"));
            then.status(201).json_body(json!({
                "message": "Item added to cart",
                "data": {
                    "cart": {
                        "items": [{"id": 101, "product_id": 7, "quantity": 2, "price": "15.50"}],
                        "total": "31.00"
                    },
                    "cart_session_id": "sess-abc"
                }
            }));
        })
        .await;

    let item = NewCartItem::new(
        ProductId::new(7),
        Quantity::new(2).unwrap(),
        "15.50".parse::<Money>().unwrap(),
    )
    .with_name("Mug")
    .with_image("mug.png");
    ctx.store.add_item(item).await.unwrap();
}

#[tokio::test]
async fn test_restart_shows_cached_cart_without_network() {
    let ctx = TestContext::new().await;
    add_mug(&ctx).await;
    let before = ctx.store.snapshot();

    let any_request = ctx
        .server
        .mock_async(|_when, then| {
            then.status(500);
        })
        .await;

    let reopened = ctx.reopen();

    assert_eq!(reopened.snapshot(), before);
    assert_eq!(reopened.snapshot().items[0].name.as_deref(), Some("Mug"));
    assert_eq!(reopened.session_id().unwrap().as_str(), "sess-abc");
    assert_eq!(any_request.hits_async().await, 0);
}

#[tokio::test]
async fn test_cache_files_are_written() {
    let ctx = TestContext::new().await;
    add_mug(&ctx).await;

    for key in ["cartItems", "cartTotal", "cartSessionId"] {
        let path = ctx.cache_dir().join(format!("{key}.json"));
        assert!(path.exists(), "missing cache entry {key}");
    }

    let session = std::fs::read_to_string(ctx.cache_dir().join("cartSessionId.json")).unwrap();
    assert_eq!(session, "\"sess-abc\"");
}

#[tokio::test]
async fn test_corrupt_cache_starts_empty() {
    let ctx = TestContext::new().await;
    add_mug(&ctx).await;

    std::fs::write(ctx.cache_dir().join("cartItems.json"), "{not json").unwrap();
    std::fs::write(ctx.cache_dir().join("cartTotal.json"), "[]").unwrap();

    let reopened = ctx.reopen();
    assert!(reopened.snapshot().is_empty());
    assert!(reopened.snapshot().total.is_zero());
    assert_eq!(reopened.session_id().unwrap().as_str(), "sess-abc");
}

#[tokio::test]
async fn test_clear_persists_empty_cart() {
    let ctx = TestContext::new().await;
    add_mug(&ctx).await;

    ctx.store.clear();

    let reopened = ctx.reopen();
    assert!(reopened.snapshot().is_empty());
    // clearing the cart does not end the guest session
    assert_eq!(reopened.session_id().unwrap().as_str(), "sess-abc");
}
