//! End-to-end cart and checkout flow.

use reqwest::StatusCode;

use pebble_integration_tests::{TestServer, htmx_post, hx_trigger};

#[tokio::test]
async fn test_cart_to_checkout_flow() {
    let server = TestServer::start().await;
    let client = &server.client;

    // Empty cart: nothing to buy
    let body = client
        .get(server.url("/cart"))
        .send()
        .await
        .expect("Failed to load cart")
        .text()
        .await
        .expect("Failed to read cart");
    assert!(body.contains("Your cart is empty"));
    assert!(body.contains("$0.00"));
    assert!(body.contains("data-checkout disabled"));

    // Add from the listing grid
    let resp = htmx_post(client, server.url("/cart/add"), &[("id", "1")])
        .send()
        .await
        .expect("Failed to add to cart");
    assert_eq!(resp.status(), StatusCode::OK);
    let trigger = hx_trigger(&resp);
    assert_eq!(trigger["cartUpdated"]["count"], 1);
    assert_eq!(trigger["cartUpdated"]["total"], "$109.95");
    assert_eq!(trigger["cartUpdated"]["checkoutEnabled"], true);
    assert_eq!(trigger["openCartPanel"], true);
    assert_eq!(trigger["showToast"], "Item added to cart");

    let body = client
        .get(server.url("/cart"))
        .send()
        .await
        .expect("Failed to load cart")
        .text()
        .await
        .expect("Failed to read cart");
    assert!(body.contains("Canvas Daypack"));
    assert!(body.contains("$109.95"));
    assert!(!body.contains("data-checkout disabled"));

    // Line changes come back as the items fragment
    let body = htmx_post(client, server.url("/cart/increment"), &[("id", "1")])
        .send()
        .await
        .expect("Failed to increment")
        .text()
        .await
        .expect("Failed to read fragment");
    assert!(body.contains("$219.90"));

    for _ in 0..3 {
        htmx_post(client, server.url("/cart/decrement"), &[("id", "1")])
            .send()
            .await
            .expect("Failed to decrement");
    }
    let count = client
        .get(server.url("/cart/count"))
        .send()
        .await
        .expect("Failed to load count")
        .text()
        .await
        .expect("Failed to read count");
    assert!(count.contains(">1</span>"));

    // Checkout empties the cart
    let resp = htmx_post(client, server.url("/checkout"), &[])
        .send()
        .await
        .expect("Failed to check out");
    assert_eq!(resp.status(), StatusCode::OK);
    let trigger = hx_trigger(&resp);
    assert_eq!(trigger["showToast"], "Order placed successfully!");
    assert_eq!(trigger["cartUpdated"]["count"], 0);
    let body = resp.text().await.expect("Failed to read fragment");
    assert!(body.contains("Your cart is empty"));
    assert!(body.contains("$0.00"));

    // A second checkout is refused
    let resp = htmx_post(client, server.url("/checkout"), &[])
        .send()
        .await
        .expect("Failed to check out");
    assert_eq!(
        hx_trigger(&resp)["showToast"],
        "Please add items to your cart first"
    );
}

#[tokio::test]
async fn test_quantity_set_and_remove() {
    let server = TestServer::start().await;
    let client = &server.client;

    htmx_post(client, server.url("/cart/add"), &[("id", "2")])
        .send()
        .await
        .expect("Failed to add to cart");

    // Typed quantities below 1 are clamped
    let resp = htmx_post(client, server.url("/cart/set"), &[("id", "2"), ("quantity", "0")])
        .send()
        .await
        .expect("Failed to set quantity");
    assert_eq!(hx_trigger(&resp)["cartUpdated"]["count"], 1);

    let resp = htmx_post(client, server.url("/cart/set"), &[("id", "2"), ("quantity", "3")])
        .send()
        .await
        .expect("Failed to set quantity");
    assert_eq!(hx_trigger(&resp)["cartUpdated"]["total"], "$66.90");

    let resp = htmx_post(client, server.url("/cart/remove"), &[("id", "2")])
        .send()
        .await
        .expect("Failed to remove line");
    assert_eq!(hx_trigger(&resp)["cartUpdated"]["checkoutEnabled"], false);
    let body = resp.text().await.expect("Failed to read fragment");
    assert!(body.contains("Your cart is empty"));

    let resp = htmx_post(client, server.url("/cart/remove"), &[("id", "nope")])
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_repeated_grid_add_is_ignored() {
    let server = TestServer::start().await;
    let client = &server.client;

    let first = htmx_post(client, server.url("/cart/add"), &[("id", "3")])
        .send()
        .await
        .expect("Failed to add to cart");
    assert_eq!(first.status(), StatusCode::OK);

    let repeat = htmx_post(client, server.url("/cart/add"), &[("id", "3")])
        .send()
        .await
        .expect("Failed to add to cart");
    assert_eq!(repeat.status(), StatusCode::NO_CONTENT);

    server.clock.advance(600);
    let later = htmx_post(client, server.url("/cart/add"), &[("id", "3")])
        .send()
        .await
        .expect("Failed to add to cart");
    assert_eq!(later.status(), StatusCode::OK);
    assert_eq!(hx_trigger(&later)["cartUpdated"]["count"], 2);
}

#[tokio::test]
async fn test_drawer_checkout_link() {
    let server = TestServer::start().await;
    let client = &server.client;

    let resp = client
        .get(server.url("/checkout/start"))
        .header("HX-Request", "true")
        .send()
        .await
        .expect("Failed to follow checkout link");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(hx_trigger(&resp)["showToast"], "Your cart is empty");

    htmx_post(client, server.url("/cart/add"), &[("id", "1")])
        .send()
        .await
        .expect("Failed to add to cart");

    let resp = client
        .get(server.url("/checkout/start"))
        .header("HX-Request", "true")
        .send()
        .await
        .expect("Failed to follow checkout link");
    assert_eq!(
        resp.headers().get("hx-redirect").and_then(|v| v.to_str().ok()),
        Some("/cart")
    );
}

#[tokio::test]
async fn test_carts_are_per_visitor() {
    let server = TestServer::start().await;

    htmx_post(&server.client, server.url("/cart/add"), &[("id", "1")])
        .send()
        .await
        .expect("Failed to add to cart");

    let other = server.new_visitor();
    let body = other
        .get(server.url("/cart"))
        .send()
        .await
        .expect("Failed to load cart")
        .text()
        .await
        .expect("Failed to read cart");
    assert!(body.contains("Your cart is empty"));
}
