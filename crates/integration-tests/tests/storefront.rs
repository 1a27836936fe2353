//! Listing, product detail and cross-cutting middleware.

use std::time::{Duration, Instant};

use reqwest::StatusCode;

use pebble_integration_tests::{TestServer, htmx_post, hx_trigger};

#[tokio::test]
async fn test_health_and_security_headers() {
    let server = TestServer::start().await;

    let resp = server
        .client
        .get(server.url("/health"))
        .header("x-request-id", "trace-abc")
        .send()
        .await
        .expect("Failed to reach health check");

    assert_eq!(resp.status(), StatusCode::OK);
    let headers = resp.headers();
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-request-id"], "trace-abc");
    let csp = headers["content-security-policy"]
        .to_str()
        .expect("CSP is not ASCII");
    assert!(csp.contains("https://unpkg.com"));
    assert_eq!(resp.text().await.expect("Failed to read body"), "ok");
}

#[tokio::test]
async fn test_listing_uses_fallback_catalog() {
    let server = TestServer::start().await;

    let resp = server
        .client
        .get(server.url("/"))
        .send()
        .await
        .expect("Failed to load listing");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));

    let body = resp.text().await.expect("Failed to read listing");
    assert!(body.contains("Canvas Daypack"));
    assert!(body.contains("$109.95"));
    assert!(body.contains("data-src=\"https://fakestoreapi.com/img/product-1.jpg\""));
}

#[tokio::test]
async fn test_product_detail_errors() {
    let server = TestServer::start().await;

    let resp = server
        .client
        .get(server.url("/product?id=abc"))
        .send()
        .await
        .expect("Failed to load detail page");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = server
        .client
        .get(server.url("/product"))
        .send()
        .await
        .expect("Failed to load detail page");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = server
        .client
        .get(server.url("/product?id=999"))
        .send()
        .await
        .expect("Failed to load detail page");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = resp.text().await.expect("Failed to read page");
    assert!(body.contains("Product 999 not found"));
}

#[tokio::test]
async fn test_product_detail_options_and_add() {
    let server = TestServer::start().await;
    let client = &server.client;

    let body = client
        .get(server.url("/product?id=1"))
        .send()
        .await
        .expect("Failed to load detail page")
        .text()
        .await
        .expect("Failed to read page");
    assert!(body.contains("Canvas Daypack"));
    assert!(body.contains("Total: $109.95"));

    // XL carries a 10% surcharge
    let body = htmx_post(
        client,
        server.url("/product/variation"),
        &[("id", "1"), ("group", "Size"), ("option", "XL")],
    )
    .send()
    .await
    .expect("Failed to choose option")
    .text()
    .await
    .expect("Failed to read fragment");
    assert!(body.contains("Total: $120.95"));

    let body = htmx_post(
        client,
        server.url("/product/quantity"),
        &[("id", "1"), ("action", "increment")],
    )
    .send()
    .await
    .expect("Failed to step quantity")
    .text()
    .await
    .expect("Failed to read fragment");
    assert!(body.contains("Total: $241.89"));

    let resp = htmx_post(client, server.url("/product/add"), &[("id", "1")])
        .send()
        .await
        .expect("Failed to add to cart");
    assert_eq!(resp.status(), StatusCode::OK);
    let trigger = hx_trigger(&resp);
    assert_eq!(trigger["showToast"], "Added 2 items to cart!");
    assert_eq!(trigger["cartUpdated"]["count"], 2);

    // The stepper is back at 1 with the option kept
    let body = resp.text().await.expect("Failed to read fragment");
    assert!(body.contains("Total: $120.95"));

    let body = client
        .get(server.url("/cart"))
        .send()
        .await
        .expect("Failed to load cart")
        .text()
        .await
        .expect("Failed to read cart");
    assert!(body.contains("Size: XL"));
}

#[tokio::test]
async fn test_detail_add_waits_before_adding() {
    let delay = Duration::from_millis(300);
    let server = TestServer::start_with_add_delay(delay).await;
    let client = &server.client;

    let started = Instant::now();
    let resp = htmx_post(client, server.url("/product/add"), &[("id", "1")])
        .send()
        .await
        .expect("Failed to add to cart");
    let elapsed = started.elapsed();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(elapsed >= delay, "add returned after {elapsed:?}");
    assert_eq!(hx_trigger(&resp)["cartUpdated"]["count"], 1);

    // Cart mutations elsewhere are not delayed
    let started = Instant::now();
    let resp = htmx_post(client, server.url("/cart/increment"), &[("id", "1")])
        .send()
        .await
        .expect("Failed to increment");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(started.elapsed() < delay);
}
