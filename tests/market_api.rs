//! Marketplace endpoints: farmer grid, posting listings, consumers and markets.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use harvestq::api::{create_router, AppState};
use harvestq::config::AppConfig;
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> Router {
    let config = AppConfig::default_config(concat!(env!("CARGO_MANIFEST_DIR"), "/data"));
    create_router(AppState::new(config))
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post_listing(app: &Router, form: Value) -> (StatusCode, Value) {
    let req = Request::post("/api/listings")
        .header("content-type", "application/json")
        .body(Body::from(form.to_string()))
        .unwrap();
    send(app, req).await
}

#[tokio::test]
async fn posting_a_listing_prepends_one_canonical_farmer() {
    let app = app();
    let (_, before) = get(&app, "/api/farmers").await;
    let before = before["count"].as_u64().unwrap();

    let (status, body) = post_listing(
        &app,
        json!({"farm": "Hilltop", "product": "Tomatoes", "qty": "40", "price": "2.50"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["ok"], true);
    assert_eq!(body["farmer"]["farmer"], "You");

    let (_, after) = get(&app, "/api/farmers").await;
    assert_eq!(after["count"].as_u64().unwrap(), before + 1);
    let first = &after["cards"][0];
    assert_eq!(first["farm"], "Hilltop");
    assert_eq!(first["product"], "Tomatoes");
    assert_eq!(first["qty"], "40");
    assert_eq!(first["price"], "2.5");
}

#[tokio::test]
async fn invalid_listing_is_rejected_without_side_effects() {
    let app = app();
    let (_, before) = get(&app, "/api/farmers").await;

    let (status, body) = post_listing(&app, json!({"qty": "", "price": "-1"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], false);
    assert_eq!(
        body["error"],
        "Listing rejected: qty: Required; price: Enter a positive number"
    );

    let (_, after) = get(&app, "/api/farmers").await;
    assert_eq!(before["count"], after["count"]);
}

#[tokio::test]
async fn farmer_grid_filters_by_country_and_sorts_by_price() {
    let (status, body) = get(&app(), "/api/farmers?country=Kenya&sort=priceAsc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 4);
    let cards = body["cards"].as_array().unwrap();
    assert!(cards.iter().all(|c| c["location"] != ", Kano"));
    assert_eq!(cards[0]["product"], "Kale");
    assert_eq!(cards[1]["product"], "Tomatoes");

    let (_, trade) = get(&app(), "/api/farmers?mode=trade").await;
    assert_eq!(trade["count"], 2);
    assert!(trade["cards"]
        .as_array()
        .unwrap()
        .iter()
        .all(|c| c["farm"] == "Thika Highlands"));
}

#[tokio::test]
async fn consumer_search() {
    let (status, body) = get(&app(), "/api/consumers?q=okra").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["consumers"][0]["name"], "Austin Bistro");
}

#[tokio::test]
async fn market_index_and_lookup() {
    let app = app();
    let (_, index) = get(&app, "/api/markets").await;
    assert_eq!(index["markets"], json!(["kenya", "nigeria", "us"]));

    let (status, nigeria) = get(&app, "/api/markets/Nigeria").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(nigeria["market"]["farmers"].as_array().unwrap().len(), 2);

    let (status, us) = get(&app, "/api/markets/US").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(us["market"]["country"], "US");

    let (status, missing) = get(&app, "/api/markets/Peru").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(missing["ok"], false);
}
