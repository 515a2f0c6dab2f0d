#![allow(clippy::unwrap_used)]
// Integration tests for `StoreClient` using wiremock.

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use plateful_api::{Error, FailureKind, StoreClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, StoreClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = StoreClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

fn category_row(id: &str, name: &str, sort_order: i64) -> serde_json::Value {
    json!({
        "id": id,
        "restaurant_id": "r1",
        "name": name,
        "sort_order": sort_order,
        "item_count": 0
    })
}

// ── List tests ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_categories() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/categories"))
        .and(query_param("restaurant_id", "eq.r1"))
        .and(query_param("order", "sort_order.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            category_row("c1", "Starters", 1),
            category_row("c2", "Mains", 2),
        ])))
        .mount(&server)
        .await;

    let rows = client.list_categories("r1").await.unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].name, "Starters");
    assert_eq!(rows[1].sort_order, 2);
}

#[tokio::test]
async fn test_list_products_with_category_filter() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/products"))
        .and(query_param("restaurant_id", "eq.r1"))
        .and(query_param("category_id", "eq.c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "p1",
            "restaurant_id": "r1",
            "category_id": "c1",
            "name": "Bruschetta",
            "price_cents": 850,
            "sort_order": 1
        }])))
        .mount(&server)
        .await;

    let rows = client.list_products("r1", Some("c1")).await.unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Bruschetta");
    assert!(rows[0].available, "available defaults to true when absent");
}

// ── Create / update / delete tests ──────────────────────────────────

#[tokio::test]
async fn test_create_category_merges_restaurant_id() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/categories"))
        .and(body_partial_json(json!({
            "name": "Desserts",
            "restaurant_id": "r1"
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!([category_row("c9", "Desserts", 3)])),
        )
        .mount(&server)
        .await;

    let row = client
        .create_category("r1", &json!({ "name": "Desserts" }))
        .await
        .unwrap();

    assert_eq!(row.id, "c9");
    assert_eq!(row.name, "Desserts");
}

#[tokio::test]
async fn test_update_product() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/products"))
        .and(query_param("id", "eq.p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "p1",
            "restaurant_id": "r1",
            "category_id": "c1",
            "name": "Bruschetta",
            "price_cents": 950,
            "sort_order": 1
        }])))
        .mount(&server)
        .await;

    let row = client
        .update_product("p1", &json!({ "price_cents": 950 }))
        .await
        .unwrap();

    assert_eq!(row.price_cents, 950);
}

#[tokio::test]
async fn test_delete_returns_deleted_row() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/categories"))
        .and(query_param("id", "eq.c1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([category_row("c1", "Starters", 1)])),
        )
        .mount(&server)
        .await;

    let row = client.delete_category("c1").await.unwrap();
    assert_eq!(row.id, "c1");
}

#[tokio::test]
async fn test_delete_missing_row_is_validation_error() {
    let (server, client) = setup().await;

    // Empty representation array: nothing matched the id filter.
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let result = client.delete_category("missing").await;
    assert!(matches!(
        result,
        Err(Error::Validation { status: 404, .. })
    ));
}

// ── Reorder tests ───────────────────────────────────────────────────

#[tokio::test]
async fn test_reorder_categories() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/reorder_categories"))
        .and(body_partial_json(json!({
            "p_restaurant_id": "r1",
            "p_ordered_ids": ["c2", "c1"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            category_row("c2", "Mains", 1),
            category_row("c1", "Starters", 2),
        ])))
        .mount(&server)
        .await;

    let rows = client
        .reorder_categories("r1", &["c2".into(), "c1".into()])
        .await
        .unwrap();

    assert_eq!(rows[0].id, "c2");
    assert_eq!(rows[0].sort_order, 1);
}

// ── Error taxonomy tests ────────────────────────────────────────────

#[tokio::test]
async fn test_auth_rejection() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/categories"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "JWT expired"
        })))
        .mount(&server)
        .await;

    let err = client.list_categories("r1").await.unwrap_err();
    assert_eq!(err.classify(), FailureKind::Auth);
    assert!(matches!(err, Error::Auth { status: 401, .. }));
}

#[tokio::test]
async fn test_validation_rejection_carries_code() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/categories"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "duplicate key value violates unique constraint",
            "code": "23505"
        })))
        .mount(&server)
        .await;

    let err = client
        .create_category("r1", &json!({ "name": "Mains" }))
        .await
        .unwrap_err();

    match err {
        Error::Validation { status, code, .. } => {
            assert_eq!(status, 409);
            assert_eq!(code.as_deref(), Some("23505"));
        }
        other => panic!("expected Validation error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_is_transient() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/products"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let err = client.list_products("r1", None).await.unwrap_err();
    assert_eq!(err.classify(), FailureKind::Network);
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/content"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client.list_content("r1", None).await.unwrap_err();
    assert!(matches!(err, Error::Decode { .. }));
}
