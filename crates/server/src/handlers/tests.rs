use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::router;
use crate::app_state::AppState;
use crate::models::{NewItem, UnitPrice};
use crate::repo::memory_repo;

async fn setup() -> (Router, AppState) {
    let state = AppState::new(memory_repo().await);
    (router(state.clone()), state)
}

async fn call(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }
    let body = match body {
        Some(v) => Body::from(serde_json::to_string(&v).unwrap()),
        None => Body::empty(),
    };
    let resp = router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let json = if bytes.is_empty() {
        json!(null)
    } else {
        serde_json::from_slice(&bytes).unwrap_or(json!(null))
    };
    (status, json)
}

async fn merchant(state: &AppState, name: &str) -> i64 {
    state.merchants.create_merchant(name).await.unwrap().id
}

async fn item(state: &AppState, name: &str, unit_price: f64, merchant_id: i64) -> i64 {
    state
        .items
        .create_item(NewItem {
            name: Some(name.to_string()),
            description: Some("This is a record".to_string()),
            unit_price: Some(UnitPrice::Number(unit_price)),
            merchant_id: Some(merchant_id),
        })
        .await
        .unwrap()
        .id
}

fn names(body: &Value) -> Vec<&str> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["attributes"]["name"].as_str().unwrap())
        .collect()
}

// ── Merchants ──

#[tokio::test]
async fn lists_merchants_in_creation_order() {
    let (r, state) = setup().await;
    merchant(&state, "Beezy's").await;
    merchant(&state, "Joey's").await;
    merchant(&state, "Josies'").await;

    let (s, body) = call(&r, "GET", "/api/v1/merchants", None).await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(names(&body), ["Beezy's", "Joey's", "Josies'"]);
    for m in body["data"].as_array().unwrap() {
        assert_eq!(m["type"], "merchant");
        assert!(m["id"].as_str().unwrap().parse::<i64>().is_ok());
    }
}

#[tokio::test]
async fn invalid_param_short_circuits() {
    let (r, state) = setup().await;
    let m = merchant(&state, "Beezy's").await;
    let i = item(&state, "KG", 1.0, m).await;

    for uri in [
        "/api/v1/merchants?invalid_param=true".to_string(),
        format!("/api/v1/merchants/{m}?invalid_param=1"),
        format!("/api/v1/merchants/{m}/items?invalid_param=yes"),
        "/api/v1/items?invalid_param=true".to_string(),
        format!("/api/v1/items/{i}?invalid_param=true"),
    ] {
        let (s, body) = call(&r, "GET", &uri, None).await;
        assert_eq!(s, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body, json!({"error": "Invalid Parameter"}));
    }

    let (s, _) = call(&r, "GET", "/api/v1/merchants?invalid_param=false", None).await;
    assert_eq!(s, StatusCode::OK);
}

#[tokio::test]
async fn shows_one_merchant() {
    let (r, state) = setup().await;
    let m = merchant(&state, "Beezy's").await;

    let (s, body) = call(&r, "GET", &format!("/api/v1/merchants/{m}"), None).await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(body["data"]["id"], m.to_string());
    assert_eq!(body["data"]["attributes"]["name"], "Beezy's");
}

#[tokio::test]
async fn unknown_merchant_is_not_found() {
    let (r, _) = setup().await;
    let (s, body) = call(&r, "GET", "/api/v1/merchants/42", None).await;
    assert_eq!(s, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (s, _) = call(&r, "GET", "/api/v1/merchants/42/items", None).await;
    assert_eq!(s, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn lists_one_merchants_items() {
    let (r, state) = setup().await;
    let beezy = merchant(&state, "Beezy's").await;
    let joey = merchant(&state, "Joey's").await;
    item(&state, "KG", 1000.0, beezy).await;
    item(&state, "LW", 1000.0, beezy).await;
    item(&state, "PetroDragonic Apocalypse", 1000.0, beezy).await;
    item(&state, "Elsewhere", 1000.0, joey).await;

    let (s, body) = call(&r, "GET", &format!("/api/v1/merchants/{beezy}/items"), None).await;
    assert_eq!(s, StatusCode::OK);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 3);
    for i in data {
        assert_eq!(i["type"], "item");
        assert!(i["attributes"]["description"].is_string());
        assert!(i["attributes"]["unit_price"].is_f64());
        assert_eq!(i["attributes"]["merchant_id"], beezy);
    }
}

#[tokio::test]
async fn merchant_find_returns_first_by_name() {
    let (r, state) = setup().await;
    merchant(&state, "Rancid beetles").await;
    merchant(&state, "Beezy's").await;
    merchant(&state, "Angelic bumps").await;

    let (s, body) = call(&r, "GET", "/api/v1/merchants/find?name=b", None).await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(body["data"]["attributes"]["name"], "Angelic bumps");
}

#[tokio::test]
async fn merchant_find_without_match_is_placeholder() {
    let (r, state) = setup().await;
    merchant(&state, "Beezy's").await;

    let (s, body) = call(&r, "GET", "/api/v1/merchants/find?name=Ricks", None).await;
    assert_eq!(s, StatusCode::OK);
    assert!(body["data"]["id"].is_null());
    assert_eq!(body["data"]["type"], "merchant");
}

#[tokio::test]
async fn merchant_find_folds_case_beyond_ascii() {
    let (r, state) = setup().await;
    merchant(&state, "Turing").await;
    merchant(&state, "ring world").await;
    let ecole = merchant(&state, "ÉCOLE Shop").await;

    let (s, body) = call(&r, "GET", "/api/v1/merchants/find?name=%C3%A9cole", None).await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(body["data"]["id"], ecole.to_string());

    let (_, body) = call(&r, "GET", "/api/v1/merchants/find?name=RING", None).await;
    assert_eq!(body["data"]["attributes"]["name"], "ring world");
}

#[tokio::test]
async fn merchant_find_requires_name() {
    let (r, _) = setup().await;
    for uri in ["/api/v1/merchants/find", "/api/v1/merchants/find?name=%20"] {
        let (s, body) = call(&r, "GET", uri, None).await;
        assert_eq!(s, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }
}

// ── Items ──

#[tokio::test]
async fn lists_all_items() {
    let (r, state) = setup().await;
    let m = merchant(&state, "Beezy's").await;
    item(&state, "KG", 1000.0, m).await;
    item(&state, "LW", 1000.0, m).await;
    item(&state, "PetroDragonic Apocalypse", 1000.0, m).await;

    let (s, body) = call(&r, "GET", "/api/v1/items", None).await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(names(&body), ["KG", "LW", "PetroDragonic Apocalypse"]);
}

#[tokio::test]
async fn item_merchant_follows_foreign_key() {
    let (r, state) = setup().await;
    let m = merchant(&state, "Beezy's").await;
    let i = item(&state, "KG", 1.0, m).await;

    let (s, body) = call(&r, "GET", &format!("/api/v1/items/{i}/merchant"), None).await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(body["data"]["id"], m.to_string());
    assert_eq!(body["data"]["attributes"]["name"], "Beezy's");

    let (s, _) = call(&r, "GET", "/api/v1/items/999/merchant", None).await;
    assert_eq!(s, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn creates_item() {
    let (r, state) = setup().await;
    let m = merchant(&state, "Beezy's").await;

    let (s, body) = call(
        &r,
        "POST",
        "/api/v1/items",
        Some(json!({"item": {
            "name": "KG",
            "description": "This is a record",
            "unit_price": 799,
            "merchant_id": m
        }})),
    )
    .await;
    assert_eq!(s, StatusCode::CREATED);
    assert_eq!(body["data"]["type"], "item");
    assert_eq!(body["data"]["attributes"]["unit_price"], 799.0);

    let id: i64 = body["data"]["id"].as_str().unwrap().parse().unwrap();
    assert!(state.items.get_item(id).await.unwrap().is_some());
}

#[tokio::test]
async fn create_reports_validation_errors() {
    let (r, state) = setup().await;
    let m = merchant(&state, "Beezy's").await;

    let (s, body) = call(
        &r,
        "POST",
        "/api/v1/items",
        Some(json!({"name": "KG", "unit_price": -1, "merchant_id": m})),
    )
    .await;
    assert_eq!(s, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body,
        json!({"error": [
            "Description can't be blank",
            "Unit price must be greater than or equal to 0"
        ]})
    );

    let (s, body) = call(
        &r,
        "POST",
        "/api/v1/items",
        Some(json!({"item": {
            "name": "KG",
            "description": "This is a record",
            "unit_price": 0,
            "merchant_id": 404
        }})),
    )
    .await;
    assert_eq!(s, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, json!({"error": ["Merchant must exist"]}));
}

#[tokio::test]
async fn create_with_non_numeric_price_keeps_other_fields() {
    let (r, state) = setup().await;
    let m = merchant(&state, "Beezy's").await;

    let (s, body) = call(
        &r,
        "POST",
        "/api/v1/items",
        Some(json!({"item": {
            "name": "KG",
            "description": "This is a record",
            "unit_price": "abc",
            "merchant_id": m
        }})),
    )
    .await;
    assert_eq!(s, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, json!({"error": ["Unit price is not a number"]}));
    assert!(state.items.list_items().await.unwrap().is_empty());

    let (s, body) = call(
        &r,
        "POST",
        "/api/v1/items",
        Some(json!({"item": {
            "name": "KG",
            "description": "This is a record",
            "unit_price": "12.50",
            "merchant_id": m
        }})),
    )
    .await;
    assert_eq!(s, StatusCode::CREATED);
    assert_eq!(body["data"]["attributes"]["unit_price"], 12.5);
}

#[tokio::test]
async fn malformed_wrapped_body_is_rejected() {
    let (r, state) = setup().await;
    let m = merchant(&state, "Beezy's").await;
    let i = item(&state, "KG", 799.0, m).await;

    let (s, body) = call(
        &r,
        "PATCH",
        &format!("/api/v1/items/{i}"),
        Some(json!({"item": {"name": ["KG"], "unit_price": 5}})),
    )
    .await;
    assert_eq!(s, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].is_string());

    let stored = state.items.get_item(i).await.unwrap().unwrap();
    assert_eq!(stored.unit_price, 799.0);
}

#[tokio::test]
async fn update_with_non_numeric_price_changes_nothing() {
    let (r, state) = setup().await;
    let m = merchant(&state, "Beezy's").await;
    let i = item(&state, "KG", 799.0, m).await;

    let (s, body) = call(
        &r,
        "PATCH",
        &format!("/api/v1/items/{i}"),
        Some(json!({"item": {"name": "NEW", "unit_price": "abc"}})),
    )
    .await;
    assert_eq!(s, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, json!({"error": ["Unit price is not a number"]}));

    let stored = state.items.get_item(i).await.unwrap().unwrap();
    assert_eq!(stored.name, "KG");
    assert_eq!(stored.unit_price, 799.0);
}

#[tokio::test]
async fn updates_item_partially() {
    let (r, state) = setup().await;
    let m = merchant(&state, "Beezy's").await;
    let i = item(&state, "KG", 799.0, m).await;

    let (s, body) = call(
        &r,
        "PATCH",
        &format!("/api/v1/items/{i}"),
        Some(json!({"item": {"name": "KG (Deluxe)"}})),
    )
    .await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(body["data"]["attributes"]["name"], "KG (Deluxe)");
    assert_eq!(body["data"]["attributes"]["unit_price"], 799.0);
    assert_eq!(body["data"]["attributes"]["description"], "This is a record");
}

#[tokio::test]
async fn update_with_unknown_merchant_is_bad_request() {
    let (r, state) = setup().await;
    let m = merchant(&state, "Beezy's").await;
    let i = item(&state, "KG", 799.0, m).await;

    let (s, body) = call(
        &r,
        "PATCH",
        &format!("/api/v1/items/{i}"),
        Some(json!({"merchant_id": 9999, "name": "Changed"})),
    )
    .await;
    assert_eq!(s, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": ["Merchant must exist"]}));

    let stored = state.items.get_item(i).await.unwrap().unwrap();
    assert_eq!(stored.name, "KG");
    assert_eq!(stored.merchant_id, m);
}

#[tokio::test]
async fn update_rejects_negative_price() {
    let (r, state) = setup().await;
    let m = merchant(&state, "Beezy's").await;
    let i = item(&state, "KG", 799.0, m).await;

    let (s, body) = call(
        &r,
        "PATCH",
        &format!("/api/v1/items/{i}"),
        Some(json!({"unit_price": -5})),
    )
    .await;
    assert_eq!(s, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, json!({"error": ["Unit price must be greater than or equal to 0"]}));
}

#[tokio::test]
async fn update_of_missing_item_is_not_found() {
    let (r, _) = setup().await;
    let (s, _) = call(&r, "PATCH", "/api/v1/items/77", Some(json!({"name": "x"}))).await;
    assert_eq!(s, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleted_item_is_not_found() {
    let (r, state) = setup().await;
    let m = merchant(&state, "Beezy's").await;
    let i = item(&state, "KG", 799.0, m).await;

    let (s, _) = call(&r, "DELETE", &format!("/api/v1/items/{i}"), None).await;
    assert_eq!(s, StatusCode::NO_CONTENT);

    let (s, body) = call(&r, "GET", &format!("/api/v1/items/{i}"), None).await;
    assert_eq!(s, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (s, _) = call(&r, "DELETE", &format!("/api/v1/items/{i}"), None).await;
    assert_eq!(s, StatusCode::NOT_FOUND);
}

// ── Item search ──

#[tokio::test]
async fn find_all_by_name_and_min_price() {
    let (r, state) = setup().await;
    let m = merchant(&state, "Beezy's").await;
    item(&state, "KG", 799.0, m).await;
    item(&state, "LW", 1099.0, m).await;

    let (s, body) = call(&r, "GET", "/api/v1/items/find_all?min_price=999", None).await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(names(&body), ["LW"]);

    let (s, body) = call(&r, "GET", "/api/v1/items/find_all?name=KG", None).await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(names(&body), ["KG"]);

    let (s, body) = call(&r, "GET", "/api/v1/items/find_all?name=nothing", None).await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(body, json!({"data": []}));
}

#[tokio::test]
async fn find_all_by_name_ignores_unicode_case() {
    let (r, state) = setup().await;
    let m = merchant(&state, "Beezy's").await;
    item(&state, "Crème Brûlée", 4.0, m).await;
    item(&state, "crème fraîche", 3.0, m).await;
    item(&state, "Creme", 2.0, m).await;

    let (s, body) = call(&r, "GET", "/api/v1/items/find_all?name=CR%C3%88ME", None).await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(names(&body), ["Crème Brûlée", "crème fraîche"]);
}

#[tokio::test]
async fn find_all_rejects_bad_parameters() {
    let (r, _) = setup().await;
    for uri in [
        "/api/v1/items/find_all",
        "/api/v1/items/find_all?name=",
        "/api/v1/items/find_all?name=KG&min_price=5",
        "/api/v1/items/find_all?min_price=cheap",
        "/api/v1/items/find_all?min_price=-1",
    ] {
        let (s, body) = call(&r, "GET", uri, None).await;
        assert_eq!(s, StatusCode::BAD_REQUEST, "{uri}");
        assert!(body["error"].is_string(), "{uri}");
    }
}

#[tokio::test]
async fn health_is_ok() {
    let (r, _) = setup().await;
    let resp = r
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
