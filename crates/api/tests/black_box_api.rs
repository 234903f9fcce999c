use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::json;

use shopfront_api::app::{build_app, services::AppServices};
use shopfront_core::ProductId;
use shopfront_infra::{InMemoryProductStore, ProductStore, StoreError};
use shopfront_products::{default_filters, Product, ProductFilterSet, ProductSerializer};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(store: Arc<dyn ProductStore>, serializer: ProductSerializer) -> Self {
        // Same router as prod, bound to an ephemeral port.
        let services = AppServices::new(
            store,
            ProductFilterSet::new(default_filters()).unwrap(),
            serializer,
        );
        let app = build_app(Arc::new(services));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    async fn with_products(products: Vec<Product>) -> Self {
        Self::spawn(
            Arc::new(InMemoryProductStore::from_products(products)),
            ProductSerializer::from_field_names(&["id", "name", "price"]).unwrap(),
        )
        .await
    }

    async fn get(&self, path_and_query: &str) -> reqwest::Response {
        reqwest::Client::new()
            .get(format!("{}{}", self.base_url, path_and_query))
            .send()
            .await
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Store whose backend is always down.
struct UnreachableStore;

#[async_trait::async_trait]
impl ProductStore for UnreachableStore {
    fn backend(&self) -> &'static str {
        "unreachable"
    }

    async fn fetch_all(&self) -> Result<Vec<Product>, StoreError> {
        Err(StoreError::Unavailable("connection refused (10.0.0.7:5432)".to_string()))
    }
}

fn product(id: i64, name: &str, price: i64) -> Product {
    Product::new(ProductId::new(id), name).unwrap().with_price(price)
}

fn two_products() -> Vec<Product> {
    vec![product(1, "A", 10), product(2, "B", 20)]
}

#[tokio::test]
async fn health_is_ok() {
    let srv = TestServer::with_products(vec![]).await;
    let res = srv.get("/health").await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn no_params_returns_every_product() {
    let srv = TestServer::with_products(two_products()).await;

    let res = srv.get("/products").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(
        body,
        json!([
            {"id": 1, "name": "A", "price": 10},
            {"id": 2, "name": "B", "price": 20},
        ])
    );
}

#[tokio::test]
async fn exact_price_filter_returns_matching_product() {
    let srv = TestServer::with_products(two_products()).await;

    let res = srv.get("/products?price=10").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, json!([{"id": 1, "name": "A", "price": 10}]));

    let res = srv.get("/products/?price=20").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, json!([{"id": 2, "name": "B", "price": 20}]));
}

#[tokio::test]
async fn empty_catalog_returns_empty_array() {
    let srv = TestServer::with_products(vec![]).await;

    let res = srv.get("/products").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "[]");
}

#[tokio::test]
async fn unknown_params_do_not_change_the_result() {
    let srv = TestServer::with_products(two_products()).await;

    let plain: serde_json::Value = srv.get("/products?min_price=15").await.json().await.unwrap();
    let noisy: serde_json::Value = srv
        .get("/products?colour=red&min_price=15&page=3")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(plain, noisy);
    assert_eq!(plain, json!([{"id": 2, "name": "B", "price": 20}]));
}

#[tokio::test]
async fn filters_are_combined_with_and() {
    let srv = TestServer::with_products(vec![
        product(1, "Blue Hammer", 10),
        product(2, "Red Hammer", 25),
        product(3, "Blue Saw", 30),
    ])
    .await;

    let body: serde_json::Value = srv
        .get("/products?name_contains=hammer&min_price=20")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!([{"id": 2, "name": "Red Hammer", "price": 25}]));
}

#[tokio::test]
async fn wrong_value_type_is_a_client_error() {
    let srv = TestServer::with_products(two_products()).await;

    let res = srv.get("/products?price=cheap&in_stock=maybe").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_filter");
    assert_eq!(body["fields"]["price"], json!(["enter a whole number"]));
    assert!(body["fields"]["in_stock"].is_array());
}

#[tokio::test]
async fn store_failure_is_a_server_error_without_details() {
    let srv = TestServer::spawn(Arc::new(UnreachableStore), ProductSerializer::full()).await;

    let res = srv.get("/products").await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = res.text().await.unwrap();
    assert!(body.contains("store_error"));
    assert!(!body.contains("10.0.0.7"));
}

#[tokio::test]
async fn invalid_filter_wins_over_store_failure() {
    let srv = TestServer::spawn(Arc::new(UnreachableStore), ProductSerializer::full()).await;

    let res = srv.get("/products?min_price=abc").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn write_verbs_are_not_allowed() {
    let srv = TestServer::with_products(two_products()).await;
    let client = reqwest::Client::new();
    let url = format!("{}/products", srv.base_url);

    let res = client.post(&url).json(&json!({"id": 3, "name": "C"})).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);

    let res = client.delete(&url).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn full_serializer_keeps_declared_field_order() {
    let srv = TestServer::spawn(
        Arc::new(InMemoryProductStore::from_products([product(7, "Lamp", 4500).with_category("home")])),
        ProductSerializer::full(),
    )
    .await;

    let body = srv.get("/products?category=HOME").await.text().await.unwrap();
    assert_eq!(
        body,
        r#"[{"id":7,"name":"Lamp","category":"home","price":4500,"in_stock":true,"created_at":"1970-01-01T00:00:00Z"}]"#
    );
}
