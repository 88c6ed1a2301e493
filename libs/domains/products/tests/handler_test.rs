//! Router-level tests backed by an in-memory repository.

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use domain_products::{
    Product, ProductFilter, ProductRepository, ProductResult, ProductService, ReferenceKind,
    handlers,
};
use http_body_util::BodyExt;
use mongodb::bson::oid::ObjectId;
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tower::ServiceExt;

#[derive(Default)]
struct InMemoryRepository {
    products: Mutex<HashMap<ObjectId, Product>>,
    known: Mutex<HashSet<ObjectId>>,
}

impl InMemoryRepository {
    fn with_known(ids: &[ObjectId]) -> Self {
        let repository = Self::default();
        repository.known.lock().unwrap().extend(ids.iter().copied());
        repository
    }
}

#[async_trait]
impl ProductRepository for InMemoryRepository {
    async fn save(&self, product: &Product) -> ProductResult<()> {
        let mut products = self.products.lock().unwrap();
        if products
            .values()
            .any(|p| p.slug == product.slug && p.id != product.id)
        {
            return Err(domain_products::ProductError::DuplicateSlug(
                product.slug.clone(),
            ));
        }
        products.insert(product.id, product.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: ObjectId) -> ProductResult<Option<Product>> {
        Ok(self.products.lock().unwrap().get(&id).cloned())
    }

    async fn get_by_slug(&self, slug: &str) -> ProductResult<Option<Product>> {
        let products = self.products.lock().unwrap();
        Ok(products.values().find(|p| p.slug == slug).cloned())
    }

    async fn exists_by_slug(&self, slug: &str) -> ProductResult<bool> {
        let products = self.products.lock().unwrap();
        Ok(products.values().any(|p| p.slug == slug))
    }

    async fn list(&self, filter: ProductFilter) -> ProductResult<Vec<Product>> {
        let products = self.products.lock().unwrap();
        Ok(products
            .values()
            .filter(|p| filter.category.is_none_or(|c| p.categories.contains(&c)))
            .take(filter.effective_limit() as usize)
            .cloned()
            .collect())
    }

    async fn count(&self, filter: ProductFilter) -> ProductResult<u64> {
        Ok(self.list(filter).await?.len() as u64)
    }

    async fn delete(&self, id: ObjectId) -> ProductResult<bool> {
        Ok(self.products.lock().unwrap().remove(&id).is_some())
    }

    async fn missing_references(
        &self,
        _kind: ReferenceKind,
        ids: &[ObjectId],
    ) -> ProductResult<Vec<ObjectId>> {
        let known = self.known.lock().unwrap();
        Ok(ids.iter().filter(|id| !known.contains(id)).copied().collect())
    }
}

fn app(repository: InMemoryRepository) -> Router {
    handlers::router(ProductService::new(repository))
}

fn shirt(category: &ObjectId) -> Value {
    json!({
        "title": "Linen Shirt",
        "categoryIds": [category.to_hex()],
        "collectionIds": [],
        "tagIds": [],
        "numberInStock": 10,
        "price": 19.99,
        "description": "A nice linen shirt",
        "imageUrls": ["a.jpg"],
        "mainImageUrl": "main.jpg"
    })
}

async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn test_create_product_returns_created_with_default_discount() {
    let category = ObjectId::new();
    let app = app(InMemoryRepository::with_known(&[category]));

    let (status, body) = send(app, "POST", "/", Some(shirt(&category))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["discount"].as_f64(), Some(0.0));
    assert_eq!(body["slug"], "linen-shirt");
    assert_eq!(body["categories"][0], category.to_hex());
    assert_eq!(body["id"].as_str().map(str::len), Some(24));
}

#[tokio::test]
async fn test_create_product_invalid_body_lists_violations() {
    let app = app(InMemoryRepository::default());

    let body = json!({ "title": "Hi", "price": -1, "slug": "nope-slug" });
    let (status, body) = send(app, "POST", "/", Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert_eq!(body["code"], 1001);

    let details = body["details"].as_array().unwrap();
    let has = |path: &str, rule: &str| {
        details
            .iter()
            .any(|d| d["path"] == path && d["rule"] == rule)
    };
    assert!(has("title", "min_length"));
    assert!(has("price", "min"));
    assert!(has("mainImageUrl", "required"));
    assert!(has("slug", "unknown"));
}

#[tokio::test]
async fn test_create_product_unknown_category_is_unprocessable() {
    let app = app(InMemoryRepository::default());
    let category = ObjectId::new();

    let (status, body) = send(app, "POST", "/", Some(shirt(&category))).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "INVALID_REFERENCE");
    assert_eq!(body["details"][0]["kind"], "categories");
    assert_eq!(body["details"][0]["ids"][0], category.to_hex());
}

#[tokio::test]
async fn test_malformed_json_uses_error_body() {
    let app = app(InMemoryRepository::default());
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "JSON_EXTRACTION");
}

#[tokio::test]
async fn test_get_product_bad_id() {
    let app = app(InMemoryRepository::default());

    let (status, body) = send(app, "GET", "/not-an-object-id", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_OBJECT_ID");
}

#[tokio::test]
async fn test_list_products_bad_query_uses_error_body() {
    let app = app(InMemoryRepository::default());

    let (status, body) = send(app.clone(), "GET", "/?category=nope", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BAD_REQUEST");
    assert_eq!(body["code"], 1006);
    assert!(body["message"].as_str().unwrap().contains("category"));

    let (status, body) = send(app, "GET", "/count?limit=lots", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_list_products_filters_by_category() {
    let category = ObjectId::new();
    let other = ObjectId::new();
    let app = app(InMemoryRepository::with_known(&[category, other]));

    let (status, _) = send(app.clone(), "POST", "/", Some(shirt(&category))).await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!("/?category={}", other.to_hex());
    let (status, body) = send(app.clone(), "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let uri = format!("/?category={}", category.to_hex());
    let (_, body) = send(app, "GET", &uri, None).await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_update_within_update_rules_still_checked_against_record() {
    let category = ObjectId::new();
    let app = app(InMemoryRepository::with_known(&[category]));

    let (_, created) = send(app.clone(), "POST", "/", Some(shirt(&category))).await;
    let uri = format!("/{}", created["id"].as_str().unwrap());

    let (status, body) = send(app.clone(), "PUT", &uri, Some(json!({ "title": "Tee" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["path"], "title");
    assert_eq!(body["details"][0]["rule"], "min_length");

    let (status, body) = send(app.clone(), "PUT", &uri, Some(json!({ "description": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["path"], "description");

    let (_, unchanged) = send(app, "GET", &uri, None).await;
    assert_eq!(unchanged["title"], "Linen Shirt");
}

#[tokio::test]
async fn test_get_product_missing() {
    let app = app(InMemoryRepository::default());

    let uri = format!("/{}", ObjectId::new().to_hex());
    let (status, body) = send(app, "GET", &uri, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_product_lifecycle() {
    let category = ObjectId::new();
    let app = app(InMemoryRepository::with_known(&[category]));

    let (status, created) = send(app.clone(), "POST", "/", Some(shirt(&category))).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();

    let (status, found) = send(app.clone(), "GET", "/slug/linen-shirt", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["id"], id);

    let patch = json!({ "discount": 50, "imageUrls": ["https://example.com/a.jpg"] });
    let (status, updated) = send(app.clone(), "PUT", &format!("/{}", id), Some(patch)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["discount"].as_f64(), Some(50.0));
    assert_eq!(updated["title"], "Linen Shirt");

    let (status, body) = send(
        app.clone(),
        "PUT",
        &format!("/{}", id),
        Some(json!({ "discount": 150 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["path"], "discount");

    let (status, count) = send(app.clone(), "GET", "/count", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(count, json!(1));

    let (status, _) = send(app.clone(), "DELETE", &format!("/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(app, "DELETE", &format!("/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_second_product_with_same_title_gets_suffixed_slug() {
    let category = ObjectId::new();
    let app = app(InMemoryRepository::with_known(&[category]));

    let (_, first) = send(app.clone(), "POST", "/", Some(shirt(&category))).await;
    let (status, second) = send(app, "POST", "/", Some(shirt(&category))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["slug"], "linen-shirt");
    assert!(second["slug"].as_str().unwrap().starts_with("linen-shirt-"));
}
