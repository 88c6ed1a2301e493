//! HTTP handlers for Products API

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use axum_helpers::{
    JsonBody, ObjectIdPath, QueryParams,
    errors::responses::{
        BadRequestObjectIdResponse, BadRequestQueryResponse, BadRequestValidationResponse,
        ConflictResponse, InternalServerErrorResponse, InvalidReferenceResponse, NotFoundResponse,
    },
};
use serde_json::Value;
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::ProductResult;
use crate::models::{CreateProduct, ProductFilter, ProductResponse, ReferenceKind, UpdateProduct};
use crate::repository::ProductRepository;
use crate::rules::{Rule, Violation};
use crate::service::ProductService;

/// OpenAPI documentation for Products API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_products,
        create_product,
        count_products,
        get_by_slug,
        get_product,
        update_product,
        delete_product,
    ),
    components(
        schemas(
            ProductResponse, CreateProduct, UpdateProduct,
            Violation, Rule, ReferenceKind
        ),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestObjectIdResponse,
            BadRequestQueryResponse,
            ConflictResponse,
            InvalidReferenceResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Products", description = "Product catalog endpoints")
    )
)]
pub struct ApiDoc;

/// Create the products router with all HTTP endpoints
pub fn router<R: ProductRepository + 'static>(service: ProductService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/count", get(count_products))
        .route("/slug/{slug}", get(get_by_slug))
        .route(
            "/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .with_state(shared_service)
}

/// List products with optional filters
#[utoipa::path(
    get,
    path = "",
    tag = "Products",
    params(ProductFilter),
    responses(
        (status = 200, description = "List of products", body = Vec<ProductResponse>),
        (status = 400, response = BadRequestQueryResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_products<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    QueryParams(filter): QueryParams<ProductFilter>,
) -> ProductResult<Json<Vec<ProductResponse>>> {
    let products = service.list_products(filter).await?;
    Ok(Json(products.into_iter().map(ProductResponse::from).collect()))
}

/// Create a new product
///
/// The body is checked against the creation rules; every violation is
/// reported in `details`.
#[utoipa::path(
    post,
    path = "",
    tag = "Products",
    request_body = CreateProduct,
    responses(
        (status = 201, description = "Product created successfully", body = ProductResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 409, response = ConflictResponse),
        (status = 422, response = InvalidReferenceResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    JsonBody(body): JsonBody<Value>,
) -> ProductResult<impl IntoResponse> {
    let product = service.create_product(body).await?;
    Ok((StatusCode::CREATED, Json(ProductResponse::from(product))))
}

/// Count products matching the filters
#[utoipa::path(
    get,
    path = "/count",
    tag = "Products",
    params(ProductFilter),
    responses(
        (status = 200, description = "Product count", body = u64),
        (status = 400, response = BadRequestQueryResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn count_products<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    QueryParams(filter): QueryParams<ProductFilter>,
) -> ProductResult<Json<u64>> {
    let count = service.count_products(filter).await?;
    Ok(Json(count))
}

/// Get a product by slug
#[utoipa::path(
    get,
    path = "/slug/{slug}",
    tag = "Products",
    params(
        ("slug" = String, Path, description = "Product slug")
    ),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_by_slug<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    Path(slug): Path<String>,
) -> ProductResult<Json<ProductResponse>> {
    let product = service.get_by_slug(&slug).await?;
    Ok(Json(product.into()))
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = String, Path, description = "Product ObjectId (24 hex characters)")
    ),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 400, response = BadRequestObjectIdResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    ObjectIdPath(id): ObjectIdPath,
) -> ProductResult<Json<ProductResponse>> {
    let product = service.get_product(id).await?;
    Ok(Json(product.into()))
}

/// Update a product
///
/// Partial update: keys left out of the body keep their stored value.
///
/// The merged product is checked against the stored-record rules before it
/// is saved, and those are stricter than the update rules:
///
/// - `title` must be 5 to 255 characters after trimming (update allows 3)
/// - `description` must be 10 to 1000 characters (update allows empty)
/// - `numberInStock` must be a whole number no greater than 255
///
/// A body that passes the update rules but breaks one of these is still
/// answered with 400 and the record violations in `details`.
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = String, Path, description = "Product ObjectId (24 hex characters)")
    ),
    request_body = UpdateProduct,
    responses(
        (status = 200, description = "Product updated successfully", body = ProductResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 422, response = InvalidReferenceResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    ObjectIdPath(id): ObjectIdPath,
    JsonBody(body): JsonBody<Value>,
) -> ProductResult<Json<ProductResponse>> {
    let product = service.update_product(id, body).await?;
    Ok(Json(product.into()))
}

/// Delete a product
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = String, Path, description = "Product ObjectId (24 hex characters)")
    ),
    responses(
        (status = 204, description = "Product deleted successfully"),
        (status = 400, response = BadRequestObjectIdResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    ObjectIdPath(id): ObjectIdPath,
) -> ProductResult<impl IntoResponse> {
    service.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
