//! ObjectId path parameter extractor with automatic validation.

use crate::errors::AppError;
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use bson::oid::ObjectId;

/// Extractor for MongoDB ObjectId path parameters.
///
/// Parses the single path segment as a 24-character hex ObjectId and
/// rejects with `400 INVALID_OBJECT_ID` otherwise.
///
/// # Example
/// ```ignore
/// use axum::Router;
/// use axum::routing::get;
/// use axum_helpers::extractors::ObjectIdPath;
///
/// async fn get_product(ObjectIdPath(id): ObjectIdPath) -> String {
///     format!("Product ID: {}", id.to_hex())
/// }
///
/// let app = Router::new().route("/products/{id}", get(get_product));
/// ```
pub struct ObjectIdPath(pub ObjectId);

impl<S> FromRequestParts<S> for ObjectIdPath
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| e.into_response())?;

        ObjectId::parse_str(&id)
            .map(ObjectIdPath)
            .map_err(|_| AppError::InvalidObjectId(id).into_response())
    }
}
