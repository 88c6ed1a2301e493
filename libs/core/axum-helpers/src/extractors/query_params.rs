//! Query string extractor whose rejection uses the standard error body.

use crate::errors::AppError;
use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;

/// Drop-in replacement for [`axum::extract::Query`].
///
/// A query string that does not deserialize into `T` is rejected with
/// [`AppError::BadRequest`], so the client gets a 400 with the shared
/// `{ code, error, message }` body instead of axum's plain-text rejection.
///
/// # Example
/// ```ignore
/// use axum_helpers::extractors::QueryParams;
///
/// async fn list(QueryParams(filter): QueryParams<ProductFilter>) { /* ... */ }
/// ```
pub struct QueryParams<T>(pub T);

impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()).into_response())?;

        Ok(QueryParams(params))
    }
}
