//! JSON body extractor whose rejection uses the standard error body.

use crate::errors::AppError;
use axum::{
    extract::{FromRequest, Json, Request},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;

/// Drop-in replacement for [`axum::Json`] in request position.
///
/// Syntax errors, a missing `Content-Type` and type mismatches are reported
/// through [`AppError::JsonExtractorRejection`], keeping axum's status code
/// (400, 415 or 422) but the shared `{ code, error, message }` body.
///
/// # Example
/// ```ignore
/// use axum_helpers::extractors::JsonBody;
/// use serde_json::Value;
///
/// async fn create(JsonBody(body): JsonBody<Value>) -> String {
///     body.to_string()
/// }
/// ```
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::from(e).into_response())?;

        Ok(JsonBody(data))
    }
}
