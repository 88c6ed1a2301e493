use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use mongodb::bson::oid::ObjectId;
use serde::Serialize;
use thiserror::Error;

use crate::models::{ReferenceKind, to_hex_all};
use crate::rules::Violations;

/// Referenced ids of one kind that do not exist
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingReferences {
    pub kind: ReferenceKind,
    #[serde(serialize_with = "hex_ids")]
    pub ids: Vec<ObjectId>,
}

fn hex_ids<S: serde::Serializer>(ids: &[ObjectId], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(to_hex_all(ids))
}

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("Product not found: {0}")]
    NotFound(ObjectId),

    #[error("Product with slug '{0}' not found")]
    SlugNotFound(String),

    #[error("Product with slug '{0}' already exists")]
    DuplicateSlug(String),

    #[error("Invalid input: {0}")]
    Validation(Violations),

    #[error("Unknown references: {}", describe(.0))]
    UnknownReferences(Vec<MissingReferences>),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn describe(missing: &[MissingReferences]) -> String {
    missing
        .iter()
        .map(|m| format!("{} [{}]", m.kind, to_hex_all(&m.ids).join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type ProductResult<T> = Result<T, ProductError>;

/// Convert ProductError to AppError for standardized error responses
impl From<ProductError> for AppError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::NotFound(id) => AppError::NotFound(format!("Product {} not found", id)),
            ProductError::SlugNotFound(slug) => {
                AppError::NotFound(format!("Product with slug '{}' not found", slug))
            }
            ProductError::DuplicateSlug(slug) => {
                AppError::Conflict(format!("Product with slug '{}' already exists", slug))
            }
            ProductError::Validation(violations) => match serde_json::to_value(&violations) {
                Ok(details) => AppError::ValidationFailed(details),
                Err(e) => AppError::SerdeJson(e),
            },
            ProductError::UnknownReferences(missing) => {
                let message = format!("Unknown references: {}", describe(&missing));
                match serde_json::to_value(&missing) {
                    Ok(details) => AppError::InvalidReference { message, details },
                    Err(e) => AppError::SerdeJson(e),
                }
            }
            ProductError::Database(msg) => AppError::InternalServerError(msg),
            ProductError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for ProductError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<mongodb::error::Error> for ProductError {
    fn from(err: mongodb::error::Error) -> Self {
        ProductError::Database(err.to_string())
    }
}

impl From<Violations> for ProductError {
    fn from(violations: Violations) -> Self {
        ProductError::Validation(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Rule, Violation};
    use axum::http::StatusCode;

    #[test]
    fn test_validation_maps_to_details() {
        let violations = Violations::single(Violation::new(
            "price",
            Rule::Min,
            "\"price\" must be greater than or equal to 0",
        ));

        match AppError::from(ProductError::Validation(violations)) {
            AppError::ValidationFailed(details) => {
                assert_eq!(details[0]["path"], "price");
                assert_eq!(details[0]["rule"], "min");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unknown_references_list_hex_ids() {
        let id = ObjectId::parse_str("64b7f0c2a1b2c3d4e5f60718").unwrap();
        let err = ProductError::UnknownReferences(vec![MissingReferences {
            kind: ReferenceKind::Categories,
            ids: vec![id],
        }]);
        assert_eq!(
            err.to_string(),
            "Unknown references: categories [64b7f0c2a1b2c3d4e5f60718]"
        );

        match AppError::from(err) {
            AppError::InvalidReference { details, .. } => {
                assert_eq!(details[0]["kind"], "categories");
                assert_eq!(details[0]["ids"][0], "64b7f0c2a1b2c3d4e5f60718");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_status_codes() {
        let conflict = ProductError::DuplicateSlug("linen-shirt".into()).into_response();
        assert_eq!(conflict.status(), StatusCode::CONFLICT);

        let missing = ProductError::NotFound(ObjectId::new()).into_response();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let db = ProductError::Database("socket closed".into()).into_response();
        assert_eq!(db.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
