//! Reusable OpenAPI response types for consistent API documentation.

use super::ErrorResponse;
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToResponse;

#[derive(ToResponse)]
#[response(
    description = "Internal Server Error",
    content_type = "application/json",
    example = json!({
        "code": 1005,
        "error": "INTERNAL_ERROR",
        "message": "An internal server error occurred"
    })
)]
pub struct InternalServerErrorResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Bad Request - Validation Error",
    content_type = "application/json",
    example = json!({
        "code": 1001,
        "error": "VALIDATION_ERROR",
        "message": "Request validation failed",
        "details": [
            {
                "path": "title",
                "rule": "min_length",
                "message": "\"title\" length must be at least 5 characters long"
            },
            {
                "path": "mainImageUrl",
                "rule": "required",
                "message": "\"mainImageUrl\" is required"
            }
        ]
    })
)]
pub struct BadRequestValidationResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Bad Request - Invalid ObjectId",
    content_type = "application/json",
    example = json!({
        "code": 1002,
        "error": "INVALID_OBJECT_ID",
        "message": "Invalid ObjectId format"
    })
)]
pub struct BadRequestObjectIdResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Resource not found",
    content_type = "application/json",
    example = json!({
        "code": 1004,
        "error": "NOT_FOUND",
        "message": "Resource not found"
    })
)]
pub struct NotFoundResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Conflict - Resource already exists",
    content_type = "application/json",
    example = json!({
        "code": 1008,
        "error": "CONFLICT",
        "message": "Resource already exists"
    })
)]
pub struct ConflictResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Unprocessable Entity - Unknown references",
    content_type = "application/json",
    example = json!({
        "code": 1012,
        "error": "INVALID_REFERENCE",
        "message": "Referenced resources do not exist",
        "details": [
            { "kind": "categories", "ids": ["64b7f0c2a1b2c3d4e5f60718"] }
        ]
    })
)]
pub struct InvalidReferenceResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Bad Request - Malformed Query String",
    content_type = "application/json",
    example = json!({
        "code": 1006,
        "error": "BAD_REQUEST",
        "message": "Failed to deserialize query string: category: invalid ObjectId"
    })
)]
pub struct BadRequestQueryResponse(pub ErrorResponse);
