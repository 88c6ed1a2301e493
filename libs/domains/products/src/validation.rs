//! Request-body rules for the create and update paths
//!
//! The two tables are independent on purpose: create takes `categoryIds`,
//! `collectionIds` and `tagIds` while update takes `categories`,
//! `collections` and `tags`; `discount` is capped at 100 only on update;
//! update requires well-formed URLs where create accepts plain strings.

use serde_json::{Map, Value, json};

use crate::rules::{FieldRule, Spec, Violations, validate_document};

const OBJECT_ID: Spec = Spec::object_id();
const IMAGE_PATH: Spec = Spec::string().trimmed().max(1000.0);
const IMAGE_URL: Spec = Spec::uri();

/// Rules for `POST /products`
pub static CREATE_RULES: &[FieldRule] = &[
    FieldRule::required("title", Spec::string().range(5.0, 50.0)),
    FieldRule::required("categoryIds", Spec::array(&OBJECT_ID)),
    FieldRule::required("collectionIds", Spec::array(&OBJECT_ID)),
    FieldRule::required("tagIds", Spec::array(&OBJECT_ID)),
    FieldRule::required("numberInStock", Spec::number().range(0.0, 255.0)),
    FieldRule::required("price", Spec::number().min(0.0)),
    FieldRule::with_default("discount", Spec::number().min(0.0), || json!(0)),
    FieldRule::required("description", Spec::string().range(10.0, 1000.0)),
    FieldRule::required("imageUrls", Spec::array(&IMAGE_PATH)),
    FieldRule::required("mainImageUrl", Spec::string().max(1000.0)),
    FieldRule::optional("additionalAttributes", Spec::scalar_map()),
];

/// Rules for `PUT /products/{id}`; every key is optional
pub static UPDATE_RULES: &[FieldRule] = &[
    FieldRule::optional("title", Spec::string().range(3.0, 255.0)),
    FieldRule::optional("categories", Spec::array(&OBJECT_ID)),
    FieldRule::optional("collections", Spec::array(&OBJECT_ID)),
    FieldRule::optional("price", Spec::number().min(0.0)),
    FieldRule::optional("discount", Spec::number().range(0.0, 100.0)),
    FieldRule::optional("numberInStock", Spec::number().min(0.0)),
    FieldRule::optional("description", Spec::string().allow_empty()),
    FieldRule::optional("imageUrls", Spec::array(&IMAGE_URL)),
    FieldRule::optional("mainImageUrl", IMAGE_URL),
    FieldRule::optional("additionalAttributes", Spec::any_object()),
    FieldRule::optional("slug", Spec::string().range(5.0, 100.0)),
    FieldRule::optional("tags", Spec::array(&OBJECT_ID)),
];

/// Validate a creation body; `discount` is filled with 0 when absent.
pub fn validate_create(input: &Value) -> Result<Map<String, Value>, Violations> {
    validate_document(CREATE_RULES, input)
}

/// Validate a partial update body.
pub fn validate_update(input: &Value) -> Result<Map<String, Value>, Violations> {
    validate_document(UPDATE_RULES, input)
}
