//! Constraints on the stored product document
//!
//! Input tables gate request bodies; this table guards what is written. It
//! runs on the merged record so a patch accepted by the update table (for
//! example `numberInStock: 300`) cannot break the stored invariants.

use serde_json::{Value, json};

use crate::models::{Product, to_hex_all};
use crate::rules::{FieldRule, Spec, Violations, validate_document};

const OBJECT_ID: Spec = Spec::object_id();
const IMAGE_URL: Spec = Spec::string().trimmed().max(1000.0);

/// Rules for a document in the `products` collection
pub static RECORD_RULES: &[FieldRule] = &[
    FieldRule::required("_id", OBJECT_ID),
    FieldRule::required("title", Spec::string().trimmed().range(5.0, 255.0)),
    FieldRule::required("price", Spec::number().min(0.0)),
    FieldRule::required("discount", Spec::number().min(0.0)),
    FieldRule::required("description", Spec::string().range(10.0, 1000.0)),
    FieldRule::required("imageUrls", Spec::array(&IMAGE_URL)),
    FieldRule::required("mainImageUrl", IMAGE_URL),
    FieldRule::required("numberInStock", Spec::integer().range(0.0, 255.0)),
    FieldRule::required("categories", Spec::array(&OBJECT_ID)),
    FieldRule::required("collections", Spec::array(&OBJECT_ID)),
    FieldRule::required("tags", Spec::array(&OBJECT_ID)),
    FieldRule::required("additionalAttributes", Spec::any_object()),
    FieldRule::required("slug", Spec::string().range(5.0, 100.0)),
];

/// Check a record before it is saved.
pub fn check_record(product: &Product) -> Result<(), Violations> {
    validate_document(RECORD_RULES, &record_view(product)).map(|_| ())
}

/// JSON view of the stored document with ids as hex strings
fn record_view(product: &Product) -> Value {
    json!({
        "_id": product.id.to_hex(),
        "title": product.title,
        "price": product.price,
        "discount": product.discount,
        "description": product.description,
        "imageUrls": product.image_urls,
        "mainImageUrl": product.main_image_url,
        "numberInStock": product.number_in_stock,
        "categories": to_hex_all(&product.categories),
        "collections": to_hex_all(&product.collections),
        "tags": to_hex_all(&product.tags),
        "additionalAttributes": product.additional_attributes,
        "slug": product.slug,
    })
}
