//! Slug generation for new products

use mongodb::bson::oid::ObjectId;
use regex::Regex;
use std::sync::LazyLock;

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("static slug pattern"));

/// Shortest slug the record schema accepts
pub const MIN_LEN: usize = 5;

/// Longest base kept from a title; leaves room for the id suffix
pub const MAX_BASE_LEN: usize = 80;

const SUFFIX_LEN: usize = 6;

/// Lowercase `title` and join its alphanumeric runs with `-`.
///
/// May return an empty string for titles without ASCII letters or digits.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let joined = NON_ALPHANUMERIC.replace_all(&lowered, "-");
    let mut slug = joined.trim_matches('-').to_string();

    if slug.len() > MAX_BASE_LEN {
        slug.truncate(MAX_BASE_LEN);
        slug = slug.trim_end_matches('-').to_string();
    }

    slug
}

/// `base` with the tail of `id` appended, e.g. `linen-shirt-a1b2c3`.
pub fn with_suffix(base: &str, id: &ObjectId) -> String {
    let hex = id.to_hex();
    let suffix = &hex[hex.len() - SUFFIX_LEN..];

    if base.is_empty() {
        format!("product-{}", suffix)
    } else {
        format!("{}-{}", base, suffix)
    }
}

/// True when `base` can be used as-is.
pub fn is_usable(base: &str) -> bool {
    base.len() >= MIN_LEN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_collapses_separators() {
        assert_eq!(slugify("  Linen Shirt, Size M!  "), "linen-shirt-size-m");
        assert_eq!(slugify("T-Shirt -- 100% Cotton"), "t-shirt-100-cotton");
    }

    #[test]
    fn test_slugify_drops_non_ascii() {
        assert_eq!(slugify("Ñandú Plüsch"), "and-pl-sch");
        assert_eq!(slugify("★★★"), "");
    }

    #[test]
    fn test_slugify_caps_length() {
        let slug = slugify(&"ab ".repeat(60));
        assert!(slug.len() <= MAX_BASE_LEN);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn test_with_suffix() {
        let id = ObjectId::parse_str("64b7f0c2a1b2c3d4e5f60718").unwrap();
        assert_eq!(with_suffix("shirt", &id), "shirt-f60718");
        assert_eq!(with_suffix("", &id), "product-f60718");
        assert!(is_usable("shirt"));
        assert!(!is_usable("tee"));
    }
}
