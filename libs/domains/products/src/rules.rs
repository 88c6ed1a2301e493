//! Table-driven JSON document validation
//!
//! A rule table is plain `static` data: one [`FieldRule`] per accepted key.
//! [`validate_document`] interprets a table against a decoded JSON body and
//! returns either the normalized object or every violation it found.
//!
//! Semantics:
//! - the input must be an object; any other value is a single `type`
//!   violation at path `value`
//! - keys missing from the table are rejected (`unknown`)
//! - `null` counts as present and fails the type check
//! - strings are non-empty unless the spec allows it; trimmed specs store and
//!   measure the trimmed text; length counts Unicode scalar values
//! - numeric strings are converted to numbers; numbers beyond
//!   ±(2^53 - 1) are rejected as `unsafe`
//! - violations follow table order, then key order for unknown keys
//!
//! Normalizing an already-normalized document is the identity.

use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::fmt;
use strum::Display;
use utoipa::ToSchema;
use validator::ValidateUrl;

/// Largest integer an IEEE 754 double holds exactly
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Which check a value failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Rule {
    Required,
    Type,
    Empty,
    MinLength,
    MaxLength,
    Min,
    Max,
    Unsafe,
    Integer,
    ObjectId,
    Uri,
    Unknown,
}

/// One field-level failure
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    /// Location of the value, e.g. `imageUrls[0]` or `additionalAttributes.color`
    pub path: String,
    pub rule: Rule,
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, rule: Rule, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            rule,
            message: message.into(),
        }
    }
}

/// Ordered, non-empty on failure, list of violations
#[derive(Debug, Clone, PartialEq, Default, Serialize, ToSchema)]
#[serde(transparent)]
pub struct Violations(Vec<Violation>);

impl Violations {
    pub fn single(violation: Violation) -> Self {
        Self(vec![violation])
    }

    pub fn push(&mut self, violation: Violation) {
        self.0.push(violation);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.0.iter()
    }

    /// True when some violation sits at exactly `path`.
    pub fn has(&self, path: &str, rule: Rule) -> bool {
        self.0.iter().any(|v| v.path == path && v.rule == rule)
    }

    pub fn into_inner(self) -> Vec<Violation> {
        self.0
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.iter().map(|v| v.message.as_str()).collect();
        write!(f, "{}", messages.join(". "))
    }
}

impl std::error::Error for Violations {}

impl<'a> IntoIterator for &'a Violations {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Shape a value must have
#[derive(Debug, Clone, Copy)]
pub enum Kind {
    String,
    Number,
    /// Number without a fractional part
    Integer,
    /// 24 hexadecimal characters
    ObjectId,
    /// Absolute URL with a scheme
    Uri,
    Array(&'static Spec),
    /// Object whose values are numbers or non-empty strings
    ScalarMap,
    /// Object with unconstrained contents
    AnyObject,
    Any,
}

/// Constraints on a single value
///
/// For string kinds `min`/`max` bound the length, for numeric kinds the value.
#[derive(Debug, Clone, Copy)]
pub struct Spec {
    pub kind: Kind,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub trim: bool,
    pub allow_empty: bool,
}

impl Spec {
    pub const fn of(kind: Kind) -> Self {
        Self {
            kind,
            min: None,
            max: None,
            trim: false,
            allow_empty: false,
        }
    }

    pub const fn string() -> Self {
        Self::of(Kind::String)
    }

    pub const fn number() -> Self {
        Self::of(Kind::Number)
    }

    pub const fn integer() -> Self {
        Self::of(Kind::Integer)
    }

    pub const fn object_id() -> Self {
        Self::of(Kind::ObjectId)
    }

    pub const fn uri() -> Self {
        Self::of(Kind::Uri)
    }

    pub const fn array(item: &'static Spec) -> Self {
        Self::of(Kind::Array(item))
    }

    pub const fn scalar_map() -> Self {
        Self::of(Kind::ScalarMap)
    }

    pub const fn any_object() -> Self {
        Self::of(Kind::AnyObject)
    }

    pub const fn any() -> Self {
        Self::of(Kind::Any)
    }

    pub const fn min(self, min: f64) -> Self {
        Self {
            min: Some(min),
            ..self
        }
    }

    pub const fn max(self, max: f64) -> Self {
        Self {
            max: Some(max),
            ..self
        }
    }

    pub const fn range(self, min: f64, max: f64) -> Self {
        self.min(min).max(max)
    }

    pub const fn trimmed(self) -> Self {
        Self { trim: true, ..self }
    }

    pub const fn allow_empty(self) -> Self {
        Self {
            allow_empty: true,
            ..self
        }
    }
}

/// Whether a key must be present
#[derive(Debug, Clone, Copy)]
pub enum Presence {
    Required,
    Optional,
    /// Optional; the produced value is inserted when the key is absent
    Default(fn() -> Value),
}

/// One row of a rule table
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub key: &'static str,
    pub presence: Presence,
    pub spec: Spec,
}

impl FieldRule {
    pub const fn required(key: &'static str, spec: Spec) -> Self {
        Self {
            key,
            presence: Presence::Required,
            spec,
        }
    }

    pub const fn optional(key: &'static str, spec: Spec) -> Self {
        Self {
            key,
            presence: Presence::Optional,
            spec,
        }
    }

    pub const fn with_default(key: &'static str, spec: Spec, default: fn() -> Value) -> Self {
        Self {
            key,
            presence: Presence::Default(default),
            spec,
        }
    }
}

/// Validate `input` against `rules`, collecting every violation.
pub fn validate_document(rules: &[FieldRule], input: &Value) -> Result<Map<String, Value>, Violations> {
    let Some(object) = input.as_object() else {
        return Err(Violations::single(Violation::new(
            "value",
            Rule::Type,
            format!("{} must be of type object", label("value")),
        )));
    };

    let mut normalized = Map::new();
    let mut violations = Violations::default();

    for rule in rules {
        match (object.get(rule.key), rule.presence) {
            (Some(value), _) => {
                if let Some(value) = check(&rule.spec, rule.key, value, &mut violations) {
                    normalized.insert(rule.key.to_string(), value);
                }
            }
            (None, Presence::Required) => violations.push(Violation::new(
                rule.key,
                Rule::Required,
                format!("{} is required", label(rule.key)),
            )),
            (None, Presence::Default(default)) => {
                normalized.insert(rule.key.to_string(), default());
            }
            (None, Presence::Optional) => {}
        }
    }

    for key in object.keys() {
        if !rules.iter().any(|rule| rule.key == key) {
            violations.push(Violation::new(
                key.as_str(),
                Rule::Unknown,
                format!("{} is not allowed", label(key)),
            ));
        }
    }

    if violations.is_empty() {
        Ok(normalized)
    } else {
        Err(violations)
    }
}

fn label(path: &str) -> String {
    format!("\"{}\"", path)
}

/// Check one value; `None` means at least one violation was recorded.
fn check(spec: &Spec, path: &str, value: &Value, out: &mut Violations) -> Option<Value> {
    match spec.kind {
        Kind::String | Kind::ObjectId | Kind::Uri => check_string(spec, path, value, out),
        Kind::Number | Kind::Integer => check_number(spec, path, value, out),
        Kind::Array(item) => check_array(item, path, value, out),
        Kind::ScalarMap => check_scalar_map(path, value, out),
        Kind::AnyObject => {
            if value.is_object() {
                Some(value.clone())
            } else {
                out.push(not_an_object(path));
                None
            }
        }
        Kind::Any => Some(value.clone()),
    }
}

fn check_string(spec: &Spec, path: &str, value: &Value, out: &mut Violations) -> Option<Value> {
    let Some(raw) = value.as_str() else {
        out.push(Violation::new(
            path,
            Rule::Type,
            format!("{} must be a string", label(path)),
        ));
        return None;
    };

    let text = if spec.trim { raw.trim() } else { raw };

    if text.is_empty() {
        if spec.allow_empty {
            return Some(Value::String(String::new()));
        }
        out.push(Violation::new(
            path,
            Rule::Empty,
            format!("{} is not allowed to be empty", label(path)),
        ));
        return None;
    }

    let before = out.len();
    let length = text.chars().count() as f64;

    if let Some(min) = spec.min.filter(|min| length < *min) {
        out.push(Violation::new(
            path,
            Rule::MinLength,
            format!("{} length must be at least {} characters long", label(path), min),
        ));
    }
    if let Some(max) = spec.max.filter(|max| length > *max) {
        out.push(Violation::new(
            path,
            Rule::MaxLength,
            format!(
                "{} length must be less than or equal to {} characters long",
                label(path),
                max
            ),
        ));
    }

    match spec.kind {
        Kind::ObjectId if !is_object_id(text) => out.push(Violation::new(
            path,
            Rule::ObjectId,
            format!(
                "{} with value \"{}\" fails to match the valid mongo id pattern",
                label(path),
                text
            ),
        )),
        Kind::Uri if !text.validate_url() => out.push(Violation::new(
            path,
            Rule::Uri,
            format!("{} must be a valid uri", label(path)),
        )),
        _ => {}
    }

    (out.len() == before).then(|| Value::String(text.to_string()))
}

fn check_number(spec: &Spec, path: &str, value: &Value, out: &mut Violations) -> Option<Value> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s),
        _ => None,
    };

    let Some(number) = parsed else {
        out.push(Violation::new(
            path,
            Rule::Type,
            format!("{} must be a number", label(path)),
        ));
        return None;
    };

    if number.abs() > MAX_SAFE_INTEGER {
        out.push(Violation::new(
            path,
            Rule::Unsafe,
            format!("{} must be a safe number", label(path)),
        ));
        return None;
    }

    let before = out.len();

    if matches!(spec.kind, Kind::Integer) && number.fract() != 0.0 {
        out.push(Violation::new(
            path,
            Rule::Integer,
            format!("{} must be an integer", label(path)),
        ));
    }
    if let Some(min) = spec.min.filter(|min| number < *min) {
        out.push(Violation::new(
            path,
            Rule::Min,
            format!("{} must be greater than or equal to {}", label(path), min),
        ));
    }
    if let Some(max) = spec.max.filter(|max| number > *max) {
        out.push(Violation::new(
            path,
            Rule::Max,
            format!("{} must be less than or equal to {}", label(path), max),
        ));
    }

    if out.len() != before {
        return None;
    }

    match value {
        Value::Number(_) => Some(value.clone()),
        _ => number_value(number),
    }
}

fn check_array(item: &Spec, path: &str, value: &Value, out: &mut Violations) -> Option<Value> {
    let Some(items) = value.as_array() else {
        out.push(Violation::new(
            path,
            Rule::Type,
            format!("{} must be an array", label(path)),
        ));
        return None;
    };

    let before = out.len();
    let mut normalized = Vec::with_capacity(items.len());

    for (index, element) in items.iter().enumerate() {
        let element_path = format!("{}[{}]", path, index);
        if let Some(element) = check(item, &element_path, element, out) {
            normalized.push(element);
        }
    }

    (out.len() == before).then_some(Value::Array(normalized))
}

fn check_scalar_map(path: &str, value: &Value, out: &mut Violations) -> Option<Value> {
    let Some(entries) = value.as_object() else {
        out.push(not_an_object(path));
        return None;
    };

    let before = out.len();
    let mut normalized = Map::new();

    for (key, entry) in entries {
        let entry_path = format!("{}.{}", path, key);
        // Number first, so numeric strings normalize to numbers.
        let accepted = match entry {
            Value::Number(_) => Some(entry.clone()),
            Value::String(s) => match parse_number(s) {
                Some(number) => number_value(number),
                None if !s.is_empty() => Some(entry.clone()),
                None => None,
            },
            _ => None,
        };

        match accepted {
            Some(entry) => {
                normalized.insert(key.clone(), entry);
            }
            None => out.push(Violation::new(
                entry_path.as_str(),
                Rule::Type,
                format!("{} must be one of [number, string]", label(&entry_path)),
            )),
        }
    }

    (out.len() == before).then_some(Value::Object(normalized))
}

fn not_an_object(path: &str) -> Violation {
    Violation::new(
        path,
        Rule::Type,
        format!("{} must be of type object", label(path)),
    )
}

pub(crate) fn is_object_id(text: &str) -> bool {
    text.len() == 24 && text.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Finite number parsed from trimmed text.
fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// JSON number, integral values kept integral.
fn number_value(number: f64) -> Option<Value> {
    if number.fract() == 0.0 && number.abs() <= MAX_SAFE_INTEGER {
        Some(Value::from(number as i64))
    } else {
        Number::from_f64(number).map(Value::Number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NAME: Spec = Spec::string().trimmed().range(2.0, 5.0);
    const REF: Spec = Spec::object_id();
    const LINK: Spec = Spec::uri();

    static RULES: &[FieldRule] = &[
        FieldRule::required("name", NAME),
        FieldRule::optional("qty", Spec::integer().range(0.0, 10.0)),
        FieldRule::optional("refs", Spec::array(&REF)),
        FieldRule::optional("links", Spec::array(&LINK)),
        FieldRule::optional("note", Spec::string().allow_empty()),
        FieldRule::optional("attrs", Spec::scalar_map()),
        FieldRule::optional("extra", Spec::any_object()),
        FieldRule::with_default("score", Spec::number().min(0.0), || json!(0)),
    ];

    fn violations(input: Value) -> Violations {
        validate_document(RULES, &input).unwrap_err()
    }

    #[test]
    fn test_non_object_input() {
        let errs = violations(json!(["name"]));
        assert_eq!(errs.len(), 1);
        assert!(errs.has("value", Rule::Type));
    }

    #[test]
    fn test_missing_required_and_default_filled() {
        let errs = violations(json!({}));
        assert!(errs.has("name", Rule::Required));

        let ok = validate_document(RULES, &json!({ "name": "abc" })).unwrap();
        assert_eq!(ok["score"], json!(0));
    }

    #[test]
    fn test_null_fails_type_rule() {
        let errs = violations(json!({ "name": null }));
        assert!(errs.has("name", Rule::Type));
        assert_eq!(errs.iter().next().unwrap().message, "\"name\" must be a string");
    }

    #[test]
    fn test_trim_applies_before_length_and_empty() {
        let ok = validate_document(RULES, &json!({ "name": "  abc  " })).unwrap();
        assert_eq!(ok["name"], "abc");

        assert!(violations(json!({ "name": "   " })).has("name", Rule::Empty));
        assert!(violations(json!({ "name": " a " })).has("name", Rule::MinLength));
    }

    #[test]
    fn test_length_counts_characters() {
        assert!(validate_document(RULES, &json!({ "name": "ñandú" })).is_ok());
    }

    #[test]
    fn test_allow_empty() {
        let ok = validate_document(RULES, &json!({ "name": "abc", "note": "" })).unwrap();
        assert_eq!(ok["note"], "");
    }

    #[test]
    fn test_numeric_string_is_converted() {
        let ok = validate_document(RULES, &json!({ "name": "abc", "qty": " 7 ", "score": "2.5" }))
            .unwrap();
        assert_eq!(ok["qty"], json!(7));
        assert_eq!(ok["score"], json!(2.5));
    }

    #[test]
    fn test_numbers_beyond_safe_range_are_rejected() {
        let input: Value = serde_json::from_str(r#"{ "name": "abc", "score": 9007199254740993 }"#)
            .unwrap();
        let errs = validate_document(RULES, &input).unwrap_err();
        assert!(errs.has("score", Rule::Unsafe));
        assert_eq!(
            errs.iter().find(|v| v.path == "score").unwrap().message,
            "\"score\" must be a safe number"
        );

        let errs = violations(json!({ "name": "abc", "score": "-1e300" }));
        assert!(errs.has("score", Rule::Unsafe));
        assert!(!errs.has("score", Rule::Min));

        let ok = validate_document(RULES, &json!({ "name": "abc", "score": 9_007_199_254_740_991_u64 }))
            .unwrap();
        assert_eq!(ok["score"], json!(9_007_199_254_740_991_u64));
    }

    #[test]
    fn test_integer_and_bounds() {
        let errs = violations(json!({ "name": "abc", "qty": 2.5 }));
        assert!(errs.has("qty", Rule::Integer));

        let errs = violations(json!({ "name": "abc", "qty": 11, "score": -1 }));
        assert!(errs.has("qty", Rule::Max));
        assert!(errs.has("score", Rule::Min));
        assert_eq!(
            errs.iter().find(|v| v.path == "score").unwrap().message,
            "\"score\" must be greater than or equal to 0"
        );
    }

    #[test]
    fn test_array_item_paths() {
        let errs = violations(json!({
            "name": "abc",
            "refs": ["64b7f0c2a1b2c3d4e5f60718", "nope"],
            "links": ["https://example.com/a.jpg", "a.jpg"]
        }));
        assert!(errs.has("refs[1]", Rule::ObjectId));
        assert!(errs.has("links[1]", Rule::Uri));
        assert_eq!(errs.len(), 2);

        assert!(violations(json!({ "name": "abc", "refs": "x" })).has("refs", Rule::Type));
    }

    #[test]
    fn test_scalar_map_values() {
        let ok = validate_document(
            RULES,
            &json!({ "name": "abc", "attrs": { "size": "42", "color": "red", "weight": 1.5 } }),
        )
        .unwrap();
        assert_eq!(ok["attrs"]["size"], json!(42));
        assert_eq!(ok["attrs"]["color"], "red");

        let errs = violations(json!({ "name": "abc", "attrs": { "nested": { "a": 1 }, "blank": "" } }));
        assert!(errs.has("attrs.nested", Rule::Type));
        assert!(errs.has("attrs.blank", Rule::Type));
    }

    #[test]
    fn test_any_object_rejects_arrays() {
        assert!(violations(json!({ "name": "abc", "extra": [1] })).has("extra", Rule::Type));
        assert!(validate_document(RULES, &json!({ "name": "abc", "extra": { "deep": [1] } })).is_ok());
    }

    #[test]
    fn test_unknown_keys_after_table_order() {
        let errs = violations(json!({ "zeta": 1, "alpha": 2, "qty": -1 }));
        let paths: Vec<&str> = errs.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(&paths[..2], &["name", "qty"]);
        assert!(errs.has("alpha", Rule::Unknown));
        assert!(errs.has("zeta", Rule::Unknown));
        assert_eq!(errs.len(), 4);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let first = validate_document(
            RULES,
            &json!({ "name": " abcd ", "qty": "3", "attrs": { "n": "1" }, "refs": [] }),
        )
        .unwrap();
        let again = validate_document(RULES, &Value::Object(first.clone())).unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn test_violation_serializes_camel_case() {
        let violation = Violation::new("imageUrls[0]", Rule::MaxLength, "too long");
        assert_eq!(
            serde_json::to_value(&violation).unwrap(),
            json!({ "path": "imageUrls[0]", "rule": "max_length", "message": "too long" })
        );
        assert_eq!(Rule::ObjectId.to_string(), "object_id");
    }
}
