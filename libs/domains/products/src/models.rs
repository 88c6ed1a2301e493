use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::{Map, Value};
use strum::{Display, EnumIter, IntoStaticStr};
use utoipa::{IntoParams, ToSchema};

/// Entity a product refers to by id
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumIter, IntoStaticStr, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReferenceKind {
    Categories,
    Collections,
    Tags,
}

impl ReferenceKind {
    /// MongoDB collection holding entities of this kind
    pub fn collection_name(self) -> &'static str {
        self.into()
    }
}

/// Product entity as stored in the `products` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub price: f64,
    #[serde(default)]
    pub discount: f64,
    pub description: String,
    #[serde(default)]
    pub image_urls: Vec<String>,
    pub main_image_url: String,
    pub number_in_stock: f64,
    #[serde(default)]
    pub categories: Vec<ObjectId>,
    #[serde(default)]
    pub collections: Vec<ObjectId>,
    #[serde(default)]
    pub tags: Vec<ObjectId>,
    #[serde(default)]
    pub additional_attributes: Map<String, Value>,
    pub slug: String,
}

impl Product {
    /// Build a new record from validated creation input.
    pub fn from_create(id: ObjectId, input: CreateProduct, slug: String) -> Self {
        Self {
            id,
            title: input.title.trim().to_string(),
            price: input.price,
            discount: input.discount,
            description: input.description,
            image_urls: trim_all(input.image_urls),
            main_image_url: input.main_image_url.trim().to_string(),
            number_in_stock: input.number_in_stock,
            categories: input.category_ids,
            collections: input.collection_ids,
            tags: input.tag_ids,
            additional_attributes: input.additional_attributes,
            slug,
        }
    }

    /// Apply a partial update; absent fields stay unchanged.
    pub fn apply_update(&mut self, update: UpdateProduct) {
        if let Some(title) = update.title {
            self.title = title.trim().to_string();
        }
        if let Some(categories) = update.categories {
            self.categories = categories;
        }
        if let Some(collections) = update.collections {
            self.collections = collections;
        }
        if let Some(tags) = update.tags {
            self.tags = tags;
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(discount) = update.discount {
            self.discount = discount;
        }
        if let Some(number_in_stock) = update.number_in_stock {
            self.number_in_stock = number_in_stock;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(image_urls) = update.image_urls {
            self.image_urls = trim_all(image_urls);
        }
        if let Some(main_image_url) = update.main_image_url {
            self.main_image_url = main_image_url.trim().to_string();
        }
        if let Some(additional_attributes) = update.additional_attributes {
            self.additional_attributes = additional_attributes;
        }
        if let Some(slug) = update.slug {
            self.slug = slug;
        }
    }

    /// Referenced ids grouped by kind, in a stable order
    pub fn references(&self) -> [(ReferenceKind, &[ObjectId]); 3] {
        [
            (ReferenceKind::Categories, self.categories.as_slice()),
            (ReferenceKind::Collections, self.collections.as_slice()),
            (ReferenceKind::Tags, self.tags.as_slice()),
        ]
    }
}

fn trim_all(values: Vec<String>) -> Vec<String> {
    values.into_iter().map(|v| v.trim().to_string()).collect()
}

/// Creation body after it passed the create rule table
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProduct {
    /// 5-50 characters
    pub title: String,
    #[serde(deserialize_with = "object_ids")]
    #[schema(value_type = Vec<String>)]
    pub category_ids: Vec<ObjectId>,
    #[serde(deserialize_with = "object_ids")]
    #[schema(value_type = Vec<String>)]
    pub collection_ids: Vec<ObjectId>,
    #[serde(deserialize_with = "object_ids")]
    #[schema(value_type = Vec<String>)]
    pub tag_ids: Vec<ObjectId>,
    /// 0-255
    pub number_in_stock: f64,
    pub price: f64,
    /// Defaults to 0
    #[serde(default)]
    pub discount: f64,
    /// 10-1000 characters
    pub description: String,
    pub image_urls: Vec<String>,
    pub main_image_url: String,
    /// Values are numbers or strings
    #[serde(default)]
    #[schema(value_type = Object)]
    pub additional_attributes: Map<String, Value>,
}

/// Partial update body after it passed the update rule table
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProduct {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "optional_object_ids")]
    #[schema(value_type = Option<Vec<String>>)]
    pub categories: Option<Vec<ObjectId>>,
    #[serde(default, deserialize_with = "optional_object_ids")]
    #[schema(value_type = Option<Vec<String>>)]
    pub collections: Option<Vec<ObjectId>>,
    pub price: Option<f64>,
    /// 0-100
    pub discount: Option<f64>,
    pub number_in_stock: Option<f64>,
    pub description: Option<String>,
    /// Absolute URLs
    pub image_urls: Option<Vec<String>>,
    pub main_image_url: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub additional_attributes: Option<Map<String, Value>>,
    /// 5-100 characters, unique
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "optional_object_ids")]
    #[schema(value_type = Option<Vec<String>>)]
    pub tags: Option<Vec<ObjectId>>,
}

/// Product as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    /// Hex ObjectId
    pub id: String,
    pub title: String,
    pub price: f64,
    pub discount: f64,
    pub description: String,
    pub image_urls: Vec<String>,
    pub main_image_url: String,
    pub number_in_stock: u32,
    pub categories: Vec<String>,
    pub collections: Vec<String>,
    pub tags: Vec<String>,
    #[schema(value_type = Object)]
    pub additional_attributes: Map<String, Value>,
    pub slug: String,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id.to_hex(),
            title: product.title,
            price: product.price,
            discount: product.discount,
            description: product.description,
            image_urls: product.image_urls,
            main_image_url: product.main_image_url,
            number_in_stock: product.number_in_stock as u32,
            categories: to_hex_all(&product.categories),
            collections: to_hex_all(&product.collections),
            tags: to_hex_all(&product.tags),
            additional_attributes: product.additional_attributes,
            slug: product.slug,
        }
    }
}

pub(crate) fn to_hex_all(ids: &[ObjectId]) -> Vec<String> {
    ids.iter().map(|id| id.to_hex()).collect()
}

/// Query filters for listing and counting products
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductFilter {
    /// Category id
    #[serde(default, deserialize_with = "optional_object_id")]
    #[param(value_type = Option<String>)]
    pub category: Option<ObjectId>,
    /// Collection id
    #[serde(default, deserialize_with = "optional_object_id")]
    #[param(value_type = Option<String>)]
    pub collection: Option<ObjectId>,
    /// Tag id
    #[serde(default, deserialize_with = "optional_object_id")]
    #[param(value_type = Option<String>)]
    pub tag: Option<ObjectId>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Only products with stock left
    pub in_stock: Option<bool>,
    /// Case-insensitive match on title or description
    pub search: Option<String>,
    /// Maximum number of results (1-200)
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Number of results to skip
    #[serde(default)]
    pub offset: u64,
}

impl Default for ProductFilter {
    fn default() -> Self {
        Self {
            category: None,
            collection: None,
            tag: None,
            min_price: None,
            max_price: None,
            in_stock: None,
            search: None,
            limit: default_limit(),
            offset: 0,
        }
    }
}

impl ProductFilter {
    pub const MAX_LIMIT: i64 = 200;

    pub fn effective_limit(&self) -> i64 {
        self.limit.clamp(1, Self::MAX_LIMIT)
    }
}

fn default_limit() -> i64 {
    50
}

fn object_ids<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<ObjectId>, D::Error> {
    Vec::<String>::deserialize(deserializer)?
        .iter()
        .map(|hex| ObjectId::parse_str(hex).map_err(de::Error::custom))
        .collect()
}

fn optional_object_ids<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<ObjectId>>, D::Error> {
    Option::<Vec<String>>::deserialize(deserializer)?
        .map(|ids| {
            ids.iter()
                .map(|hex| ObjectId::parse_str(hex).map_err(de::Error::custom))
                .collect()
        })
        .transpose()
}

fn optional_object_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<ObjectId>, D::Error> {
    Option::<String>::deserialize(deserializer)?
        .map(|hex| ObjectId::parse_str(&hex).map_err(de::Error::custom))
        .transpose()
}
