//! MongoDB implementation of ProductRepository

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{Document, doc, oid::ObjectId},
    error::{ErrorKind, WriteFailure},
    options::{FindOptions, IndexOptions, ReplaceOptions},
};
use tracing::instrument;

use crate::error::{ProductError, ProductResult};
use crate::models::{Product, ProductFilter, ReferenceKind};
use crate::repository::ProductRepository;

const DUPLICATE_KEY: i32 = 11000;

/// MongoDB implementation of the ProductRepository
pub struct MongoProductRepository {
    collection: Collection<Product>,
    db: Database,
}

impl MongoProductRepository {
    /// Create a new MongoProductRepository
    pub fn new(db: &Database) -> Self {
        Self::with_collection(db, "products")
    }

    /// Create a new MongoProductRepository with a custom collection name
    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        Self {
            collection: db.collection::<Product>(collection_name),
            db: db.clone(),
        }
    }

    /// Initialize indexes; the unique slug index backs `DuplicateSlug`.
    pub async fn init_indexes(&self) -> ProductResult<()> {
        self.collection.create_indexes(Self::index_models()).await?;
        tracing::info!("Product indexes created successfully");
        Ok(())
    }

    /// Unique slug plus the fields `build_filter` matches exactly
    fn index_models() -> Vec<IndexModel> {
        let named = |keys: Document, name: &str, unique: bool| {
            IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .unique(unique.then_some(true))
                        .name(name.to_string())
                        .build(),
                )
                .build()
        };

        vec![
            named(doc! { "slug": 1 }, "idx_slug_unique", true),
            named(doc! { "categories": 1 }, "idx_categories", false),
            named(doc! { "collections": 1 }, "idx_collections", false),
            named(doc! { "tags": 1 }, "idx_tags", false),
            named(doc! { "price": 1 }, "idx_price", false),
        ]
    }

    /// Get the underlying collection for advanced operations
    pub fn collection(&self) -> &Collection<Product> {
        &self.collection
    }

    /// Build a MongoDB filter document from ProductFilter
    fn build_filter(filter: &ProductFilter) -> Document {
        let mut doc = doc! {};

        if let Some(category) = filter.category {
            doc.insert("categories", category);
        }

        if let Some(collection) = filter.collection {
            doc.insert("collections", collection);
        }

        if let Some(tag) = filter.tag {
            doc.insert("tags", tag);
        }

        // Price range
        if filter.min_price.is_some() || filter.max_price.is_some() {
            let mut price_filter = doc! {};
            if let Some(min) = filter.min_price {
                price_filter.insert("$gte", min);
            }
            if let Some(max) = filter.max_price {
                price_filter.insert("$lte", max);
            }
            doc.insert("price", price_filter);
        }

        match filter.in_stock {
            Some(true) => {
                doc.insert("numberInStock", doc! { "$gt": 0 });
            }
            Some(false) => {
                doc.insert("numberInStock", doc! { "$lte": 0 });
            }
            None => {}
        }

        if let Some(ref search) = filter.search {
            let pattern = regex::escape(search);
            doc.insert(
                "$or",
                vec![
                    doc! { "title": { "$regex": pattern.as_str(), "$options": "i" } },
                    doc! { "description": { "$regex": pattern.as_str(), "$options": "i" } },
                ],
            );
        }

        doc
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

#[async_trait]
impl ProductRepository for MongoProductRepository {
    #[instrument(skip(self, product), fields(product_id = %product.id, slug = %product.slug))]
    async fn save(&self, product: &Product) -> ProductResult<()> {
        let options = ReplaceOptions::builder().upsert(true).build();

        self.collection
            .replace_one(doc! { "_id": product.id }, product)
            .with_options(options)
            .await
            .map_err(|e| {
                if is_duplicate_key(&e) {
                    ProductError::DuplicateSlug(product.slug.clone())
                } else {
                    ProductError::from(e)
                }
            })?;

        tracing::info!("Product saved");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: ObjectId) -> ProductResult<Option<Product>> {
        let product = self.collection.find_one(doc! { "_id": id }).await?;
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn get_by_slug(&self, slug: &str) -> ProductResult<Option<Product>> {
        let product = self.collection.find_one(doc! { "slug": slug }).await?;
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn exists_by_slug(&self, slug: &str) -> ProductResult<bool> {
        let count = self
            .collection
            .count_documents(doc! { "slug": slug })
            .limit(1)
            .await?;
        Ok(count > 0)
    }

    #[instrument(skip(self))]
    async fn list(&self, filter: ProductFilter) -> ProductResult<Vec<Product>> {
        let mongo_filter = Self::build_filter(&filter);

        let options = FindOptions::builder()
            .limit(filter.effective_limit())
            .skip(filter.offset)
            .sort(doc! { "_id": -1 })
            .build();

        let cursor = self
            .collection
            .find(mongo_filter)
            .with_options(options)
            .await?;
        let products: Vec<Product> = cursor.try_collect().await?;

        Ok(products)
    }

    #[instrument(skip(self))]
    async fn count(&self, filter: ProductFilter) -> ProductResult<u64> {
        let mongo_filter = Self::build_filter(&filter);
        let count = self.collection.count_documents(mongo_filter).await?;
        Ok(count)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: ObjectId) -> ProductResult<bool> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;

        if result.deleted_count > 0 {
            tracing::info!(product_id = %id, "Product deleted successfully");
        }
        Ok(result.deleted_count > 0)
    }

    #[instrument(skip(self, ids), fields(kind = %kind, count = ids.len()))]
    async fn missing_references(
        &self,
        kind: ReferenceKind,
        ids: &[ObjectId],
    ) -> ProductResult<Vec<ObjectId>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let referenced = self.db.collection::<Document>(kind.collection_name());
        let found: Vec<Document> = referenced
            .find(doc! { "_id": { "$in": ids.to_vec() } })
            .projection(doc! { "_id": 1 })
            .await?
            .try_collect()
            .await?;

        let existing: Vec<ObjectId> = found
            .iter()
            .filter_map(|d| d.get_object_id("_id").ok())
            .collect();

        let mut missing: Vec<ObjectId> = Vec::new();
        for id in ids {
            if !existing.contains(id) && !missing.contains(id) {
                missing.push(*id);
            }
        }

        Ok(missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_models() {
        let indexes = MongoProductRepository::index_models();
        let names: Vec<&str> = indexes
            .iter()
            .filter_map(|i| i.options.as_ref()?.name.as_deref())
            .collect();
        assert_eq!(
            names,
            ["idx_slug_unique", "idx_categories", "idx_collections", "idx_tags", "idx_price"]
        );

        let slug = indexes[0].options.as_ref().unwrap();
        assert_eq!(slug.unique, Some(true));
        assert!(indexes[1..]
            .iter()
            .all(|i| i.options.as_ref().unwrap().unique.is_none()));
        assert!(indexes
            .iter()
            .all(|i| i.keys.values().all(|v| v.as_str() != Some("text"))));
    }

    #[test]
    fn test_build_filter_empty() {
        let filter = ProductFilter::default();
        let doc = MongoProductRepository::build_filter(&filter);
        assert!(doc.is_empty());
    }

    #[test]
    fn test_build_filter_with_references() {
        let category = ObjectId::new();
        let filter = ProductFilter {
            category: Some(category),
            tag: Some(ObjectId::new()),
            ..Default::default()
        };
        let doc = MongoProductRepository::build_filter(&filter);
        assert_eq!(doc.get_object_id("categories").unwrap(), category);
        assert!(doc.contains_key("tags"));
        assert!(!doc.contains_key("collections"));
    }

    #[test]
    fn test_build_filter_with_price_range() {
        let filter = ProductFilter {
            min_price: Some(10.0),
            max_price: Some(50.0),
            ..Default::default()
        };
        let doc = MongoProductRepository::build_filter(&filter);
        let price = doc.get_document("price").unwrap();
        assert_eq!(price.get_f64("$gte").unwrap(), 10.0);
        assert_eq!(price.get_f64("$lte").unwrap(), 50.0);
    }

    #[test]
    fn test_build_filter_in_stock() {
        let filter = ProductFilter {
            in_stock: Some(true),
            ..Default::default()
        };
        let doc = MongoProductRepository::build_filter(&filter);
        assert!(doc.get_document("numberInStock").unwrap().contains_key("$gt"));
    }

    #[test]
    fn test_build_filter_escapes_search() {
        let filter = ProductFilter {
            search: Some("shirt (xl)".to_string()),
            ..Default::default()
        };
        let doc = MongoProductRepository::build_filter(&filter);
        let clauses = doc.get_array("$or").unwrap();
        assert_eq!(clauses.len(), 2);

        let title = clauses[0].as_document().unwrap().get_document("title").unwrap();
        assert_eq!(title.get_str("$regex").unwrap(), r"shirt \(xl\)");
    }
}
