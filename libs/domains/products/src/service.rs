//! Product Service - Business logic layer

use mongodb::bson::oid::ObjectId;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::instrument;

use crate::error::{MissingReferences, ProductError, ProductResult};
use crate::models::{CreateProduct, Product, ProductFilter, UpdateProduct};
use crate::repository::ProductRepository;
use crate::schema::check_record;
use crate::slug;
use crate::validation::{validate_create, validate_update};

/// Product service providing business logic operations
///
/// Request bodies arrive as raw JSON; the rule tables decide what is valid
/// before anything is typed. Every write goes through the record check.
pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
}

impl<R: ProductRepository> ProductService<R> {
    /// Create a new ProductService with the given repository
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Create a new product from a raw request body
    #[instrument(skip(self, body))]
    pub async fn create_product(&self, body: Value) -> ProductResult<Product> {
        let input: CreateProduct = typed(validate_create(&body)?)?;

        let id = ObjectId::new();
        let slug = self.generate_slug(&input.title, &id).await?;
        let product = Product::from_create(id, input, slug);

        self.ensure_references(&product).await?;
        check_record(&product)?;
        self.repository.save(&product).await?;

        tracing::info!(product_id = %product.id, slug = %product.slug, "Product created");
        Ok(product)
    }

    /// Get a product by ID
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: ObjectId) -> ProductResult<Product> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(ProductError::NotFound(id))
    }

    /// Get a product by slug
    #[instrument(skip(self))]
    pub async fn get_by_slug(&self, slug: &str) -> ProductResult<Product> {
        self.repository
            .get_by_slug(slug)
            .await?
            .ok_or_else(|| ProductError::SlugNotFound(slug.to_string()))
    }

    /// List products with optional filters
    #[instrument(skip(self))]
    pub async fn list_products(&self, filter: ProductFilter) -> ProductResult<Vec<Product>> {
        self.repository.list(filter).await
    }

    /// Count products matching a filter
    #[instrument(skip(self))]
    pub async fn count_products(&self, filter: ProductFilter) -> ProductResult<u64> {
        self.repository.count(filter).await
    }

    /// Apply a partial update from a raw request body
    #[instrument(skip(self, body))]
    pub async fn update_product(&self, id: ObjectId, body: Value) -> ProductResult<Product> {
        let update: UpdateProduct = typed(validate_update(&body)?)?;

        let mut product = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or(ProductError::NotFound(id))?;

        if let Some(ref new_slug) = update.slug {
            if new_slug != &product.slug && self.repository.exists_by_slug(new_slug).await? {
                return Err(ProductError::DuplicateSlug(new_slug.clone()));
            }
        }

        let references_changed =
            update.categories.is_some() || update.collections.is_some() || update.tags.is_some();

        product.apply_update(update);

        if references_changed {
            self.ensure_references(&product).await?;
        }
        check_record(&product)?;
        self.repository.save(&product).await?;

        tracing::info!(product_id = %id, "Product updated");
        Ok(product)
    }

    /// Delete a product
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: ObjectId) -> ProductResult<()> {
        if !self.repository.delete(id).await? {
            return Err(ProductError::NotFound(id));
        }
        Ok(())
    }

    /// Slug from the title, suffixed with the id tail when short or taken
    async fn generate_slug(&self, title: &str, id: &ObjectId) -> ProductResult<String> {
        let base = slug::slugify(title);

        if slug::is_usable(&base) && !self.repository.exists_by_slug(&base).await? {
            return Ok(base);
        }

        let slug = slug::with_suffix(&base, id);
        tracing::debug!(base = %base, slug = %slug, "Falling back to suffixed slug");
        Ok(slug)
    }

    /// Fail with every unknown category, collection and tag id at once
    async fn ensure_references(&self, product: &Product) -> ProductResult<()> {
        let mut missing = Vec::new();

        for (kind, ids) in product.references() {
            if ids.is_empty() {
                continue;
            }
            let unknown = self.repository.missing_references(kind, ids).await?;
            if !unknown.is_empty() {
                missing.push(MissingReferences { kind, ids: unknown });
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ProductError::UnknownReferences(missing))
        }
    }
}

impl<R: ProductRepository> Clone for ProductService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

/// Type a normalized body; a failure here means the rule table and the DTO disagree.
fn typed<T: DeserializeOwned>(normalized: Map<String, Value>) -> ProductResult<T> {
    serde_json::from_value(Value::Object(normalized))
        .map_err(|e| ProductError::Internal(format!("normalized body did not deserialize: {}", e)))
}
