use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use crate::error::ProductResult;
use crate::models::{Product, ProductFilter, ReferenceKind};

/// Repository trait for Product persistence
///
/// Replaces any implicit model registry: the service only sees this trait,
/// so storage backends and test doubles plug in the same way.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert or replace a product by id
    ///
    /// Fails with `DuplicateSlug` when another product owns the slug.
    async fn save(&self, product: &Product) -> ProductResult<()>;

    /// Get a product by ID
    async fn get_by_id(&self, id: ObjectId) -> ProductResult<Option<Product>>;

    /// Get a product by slug
    async fn get_by_slug(&self, slug: &str) -> ProductResult<Option<Product>>;

    /// Check if a slug is taken
    async fn exists_by_slug(&self, slug: &str) -> ProductResult<bool>;

    /// List products with optional filters
    async fn list(&self, filter: ProductFilter) -> ProductResult<Vec<Product>>;

    /// Count products matching a filter
    async fn count(&self, filter: ProductFilter) -> ProductResult<u64>;

    /// Delete a product by ID; false when nothing was deleted
    async fn delete(&self, id: ObjectId) -> ProductResult<bool>;

    /// Ids from `ids` with no matching document of `kind`
    async fn missing_references(
        &self,
        kind: ReferenceKind,
        ids: &[ObjectId],
    ) -> ProductResult<Vec<ObjectId>>;
}
