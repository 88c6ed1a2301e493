//! Products Domain
//!
//! Product catalog for the storefront, stored in MongoDB.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints, raw JSON bodies
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Rule tables, slug, references, record check
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Data access (trait + MongoDB implementation)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entity, DTOs, API response
//! └─────────────┘
//! ```
//!
//! Request bodies are validated by [`validation`], a pair of plain rule
//! tables interpreted by [`rules::validate_document`]. The stored shape is
//! guarded separately by [`schema::check_record`].
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_products::{
//!     handlers,
//!     mongodb::MongoProductRepository,
//!     service::ProductService,
//! };
//! use mongodb::Client;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::with_uri_str("mongodb://localhost:27017").await?;
//! let db = client.database("storefront");
//!
//! let repository = MongoProductRepository::new(&db);
//! repository.init_indexes().await?;
//! let service = ProductService::new(repository);
//!
//! let router = handlers::router(service);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handlers;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod rules;
pub mod schema;
pub mod service;
pub mod slug;
pub mod validation;

pub use error::{MissingReferences, ProductError, ProductResult};
pub use handlers::ApiDoc;
pub use models::{
    CreateProduct, Product, ProductFilter, ProductResponse, ReferenceKind, UpdateProduct,
};
pub use mongodb::MongoProductRepository;
pub use repository::ProductRepository;
pub use rules::{Rule, Violation, Violations};
pub use service::ProductService;
pub use validation::{validate_create, validate_update};
