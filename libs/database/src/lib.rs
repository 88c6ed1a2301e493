//! Database connectors and utilities for the storefront services.
//!
//! # Features
//!
//! - `mongodb` (default) - MongoDB connector, configuration and health checks
//! - `config` - `core_config::FromEnv` support for [`mongodb::MongoConfig`]
//!
//! # Example
//!
//! ```ignore
//! use database::common::RetryConfig;
//! use database::mongodb::{MongoConfig, connect_from_config_with_retry};
//!
//! let config = MongoConfig::with_database("mongodb://localhost:27017", "storefront");
//! let client = connect_from_config_with_retry(&config, Some(RetryConfig::new())).await?;
//! let products = client.database(config.database()).collection::<Document>("products");
//! ```

pub mod common;

#[cfg(feature = "mongodb")]
pub mod mongodb;

pub use common::{DatabaseError, DatabaseResult};
