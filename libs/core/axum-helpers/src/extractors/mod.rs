//! Custom extractors for Axum handlers.
//!
//! Every extractor here rejects with [`AppError`](crate::errors::AppError) so that
//! malformed paths, query strings and bodies share the standard error body.

pub mod json_body;
pub mod object_id_path;
pub mod query_params;

pub use json_body::JsonBody;
pub use object_id_path::ObjectIdPath;
pub use query_params::QueryParams;
