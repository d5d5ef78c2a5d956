//! Typesense implementation of the search index provider.

pub mod collection_schema;
pub mod config;
mod provider;

pub use collection_schema::{CollectionSchema, SchemaField};
pub use config::{TypesenseConfig, LISTINGS_COLLECTION};
pub use provider::TypesenseProvider;
