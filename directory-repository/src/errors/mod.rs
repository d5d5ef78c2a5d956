//! Error types for the directory repository.
//! Consolidates and re-exports error types related to listing and lead persistence.
mod repository;

pub use repository::RepositoryError;
