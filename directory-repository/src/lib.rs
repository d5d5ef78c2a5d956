//! # Directory Repository
//! This crate provides traits and implementations for interacting with the
//! directory's relational store. It includes definitions for errors, interfaces,
//! a PostgreSQL implementation and an in-memory implementation.
pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod postgres;
pub mod types;

pub use errors::RepositoryError;
pub use interfaces::{LeadRepository, ListingRepository};
pub use memory::{InMemoryLeadRepository, InMemoryListingRepository};
pub use postgres::{run_migrations, PostgresLeadRepository, PostgresListingRepository};
pub use types::PersistedListing;
