//! PostgreSQL implementation of the directory repository.
//!
//! ## Database Tables
//!
//! - `categories`: taxonomy entries keyed by slug
//! - `listings`: business listings keyed by slug
//! - `listing_categories`: listing ↔ category join
//! - `leads`: append-only lead submissions
mod lead_repository;
mod listing_repository;

pub use lead_repository::PostgresLeadRepository;
pub use listing_repository::PostgresListingRepository;

use crate::errors::RepositoryError;

/// Embedded schema migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("src/postgres/migrations");

/// Applies any pending migrations.
pub async fn run_migrations(pool: &sqlx::PgPool) -> Result<(), RepositoryError> {
    MIGRATOR.run(pool).await?;
    Ok(())
}
