use thiserror::Error;

/// Represents errors that can occur within the directory repository.
///
/// This enum consolidates the failure modes of the relational store: SQLx
/// errors, migration failures, and slugs that could not be disambiguated.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("No free slug derived from '{slug}' after {attempts} attempts")]
    SlugExhausted { slug: String, attempts: u32 },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}
