use async_trait::async_trait;
use directory_shared::NewLead;
use uuid::Uuid;

use crate::errors::RepositoryError;

/// Append-only store for captured leads.
#[async_trait]
pub trait LeadRepository: Send + Sync {
    /// Inserts a lead and returns its id.
    async fn insert_lead(&self, lead: &NewLead) -> Result<Uuid, RepositoryError>;
}
