//! Orchestrator module for listing ingestion and lead capture.
//!
//! Coordinates the normalizer, the relational store and the reindex worker.

use std::sync::Arc;

use chrono::Utc;
use directory_repository::{LeadRepository, ListingRepository};
use directory_shared::{IngestPayload, LeadInput, NewLead, VerticalConfig};
use serde::Serialize;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::errors::IngestError;
use crate::processor::ListingNormalizer;
use crate::reindex::{ReindexHandle, ReindexRequest};

/// Result of a successful ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestOutcome {
    /// Stored slugs, in payload order.
    pub slugs: Vec<String>,
    /// How many of them were new rows.
    pub created: usize,
    /// Whether a background reindex was requested.
    pub reindex_requested: bool,
}

/// Entry point for writes to the directory.
///
/// Ingestion validates the whole batch first, then normalizes each listing
/// (geocoding where needed), persists the batch atomically, and finally asks
/// the reindex worker for a sweep. Reindexing never affects the result.
pub struct IngestService {
    listings: Arc<dyn ListingRepository>,
    leads: Arc<dyn LeadRepository>,
    normalizer: ListingNormalizer,
    reindex: Option<ReindexHandle>,
    vertical: Arc<VerticalConfig>,
}

impl IngestService {
    pub fn new(
        listings: Arc<dyn ListingRepository>,
        leads: Arc<dyn LeadRepository>,
        normalizer: ListingNormalizer,
        reindex: Option<ReindexHandle>,
        vertical: Arc<VerticalConfig>,
    ) -> Self {
        Self {
            listings,
            leads,
            normalizer,
            reindex,
            vertical,
        }
    }

    pub fn reindex_handle(&self) -> Option<&ReindexHandle> {
        self.reindex.as_ref()
    }

    /// Ingest a batch of listings.
    ///
    /// # Errors
    ///
    /// * Validation errors when any listing is malformed; nothing is written
    /// * Persistence errors when the store fails; the whole batch is rolled back
    #[instrument(skip_all, fields(listings = payload.listings.len(), reindex = payload.reindex))]
    pub async fn ingest(&self, payload: IngestPayload) -> Result<IngestOutcome, IngestError> {
        self.normalizer.validate_batch(&payload.listings)?;

        let mut normalized = Vec::with_capacity(payload.listings.len());
        for input in payload.listings {
            normalized.push(self.normalizer.normalize(input).await);
        }

        let changeset = self.normalizer.build_changeset(normalized);
        let persisted = if changeset.is_empty() {
            Vec::new()
        } else {
            self.listings.persist_changeset(&changeset).await?
        };

        let outcome = IngestOutcome {
            created: persisted.iter().filter(|p| p.created).count(),
            slugs: persisted.into_iter().map(|p| p.slug).collect(),
            reindex_requested: payload.reindex && self.request_reindex(),
        };

        info!(
            listings = outcome.slugs.len(),
            created = outcome.created,
            reindex_requested = outcome.reindex_requested,
            "Ingested listings"
        );
        Ok(outcome)
    }

    fn request_reindex(&self) -> bool {
        match self.reindex {
            Some(ref handle) => handle.request() != ReindexRequest::Closed,
            None => {
                debug!("No reindex worker configured");
                false
            }
        }
    }

    /// Record a lead.
    ///
    /// An unknown listing slug does not reject the lead; it is stored without
    /// a listing.
    #[instrument(skip_all)]
    pub async fn capture_lead(
        &self,
        input: LeadInput,
        ip: Option<String>,
    ) -> Result<Uuid, IngestError> {
        input.validate().map_err(IngestError::validation)?;

        let listing_id = match input.listing_slug() {
            Some(slug) => {
                let id = self.listings.find_listing_id_by_slug(slug).await?;
                if id.is_none() {
                    debug!(slug = %slug, "Lead references unknown listing");
                }
                id
            }
            None => None,
        };

        let lead = NewLead::from_input(input, listing_id, ip, Utc::now());
        let id = self.leads.insert_lead(&lead).await?;

        info!(lead_id = %id, listing_id = ?listing_id, "Captured lead");
        Ok(id)
    }

    /// Register the vertical's category taxonomy with its labels.
    pub async fn seed_categories(&self) -> Result<usize, IngestError> {
        self.listings
            .upsert_categories(&self.vertical.categories)
            .await?;
        info!(
            vertical = %self.vertical.id,
            categories = self.vertical.categories.len(),
            "Seeded categories"
        );
        Ok(self.vertical.categories.len())
    }
}
