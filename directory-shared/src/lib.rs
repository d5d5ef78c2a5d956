//! # Directory Shared
//!
//! This crate defines the data structures shared across the directory ecosystem:
//! listing payloads and rows, categories, leads, the search document projection,
//! search queries and responses, slug helpers, and the vertical configuration.

pub mod slug;
pub mod types;
pub mod vertical;

pub use slug::{derive_listing_slug, slugify};
pub use types::category::{Category, CategorySeed};
pub use types::changeset::IngestChangeset;
pub use types::lead::{LeadInput, NewLead};
pub use types::listing::{IngestPayload, Listing, ListingInput, ListingUpsert, ListingWithCategories};
pub use types::listing_document::ListingDocument;
pub use types::search_query::{ListingSearchQuery, SearchFacets};
pub use types::search_result::{FacetCount, FacetValueCount, SearchHit, SearchResponse};
pub use vertical::VerticalConfig;
