//! Processor module for listing ingestion.
//!
//! Validates and shapes inbound listings into the changeset the store persists.

mod listing_normalizer;

pub use listing_normalizer::ListingNormalizer;
