//! This module defines the core data structures used across the directory.
//! It re-exports the listing, category, lead, document and search types.

pub mod category;
pub mod changeset;
pub mod lead;
pub mod listing;
pub mod listing_document;
pub mod search_query;
pub mod search_result;
mod validation;

pub use listing_document::ListingDocument;
