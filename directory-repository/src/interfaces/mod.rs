//! This module defines and re-exports the interfaces for the directory repository.
//! It serves as a central point for accessing traits related to data interaction.
mod lead_repository;
mod listing_repository;

pub use lead_repository::LeadRepository;
pub use listing_repository::ListingRepository;
