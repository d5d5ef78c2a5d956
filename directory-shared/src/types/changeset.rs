//! The unit of work the listing store persists atomically.

use super::category::CategorySeed;
use super::listing::ListingUpsert;

/// Categories to register plus listings to upsert, written in one transaction.
///
/// Category seeds are applied before any listing so that every slug a listing
/// references can be joined.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestChangeset {
    pub categories: Vec<CategorySeed>,
    pub listings: Vec<ListingUpsert>,
}

impl IngestChangeset {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.listings.is_empty()
    }
}
