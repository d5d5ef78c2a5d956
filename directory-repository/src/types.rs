//! Records returned by the store's write operations.

use uuid::Uuid;

/// The outcome of upserting one listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedListing {
    pub id: Uuid,
    /// The slug the listing was stored under, after any disambiguation.
    pub slug: String,
    /// True if the row was inserted rather than updated.
    pub created: bool,
}
