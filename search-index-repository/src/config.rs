//! Configuration types for the SearchIndexService.

/// Default number of documents sent in one import request.
pub const DEFAULT_IMPORT_CHUNK_SIZE: usize = 250;

/// Configuration for the SearchIndexService.
///
/// Bounds the size of each bulk import request so that a full reindex never
/// sends the whole table to the search engine at once.
#[derive(Debug, Clone)]
pub struct SearchIndexServiceConfig {
    /// Maximum number of documents sent in a single import request.
    pub import_chunk_size: usize,
}

impl Default for SearchIndexServiceConfig {
    fn default() -> Self {
        Self {
            import_chunk_size: DEFAULT_IMPORT_CHUNK_SIZE,
        }
    }
}

impl SearchIndexServiceConfig {
    /// Create a config with a custom chunk size.
    ///
    /// A chunk size of zero is treated as one.
    pub fn with_import_chunk_size(import_chunk_size: usize) -> Self {
        Self {
            import_chunk_size: import_chunk_size.max(1),
        }
    }
}
