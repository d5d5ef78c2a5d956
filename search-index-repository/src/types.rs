//! Request and response types for search index operations.

use crate::errors::SearchIndexError;
use crate::query::FilterExpression;

/// One field of the result ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    pub field: String,
    pub descending: bool,
}

impl SortField {
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }
}

/// A compiled search request.
///
/// Produced by the query compiler from a `ListingSearchQuery`. Providers
/// either render it into their own wire format or evaluate it directly.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    /// Free-text query; `*` selects every document.
    pub q: String,
    /// Fields the free text is matched against.
    pub query_by: Vec<String>,
    /// Conjunction of filter clauses. May be empty.
    pub filter: FilterExpression,
    /// Ordering, most significant first.
    pub sort_by: Vec<SortField>,
    /// Fields to return value counts for.
    pub facet_by: Vec<String>,
    /// 1-indexed page.
    pub page: u32,
    pub per_page: u32,
}

impl SearchRequest {
    /// True when the request matches on filters alone.
    pub fn is_wildcard(&self) -> bool {
        self.q == "*"
    }
}

/// Result of a batch operation for a single document.
///
/// Indicates whether importing one document succeeded and includes error
/// details if it failed.
#[derive(Debug, Clone)]
pub struct BatchOperationResult {
    /// The document's id.
    pub document_id: String,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error if the operation failed.
    pub error: Option<SearchIndexError>,
}

/// Summary of a batch operation containing aggregate statistics and individual results.
///
/// This struct provides a complete overview of a bulk import, including the total
/// number of documents processed, how many succeeded and failed, and detailed results
/// for each document. This allows callers to handle partial failures gracefully.
#[derive(Debug, Clone, Default)]
pub struct BatchOperationSummary {
    /// Total number of documents in the batch.
    pub total: usize,
    /// Number of successful operations.
    pub succeeded: usize,
    /// Number of failed operations.
    pub failed: usize,
    /// Individual results for each document.
    pub results: Vec<BatchOperationResult>,
}

impl BatchOperationSummary {
    /// Build a summary from per-document results.
    pub fn from_results(results: Vec<BatchOperationResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }

    /// Fold another summary into this one.
    pub fn merge(&mut self, other: BatchOperationSummary) {
        self.total += other.total;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.results.extend(other.results);
    }

    /// Results of the documents that failed.
    pub fn failures(&self) -> impl Iterator<Item = &BatchOperationResult> {
        self.results.iter().filter(|r| !r.success)
    }
}
