//! Search result types for the directory.
//!
//! This module defines the response structures returned from search operations.

use serde::{Deserialize, Serialize};

use super::listing_document::ListingDocument;

/// A single search hit wrapping the projected document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub document: ListingDocument,

    /// Text-match score from the search engine. Higher is a better match.
    #[serde(default)]
    pub text_match: u64,
}

/// Count of documents sharing one facet value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FacetValueCount {
    pub value: String,
    pub count: u64,
}

/// Value counts for one faceted field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FacetCount {
    pub field_name: String,
    pub counts: Vec<FacetValueCount>,
}

/// Complete search response with hits and metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// Total number of matching documents.
    /// May be greater than the number of returned hits due to pagination.
    pub found: u64,

    pub page: u32,

    /// Hits in ranked order.
    pub hits: Vec<SearchHit>,

    #[serde(default)]
    pub facet_counts: Vec<FacetCount>,

    /// Time taken to execute the search in milliseconds.
    #[serde(default)]
    pub search_time_ms: u64,
}

impl SearchResponse {
    /// Create an empty search response for the given page.
    pub fn empty(page: u32) -> Self {
        Self {
            found: 0,
            page,
            hits: Vec::new(),
            facet_counts: Vec::new(),
            search_time_ms: 0,
        }
    }

    /// Returns true if there are no hits.
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Returns the number of hits in this response.
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Slugs of the hits, in ranked order.
    pub fn slugs(&self) -> Vec<&str> {
        self.hits.iter().map(|h| h.document.slug.as_str()).collect()
    }

    /// The value counts for one faceted field, if the engine returned them.
    pub fn facet(&self, field_name: &str) -> Option<&FacetCount> {
        self.facet_counts.iter().find(|f| f.field_name == field_name)
    }
}
