//! Typesense provider implementation.
//!
//! This module provides the concrete implementation of `SearchIndexProvider`
//! against the Typesense REST API using reqwest.

use async_trait::async_trait;
use directory_shared::{FacetCount, FacetValueCount, ListingDocument, SearchHit, SearchResponse};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::types::{BatchOperationResult, BatchOperationSummary, SearchRequest, SortField};
use crate::typesense::collection_schema::CollectionSchema;
use crate::typesense::config::TypesenseConfig;

const API_KEY_HEADER: &str = "X-TYPESENSE-API-KEY";

/// Typesense provider implementation.
///
/// # Example
///
/// ```ignore
/// let config = TypesenseConfig::from_env()?;
/// let provider = TypesenseProvider::new(config)?;
/// provider.ensure_collection_exists().await?;
/// let summary = provider.import_documents(&documents).await?;
/// ```
pub struct TypesenseProvider {
    client: Client,
    config: TypesenseConfig,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct CollectionInfo {
    #[serde(default)]
    num_documents: u64,
}

#[derive(Debug, Deserialize)]
struct ImportLine {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSearchResponse {
    #[serde(default)]
    found: u64,
    #[serde(default)]
    page: u32,
    #[serde(default)]
    search_time_ms: u64,
    #[serde(default)]
    hits: Vec<RawHit>,
    #[serde(default)]
    facet_counts: Vec<RawFacetCount>,
}

#[derive(Debug, Deserialize)]
struct RawHit {
    document: ListingDocument,
    #[serde(default)]
    text_match: u64,
}

#[derive(Debug, Deserialize)]
struct RawFacetCount {
    field_name: String,
    #[serde(default)]
    counts: Vec<FacetValueCount>,
}

impl From<RawSearchResponse> for SearchResponse {
    fn from(raw: RawSearchResponse) -> Self {
        SearchResponse {
            found: raw.found,
            page: raw.page,
            hits: raw
                .hits
                .into_iter()
                .map(|h| SearchHit {
                    document: h.document,
                    text_match: h.text_match,
                })
                .collect(),
            facet_counts: raw
                .facet_counts
                .into_iter()
                .map(|f| FacetCount {
                    field_name: f.field_name,
                    counts: f.counts,
                })
                .collect(),
            search_time_ms: raw.search_time_ms,
        }
    }
}

impl TypesenseProvider {
    /// Create a new provider for the configured node.
    ///
    /// No request is made here; call `ensure_collection_exists` to verify
    /// connectivity.
    pub fn new(config: TypesenseConfig) -> Result<Self, SearchIndexError> {
        let client = Client::builder()
            .timeout(config.connection_timeout)
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;
        let base_url = config.base_url();

        info!(
            url = %base_url,
            collection = %config.collection,
            "Created Typesense provider"
        );

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.base_url, self.config.collection)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(API_KEY_HEADER, &self.config.api_key)
    }

    /// Render the sort order as `field:desc,field:asc`.
    fn encode_sort(sort_by: &[SortField]) -> String {
        sort_by
            .iter()
            .map(|s| format!("{}:{}", s.field, if s.descending { "desc" } else { "asc" }))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Build the query parameters of a search request.
    fn search_params(request: &SearchRequest) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("q", request.q.clone()),
            ("query_by", request.query_by.join(",")),
        ];
        if let Some(filter) = request.filter.encode() {
            params.push(("filter_by", filter));
        }
        params.push(("sort_by", Self::encode_sort(&request.sort_by)));
        if !request.facet_by.is_empty() {
            params.push(("facet_by", request.facet_by.join(",")));
        }
        params.push(("page", request.page.to_string()));
        params.push(("per_page", request.per_page.to_string()));
        params
    }

    async fn body_text(response: Response) -> String {
        response.text().await.unwrap_or_default()
    }

    async fn create_collection(&self) -> Result<(), SearchIndexError> {
        let schema = CollectionSchema::listings(&self.config.collection);
        let response = self
            .authorized(self.client.post(format!("{}/collections", self.base_url)))
            .json(&schema)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                info!(collection = %self.config.collection, "Created search collection");
                Ok(())
            }
            // Another process created it between our lookup and this request.
            StatusCode::CONFLICT => {
                debug!(collection = %self.config.collection, "Collection already exists");
                Ok(())
            }
            status => Err(SearchIndexError::collection(format!(
                "Failed to create collection '{}': {} {}",
                self.config.collection,
                status,
                Self::body_text(response).await
            ))),
        }
    }

    /// Map import response lines onto the submitted documents, in order.
    fn parse_import_results(
        documents: &[ListingDocument],
        body: &str,
    ) -> Result<Vec<BatchOperationResult>, SearchIndexError> {
        let lines: Vec<ImportLine> = body
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| {
                serde_json::from_str(l).map_err(|e| {
                    SearchIndexError::parse(format!("Invalid import result line: {}", e))
                })
            })
            .collect::<Result<_, _>>()?;

        Ok(documents
            .iter()
            .enumerate()
            .map(|(i, doc)| {
                let document_id = doc.document_id().to_string();
                match lines.get(i) {
                    Some(line) if line.success => BatchOperationResult {
                        document_id,
                        success: true,
                        error: None,
                    },
                    Some(line) => BatchOperationResult {
                        document_id,
                        success: false,
                        error: Some(SearchIndexError::import(
                            line.error.clone().unwrap_or_else(|| "rejected".to_string()),
                        )),
                    },
                    None => BatchOperationResult {
                        document_id,
                        success: false,
                        error: Some(SearchIndexError::import("No result returned for document")),
                    },
                }
            })
            .collect())
    }
}

#[async_trait]
impl SearchIndexProvider for TypesenseProvider {
    async fn ensure_collection_exists(&self) -> Result<(), SearchIndexError> {
        let response = self
            .authorized(self.client.get(self.collection_url()))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                debug!(collection = %self.config.collection, "Collection exists");
                Ok(())
            }
            StatusCode::NOT_FOUND => self.create_collection().await,
            status => Err(SearchIndexError::collection(format!(
                "Failed to retrieve collection '{}': {} {}",
                self.config.collection,
                status,
                Self::body_text(response).await
            ))),
        }
    }

    async fn import_documents(
        &self,
        documents: &[ListingDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        if documents.is_empty() {
            return Ok(BatchOperationSummary::default());
        }

        let mut body = String::new();
        for doc in documents {
            let line = serde_json::to_string(doc)
                .map_err(|e| SearchIndexError::serialization(e.to_string()))?;
            body.push_str(&line);
            body.push('\n');
        }

        let response = self
            .authorized(
                self.client
                    .post(format!("{}/documents/import", self.collection_url())),
            )
            .query(&[("action", "upsert")])
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = Self::body_text(response).await;
        if !status.is_success() {
            return Err(SearchIndexError::import(format!(
                "Import request failed: {} {}",
                status, text
            )));
        }

        let summary =
            BatchOperationSummary::from_results(Self::parse_import_results(documents, &text)?);
        if summary.failed > 0 {
            warn!(
                total = summary.total,
                failed = summary.failed,
                "Search index rejected documents"
            );
        } else {
            debug!(total = summary.total, "Imported documents");
        }
        Ok(summary)
    }

    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchIndexError> {
        let response = self
            .authorized(
                self.client
                    .get(format!("{}/documents/search", self.collection_url())),
            )
            .query(&Self::search_params(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchIndexError::search(format!(
                "Search request failed: {} {}",
                status,
                Self::body_text(response).await
            )));
        }

        let raw: RawSearchResponse = response.json().await?;
        Ok(raw.into())
    }

    async fn document_count(&self) -> Result<u64, SearchIndexError> {
        let response = self
            .authorized(self.client.get(self.collection_url()))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchIndexError::collection(format!(
                "Failed to retrieve collection '{}': {} {}",
                self.config.collection,
                status,
                Self::body_text(response).await
            )));
        }

        let info: CollectionInfo = response.json().await?;
        Ok(info.num_documents)
    }
}
