//! In-memory search index provider.
//!
//! Evaluates compiled requests directly against stored documents. Text
//! relevance is a token-prefix overlap count, which is enough to exercise
//! ranking, filtering and paging without a search engine.

use std::cmp::Ordering as CmpOrdering;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use directory_shared::{FacetCount, FacetValueCount, ListingDocument, SearchHit, SearchResponse};
use tokio::sync::RwLock;

use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::query::compiler::TEXT_MATCH;
use crate::query::{FilterClause, FilterOperator};
use crate::types::{BatchOperationResult, BatchOperationSummary, SearchRequest};

const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

#[derive(Default)]
pub struct InMemorySearchProvider {
    documents: RwLock<BTreeMap<String, ListingDocument>>,
    collection_ready: AtomicBool,
    fail: AtomicBool,
}

impl InMemorySearchProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a connection error.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn collection_ready(&self) -> bool {
        self.collection_ready.load(Ordering::SeqCst)
    }

    pub async fn get(&self, id: &str) -> Option<ListingDocument> {
        self.documents.read().await.get(id).cloned()
    }

    pub async fn documents(&self) -> Vec<ListingDocument> {
        self.documents.read().await.values().cloned().collect()
    }

    fn check_available(&self) -> Result<(), SearchIndexError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SearchIndexError::connection("search index unavailable"));
        }
        Ok(())
    }
}

fn tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn string_values<'a>(doc: &'a ListingDocument, field: &str) -> Vec<&'a str> {
    match field {
        "id" => vec![doc.id.as_str()],
        "slug" => vec![doc.slug.as_str()],
        "name" => vec![doc.name.as_str()],
        "city" => vec![doc.city.as_str()],
        "categories" => doc.categories.iter().map(String::as_str).collect(),
        "brands" => doc.brands.iter().map(String::as_str).collect(),
        "financing" => doc.financing.iter().map(String::as_str).collect(),
        _ => Vec::new(),
    }
}

fn numeric_value(doc: &ListingDocument, field: &str) -> Option<f64> {
    match field {
        "rating" => doc.rating,
        "planWeight" => Some(f64::from(doc.plan_weight)),
        "lat" => doc.lat,
        "lng" => doc.lng,
        _ => None,
    }
}

/// Great-circle distance in meters.
fn haversine_meters(a: [f64; 2], b: [f64; 2]) -> f64 {
    let (lat1, lat2) = (a[0].to_radians(), b[0].to_radians());
    let d_lat = lat2 - lat1;
    let d_lng = (b[1] - a[1]).to_radians();
    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().asin()
}

fn matches_clause(doc: &ListingDocument, clause: &FilterClause) -> bool {
    match &clause.operator {
        FilterOperator::Equals(value) => string_values(doc, &clause.field)
            .iter()
            .any(|v| v.eq_ignore_ascii_case(value)),
        FilterOperator::In(values) => string_values(doc, &clause.field)
            .iter()
            .any(|v| values.iter().any(|w| v.eq_ignore_ascii_case(w))),
        FilterOperator::AtLeast(min) => {
            numeric_value(doc, &clause.field).is_some_and(|v| v >= *min)
        }
        FilterOperator::WithinRadius {
            lat,
            lng,
            radius_meters,
        } => doc
            .location
            .is_some_and(|loc| haversine_meters(loc, [*lat, *lng]) <= *radius_meters as f64),
    }
}

/// Count of query tokens that prefix a token in one of the searched fields.
fn text_score(doc: &ListingDocument, request: &SearchRequest) -> u64 {
    let doc_tokens: Vec<String> = request
        .query_by
        .iter()
        .flat_map(|field| string_values(doc, field))
        .flat_map(tokens)
        .collect();

    tokens(&request.q)
        .iter()
        .filter(|q| doc_tokens.iter().any(|t| t.starts_with(q.as_str())))
        .count() as u64
}

fn sort_value(hit: &SearchHit, field: &str) -> f64 {
    if field == TEXT_MATCH {
        return hit.text_match as f64;
    }
    numeric_value(&hit.document, field).unwrap_or(f64::MIN)
}

fn facet_counts(hits: &[SearchHit], facet_by: &[String]) -> Vec<FacetCount> {
    facet_by
        .iter()
        .map(|field| {
            let mut counts: HashMap<String, u64> = HashMap::new();
            for hit in hits {
                let values: Vec<String> = match numeric_value(&hit.document, field) {
                    Some(v) if field == "rating" => vec![v.to_string()],
                    _ => string_values(&hit.document, field)
                        .into_iter()
                        .map(str::to_string)
                        .collect(),
                };
                for value in values {
                    *counts.entry(value).or_default() += 1;
                }
            }

            let mut counts: Vec<FacetValueCount> = counts
                .into_iter()
                .map(|(value, count)| FacetValueCount { value, count })
                .collect();
            counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));

            FacetCount {
                field_name: field.clone(),
                counts,
            }
        })
        .collect()
}

#[async_trait]
impl SearchIndexProvider for InMemorySearchProvider {
    async fn ensure_collection_exists(&self) -> Result<(), SearchIndexError> {
        self.check_available()?;
        self.collection_ready.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn import_documents(
        &self,
        documents: &[ListingDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        self.check_available()?;

        let mut store = self.documents.write().await;
        let results = documents
            .iter()
            .map(|doc| {
                if doc.id.is_empty() {
                    return BatchOperationResult {
                        document_id: String::new(),
                        success: false,
                        error: Some(SearchIndexError::import("Document has no id")),
                    };
                }
                store.insert(doc.id.clone(), doc.clone());
                BatchOperationResult {
                    document_id: doc.id.clone(),
                    success: true,
                    error: None,
                }
            })
            .collect();

        Ok(BatchOperationSummary::from_results(results))
    }

    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchIndexError> {
        self.check_available()?;

        let store = self.documents.read().await;
        let mut hits: Vec<SearchHit> = store
            .values()
            .filter(|doc| request.filter.clauses().iter().all(|c| matches_clause(doc, c)))
            .filter_map(|doc| {
                let score = if request.is_wildcard() {
                    0
                } else {
                    text_score(doc, request)
                };
                if !request.is_wildcard() && score == 0 {
                    return None;
                }
                Some(SearchHit {
                    document: doc.clone(),
                    text_match: score,
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            request
                .sort_by
                .iter()
                .map(|s| {
                    let ord = sort_value(a, &s.field)
                        .partial_cmp(&sort_value(b, &s.field))
                        .unwrap_or(CmpOrdering::Equal);
                    if s.descending {
                        ord.reverse()
                    } else {
                        ord
                    }
                })
                .find(|o| *o != CmpOrdering::Equal)
                .unwrap_or(CmpOrdering::Equal)
                .then_with(|| a.document.slug.cmp(&b.document.slug))
        });

        let found = hits.len() as u64;
        let facet_counts = facet_counts(&hits, &request.facet_by);
        let per_page = request.per_page as usize;
        let offset = (request.page.saturating_sub(1) as usize).saturating_mul(per_page);
        let hits = hits.into_iter().skip(offset).take(per_page).collect();

        Ok(SearchResponse {
            found,
            page: request.page,
            hits,
            facet_counts,
            search_time_ms: 0,
        })
    }

    async fn document_count(&self) -> Result<u64, SearchIndexError> {
        self.check_available()?;
        Ok(self.documents.read().await.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::compile;
    use directory_shared::{ListingSearchQuery, SearchFacets};

    fn doc(slug: &str, name: &str, city: &str, plan_weight: i32) -> ListingDocument {
        ListingDocument {
            id: slug.to_string(),
            slug: slug.to_string(),
            name: name.to_string(),
            city: city.to_string(),
            categories: vec!["botox-dysport".to_string()],
            brands: vec![],
            financing: vec![],
            rating: Some(4.0),
            plan_weight,
            lat: None,
            lng: None,
            location: None,
        }
    }

    async fn provider_with(docs: Vec<ListingDocument>) -> InMemorySearchProvider {
        let provider = InMemorySearchProvider::new();
        provider.import_documents(&docs).await.unwrap();
        provider
    }

    #[tokio::test]
    async fn test_plan_weight_outranks_text_match() {
        let provider = provider_with(vec![
            doc("a", "Laser Laser Clinic", "Austin", 0),
            doc("b", "Laser Spa", "Austin", 100),
        ])
        .await;

        let response = provider
            .search(&compile(&ListingSearchQuery::text("laser clinic")).unwrap())
            .await
            .unwrap();

        assert_eq!(response.slugs(), vec!["b", "a"]);
        assert!(response.hits[1].text_match > response.hits[0].text_match);
    }

    #[tokio::test]
    async fn test_city_filter_is_case_insensitive() {
        let provider = provider_with(vec![
            doc("austin-glow-spa", "Glow Spa", "Austin", 0),
            doc("miami-glow-spa", "Glow Spa", "Miami", 0),
        ])
        .await;

        let response = provider
            .search(&compile(&ListingSearchQuery::default().in_city("austin")).unwrap())
            .await
            .unwrap();

        assert_eq!(response.slugs(), vec!["austin-glow-spa"]);
        assert_eq!(response.found, 1);
    }

    #[tokio::test]
    async fn test_geo_and_rating_filters() {
        let mut near = doc("near", "Near Spa", "Austin", 0);
        near.location = Some([30.2672, -97.7431]);
        let mut far = doc("far", "Far Spa", "Dallas", 0);
        far.location = Some([32.7767, -96.7970]);
        let mut low = doc("low", "Low Spa", "Austin", 0);
        low.location = Some([30.2672, -97.7431]);
        low.rating = Some(3.0);
        let provider = provider_with(vec![near, far, low, doc("nowhere", "X", "Austin", 0)]).await;

        let query = ListingSearchQuery::default()
            .near(30.27, -97.74, 24000.0)
            .with_facets(SearchFacets {
                rating: Some(4.0),
                ..Default::default()
            });
        let response = provider.search(&compile(&query).unwrap()).await.unwrap();

        assert_eq!(response.slugs(), vec!["near"]);
    }

    #[tokio::test]
    async fn test_paging_and_facets() {
        let docs = (0..25)
            .map(|i| doc(&format!("spa-{:02}", i), "Spa", "Austin", 0))
            .collect();
        let provider = provider_with(docs).await;

        let page2 = provider
            .search(&compile(&ListingSearchQuery::default().with_page(2)).unwrap())
            .await
            .unwrap();

        assert_eq!(page2.found, 25);
        assert_eq!(page2.len(), 5);
        assert_eq!(page2.hits[0].document.slug, "spa-20");
        let city = page2.facet("city").unwrap();
        assert_eq!(city.counts[0].value, "Austin");
        assert_eq!(city.counts[0].count, 25);
    }

    #[tokio::test]
    async fn test_upsert_by_id_and_failure_toggle() {
        let provider = provider_with(vec![doc("a", "Old", "Austin", 0)]).await;
        provider
            .import_documents(&[doc("a", "New", "Austin", 0)])
            .await
            .unwrap();

        assert_eq!(provider.document_count().await.unwrap(), 1);
        assert_eq!(provider.get("a").await.unwrap().name, "New");

        provider.set_fail(true);
        assert!(matches!(
            provider.document_count().await,
            Err(SearchIndexError::ConnectionError(_))
        ));
    }

    #[test]
    fn test_haversine() {
        let d = haversine_meters([30.2672, -97.7431], [32.7767, -96.7970]);
        assert!((d - 294_000.0).abs() < 5_000.0);
        assert_eq!(haversine_meters([1.0, 1.0], [1.0, 1.0]), 0.0);
    }
}
