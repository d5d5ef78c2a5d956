//! Turns directory filter state into a search request.

use directory_shared::types::search_query::RESULTS_PER_PAGE;
use directory_shared::ListingSearchQuery;

use crate::errors::SearchIndexError;
use crate::query::filter::{FilterClause, FilterExpression};
use crate::types::{SearchRequest, SortField};

/// Fields the free text is matched against, in priority order.
pub const QUERY_BY: [&str; 3] = ["name", "categories", "city"];

/// Fields facet counts are requested for.
pub const FACET_BY: [&str; 5] = ["city", "categories", "brands", "financing", "rating"];

/// Pseudo-field holding the engine's text relevance score.
pub const TEXT_MATCH: &str = "_text_match";

/// Compile a directory query.
///
/// Paid placement always outranks relevance: results are ordered by
/// `planWeight` descending, then by text match descending.
///
/// # Errors
///
/// Returns a validation error when the query parameters are out of range.
pub fn compile(query: &ListingSearchQuery) -> Result<SearchRequest, SearchIndexError> {
    query.validate().map_err(SearchIndexError::validation)?;

    Ok(SearchRequest {
        q: query.text_term().unwrap_or("*").to_string(),
        query_by: QUERY_BY.iter().map(|f| f.to_string()).collect(),
        filter: build_filter(query),
        sort_by: vec![SortField::desc("planWeight"), SortField::desc(TEXT_MATCH)],
        facet_by: FACET_BY.iter().map(|f| f.to_string()).collect(),
        page: query.page,
        per_page: RESULTS_PER_PAGE,
    })
}

fn build_filter(query: &ListingSearchQuery) -> FilterExpression {
    let facets = &query.facets;

    let city = query
        .city
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(|c| FilterClause::equals("city", c));

    let list = |field: &str, values: &Option<Vec<String>>| {
        values
            .as_ref()
            .map(|v| FilterClause::in_list(field, v.clone()))
    };

    // A zero rating means any rating.
    let rating = facets
        .rating
        .filter(|r| *r > 0.0)
        .map(|r| FilterClause::at_least("rating", r));

    let geo = match (query.lat, query.lng) {
        (Some(lat), Some(lng)) => Some(FilterClause::within_radius(
            "location",
            lat,
            lng,
            radius_floor(query.radius_meters),
        )),
        _ => None,
    };

    FilterExpression::new()
        .and_maybe(city)
        .and_maybe(list("categories", &facets.categories))
        .and_maybe(list("brands", &facets.brands))
        .and_maybe(list("financing", &facets.financing))
        .and_maybe(rating)
        .and_maybe(geo)
}

/// Round to the nearest meter, never below one.
fn radius_floor(radius_meters: f64) -> u64 {
    radius_meters.round().max(1.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use directory_shared::SearchFacets;

    #[test]
    fn test_wildcard_and_fixed_parameters() {
        let request = compile(&ListingSearchQuery::default()).unwrap();

        assert_eq!(request.q, "*");
        assert!(request.is_wildcard());
        assert_eq!(request.query_by, vec!["name", "categories", "city"]);
        assert_eq!(
            request.sort_by,
            vec![SortField::desc("planWeight"), SortField::desc("_text_match")]
        );
        assert_eq!(request.per_page, 20);
        assert_eq!(request.page, 1);
        assert!(request.filter.is_empty());
        assert_eq!(request.filter.encode(), None);
    }

    #[test]
    fn test_city_brands_and_rating_are_conjoined() {
        let query = ListingSearchQuery::default()
            .in_city("miami")
            .with_facets(SearchFacets {
                brands: Some(vec!["Allergan".to_string()]),
                rating: Some(4.0),
                ..Default::default()
            });

        let request = compile(&query).unwrap();
        assert_eq!(
            request.filter.encode().unwrap(),
            "city:=`miami` && brands:=[`Allergan`] && rating:>=4"
        );
    }

    #[test]
    fn test_empty_facets_are_omitted() {
        let query = ListingSearchQuery::text("laser").with_facets(SearchFacets {
            categories: Some(vec![]),
            brands: Some(vec![]),
            financing: None,
            rating: Some(0.0),
        });

        let request = compile(&query).unwrap();
        assert_eq!(request.q, "laser");
        assert!(request.filter.is_empty());
    }

    #[test]
    fn test_geo_radius_is_rounded_with_floor() {
        let query = ListingSearchQuery::default().near(25.76, -80.19, 0.2);
        let request = compile(&query).unwrap();
        assert_eq!(
            request.filter.encode().unwrap(),
            "location:(25.76, -80.19, 1 m)"
        );

        let query = ListingSearchQuery::default().near(25.76, -80.19, 1609.6);
        let request = compile(&query).unwrap();
        assert_eq!(
            request.filter.encode().unwrap(),
            "location:(25.76, -80.19, 1610 m)"
        );
    }

    #[test]
    fn test_geo_needs_both_coordinates() {
        let mut query = ListingSearchQuery::default();
        query.lat = Some(25.76);
        assert!(compile(&query).unwrap().filter.is_empty());
    }

    #[test]
    fn test_page_is_passed_through() {
        let request = compile(&ListingSearchQuery::default().with_page(4)).unwrap();
        assert_eq!(request.page, 4);
    }

    #[test]
    fn test_invalid_query_is_rejected() {
        let err = compile(&ListingSearchQuery::default().with_page(0)).unwrap_err();
        assert!(err.is_validation());
    }
}
