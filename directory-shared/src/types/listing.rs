//! Listing types: the inbound ingestion payload, the normalized upsert record,
//! and the stored row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::validation::{require_non_blank, validate_email, validate_range, validate_url};

/// Country stored when a listing does not supply one.
pub const DEFAULT_COUNTRY: &str = "US";

/// Body of an ingestion request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngestPayload {
    pub listings: Vec<ListingInput>,
    /// Whether to refresh the search mirror after the write. Defaults to true.
    #[serde(default = "default_reindex")]
    pub reindex: bool,
}

fn default_reindex() -> bool {
    true
}

/// One listing as submitted to the ingestion endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListingInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(
        default,
        deserialize_with = "deserialize_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub review_count: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brands: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financing: Option<Vec<String>>,
    /// Category slugs, stored as given. `Some` replaces the listing's categories, `None` leaves them alone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
}

impl ListingInput {
    /// Validate the payload.
    ///
    /// Returns an error message naming the first offending field.
    pub fn validate(&self) -> Result<(), String> {
        require_non_blank("name", &self.name)?;
        require_non_blank("city", &self.city)?;
        require_non_blank("state", &self.state)?;
        require_non_blank("postalCode", &self.postal_code)?;

        if let Some(ref website) = self.website {
            validate_url("website", website)?;
        }
        if let Some(ref email) = self.email {
            validate_email("email", email)?;
        }
        if let Some(lat) = self.lat {
            validate_range("lat", lat, -90.0, 90.0)?;
        }
        if let Some(lng) = self.lng {
            validate_range("lng", lng, -180.0, 180.0)?;
        }
        if let Some(review_count) = self.review_count {
            if review_count < 0 {
                return Err("reviewCount must not be negative".to_string());
            }
        }
        Ok(())
    }

    /// True when both coordinates are present.
    pub fn has_coordinates(&self) -> bool {
        self.lat.is_some() && self.lng.is_some()
    }

    /// The free-text query used to geocode this listing, if it has a street address.
    pub fn geocode_query(&self) -> Option<String> {
        let address = self.address.as_deref().map(str::trim).filter(|a| !a.is_empty())?;
        Some(format!(
            "{}, {}, {} {}",
            address, self.city, self.state, self.postal_code
        ))
    }
}

/// Accept any JSON number for a count, truncating fractions.
fn deserialize_count<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.map(|n| n.trunc() as i32))
}

/// A validated, normalized listing ready to be persisted.
///
/// Produced by the normalizer from a [`ListingInput`]: the slug is resolved,
/// defaults are applied, and coordinates may have been filled by geocoding.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingUpsert {
    pub slug: String,
    /// True when the slug was derived from city and name rather than supplied.
    pub slug_derived: bool,
    pub name: String,
    pub website: Option<String>,
    pub description: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub rating: Option<f64>,
    pub review_count: Option<i32>,
    pub brands: Vec<String>,
    pub financing: Vec<String>,
    pub categories: Option<Vec<String>>,
}

impl ListingUpsert {
    /// Whether a stored listing with the given name/city/state is the same business.
    ///
    /// Used to tell a re-ingestion apart from an unrelated listing whose derived
    /// slug happens to collide.
    pub fn same_identity(&self, name: &str, city: &str, state: &str) -> bool {
        fn key(value: &str) -> String {
            value.trim().to_lowercase()
        }
        key(&self.name) == key(name) && key(&self.city) == key(city) && key(&self.state) == key(state)
    }
}

/// A listing row as stored in the relational database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub website: Option<String>,
    pub description: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub rating: Option<f64>,
    pub review_count: Option<i32>,
    pub brands: Vec<String>,
    pub financing: Vec<String>,
    pub plan_weight: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A listing together with the slugs of the categories joined to it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListingWithCategories {
    #[serde(flatten)]
    pub listing: Listing,
    /// Category slugs, sorted.
    pub categories: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> ListingInput {
        ListingInput {
            name: "Glow Spa".to_string(),
            city: "Austin".to_string(),
            state: "TX".to_string(),
            postal_code: "78701".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_payload_reindex_defaults_to_true() {
        let payload: IngestPayload = serde_json::from_str(r#"{"listings": []}"#).unwrap();
        assert!(payload.reindex);
        assert!(payload.listings.is_empty());

        let payload: IngestPayload =
            serde_json::from_str(r#"{"listings": [], "reindex": false}"#).unwrap();
        assert!(!payload.reindex);
    }

    #[test]
    fn test_input_deserializes_camel_case() {
        let json = r#"{
            "name": "Glow Spa",
            "city": "Austin",
            "state": "TX",
            "postalCode": "78701",
            "reviewCount": 12,
            "categories": ["botox-dysport"]
        }"#;
        let input: ListingInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.postal_code, "78701");
        assert_eq!(input.review_count, Some(12));
        assert_eq!(input.categories, Some(vec!["botox-dysport".to_string()]));
        assert!(input.slug.is_none());
    }

    #[test]
    fn test_missing_required_field_fails_to_deserialize() {
        let json = r#"{"name": "Glow Spa", "city": "Austin", "state": "TX"}"#;
        assert!(serde_json::from_str::<ListingInput>(json).is_err());
    }

    #[test]
    fn test_validate_ok() {
        assert!(valid_input().validate().is_ok());
    }

    #[test]
    fn test_validate_blank_fields() {
        let mut input = valid_input();
        input.name = "   ".to_string();
        assert_eq!(input.validate().unwrap_err(), "name is required");

        let mut input = valid_input();
        input.postal_code = String::new();
        assert_eq!(input.validate().unwrap_err(), "postalCode is required");
    }

    #[test]
    fn test_validate_formats() {
        let mut input = valid_input();
        input.email = Some("nope".to_string());
        assert!(input.validate().is_err());

        let mut input = valid_input();
        input.website = Some("glowspa".to_string());
        assert!(input.validate().is_err());

        let mut input = valid_input();
        input.lat = Some(91.0);
        assert!(input.validate().is_err());

        let mut input = valid_input();
        input.review_count = Some(-1);
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_free_form_slug_categories_and_rating_are_accepted() {
        let mut input = valid_input();
        input.slug = Some("Glow_Spa".to_string());
        input.categories = Some(vec!["botox, dysport".to_string(), "Fillers & More".to_string()]);
        input.rating = Some(9.0);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_review_count_accepts_any_number() {
        let json = r#"{"name": "A", "city": "B", "state": "C", "postalCode": "1", "reviewCount": 12.0}"#;
        let input: ListingInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.review_count, Some(12));

        let json = r#"{"name": "A", "city": "B", "state": "C", "postalCode": "1", "reviewCount": 7.9}"#;
        let input: ListingInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.review_count, Some(7));

        let json = r#"{"name": "A", "city": "B", "state": "C", "postalCode": "1", "reviewCount": null}"#;
        let input: ListingInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.review_count, None);
    }

    #[test]
    fn test_geocode_query() {
        let mut input = valid_input();
        assert!(input.geocode_query().is_none());

        input.address = Some("  ".to_string());
        assert!(input.geocode_query().is_none());

        input.address = Some("100 Congress Ave".to_string());
        assert_eq!(
            input.geocode_query().unwrap(),
            "100 Congress Ave, Austin, TX 78701"
        );
    }

    #[test]
    fn test_same_identity_ignores_case_and_padding() {
        let upsert = ListingUpsert {
            slug: "austin-glow-spa".to_string(),
            slug_derived: true,
            name: "Glow Spa".to_string(),
            website: None,
            description: None,
            phone: None,
            email: None,
            address: None,
            city: "Austin".to_string(),
            state: "TX".to_string(),
            postal_code: "78701".to_string(),
            country: DEFAULT_COUNTRY.to_string(),
            lat: None,
            lng: None,
            rating: None,
            review_count: None,
            brands: vec![],
            financing: vec![],
            categories: None,
        };

        assert!(upsert.same_identity(" glow spa ", "AUSTIN", "tx"));
        assert!(!upsert.same_identity("Glow-Spa", "Austin", "TX"));
        assert!(!upsert.same_identity("Glow Spa", "Austin", "CA"));
    }
}
