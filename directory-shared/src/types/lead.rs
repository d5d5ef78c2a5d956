//! Lead-capture types.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{require_min_len, require_non_blank, validate_email};

/// Body of a lead-capture request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeadInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listing_slug: Option<String>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub zip: String,
    pub interest: String,
    pub timeline: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<String>,
    /// Must be literally `true`.
    pub consent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm: Option<HashMap<String, String>>,
}

impl LeadInput {
    /// Validate the payload.
    ///
    /// Returns an error message naming the first offending field.
    pub fn validate(&self) -> Result<(), String> {
        require_non_blank("name", &self.name)?;
        validate_email("email", &self.email)?;
        require_min_len("phone", &self.phone, 5)?;
        require_min_len("zip", &self.zip, 3)?;
        require_non_blank("interest", &self.interest)?;
        require_non_blank("timeline", &self.timeline)?;
        if !self.consent {
            return Err("consent must be given".to_string());
        }
        Ok(())
    }

    /// The listing slug to resolve, if one was supplied.
    pub fn listing_slug(&self) -> Option<&str> {
        self.listing_slug
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// A lead ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLead {
    pub listing_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub zip: String,
    pub interest: String,
    pub timeline: String,
    pub budget: Option<String>,
    pub consent_ts: DateTime<Utc>,
    pub ip: Option<String>,
    pub utm: HashMap<String, String>,
}

impl NewLead {
    /// Build the record from a validated input.
    pub fn from_input(
        input: LeadInput,
        listing_id: Option<Uuid>,
        ip: Option<String>,
        consent_ts: DateTime<Utc>,
    ) -> Self {
        Self {
            listing_id,
            name: input.name,
            email: input.email,
            phone: input.phone,
            zip: input.zip,
            interest: input.interest,
            timeline: input.timeline,
            budget: input.budget,
            consent_ts,
            ip,
            utm: input.utm.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> LeadInput {
        LeadInput {
            listing_slug: Some("austin-glow-spa".to_string()),
            name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            phone: "5125550100".to_string(),
            zip: "78701".to_string(),
            interest: "botox".to_string(),
            timeline: "this month".to_string(),
            budget: None,
            consent: true,
            utm: None,
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_consent_required() {
        let mut input = valid();
        input.consent = false;
        assert_eq!(input.validate().unwrap_err(), "consent must be given");

        let json = r#"{"name":"Jane","email":"jane@example.com","phone":"5125550100",
            "zip":"78701","interest":"botox","timeline":"now"}"#;
        assert!(serde_json::from_str::<LeadInput>(json).is_err());
    }

    #[test]
    fn test_short_fields_rejected() {
        let mut input = valid();
        input.phone = "123".to_string();
        assert!(input.validate().is_err());

        let mut input = valid();
        input.zip = "78".to_string();
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_from_input() {
        let mut input = valid();
        input.utm = Some(HashMap::from([("source".to_string(), "google".to_string())]));
        let now = Utc::now();
        let lead = NewLead::from_input(input, None, Some("203.0.113.9".to_string()), now);

        assert!(lead.listing_id.is_none());
        assert_eq!(lead.consent_ts, now);
        assert_eq!(lead.utm.get("source").map(String::as_str), Some("google"));
    }

    #[test]
    fn test_blank_listing_slug_is_none() {
        let mut input = valid();
        input.listing_slug = Some("  ".to_string());
        assert!(input.listing_slug().is_none());
    }
}
