//! Field-level validation helpers shared by the inbound payload types.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Require a string field to contain something other than whitespace.
pub(crate) fn require_non_blank(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", field));
    }
    Ok(())
}

/// Require a string field to be at least `min` characters long.
pub(crate) fn require_min_len(field: &str, value: &str, min: usize) -> Result<(), String> {
    if value.trim().chars().count() < min {
        return Err(format!("{} must be at least {} characters", field, min));
    }
    Ok(())
}

pub(crate) fn validate_email(field: &str, value: &str) -> Result<(), String> {
    if !EMAIL_RE.is_match(value) {
        return Err(format!("{} must be a valid email address", field));
    }
    Ok(())
}

/// Absolute http(s) URLs only.
pub(crate) fn validate_url(field: &str, value: &str) -> Result<(), String> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(()),
        Ok(_) => Err(format!("{} must be an http(s) URL", field)),
        Err(e) => Err(format!("{} must be a valid URL: {}", field, e)),
    }
}

pub(crate) fn validate_range(field: &str, value: f64, min: f64, max: f64) -> Result<(), String> {
    if !value.is_finite() || value < min || value > max {
        return Err(format!("{} must be between {} and {}", field, min, max));
    }
    Ok(())
}
