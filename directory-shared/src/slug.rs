//! Slug helpers for listings and categories.
//!
//! A slug is a lowercase ASCII token where every run of characters outside
//! `[a-z0-9]` is collapsed into a single hyphen, with no leading or trailing
//! hyphen.

/// Highest numeric suffix tried when disambiguating a derived slug.
pub const MAX_SLUG_SUFFIX: u32 = 100;

/// Convert arbitrary text into a URL-safe slug.
///
/// # Example
///
/// ```
/// use directory_shared::slugify;
///
/// assert_eq!(slugify("  Glow Spa & Laser!! "), "glow-spa-laser");
/// ```
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_hyphen = false;

    for c in input.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Derive the slug of a listing that did not supply one, from its city and name.
pub fn derive_listing_slug(city: &str, name: &str) -> String {
    slugify(&format!("{}-{}", city, name))
}

/// The slug to try for the given disambiguation attempt.
///
/// Attempt 1 is the base slug itself; attempt `n > 1` appends `-n`.
pub fn slug_candidate(base: &str, attempt: u32) -> String {
    if attempt <= 1 {
        base.to_string()
    } else {
        format!("{}-{}", base, attempt)
    }
}
