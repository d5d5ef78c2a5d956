//! Category taxonomy types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored taxonomy entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: Uuid,
    pub slug: String,
    pub label: String,
}

/// A category to create, or relabel if the slug already exists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CategorySeed {
    pub slug: String,
    pub label: String,
}

impl CategorySeed {
    pub fn new(slug: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            label: label.into(),
        }
    }

    /// A seed whose label is the slug with hyphens turned into spaces.
    pub fn from_slug(slug: &str) -> Self {
        Self::new(slug, slug.replace('-', " "))
    }
}
