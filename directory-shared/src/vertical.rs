//! Vertical configuration.
//!
//! A vertical bundles the branding and category taxonomy of one directory
//! deployment. It is selected once at startup and passed around as a
//! value.

use serde::{Deserialize, Serialize};

use crate::types::category::CategorySeed;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerticalConfig {
    pub id: String,
    pub name: String,
    pub categories: Vec<CategorySeed>,
}

impl VerticalConfig {
    /// The MedSpa vertical.
    pub fn medspa() -> Self {
        let categories = [
            ("botox-dysport", "Botox & Dysport"),
            ("dermal-fillers", "Dermal Fillers"),
            ("laser-treatments", "Laser Treatments"),
            ("body-contouring", "Body Contouring"),
            ("skin-treatments", "Skin Treatments"),
            ("wellness", "Wellness & IV Therapy"),
            ("chemical-peels", "Chemical Peels"),
            ("microneedling", "Microneedling"),
            ("skin-tightening", "Skin Tightening"),
            ("iv-therapy", "IV Therapy"),
        ]
        .into_iter()
        .map(|(slug, label)| CategorySeed::new(slug, label))
        .collect();

        Self {
            id: "medspa".to_string(),
            name: "MedSpa Directory".to_string(),
            categories,
        }
    }

    /// Look up a vertical by id, or `None` if it is not known.
    pub fn by_id(id: &str) -> Option<Self> {
        match id.trim().to_ascii_lowercase().as_str() {
            "medspa" => Some(Self::medspa()),
            _ => None,
        }
    }

    /// Look up a vertical by id, falling back to MedSpa for unknown ids.
    pub fn resolve(id: &str) -> Self {
        Self::by_id(id).unwrap_or_else(Self::medspa)
    }

    /// The label for a category slug, if the taxonomy defines one.
    pub fn category_label(&self, slug: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|c| c.slug == slug)
            .map(|c| c.label.as_str())
    }

    /// The seed for a referenced category slug, labelled from the taxonomy when known.
    pub fn category_seed(&self, slug: &str) -> CategorySeed {
        match self.category_label(slug) {
            Some(label) => CategorySeed::new(slug, label),
            None => CategorySeed::from_slug(slug),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_falls_back_to_medspa() {
        assert_eq!(VerticalConfig::resolve("MEDSPA").id, "medspa");
        assert_eq!(VerticalConfig::resolve("dentists").id, "medspa");
        assert!(VerticalConfig::by_id("dentists").is_none());
    }

    #[test]
    fn test_category_seed_labels() {
        let vertical = VerticalConfig::medspa();
        assert_eq!(vertical.category_seed("botox-dysport").label, "Botox & Dysport");
        assert_eq!(vertical.category_seed("hair-removal").label, "hair removal");
    }
}
