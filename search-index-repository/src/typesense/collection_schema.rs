//! Collection schema for the listings mirror.

use serde::Serialize;

/// A single field of a Typesense collection.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SchemaField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub facet: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}

impl SchemaField {
    fn new(name: &str, field_type: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type: field_type.to_string(),
            facet: false,
            optional: false,
        }
    }

    fn faceted(mut self) -> Self {
        self.facet = true;
        self
    }

    fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// Body of a create-collection request.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CollectionSchema {
    pub name: String,
    pub fields: Vec<SchemaField>,
    pub default_sorting_field: String,
}

impl CollectionSchema {
    /// The listings schema under the given collection name.
    ///
    /// Rating and coordinates are optional since geocoding and reviews may be
    /// missing. `planWeight` is the default sort.
    pub fn listings(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fields: vec![
                SchemaField::new("id", "string"),
                SchemaField::new("slug", "string"),
                SchemaField::new("name", "string"),
                SchemaField::new("city", "string").faceted(),
                SchemaField::new("categories", "string[]").faceted(),
                SchemaField::new("brands", "string[]").faceted(),
                SchemaField::new("financing", "string[]").faceted(),
                SchemaField::new("rating", "float").faceted().optional(),
                SchemaField::new("planWeight", "int32"),
                SchemaField::new("lat", "float").optional(),
                SchemaField::new("lng", "float").optional(),
                SchemaField::new("location", "geopoint").optional(),
            ],
            default_sorting_field: "planWeight".to_string(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.name == name)
    }
}
