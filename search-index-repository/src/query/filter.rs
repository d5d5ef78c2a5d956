//! Structured filter expressions.
//!
//! Filters are built as a list of typed clauses and turned into the search
//! engine's `filter_by` grammar by a single encoder, so values never reach the
//! query string without quoting.

/// Operator of a filter clause, carrying its operand.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOperator {
    /// Exact match on a string field.
    Equals(String),
    /// Set membership: the field matches any of the values.
    In(Vec<String>),
    /// Numeric lower bound, inclusive.
    AtLeast(f64),
    /// Geopoint within `radius_meters` of a point.
    WithinRadius {
        lat: f64,
        lng: f64,
        radius_meters: u64,
    },
}

/// A single `{field, operator, value}` filter clause.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterClause {
    pub field: String,
    pub operator: FilterOperator,
}

impl FilterClause {
    pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator: FilterOperator::Equals(value.into()),
        }
    }

    pub fn in_list(field: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            field: field.into(),
            operator: FilterOperator::In(values),
        }
    }

    pub fn at_least(field: impl Into<String>, value: f64) -> Self {
        Self {
            field: field.into(),
            operator: FilterOperator::AtLeast(value),
        }
    }

    pub fn within_radius(field: impl Into<String>, lat: f64, lng: f64, radius_meters: u64) -> Self {
        Self {
            field: field.into(),
            operator: FilterOperator::WithinRadius {
                lat,
                lng,
                radius_meters,
            },
        }
    }

    /// Render this clause in `filter_by` syntax.
    pub fn encode(&self) -> String {
        match &self.operator {
            FilterOperator::Equals(value) => format!("{}:={}", self.field, quote(value)),
            FilterOperator::In(values) => {
                let quoted: Vec<String> = values.iter().map(|v| quote(v)).collect();
                format!("{}:=[{}]", self.field, quoted.join(","))
            }
            FilterOperator::AtLeast(value) => format!("{}:>={}", self.field, value),
            FilterOperator::WithinRadius {
                lat,
                lng,
                radius_meters,
            } => format!("{}:({}, {}, {} m)", self.field, lat, lng, radius_meters),
        }
    }
}

/// Wrap a string operand in backticks, dropping any backtick inside it.
///
/// Backtick quoting lets values contain `,` `:` `&&` `[` `]` and spaces.
fn quote(value: &str) -> String {
    let cleaned: String = value.chars().filter(|&c| c != '`').collect();
    format!("`{}`", cleaned)
}

/// A conjunction of filter clauses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterExpression {
    clauses: Vec<FilterClause>,
}

impl FilterExpression {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a clause.
    ///
    /// Set-membership clauses with no values are dropped, since an empty set
    /// would match nothing.
    pub fn and(mut self, clause: FilterClause) -> Self {
        if let FilterOperator::In(ref values) = clause.operator {
            if values.is_empty() {
                return self;
            }
        }
        self.clauses.push(clause);
        self
    }

    /// Add a clause if one is given.
    pub fn and_maybe(self, clause: Option<FilterClause>) -> Self {
        match clause {
            Some(clause) => self.and(clause),
            None => self,
        }
    }

    pub fn clauses(&self) -> &[FilterClause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Render the whole expression, joining clauses with `&&`.
    ///
    /// Returns `None` for an empty expression so that no `filter_by` is sent.
    pub fn encode(&self) -> Option<String> {
        if self.clauses.is_empty() {
            return None;
        }
        Some(
            self.clauses
                .iter()
                .map(FilterClause::encode)
                .collect::<Vec<_>>()
                .join(" && "),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_each_operator() {
        assert_eq!(FilterClause::equals("city", "Miami").encode(), "city:=`Miami`");
        assert_eq!(
            FilterClause::in_list("brands", vec!["Allergan".into(), "Galderma".into()]).encode(),
            "brands:=[`Allergan`,`Galderma`]"
        );
        assert_eq!(FilterClause::at_least("rating", 4.0).encode(), "rating:>=4");
        assert_eq!(FilterClause::at_least("rating", 4.5).encode(), "rating:>=4.5");
        assert_eq!(
            FilterClause::within_radius("location", 30.27, -97.74, 24000).encode(),
            "location:(30.27, -97.74, 24000 m)"
        );
    }

    #[test]
    fn test_structural_characters_stay_inside_quotes() {
        let clause = FilterClause::in_list(
            "categories",
            vec!["botox, fillers".into(), "a]&&city:=`x`".into()],
        );
        assert_eq!(clause.encode(), "categories:=[`botox, fillers`,`a]&&city:=x`]");
    }

    #[test]
    fn test_empty_in_list_is_dropped() {
        let expr = FilterExpression::new()
            .and(FilterClause::in_list("brands", vec![]))
            .and_maybe(None);
        assert!(expr.is_empty());
        assert_eq!(expr.encode(), None);
    }

    #[test]
    fn test_clauses_are_conjoined() {
        let expr = FilterExpression::new()
            .and(FilterClause::equals("city", "miami"))
            .and(FilterClause::at_least("rating", 4.0));
        assert_eq!(expr.encode().unwrap(), "city:=`miami` && rating:>=4");
        assert_eq!(expr.clauses().len(), 2);
    }
}
