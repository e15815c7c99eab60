use std::collections::BTreeMap;

/// Field constraints passed to `find` and `clear`.
///
/// Filters are accepted and carried for API compatibility, but queries always
/// cover every record of a model: no filter is ever applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters(BTreeMap<String, String>);

impl Filters {
    /// The empty filter, matching every record.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the constraint on `field`.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Merges several filters into one; later filters win on conflicting fields.
    #[must_use]
    pub fn combine(filters: impl IntoIterator<Item = Filters>) -> Self {
        let mut merged = BTreeMap::new();
        for filter in filters {
            merged.extend(filter.0);
        }
        Self(merged)
    }

    /// Whether no criterion is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of criteria.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Constraint on `field`, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }
}
