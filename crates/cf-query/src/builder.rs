//! Query Builder
//!
//! Provides a fluent API for constructing delivery queries.
//!
//! Every mutator consumes the builder and hands it back, so a builder is
//! only ever reachable from one call chain. Mutators that can reject their
//! input return `CfResult<Self>` and fail before any request is made.

use cf_core::{CfError, CfResult};

use crate::filters::{params, validate_field_path, Filter, FilterOperator};
use crate::mime::MimeTypeRestriction;
use crate::query::{Query, MAX_INCLUDE, MAX_LIMIT, MAX_SELECT};
use crate::sorts::SortOrder;

/// Builder for constructing queries fluently
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to entries of one content type; a second call overwrites
    pub fn content_type_is(mut self, content_type_id: impl Into<String>) -> Self {
        self.query.content_type = Some(content_type_id.into());
        self
    }

    // Filter methods

    /// Add a raw filter
    pub fn filter(mut self, filter: Filter) -> Self {
        self.query.filters.add(filter);
        self
    }

    pub fn field_equals(self, field: impl Into<String>, value: impl Into<String>) -> CfResult<Self> {
        Ok(self.filter(Filter::equals(field, value)?))
    }

    pub fn field_does_not_equal(
        self,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> CfResult<Self> {
        Ok(self.filter(Filter::not_equals(field, value)?))
    }

    /// Match entries whose field equals any of the values
    pub fn field_includes<I, S>(self, field: impl Into<String>, values: I) -> CfResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(self.filter(Filter::includes(field, values)?))
    }

    /// Match entries whose field equals none of the values
    pub fn field_excludes<I, S>(self, field: impl Into<String>, values: I) -> CfResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(self.filter(Filter::excludes(field, values)?))
    }

    /// Match entries whose array field contains every value
    pub fn field_includes_all<I, S>(self, field: impl Into<String>, values: I) -> CfResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(self.filter(Filter::includes_all(field, values)?))
    }

    pub fn field_exists(self, field: impl Into<String>, must_exist: bool) -> CfResult<Self> {
        Ok(self.filter(Filter::exists(field, must_exist)?))
    }

    pub fn field_matches(self, field: impl Into<String>, text: impl Into<String>) -> CfResult<Self> {
        Ok(self.filter(Filter::matches(field, text)?))
    }

    pub fn field_less_than(self, field: impl Into<String>, value: impl Into<String>) -> CfResult<Self> {
        Ok(self.filter(Filter::less_than(field, value)?))
    }

    pub fn field_less_than_or_equal_to(
        self,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> CfResult<Self> {
        Ok(self.filter(Filter::less_than_or_equal(field, value)?))
    }

    pub fn field_greater_than(
        self,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> CfResult<Self> {
        Ok(self.filter(Filter::greater_than(field, value)?))
    }

    pub fn field_greater_than_or_equal_to(
        self,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> CfResult<Self> {
        Ok(self.filter(Filter::greater_than_or_equal(field, value)?))
    }

    /// Inclusive range; `bounds` must hold exactly a lower and an upper bound
    pub fn field_between<S: AsRef<str>>(
        self,
        field: impl Into<String>,
        bounds: &[S],
    ) -> CfResult<Self> {
        let [lower, upper] = Filter::range(field, bounds)?;
        Ok(self.filter(lower).filter(upper))
    }

    /// Full text search across all fields; replaces an earlier search term
    pub fn full_text_search(mut self, term: impl Into<String>) -> CfResult<Self> {
        let filter = Filter::full_text(term)?;
        self.query.filters.remove_operator(FilterOperator::FullText);
        Ok(self.filter(filter))
    }

    /// Order by distance to `[lat, lon]`
    pub fn in_proximity_of(self, field: impl Into<String>, coords: &[f64]) -> CfResult<Self> {
        Ok(self.filter(Filter::near(field, coords)?))
    }

    /// Restrict to the box `[lat1, lon1, lat2, lon2]` (top-left, bottom-right)
    pub fn within_area(self, field: impl Into<String>, coords: &[f64]) -> CfResult<Self> {
        Ok(self.filter(Filter::within_area(field, coords)?))
    }

    /// Restrict to a circle around `(lat, lon)`
    pub fn within_radius(
        self,
        field: impl Into<String>,
        lat: f64,
        lon: f64,
        radius_km: f64,
    ) -> CfResult<Self> {
        Ok(self.filter(Filter::within_radius(field, lat, lon, radius_km)?))
    }

    /// Restrict assets to a mime type group; replaces an earlier restriction
    pub fn mime_type_is(mut self, restriction: MimeTypeRestriction) -> Self {
        self.query.filters.remove_operator(FilterOperator::MimeTypeGroup);
        self.filter(Filter::mime_type(restriction))
    }

    // Sort, pagination and projection

    /// Replace the sort order
    pub fn order_by(mut self, sorts: SortOrder) -> CfResult<Self> {
        sorts.validate()?;
        self.query.sorts = sorts;
        Ok(self)
    }

    /// Page size, between 1 and 1000
    pub fn limit(mut self, limit: i64) -> CfResult<Self> {
        if limit <= 0 {
            return Err(CfError::validation(params::LIMIT, "must be greater than 0"));
        }
        if limit > MAX_LIMIT {
            return Err(CfError::validation(
                params::LIMIT,
                format!("must be at most {}", MAX_LIMIT),
            ));
        }
        self.query.limit = Some(limit);
        Ok(self)
    }

    /// Number of items to skip
    pub fn skip(mut self, skip: i64) -> CfResult<Self> {
        if skip < 0 {
            return Err(CfError::validation(params::SKIP, "must not be negative"));
        }
        self.query.skip = skip;
        Ok(self)
    }

    /// Link levels to resolve, between 0 and 10
    pub fn include(mut self, levels: i64) -> CfResult<Self> {
        if !(0..=MAX_INCLUDE).contains(&levels) {
            return Err(CfError::validation(
                params::INCLUDE,
                format!("must be between 0 and {}", MAX_INCLUDE),
            ));
        }
        self.query.include = Some(levels);
        Ok(self)
    }

    /// Locale code, or `*` for all locales
    pub fn locale_is(mut self, locale: impl Into<String>) -> Self {
        self.query.locale = Some(locale.into());
        self
    }

    /// Only return the given paths (`sys`, `sys.id`, `fields.name`, ...)
    pub fn select<I, S>(mut self, paths: I) -> CfResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let paths: Vec<String> = paths.into_iter().map(Into::into).collect();
        if paths.is_empty() {
            return Err(CfError::validation(params::SELECT, "requires at least one path"));
        }
        if paths.len() > MAX_SELECT {
            return Err(CfError::validation(
                params::SELECT,
                format!("accepts at most {} paths", MAX_SELECT),
            ));
        }
        for path in &paths {
            validate_field_path(path)?;
            let allowed = ["sys", "fields", "metadata"]
                .iter()
                .any(|root| path == root || path.starts_with(&format!("{}.", root)));
            if !allowed {
                return Err(CfError::validation(
                    params::SELECT,
                    format!("'{}' must start with sys, fields or metadata", path),
                ));
            }
        }
        self.query.select = paths;
        Ok(self)
    }

    /// Entries that link to the given entry
    pub fn links_to_entry(mut self, entry_id: impl Into<String>) -> Self {
        self.query.links_to_entry = Some(entry_id.into());
        self
    }

    /// Entries that link to the given asset
    pub fn links_to_asset(mut self, asset_id: impl Into<String>) -> Self {
        self.query.links_to_asset = Some(asset_id.into());
        self
    }

    /// Inspect the accumulated state
    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn to_query_string(&self) -> String {
        self.query.to_query_string()
    }

    /// Build the query
    pub fn build(self) -> Query {
        self.query
    }
}

impl From<Query> for QueryBuilder {
    fn from(query: Query) -> Self {
        Self { query }
    }
}
