//! Query Model
//!
//! The accumulated state of a search: content type, filters, sort order,
//! pagination, include depth, locale and projection. A `Query` serializes to
//! the delivery API's query string and can be parsed back from one.

use url::form_urlencoded;

use cf_core::CfResult;

use crate::builder::QueryBuilder;
use crate::filters::{params, Filter, FilterSet};
use crate::sorts::SortOrder;

/// Largest page the platform will return
pub const MAX_LIMIT: i64 = 1000;
/// Deepest link resolution the platform supports
pub const MAX_INCLUDE: i64 = 10;
/// Include depth the platform applies when none is requested
pub const DEFAULT_INCLUDE: i64 = 1;
/// Most paths a single `select` may name
pub const MAX_SELECT: usize = 100;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// At most one content type constraint
    pub content_type: Option<String>,
    /// Conjunctive filters, in insertion order
    pub filters: FilterSet,
    pub sorts: SortOrder,
    /// `None` leaves the page size to the server
    pub limit: Option<i64>,
    pub skip: i64,
    /// `None` leaves the include depth to the server
    pub include: Option<i64>,
    /// `None` means the space's default locale
    pub locale: Option<String>,
    /// Field projection
    pub select: Vec<String>,
    pub links_to_entry: Option<String>,
    pub links_to_asset: Option<String>,
}

fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Encode each component separately so the joining commas stay literal
fn encode_parts<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(|p| encode(p.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link depth the response will be resolved to
    pub fn include_depth(&self) -> i64 {
        self.include.unwrap_or(DEFAULT_INCLUDE)
    }

    /// Ordered `(key, encoded value)` pairs; unset parameters are omitted
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();

        if let Some(content_type) = &self.content_type {
            pairs.push((params::CONTENT_TYPE.to_string(), encode(content_type)));
        }
        for filter in self.filters.filters() {
            pairs.push((filter.key(), encode_parts(&filter.value.parts())));
        }
        if !self.sorts.is_empty() {
            let parts: Vec<String> = self.sorts.criteria().iter().map(|c| c.to_wire()).collect();
            pairs.push((params::ORDER.to_string(), encode_parts(&parts)));
        }
        if self.skip > 0 {
            pairs.push((params::SKIP.to_string(), self.skip.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push((params::LIMIT.to_string(), limit.to_string()));
        }
        if let Some(include) = self.include {
            pairs.push((params::INCLUDE.to_string(), include.to_string()));
        }
        if let Some(locale) = &self.locale {
            pairs.push((params::LOCALE.to_string(), encode(locale)));
        }
        if !self.select.is_empty() {
            pairs.push((params::SELECT.to_string(), encode_parts(&self.select)));
        }
        if let Some(id) = &self.links_to_entry {
            pairs.push((params::LINKS_TO_ENTRY.to_string(), encode(id)));
        }
        if let Some(id) = &self.links_to_asset {
            pairs.push((params::LINKS_TO_ASSET.to_string(), encode(id)));
        }

        pairs
    }

    /// `&`-joined query string, without a leading `?`
    pub fn to_query_string(&self) -> String {
        self.to_pairs()
            .into_iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Parse a query string (with or without a leading `?`).
    ///
    /// Every parameter goes through the same validation as the builder, so
    /// a string this crate would refuse to produce is refused here too.
    /// Repeated `order` keys are concatenated in order of appearance.
    pub fn parse(query_string: &str) -> CfResult<Query> {
        let query_string = query_string.strip_prefix('?').unwrap_or(query_string);
        let mut builder = QueryBuilder::new();
        let mut sorts = SortOrder::new();

        for (key, value) in form_urlencoded::parse(query_string.as_bytes()) {
            let (key, value) = (key.as_ref(), value.as_ref());
            builder = match key {
                params::CONTENT_TYPE => builder.content_type_is(value),
                params::ORDER => {
                    sorts.extend(SortOrder::parse(value)?);
                    builder
                }
                params::SKIP => builder.skip(parse_int(key, value)?)?,
                params::LIMIT => builder.limit(parse_int(key, value)?)?,
                params::INCLUDE => builder.include(parse_int(key, value)?)?,
                params::LOCALE => builder.locale_is(value),
                params::SELECT => builder.select(value.split(',').map(str::trim))?,
                params::LINKS_TO_ENTRY => builder.links_to_entry(value),
                params::LINKS_TO_ASSET => builder.links_to_asset(value),
                _ => match Filter::from_pair(key, value)? {
                    Some(filter) => builder.filter(filter),
                    None => builder,
                },
            };
        }

        if !sorts.is_empty() {
            builder = builder.order_by(sorts)?;
        }
        Ok(builder.build())
    }

    /// Same parameters, ignoring filter insertion order
    pub fn equivalent(&self, other: &Query) -> bool {
        self.filters.equivalent(&other.filters)
            && self.content_type == other.content_type
            && self.sorts == other.sorts
            && self.limit == other.limit
            && self.skip == other.skip
            && self.include == other.include
            && self.locale == other.locale
            && self.select == other.select
            && self.links_to_entry == other.links_to_entry
            && self.links_to_asset == other.links_to_asset
    }
}

fn parse_int(key: &str, value: &str) -> CfResult<i64> {
    value
        .trim()
        .parse()
        .map_err(|_| cf_core::CfError::validation(key, format!("is not a number: '{}'", value)))
}
