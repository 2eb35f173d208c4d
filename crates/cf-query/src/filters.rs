//! Query Filters
//!
//! A filter is a single predicate on a field path. The operator decides the
//! suffix appended to the path on the wire and the shape of value it takes.

use cf_core::{CfError, CfResult};

use crate::mime::MimeTypeRestriction;

/// Reserved query-string keys
pub mod params {
    pub const CONTENT_TYPE: &str = "content_type";
    pub const ORDER: &str = "order";
    pub const SKIP: &str = "skip";
    pub const LIMIT: &str = "limit";
    pub const INCLUDE: &str = "include";
    pub const LOCALE: &str = "locale";
    pub const QUERY: &str = "query";
    pub const MIMETYPE_GROUP: &str = "mimetype_group";
    pub const SELECT: &str = "select";
    pub const LINKS_TO_ENTRY: &str = "links_to_entry";
    pub const LINKS_TO_ASSET: &str = "links_to_asset";

    /// Keys that configure the query rather than filter on a field
    pub const NON_FILTER: &[&str] = &[
        CONTENT_TYPE,
        ORDER,
        SKIP,
        LIMIT,
        INCLUDE,
        LOCALE,
        SELECT,
        LINKS_TO_ENTRY,
        LINKS_TO_ASSET,
    ];

    /// True for any key the query string reserves, filter or not
    pub fn is_reserved(key: &str) -> bool {
        key == QUERY || key == MIMETYPE_GROUP || NON_FILTER.contains(&key)
    }
}

/// Filter operators that can be applied to a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    /// Equals (no suffix)
    Equals,
    /// Not equals `[ne]`
    NotEquals,
    /// Any of the values `[in]`
    In,
    /// None of the values `[nin]`
    NotIn,
    /// All of the values `[all]`
    All,
    /// Field present or absent `[exists]`
    Exists,
    /// Free text match on one field `[match]`
    Match,
    /// Less than `[lt]`
    LessThan,
    /// Less than or equal `[lte]`
    LessThanOrEqual,
    /// Greater than `[gt]`
    GreaterThan,
    /// Greater than or equal `[gte]`
    GreaterThanOrEqual,
    /// Full text search across all fields (`query` parameter)
    FullText,
    /// Ordered by distance to a point `[near]`
    Near,
    /// Inside a bounding box or circle `[within]`
    Within,
    /// Asset mime type group (`mimetype_group` parameter)
    MimeTypeGroup,
}

/// Value shape an operator expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly one string
    Scalar,
    /// A boolean
    Flag,
    /// A non-empty list of strings
    List,
    /// A fixed number of coordinates; any of the listed counts is accepted
    Coordinates(&'static [usize]),
}

impl FilterOperator {
    const ALL: [FilterOperator; 15] = [
        Self::Equals,
        Self::NotEquals,
        Self::In,
        Self::NotIn,
        Self::All,
        Self::Exists,
        Self::Match,
        Self::LessThan,
        Self::LessThanOrEqual,
        Self::GreaterThan,
        Self::GreaterThanOrEqual,
        Self::FullText,
        Self::Near,
        Self::Within,
        Self::MimeTypeGroup,
    ];

    /// Suffix appended to the field path, including the brackets
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Equals | Self::FullText | Self::MimeTypeGroup => "",
            Self::NotEquals => "[ne]",
            Self::In => "[in]",
            Self::NotIn => "[nin]",
            Self::All => "[all]",
            Self::Exists => "[exists]",
            Self::Match => "[match]",
            Self::LessThan => "[lt]",
            Self::LessThanOrEqual => "[lte]",
            Self::GreaterThan => "[gt]",
            Self::GreaterThanOrEqual => "[gte]",
            Self::Near => "[near]",
            Self::Within => "[within]",
        }
    }

    /// Parse an operator from its bracketed suffix
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        if suffix.is_empty() {
            return Some(Self::Equals);
        }
        Self::ALL
            .iter()
            .copied()
            .find(|op| !op.suffix().is_empty() && op.suffix() == suffix)
    }

    /// Reserved parameter that replaces the field path entirely
    pub fn reserved_key(&self) -> Option<&'static str> {
        match self {
            Self::FullText => Some(params::QUERY),
            Self::MimeTypeGroup => Some(params::MIMETYPE_GROUP),
            _ => None,
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            Self::In | Self::NotIn | Self::All => Arity::List,
            Self::Exists => Arity::Flag,
            Self::Near => Arity::Coordinates(&[2]),
            Self::Within => Arity::Coordinates(&[3, 4]),
            _ => Arity::Scalar,
        }
    }
}

/// Filter value types
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// Single string value
    Scalar(String),
    /// Boolean value
    Flag(bool),
    /// List of string values
    List(Vec<String>),
    /// Geographic coordinates (and radius, for circles)
    Coordinates(Vec<f64>),
}

impl FilterValue {
    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(values.into_iter().map(Into::into).collect())
    }

    /// Wire components; multi-valued filters are comma-joined on the wire
    pub fn parts(&self) -> Vec<String> {
        match self {
            Self::Scalar(s) => vec![s.clone()],
            Self::Flag(b) => vec![b.to_string()],
            Self::List(values) => values.clone(),
            Self::Coordinates(coords) => coords.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Unencoded wire value
    pub fn to_wire(&self) -> String {
        self.parts().join(",")
    }

    fn shape(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "a single value",
            Self::Flag(_) => "a boolean",
            Self::List(_) => "a list of values",
            Self::Coordinates(_) => "coordinates",
        }
    }
}

/// Check a dotted field path such as `fields.bestFriend.sys.id`
pub fn validate_field_path(field: &str) -> CfResult<()> {
    if field.is_empty() {
        return Err(CfError::validation("field", "can't be blank"));
    }
    if field.starts_with('.') || field.ends_with('.') || field.contains("..") {
        return Err(CfError::validation(
            field,
            "is not a valid field path",
        ));
    }
    if let Some(c) = field
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
    {
        return Err(CfError::validation(
            field,
            format!("contains invalid character '{}'", c),
        ));
    }
    if params::is_reserved(field) {
        return Err(CfError::validation(field, "is a reserved query parameter"));
    }
    Ok(())
}

fn validate_coordinates(field: &str, coords: &[f64]) -> CfResult<()> {
    if coords.iter().any(|c| !c.is_finite()) {
        return Err(CfError::validation(field, "coordinates must be finite numbers"));
    }
    // Points are (lat, lon) pairs; a third value is a circle radius in km.
    for pair in coords.chunks(2) {
        if pair.len() == 2 {
            if !(-90.0..=90.0).contains(&pair[0]) {
                return Err(CfError::validation(field, format!("latitude {} is out of range", pair[0])));
            }
            if !(-180.0..=180.0).contains(&pair[1]) {
                return Err(CfError::validation(field, format!("longitude {} is out of range", pair[1])));
            }
        } else if pair[0] <= 0.0 {
            return Err(CfError::validation(field, "radius must be positive"));
        }
    }
    Ok(())
}

/// A single filter condition
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// The field path being filtered (e.g., "sys.id", "fields.color")
    pub field: String,
    /// The operator to apply
    pub operator: FilterOperator,
    /// The value(s) to filter by
    pub value: FilterValue,
}

impl Filter {
    /// Create a new filter, checking the value against the operator's arity
    pub fn new(
        field: impl Into<String>,
        operator: FilterOperator,
        value: FilterValue,
    ) -> CfResult<Self> {
        let field = field.into();
        match operator.reserved_key() {
            Some(key) if field == key => {}
            Some(key) => {
                return Err(CfError::validation(
                    field,
                    format!("operator {:?} only applies to '{}'", operator, key),
                ))
            }
            None => validate_field_path(&field)?,
        }

        match (operator.arity(), &value) {
            (Arity::Scalar, FilterValue::Scalar(s)) => {
                if s.is_empty() && operator != FilterOperator::Equals {
                    return Err(CfError::validation(field, "requires a non-empty value"));
                }
            }
            (Arity::Flag, FilterValue::Flag(_)) => {}
            (Arity::List, FilterValue::List(values)) => {
                if values.is_empty() {
                    return Err(CfError::validation(field, "requires at least one value"));
                }
                if values.iter().any(|v| v.is_empty() || v.contains(',')) {
                    return Err(CfError::validation(
                        field,
                        "list values must be non-empty and must not contain commas",
                    ));
                }
            }
            (Arity::Coordinates(counts), FilterValue::Coordinates(coords)) => {
                if !counts.contains(&coords.len()) {
                    let expected: Vec<String> = counts.iter().map(|c| c.to_string()).collect();
                    return Err(CfError::validation(
                        field,
                        format!(
                            "expects {} coordinates, got {}",
                            expected.join(" or "),
                            coords.len()
                        ),
                    ));
                }
                validate_coordinates(&field, coords)?;
            }
            (_, other) => {
                return Err(CfError::validation(
                    field,
                    format!("operator {:?} does not accept {}", operator, other.shape()),
                ));
            }
        }

        Ok(Self {
            field,
            operator,
            value,
        })
    }

    /// Create an equals filter
    pub fn equals(field: impl Into<String>, value: impl Into<String>) -> CfResult<Self> {
        Self::new(field, FilterOperator::Equals, FilterValue::Scalar(value.into()))
    }

    /// Create a not equals filter
    pub fn not_equals(field: impl Into<String>, value: impl Into<String>) -> CfResult<Self> {
        Self::new(field, FilterOperator::NotEquals, FilterValue::Scalar(value.into()))
    }

    /// Create an includes filter (any of)
    pub fn includes<I, S>(field: impl Into<String>, values: I) -> CfResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(field, FilterOperator::In, FilterValue::list(values))
    }

    /// Create an excludes filter (none of)
    pub fn excludes<I, S>(field: impl Into<String>, values: I) -> CfResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(field, FilterOperator::NotIn, FilterValue::list(values))
    }

    /// Create an includes-all filter, for array fields
    pub fn includes_all<I, S>(field: impl Into<String>, values: I) -> CfResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(field, FilterOperator::All, FilterValue::list(values))
    }

    /// Create an exists filter
    pub fn exists(field: impl Into<String>, must_exist: bool) -> CfResult<Self> {
        Self::new(field, FilterOperator::Exists, FilterValue::Flag(must_exist))
    }

    /// Create a match filter
    pub fn matches(field: impl Into<String>, text: impl Into<String>) -> CfResult<Self> {
        Self::new(field, FilterOperator::Match, FilterValue::Scalar(text.into()))
    }

    pub fn less_than(field: impl Into<String>, value: impl Into<String>) -> CfResult<Self> {
        Self::new(field, FilterOperator::LessThan, FilterValue::Scalar(value.into()))
    }

    pub fn less_than_or_equal(field: impl Into<String>, value: impl Into<String>) -> CfResult<Self> {
        Self::new(field, FilterOperator::LessThanOrEqual, FilterValue::Scalar(value.into()))
    }

    pub fn greater_than(field: impl Into<String>, value: impl Into<String>) -> CfResult<Self> {
        Self::new(field, FilterOperator::GreaterThan, FilterValue::Scalar(value.into()))
    }

    pub fn greater_than_or_equal(
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> CfResult<Self> {
        Self::new(
            field,
            FilterOperator::GreaterThanOrEqual,
            FilterValue::Scalar(value.into()),
        )
    }

    /// Inclusive range; expands to a `[gte]` and a `[lte]` filter
    pub fn range<S: AsRef<str>>(field: impl Into<String>, bounds: &[S]) -> CfResult<[Self; 2]> {
        let field = field.into();
        match bounds {
            [lower, upper] => Ok([
                Self::greater_than_or_equal(field.clone(), lower.as_ref())?,
                Self::less_than_or_equal(field, upper.as_ref())?,
            ]),
            _ => Err(CfError::validation(
                field,
                format!("range expects exactly 2 bounds, got {}", bounds.len()),
            )),
        }
    }

    /// Full text search across all fields
    pub fn full_text(term: impl Into<String>) -> CfResult<Self> {
        Self::new(params::QUERY, FilterOperator::FullText, FilterValue::Scalar(term.into()))
    }

    /// Proximity search; `coords` is `[lat, lon]`
    pub fn near(field: impl Into<String>, coords: &[f64]) -> CfResult<Self> {
        Self::new(field, FilterOperator::Near, FilterValue::Coordinates(coords.to_vec()))
    }

    /// Bounding box search; `coords` is `[lat1, lon1, lat2, lon2]` for the
    /// top-left and bottom-right corners
    pub fn within_area(field: impl Into<String>, coords: &[f64]) -> CfResult<Self> {
        let field = field.into();
        if coords.len() != 4 {
            return Err(CfError::validation(
                field,
                format!("area expects 4 coordinates, got {}", coords.len()),
            ));
        }
        Self::new(field, FilterOperator::Within, FilterValue::Coordinates(coords.to_vec()))
    }

    /// Circle search around a point, radius in kilometers
    pub fn within_radius(
        field: impl Into<String>,
        lat: f64,
        lon: f64,
        radius_km: f64,
    ) -> CfResult<Self> {
        Self::new(
            field,
            FilterOperator::Within,
            FilterValue::Coordinates(vec![lat, lon, radius_km]),
        )
    }

    /// Restrict assets to a mime type group
    pub fn mime_type(restriction: MimeTypeRestriction) -> Self {
        Self {
            field: params::MIMETYPE_GROUP.to_string(),
            operator: FilterOperator::MimeTypeGroup,
            value: FilterValue::Scalar(restriction.as_str().to_string()),
        }
    }

    /// Query-string key for this filter
    pub fn key(&self) -> String {
        match self.operator.reserved_key() {
            Some(key) => key.to_string(),
            None => format!("{}{}", self.field, self.operator.suffix()),
        }
    }

    /// Unencoded `(key, value)` pair
    pub fn to_pair(&self) -> (String, String) {
        (self.key(), self.value.to_wire())
    }

    /// Parse a decoded query-string pair back into a filter.
    ///
    /// Returns `Ok(None)` for reserved keys that are not filters
    /// (`limit`, `order`, ...).
    pub fn from_pair(key: &str, value: &str) -> CfResult<Option<Self>> {
        if params::NON_FILTER.contains(&key) {
            return Ok(None);
        }
        if key == params::QUERY {
            return Self::full_text(value).map(Some);
        }
        if key == params::MIMETYPE_GROUP {
            let restriction = MimeTypeRestriction::from_str(value).ok_or_else(|| {
                CfError::validation(key, format!("unknown mime type group '{}'", value))
            })?;
            return Ok(Some(Self::mime_type(restriction)));
        }

        let (field, operator) = match key.find('[') {
            Some(idx) if key.ends_with(']') => {
                let operator = FilterOperator::from_suffix(&key[idx..]).ok_or_else(|| {
                    CfError::validation(key, format!("unknown operator '{}'", &key[idx..]))
                })?;
                (&key[..idx], operator)
            }
            _ => (key, FilterOperator::Equals),
        };

        let value = match operator.arity() {
            Arity::Scalar => FilterValue::Scalar(value.to_string()),
            Arity::Flag => match value {
                "true" => FilterValue::Flag(true),
                "false" => FilterValue::Flag(false),
                other => {
                    return Err(CfError::validation(
                        key,
                        format!("expects true or false, got '{}'", other),
                    ))
                }
            },
            Arity::List => FilterValue::list(value.split(',')),
            Arity::Coordinates(_) => {
                let coords = value
                    .split(',')
                    .map(|c| c.trim().parse::<f64>())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|_| CfError::validation(key, format!("invalid coordinates '{}'", value)))?;
                FilterValue::Coordinates(coords)
            }
        };

        Self::new(field, operator, value).map(Some)
    }
}

/// Filter set - a collection of filters with AND semantics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    filters: Vec<Filter>,
}

impl FilterSet {
    /// Create a new empty filter set
    pub fn new() -> Self {
        Self { filters: vec![] }
    }

    /// Add a filter to the set
    pub fn add(&mut self, filter: Filter) -> &mut Self {
        self.filters.push(filter);
        self
    }

    /// Get all filters, in insertion order
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Remove filters using a given operator
    pub fn remove_operator(&mut self, operator: FilterOperator) {
        self.filters.retain(|f| f.operator != operator);
    }

    /// Same filters regardless of insertion order
    pub fn equivalent(&self, other: &FilterSet) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let mut remaining: Vec<&Filter> = other.filters.iter().collect();
        for filter in &self.filters {
            match remaining.iter().position(|f| *f == filter) {
                Some(idx) => {
                    remaining.swap_remove(idx);
                }
                None => return false,
            }
        }
        true
    }
}
