//! Query Sort Orders
//!
//! Sort orders define how results are ordered. The first criterion has the
//! highest precedence; later ones only break ties.
//!
//! On the wire the whole order is one `order` parameter with comma-joined
//! field paths, descending ones prefixed with `-`.

use cf_core::CfResult;

use crate::filters::validate_field_path;

/// Direction of one sort key; the wire form marks descending with `-`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// One field path and its direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortCriterion {
    /// Dotted path, e.g. `fields.name`
    pub field: String,
    pub direction: SortDirection,
}

impl SortCriterion {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Desc)
    }

    /// `sys.createdAt` or `-sys.createdAt`
    pub fn to_wire(&self) -> String {
        match self.direction {
            SortDirection::Asc => self.field.clone(),
            SortDirection::Desc => format!("-{}", self.field),
        }
    }

    pub fn from_wire(s: &str) -> Self {
        match s.strip_prefix('-') {
            Some(field) => Self::desc(field),
            None => Self::asc(s),
        }
    }
}

/// Ordered sort keys; earlier keys take precedence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortOrder {
    criteria: Vec<SortCriterion>,
}

impl SortOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Order on one field
    pub fn by(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            criteria: vec![SortCriterion::new(field, direction)],
        }
    }

    pub fn by_asc(field: impl Into<String>) -> Self {
        Self::by(field, SortDirection::Asc)
    }

    pub fn by_desc(field: impl Into<String>) -> Self {
        Self::by(field, SortDirection::Desc)
    }

    /// Append a tie breaker
    pub fn then(mut self, criterion: SortCriterion) -> Self {
        self.criteria.push(criterion);
        self
    }

    pub fn then_asc(self, field: impl Into<String>) -> Self {
        self.then(SortCriterion::asc(field))
    }

    pub fn then_desc(self, field: impl Into<String>) -> Self {
        self.then(SortCriterion::desc(field))
    }

    pub fn criteria(&self) -> &[SortCriterion] {
        &self.criteria
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    /// Check every criterion names a valid field path
    pub fn validate(&self) -> CfResult<()> {
        self.criteria
            .iter()
            .try_for_each(|c| validate_field_path(&c.field))
    }

    /// Value of the `order` parameter, `None` when unsorted
    pub fn to_wire(&self) -> Option<String> {
        if self.criteria.is_empty() {
            return None;
        }
        Some(
            self.criteria
                .iter()
                .map(SortCriterion::to_wire)
                .collect::<Vec<_>>()
                .join(","),
        )
    }

    /// Parse an `order` value, e.g. `-sys.createdAt,fields.name`
    pub fn parse(order: &str) -> CfResult<Self> {
        let sort = Self {
            criteria: order
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(SortCriterion::from_wire)
                .collect(),
        };
        sort.validate()?;
        Ok(sort)
    }

    /// Append all criteria of another order (repeated `order` keys)
    pub fn extend(&mut self, other: SortOrder) {
        self.criteria.extend(other.criteria);
    }
}
