//! # cf-query
//!
//! Search query layer for Contentful RS.
//!
//! This crate turns typed filter, sort and pagination intents into the
//! delivery API's query-string grammar, and parses such strings back.
//!
//! ## Structure
//!
//! - `filters` - Field predicates and their operator suffixes
//! - `sorts` - Sort criteria and the `order` parameter
//! - `mime` - Asset mime type groups
//! - `query` - The accumulated query state and its wire format
//! - `builder` - Fluent API for constructing queries
//!
//! ## Example
//!
//! ```
//! use cf_query::{QueryBuilder, SortOrder};
//!
//! let query = QueryBuilder::new()
//!     .content_type_is("cat")
//!     .field_equals("fields.color", "rainbow").unwrap()
//!     .order_by(SortOrder::by_desc("sys.createdAt")).unwrap()
//!     .limit(3).unwrap();
//!
//! assert_eq!(
//!     query.to_query_string(),
//!     "content_type=cat&fields.color=rainbow&order=-sys.createdAt&limit=3"
//! );
//! ```

pub mod filters;
pub mod sorts;
pub mod mime;
pub mod query;
pub mod builder;

// Re-exports for convenience
pub use filters::{Filter, FilterOperator, FilterSet, FilterValue};
pub use sorts::{SortCriterion, SortDirection, SortOrder};
pub use mime::MimeTypeRestriction;
pub use query::Query;
pub use builder::QueryBuilder;
