//! # cf-delivery
//!
//! Content Delivery API layer for Contentful RS.
//!
//! - `model` - Entries, assets and the tagged field value tree
//! - `page` - Paginated collection responses and their `includes` side tables
//! - `resolver` - Replaces link placeholders with included entries and assets
//! - `space` - Space, locale and content type metadata
//! - `sync` - Initial and incremental synchronization results
//! - `client` - Delivery client issuing queries through a `Transport`
//! - `recorded` - In-memory transport serving canned payloads

pub mod model;
pub mod page;
pub mod resolver;
pub mod space;
pub mod sync;
pub mod client;
pub mod recorded;

pub use model::{Asset, AssetFile, Entry, FieldValue, Fields};
pub use page::{Page, PageItem, UnresolvedLink};
pub use resolver::LinkResolver;
pub use space::{ContentType, ContentTypeField, Locale, Space};
pub use sync::{SyncResult, SyncType};
pub use client::DeliveryClient;
pub use recorded::RecordedTransport;
