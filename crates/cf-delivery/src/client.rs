//! Delivery Client
//!
//! Issues queries for one space and environment through a [`Transport`] and
//! hands back resolved pages, space metadata and sync results.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, instrument};
use url::form_urlencoded;

use cf_core::config::ClientOptions;
use cf_core::{CfError, CfResult, Transport};
use cf_query::{Query, QueryBuilder};

use crate::model::{Asset, Entry};
use crate::page::{Page, PageItem};
use crate::space::{ContentType, Space};
use crate::sync::{self, SyncResult, SyncType};

/// Read-only client for the delivery (or preview) API
pub struct DeliveryClient<T: Transport> {
    transport: T,
    options: ClientOptions,
}

impl<T: Transport> DeliveryClient<T> {
    /// Create a client; fails when the options do not validate
    pub fn new(transport: T, options: ClientOptions) -> CfResult<Self> {
        options.validate()?;
        Ok(Self { transport, options })
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Apply client-wide defaults the query does not override
    fn prepare(&self, builder: &QueryBuilder) -> Query {
        let mut query = builder.query().clone();
        if query.locale.is_none() {
            query.locale = self.options.default_locale.clone();
        }
        query
    }

    async fn request(&self, path: &str, query_string: &str) -> CfResult<Value> {
        debug!(path = %path, query = %query_string, "Delivery request");
        self.transport.execute(path, query_string).await
    }

    async fn fetch<I: PageItem>(&self, collection: &str, query: &Query) -> CfResult<Page<I>> {
        let path = format!("{}/{}", self.options.environment_path(), collection);
        let payload = self.request(&path, &query.to_query_string()).await?;
        let page = Page::from_payload(&payload)?;
        debug!(items = page.len(), total = page.total, "Delivery response");
        Ok(page)
    }

    /// Fetch a page of entries with links resolved to the query's include depth
    #[instrument(skip(self, builder))]
    pub async fn get_entries(&self, builder: &QueryBuilder) -> CfResult<Page<Entry>> {
        let query = self.prepare(builder);
        let page: Page<Entry> = self.fetch("entries", &query).await?;
        Ok(page.resolve_links(query.include_depth()))
    }

    /// Fetch entries and deserialize their fields into `U`
    pub async fn get_entries_typed<U: DeserializeOwned>(
        &self,
        builder: &QueryBuilder,
    ) -> CfResult<Page<U>> {
        self.get_entries(builder).await?.into_typed()
    }

    /// Fetch a single entry by id, optionally in one locale
    #[instrument(skip(self))]
    pub async fn get_entry(&self, id: &str, locale: Option<&str>) -> CfResult<Entry> {
        let mut builder = QueryBuilder::new().field_equals("sys.id", id)?;
        if let Some(locale) = locale {
            builder = builder.locale_is(locale);
        }

        self.get_entries(&builder)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CfError::NotFound {
                kind: "Entry",
                id: id.to_string(),
            })
    }

    #[instrument(skip(self, builder))]
    pub async fn get_assets(&self, builder: &QueryBuilder) -> CfResult<Page<Asset>> {
        let query = self.prepare(builder);
        let page: Page<Asset> = self.fetch("assets", &query).await?;
        Ok(page.resolve_links(query.include_depth()))
    }

    #[instrument(skip(self))]
    pub async fn get_asset(&self, id: &str) -> CfResult<Asset> {
        let builder = QueryBuilder::new().field_equals("sys.id", id)?;
        self.get_assets(&builder)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CfError::NotFound {
                kind: "Asset",
                id: id.to_string(),
            })
    }

    /// The space, with its locales
    #[instrument(skip(self))]
    pub async fn get_space(&self) -> CfResult<Space> {
        let path = format!("/spaces/{}", self.options.space_id);
        Space::from_json(&self.request(&path, "").await?)
    }

    #[instrument(skip(self, builder))]
    pub async fn get_content_types(
        &self,
        builder: &QueryBuilder,
    ) -> CfResult<Page<ContentType>> {
        self.fetch("content_types", builder.query()).await
    }

    #[instrument(skip(self))]
    pub async fn get_content_type(&self, id: &str) -> CfResult<ContentType> {
        if id.is_empty() || id.contains('/') {
            return Err(CfError::validation("id", "is not a valid content type id"));
        }
        let path = format!("{}/content_types/{}", self.options.environment_path(), id);
        match self.request(&path, "").await {
            Err(CfError::Transport {
                status: Some(404), ..
            }) => Err(CfError::NotFound {
                kind: "ContentType",
                id: id.to_string(),
            }),
            payload => ContentType::from_json(&payload?),
        }
    }

    /// Start a sync; `content_type` narrows an entry sync to one type
    #[instrument(skip(self))]
    pub async fn sync_initial(
        &self,
        sync_type: SyncType,
        content_type: Option<&str>,
    ) -> CfResult<SyncResult> {
        if content_type.is_some() && sync_type != SyncType::Entry {
            return Err(CfError::validation("content_type", "can only narrow an entry sync"));
        }

        let mut params = form_urlencoded::Serializer::new(String::new());
        params.append_pair("initial", "true");
        if let Some(kind) = sync_type.wire() {
            params.append_pair("type", kind);
        }
        if let Some(content_type) = content_type {
            params.append_pair("content_type", content_type);
        }
        self.sync(&params.finish()).await
    }

    /// Continue from a `nextPageUrl` or `nextSyncUrl`
    #[instrument(skip(self))]
    pub async fn sync_next(&self, next_url: &str) -> CfResult<SyncResult> {
        let token = sync::sync_token(next_url)?;
        let query_string = form_urlencoded::Serializer::new(String::new())
            .append_pair(sync::SYNC_TOKEN, &token)
            .finish();
        self.sync(&query_string).await
    }

    async fn sync(&self, query_string: &str) -> CfResult<SyncResult> {
        let path = format!("{}/sync", self.options.environment_path());
        let result = SyncResult::from_payload(&self.request(&path, query_string).await?)?;
        info!(
            entries = result.entries.len(),
            assets = result.assets.len(),
            deletions = result.deleted_entries.len() + result.deleted_assets.len(),
            more = result.has_more(),
            "Sync page"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldValue;
    use crate::recorded::RecordedTransport;
    use cf_core::Link;
    use cf_query::SortOrder;
    use serde_json::json;

    const ENTRIES: &str = "/spaces/cfexampleapi/environments/master/entries";
    const ASSETS: &str = "/spaces/cfexampleapi/environments/master/assets";
    const CONTENT_TYPES: &str = "/spaces/cfexampleapi/environments/master/content_types";
    const SYNC: &str = "/spaces/cfexampleapi/environments/master/sync";

    fn options() -> ClientOptions {
        ClientOptions::new("cfexampleapi", "b4c0n73n7fu1")
    }

    fn cats_payload() -> serde_json::Value {
        json!({
            "sys": {"type": "Array"},
            "total": 3,
            "skip": 0,
            "limit": 1,
            "items": [{
                "sys": {"id": "nyancat", "type": "Entry"},
                "fields": {
                    "name": "Nyan Cat",
                    "image": {"sys": {"type": "Link", "linkType": "Asset", "id": "nyancat"}}
                }
            }],
            "includes": {
                "Asset": [{
                    "sys": {"id": "nyancat", "type": "Asset"},
                    "fields": {"title": "Nyan Cat", "file": {"url": "//images.example/Nyan_cat.png"}}
                }]
            }
        })
    }

    #[tokio::test]
    async fn test_get_entries_resolves_includes() {
        let builder = QueryBuilder::new()
            .content_type_is("cat")
            .order_by(SortOrder::by_desc("sys.createdAt"))
            .unwrap()
            .limit(1)
            .unwrap();
        let transport = RecordedTransport::new().with_fixture(
            ENTRIES,
            "content_type=cat&order=-sys.createdAt&limit=1",
            cats_payload(),
        );
        let client = DeliveryClient::new(transport, options()).unwrap();

        let page = client.get_entries(&builder).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.next_skip(), Some(1));
        let image = page.items[0].asset_field("image").unwrap();
        assert_eq!(image.title(), Some("Nyan Cat"));
    }

    #[tokio::test]
    async fn test_include_zero_keeps_links() {
        let builder = QueryBuilder::new().include(0).unwrap();
        let transport = RecordedTransport::new().with_fixture(ENTRIES, "include=0", cats_payload());
        let client = DeliveryClient::new(transport, options()).unwrap();

        let page = client.get_entries(&builder).await.unwrap();
        assert_eq!(
            page.items[0].field("image").and_then(FieldValue::as_link),
            Some(&Link::asset("nyancat"))
        );
    }

    #[tokio::test]
    async fn test_default_locale_applied() {
        let mut options = options();
        options.default_locale = Some("tlh".to_string());
        let transport = RecordedTransport::new().with_fixture(ENTRIES, "locale=tlh", cats_payload());
        let client = DeliveryClient::new(transport, options).unwrap();

        assert!(client.get_entries(&QueryBuilder::new()).await.is_ok());

        let explicit = QueryBuilder::new().locale_is("en-US");
        let err = client.get_entries(&explicit).await.unwrap_err();
        assert_eq!(err.error_code(), "transport_error");
        assert_eq!(
            client.transport().requests().await[1],
            (ENTRIES.to_string(), "locale=en-US".to_string())
        );
    }

    #[tokio::test]
    async fn test_get_entry_and_not_found() {
        let transport = RecordedTransport::new()
            .with_fixture(ENTRIES, "sys.id=nyancat&locale=en-US", cats_payload())
            .with_fixture(ENTRIES, "sys.id=garfield", json!({"total": 0, "items": []}));
        let client = DeliveryClient::new(transport, options()).unwrap();

        let entry = client.get_entry("nyancat", Some("en-US")).await.unwrap();
        assert_eq!(entry.str_field("name"), Some("Nyan Cat"));

        match client.get_entry("garfield", None).await {
            Err(CfError::NotFound { kind, id }) => {
                assert_eq!(kind, "Entry");
                assert_eq!(id, "garfield");
            }
            other => panic!("expected not found, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_asset() {
        let transport = RecordedTransport::new().with_fixture(
            ASSETS,
            "sys.id=doge",
            json!({
                "total": 1,
                "items": [{"sys": {"id": "doge", "type": "Asset"}, "fields": {"title": "Doge"}}]
            }),
        );
        let client = DeliveryClient::new(transport, options()).unwrap();

        let asset = client.get_asset("doge").await.unwrap();
        assert_eq!(asset.title(), Some("Doge"));
        assert_eq!(client.get_asset("nope").await.unwrap_err().error_code(), "transport_error");
    }

    #[tokio::test]
    async fn test_typed_entries() {
        #[derive(serde::Deserialize)]
        struct Cat {
            name: String,
        }

        let transport = RecordedTransport::new().with_fixture(ENTRIES, "", cats_payload());
        let client = DeliveryClient::new(transport, options()).unwrap();

        let cats = client.get_entries_typed::<Cat>(&QueryBuilder::new()).await.unwrap();
        assert_eq!(cats.items[0].name, "Nyan Cat");
    }

    #[test]
    fn test_invalid_options_rejected() {
        let result = DeliveryClient::new(RecordedTransport::new(), ClientOptions::default());
        assert!(matches!(result, Err(CfError::Validation(_))));
    }

    #[tokio::test]
    async fn test_get_space() {
        let transport = RecordedTransport::new().with_fixture(
            "/spaces/cfexampleapi",
            "",
            json!({
                "sys": {"type": "Space", "id": "cfexampleapi"},
                "name": "Contentful Example API",
                "locales": [
                    {"code": "en-US", "default": true, "name": "English"},
                    {"code": "tlh", "default": false, "name": "Klingon", "fallbackCode": "en-US"}
                ]
            }),
        );
        let client = DeliveryClient::new(transport, options()).unwrap();

        let space = client.get_space().await.unwrap();
        assert_eq!(space.name, "Contentful Example API");
        assert_eq!(space.sys.id, "cfexampleapi");
        assert_eq!(space.locales.len(), 2);
        assert_eq!(space.default_locale().map(|l| l.code.as_str()), Some("en-US"));
    }

    fn content_type(id: &str, description: &str, fields: &[&str]) -> serde_json::Value {
        let fields: Vec<_> = fields
            .iter()
            .map(|f| json!({"id": f, "name": f, "type": "Symbol"}))
            .collect();
        json!({
            "sys": {"type": "ContentType", "id": id},
            "name": id,
            "description": description,
            "displayField": "name",
            "fields": fields
        })
    }

    #[tokio::test]
    async fn test_get_content_types() {
        let transport = RecordedTransport::new()
            .with_fixture(
                CONTENT_TYPES,
                "",
                json!({
                    "total": 2,
                    "items": [
                        content_type("cat", "Meow.", &["name", "likes", "color", "bestFriend"]),
                        content_type("dog", "Bark!", &["name", "description", "image"])
                    ]
                }),
            )
            .with_fixture(
                &format!("{}/cat", CONTENT_TYPES),
                "",
                content_type("cat", "Meow.", &["name", "likes", "color", "bestFriend"]),
            );
        let client = DeliveryClient::new(transport, options()).unwrap();

        let page = client.get_content_types(&QueryBuilder::new()).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items[1].description.as_deref(), Some("Bark!"));

        let cat = client.get_content_type("cat").await.unwrap();
        assert_eq!(cat.fields.len(), 4);
        assert_eq!(cat.display_field.as_deref(), Some("name"));

        match client.get_content_type("unicorn").await {
            Err(CfError::NotFound { kind, id }) => {
                assert_eq!(kind, "ContentType");
                assert_eq!(id, "unicorn");
            }
            other => panic!("expected not found, got {:?}", other),
        }
        assert!(client.get_content_type("").await.unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn test_sync_initial_and_next() {
        let next = "https://cdn.contentful.com/spaces/cfexampleapi/environments/master/sync\
                    ?sync_token=w5ZGw6JF";
        let doge = |id: &str| {
            json!({"sys": {"type": "Asset", "id": id}, "fields": {"title": {"en-US": id}}})
        };
        let cat = |id: &str| {
            json!({"sys": {"type": "Entry", "id": id}, "fields": {"name": {"en-US": id}}})
        };
        let transport = RecordedTransport::new()
            .with_fixture(
                SYNC,
                "initial=true&type=Asset",
                json!({
                    "items": [doge("doge"), doge("nyancat"), doge("happycat"), doge("jake")],
                    "nextSyncUrl": next
                }),
            )
            .with_fixture(
                SYNC,
                "initial=true&type=Entry&content_type=cat",
                json!({
                    "items": [cat("nyancat"), cat("happycat"), cat("garfield")],
                    "nextSyncUrl": next
                }),
            )
            .with_fixture(SYNC, "sync_token=w5ZGw6JF", json!({"items": [], "nextSyncUrl": next}));
        let client = DeliveryClient::new(transport, options()).unwrap();

        let assets = client.sync_initial(SyncType::Asset, None).await.unwrap();
        assert_eq!(assets.assets.len(), 4);
        assert!(assets.entries.is_empty());

        let cats = client.sync_initial(SyncType::Entry, Some("cat")).await.unwrap();
        assert_eq!(cats.entries.len(), 3);

        let changes = client.sync_next(cats.next_url().unwrap()).await.unwrap();
        assert!(changes.is_empty());
        assert_eq!(changes.next_sync_url.as_deref(), Some(next));
    }

    #[tokio::test]
    async fn test_sync_content_type_needs_entry_sync() {
        let client = DeliveryClient::new(RecordedTransport::new(), options()).unwrap();

        let err = client.sync_initial(SyncType::Asset, Some("cat")).await.unwrap_err();
        assert!(err.is_validation());
        assert!(client.sync_next("https://cdn.contentful.com/sync").await.is_err());
        assert_eq!(client.transport().request_count().await, 0);
    }

    #[tokio::test]
    async fn test_malformed_payload_surfaces() {
        let transport = RecordedTransport::new().with_fixture(ENTRIES, "", json!({"items": []}));
        let client = DeliveryClient::new(transport, options()).unwrap();

        let err = client.get_entries(&QueryBuilder::new()).await.unwrap_err();
        assert_eq!(err.error_code(), "malformed_response");
    }
}
