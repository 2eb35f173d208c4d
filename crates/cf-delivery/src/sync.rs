//! Synchronization
//!
//! An initial sync returns every published entry and asset (optionally of
//! one kind or content type). Each response ends with either a
//! `nextPageUrl`, when more items are waiting, or a `nextSyncUrl` to fetch
//! the changes made since. Both urls carry the `sync_token` for the next
//! request.

use serde_json::Value;
use url::Url;

use cf_core::{CfError, CfResult, SystemProperties};

use crate::model::{Asset, Entry};

pub const SYNC_TOKEN: &str = "sync_token";

/// Which objects an initial sync covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncType {
    #[default]
    All,
    Asset,
    Entry,
    Deletion,
    DeletedAsset,
    DeletedEntry,
}

impl SyncType {
    /// Value of the `type` parameter; `None` for everything
    pub fn wire(&self) -> Option<&'static str> {
        match self {
            Self::All => None,
            Self::Asset => Some("Asset"),
            Self::Entry => Some("Entry"),
            Self::Deletion => Some("Deletion"),
            Self::DeletedAsset => Some("DeletedAsset"),
            Self::DeletedEntry => Some("DeletedEntry"),
        }
    }
}

/// One page of sync results
#[derive(Debug, Clone, Default)]
pub struct SyncResult {
    pub entries: Vec<Entry>,
    pub assets: Vec<Asset>,
    pub deleted_entries: Vec<SystemProperties>,
    pub deleted_assets: Vec<SystemProperties>,
    /// Set when the sync has more pages
    pub next_page_url: Option<String>,
    /// Set on the last page; fetch it later for the changes since
    pub next_sync_url: Option<String>,
}

impl SyncResult {
    pub fn from_payload(payload: &Value) -> CfResult<Self> {
        let items = payload
            .get("items")
            .and_then(Value::as_array)
            .ok_or_else(|| CfError::malformed("sync response has no items array"))?;

        let url = |key: &str| payload.get(key).and_then(Value::as_str).map(str::to_string);
        let mut result = SyncResult {
            next_page_url: url("nextPageUrl"),
            next_sync_url: url("nextSyncUrl"),
            ..Default::default()
        };
        if result.next_page_url.is_some() == result.next_sync_url.is_some() {
            return Err(CfError::malformed(
                "sync response needs exactly one of nextPageUrl and nextSyncUrl",
            ));
        }

        for item in items {
            let kind = item
                .pointer("/sys/type")
                .and_then(Value::as_str)
                .ok_or_else(|| CfError::malformed("sync item has no sys.type"))?;
            match kind {
                "Entry" => result.entries.push(Entry::from_json(item)?),
                "Asset" => result.assets.push(Asset::from_json(item)?),
                "DeletedEntry" => result.deleted_entries.push(deletion(item)?),
                "DeletedAsset" => result.deleted_assets.push(deletion(item)?),
                other => {
                    return Err(CfError::malformed(format!("unexpected sync item type '{}'", other)))
                }
            }
        }
        Ok(result)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
            && self.assets.is_empty()
            && self.deleted_entries.is_empty()
            && self.deleted_assets.is_empty()
    }

    pub fn has_more(&self) -> bool {
        self.next_page_url.is_some()
    }

    /// The url to continue from, whichever of the two the server sent
    pub fn next_url(&self) -> Option<&str> {
        self.next_page_url.as_deref().or(self.next_sync_url.as_deref())
    }
}

fn deletion(item: &Value) -> CfResult<SystemProperties> {
    let sys = item.get("sys").cloned().unwrap_or(Value::Null);
    serde_json::from_value(sys).map_err(|e| CfError::malformed(format!("invalid deletion: {}", e)))
}

/// Pull the `sync_token` out of a `nextSyncUrl` or `nextPageUrl`
pub fn sync_token(next_url: &str) -> CfResult<String> {
    let url = Url::parse(next_url)
        .map_err(|e| CfError::validation("next_url", format!("is not a url: {}", e)))?;
    url.query_pairs()
        .find(|(key, _)| key == SYNC_TOKEN)
        .map(|(_, token)| token.into_owned())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| CfError::validation("next_url", "has no sync_token"))
}
