//! Paginated collection responses
//!
//! Payload shape:
//!
//! ```json
//! { "sys": {"type": "Array"}, "total": 10, "skip": 0, "limit": 3,
//!   "items": [...],
//!   "includes": { "Entry": [...], "Asset": [...] },
//!   "errors": [...] }
//! ```

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use cf_core::{CfError, CfResult, Link, LinkType};

use crate::model::{Asset, Entry};
use crate::resolver::LinkResolver;

/// Item types a collection can be parsed into
pub trait PageItem: Sized {
    fn from_json(value: &Value) -> CfResult<Self>;
}

impl PageItem for Entry {
    fn from_json(value: &Value) -> CfResult<Self> {
        Entry::from_json(value)
    }
}

impl PageItem for Asset {
    fn from_json(value: &Value) -> CfResult<Self> {
        Asset::from_json(value)
    }
}

/// A link the server reported as not resolvable (deleted or unpublished target)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedLink {
    pub link: Link,
    pub error_id: String,
}

/// One page of a collection plus the linked objects the server included
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// Items in server order
    pub items: Vec<T>,
    pub total: i64,
    pub skip: i64,
    pub limit: i64,
    pub linked_entries: HashMap<String, Entry>,
    pub linked_assets: HashMap<String, Asset>,
    pub errors: Vec<UnresolvedLink>,
}

fn read_int(payload: &Value, key: &str) -> CfResult<Option<i64>> {
    match payload.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| CfError::malformed(format!("'{}' must be an integer", key))),
    }
}

fn read_includes<T: PageItem>(
    includes: Option<&Value>,
    kind: &str,
    id_of: impl Fn(&T) -> String,
) -> CfResult<HashMap<String, T>> {
    let Some(list) = includes.and_then(|inc| inc.get(kind)) else {
        return Ok(HashMap::new());
    };
    let list = list
        .as_array()
        .ok_or_else(|| CfError::malformed(format!("includes.{} must be an array", kind)))?;
    list.iter()
        .map(|raw| T::from_json(raw).map(|item| (id_of(&item), item)))
        .collect()
}

fn read_errors(payload: &Value) -> Vec<UnresolvedLink> {
    let Some(errors) = payload.get("errors").and_then(Value::as_array) else {
        return Vec::new();
    };
    errors
        .iter()
        .filter_map(|error| {
            let error_id = error.pointer("/sys/id")?.as_str()?.to_string();
            let details = error.get("details")?;
            let link_type = LinkType::from_str(details.get("linkType")?.as_str()?)?;
            let id = details.get("id")?.as_str()?;
            Some(UnresolvedLink {
                link: Link::new(link_type, id),
                error_id,
            })
        })
        .collect()
}

impl<T: PageItem> Page<T> {
    /// Parse a raw collection payload.
    ///
    /// Fails when `items` is absent, when `total` is missing, when any count
    /// is negative, or when the counts contradict each other.
    pub fn from_payload(payload: &Value) -> CfResult<Self> {
        let raw_items = payload
            .get("items")
            .ok_or_else(|| CfError::malformed("response has no items"))?
            .as_array()
            .ok_or_else(|| CfError::malformed("items must be an array"))?;

        let total = read_int(payload, "total")?
            .ok_or_else(|| CfError::malformed("response has no total"))?;
        let skip = read_int(payload, "skip")?.unwrap_or(0);
        let limit = read_int(payload, "limit")?.unwrap_or(raw_items.len() as i64);
        for (key, count) in [("total", total), ("skip", skip), ("limit", limit)] {
            if count < 0 {
                return Err(CfError::malformed(format!(
                    "{} must not be negative, got {}",
                    key, count
                )));
            }
        }

        let items = raw_items
            .iter()
            .map(T::from_json)
            .collect::<CfResult<Vec<_>>>()?;

        if items.len() as i64 > total {
            return Err(CfError::malformed(format!(
                "{} items exceed total of {}",
                items.len(),
                total
            )));
        }
        if items.len() as i64 > limit {
            return Err(CfError::malformed(format!(
                "{} items exceed limit of {}",
                items.len(),
                limit
            )));
        }

        let includes = payload.get("includes");
        let linked_entries = read_includes::<Entry>(includes, "Entry", |e| e.sys.id.clone())?;
        let linked_assets = read_includes::<Asset>(includes, "Asset", |a| a.sys.id.clone())?;

        Ok(Self {
            items,
            total,
            skip,
            limit,
            linked_entries,
            linked_assets,
            errors: read_errors(payload),
        })
    }
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    /// Skip value for the following page, `None` on the last page
    pub fn next_skip(&self) -> Option<i64> {
        let next = self.skip + self.items.len() as i64;
        if !self.items.is_empty() && next < self.total {
            Some(next)
        } else {
            None
        }
    }

    pub fn has_more(&self) -> bool {
        self.next_skip().is_some()
    }

    /// Resolver over this page's side tables
    pub fn resolver(&self, include_depth: i64) -> LinkResolver<'_> {
        LinkResolver::new(&self.linked_entries, &self.linked_assets, include_depth)
    }

    /// Transform items, keeping pagination and side tables
    pub fn map_items<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            skip: self.skip,
            limit: self.limit,
            linked_entries: self.linked_entries,
            linked_assets: self.linked_assets,
            errors: self.errors,
        }
    }

    pub fn try_map_items<U>(self, f: impl FnMut(T) -> CfResult<U>) -> CfResult<Page<U>> {
        let items = self.items.into_iter().map(f).collect::<CfResult<Vec<_>>>()?;
        Ok(Page {
            items,
            total: self.total,
            skip: self.skip,
            limit: self.limit,
            linked_entries: self.linked_entries,
            linked_assets: self.linked_assets,
            errors: self.errors,
        })
    }
}

impl Page<Entry> {
    /// Replace link placeholders in every item, up to `include_depth` hops
    pub fn resolve_links(mut self, include_depth: i64) -> Self {
        let items: Vec<_> = {
            let resolver = self.resolver(include_depth);
            self.items.iter().map(|e| resolver.resolve_entry(e)).collect()
        };
        self.items = items;
        self
    }

    /// Deserialize every entry's fields into `U`
    pub fn into_typed<U: DeserializeOwned>(self) -> CfResult<Page<U>> {
        self.try_map_items(|entry| entry.deserialize_fields())
    }
}

impl Page<Asset> {
    pub fn resolve_links(mut self, include_depth: i64) -> Self {
        let items: Vec<_> = {
            let resolver = self.resolver(include_depth);
            self.items.iter().map(|a| resolver.resolve_asset(a)).collect()
        };
        self.items = items;
        self
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cat(id: &str) -> Value {
        json!({
            "sys": {"id": id, "type": "Entry"},
            "fields": {"name": id}
        })
    }

    #[test]
    fn test_page_counts() {
        let payload = json!({
            "sys": {"type": "Array"},
            "total": 10,
            "skip": 0,
            "limit": 3,
            "items": [cat("nyancat"), cat("happycat"), cat("garfield")]
        });

        let page = Page::<Entry>::from_payload(&payload).unwrap();
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.total, 10);
        assert_eq!(page.limit, 3);
        assert_eq!(page.next_skip(), Some(3));
        assert!(page.has_more());
    }

    #[test]
    fn test_items_keep_server_order() {
        let payload = json!({
            "total": 3,
            "items": [cat("b"), cat("a"), cat("c")]
        });
        let page = Page::<Entry>::from_payload(&payload).unwrap();
        let ids: Vec<&str> = page.iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert_eq!(page.skip, 0);
        assert_eq!(page.limit, 3);
        assert_eq!(page.next_skip(), None);
    }

    #[test]
    fn test_malformed_payloads() {
        let cases = vec![
            json!({"total": 1}),
            json!({"items": {}, "total": 1}),
            json!({"items": []}),
            json!({"items": [], "total": -1}),
            json!({"items": [], "total": "ten"}),
            json!({"items": [cat("a"), cat("b")], "total": 1}),
            json!({"items": [cat("a"), cat("b")], "total": 5, "limit": 1}),
            json!({"items": [cat("a")], "total": 5, "limit": 0}),
            json!({"items": [], "total": 5, "skip": -1}),
            json!({"items": [], "total": 5, "limit": -3}),
            json!({"items": [{"fields": {}}], "total": 1}),
            json!({"items": [], "total": 0, "includes": {"Entry": {}}}),
        ];

        for payload in cases {
            let err = Page::<Entry>::from_payload(&payload).unwrap_err();
            assert_eq!(err.error_code(), "malformed_response", "payload: {}", payload);
        }
    }

    #[test]
    fn test_empty_page_with_zero_limit() {
        let payload = json!({"total": 7, "skip": 0, "limit": 0, "items": []});
        let page = Page::<Entry>::from_payload(&payload).unwrap();
        assert!(page.is_empty());
        assert_eq!(page.total, 7);
        assert!(!page.has_more());
    }

    #[test]
    fn test_includes_side_tables() {
        let payload = json!({
            "total": 1,
            "items": [cat("nyancat")],
            "includes": {
                "Entry": [cat("happycat")],
                "Asset": [{"sys": {"id": "doge", "type": "Asset"}, "fields": {"title": "Doge"}}]
            },
            "errors": [{
                "sys": {"id": "notResolvable", "type": "error"},
                "details": {"type": "Link", "linkType": "Entry", "id": "garfield"}
            }]
        });

        let page = Page::<Entry>::from_payload(&payload).unwrap();
        assert!(page.linked_entries.contains_key("happycat"));
        assert_eq!(page.linked_assets.get("doge").and_then(|a| a.title()), Some("Doge"));
        assert_eq!(
            page.errors,
            vec![UnresolvedLink {
                link: Link::entry("garfield"),
                error_id: "notResolvable".to_string()
            }]
        );
    }

    #[test]
    fn test_into_typed() {
        #[derive(serde::Deserialize)]
        struct Named {
            name: String,
        }

        let payload = json!({"total": 2, "skip": 4, "items": [cat("a"), cat("b")]});
        let page = Page::<Entry>::from_payload(&payload).unwrap().into_typed::<Named>().unwrap();
        assert_eq!(page.items.iter().map(|n| n.name.as_str()).collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(page.skip, 4);
        assert_eq!(page.total, 2);
    }
}
