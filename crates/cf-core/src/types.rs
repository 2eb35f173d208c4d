//! Common types used throughout Contentful RS

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of resource a link can point at
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LinkType {
    Entry,
    Asset,
}

impl LinkType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Entry" => Some(Self::Entry),
            "Asset" => Some(Self::Asset),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entry => "Entry",
            Self::Asset => "Asset",
        }
    }
}

impl std::fmt::Display for LinkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference to an entry or asset that has not been (or could not be)
/// replaced by the linked object.
///
/// On the wire: `{"sys": {"type": "Link", "linkType": "Entry", "id": "happycat"}}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Link {
    pub link_type: LinkType,
    pub id: String,
}

impl Link {
    pub fn new(link_type: LinkType, id: impl Into<String>) -> Self {
        Self {
            link_type,
            id: id.into(),
        }
    }

    pub fn entry(id: impl Into<String>) -> Self {
        Self::new(LinkType::Entry, id)
    }

    pub fn asset(id: impl Into<String>) -> Self {
        Self::new(LinkType::Asset, id)
    }

    /// Recognize a link placeholder in a raw payload value.
    ///
    /// Only entry and asset links qualify; links to spaces, content types
    /// or environments are ordinary metadata.
    pub fn from_json(value: &Value) -> Option<Self> {
        let sys = value.as_object()?.get("sys")?.as_object()?;
        if sys.get("type")?.as_str()? != "Link" {
            return None;
        }
        let link_type = LinkType::from_str(sys.get("linkType")?.as_str()?)?;
        let id = sys.get("id")?.as_str()?;
        Some(Self::new(link_type, id))
    }

    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "sys": {
                "type": "Link",
                "linkType": self.link_type.as_str(),
                "id": self.id,
            }
        })
    }
}

/// `sys` block of a link to non-content metadata (space, content type, ...)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LinkSys {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub link_type: String,
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LinkEnvelope {
    pub sys: LinkSys,
}

/// System-managed metadata carried by every entry and asset
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SystemProperties {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub revision: Option<i64>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub content_type: Option<LinkEnvelope>,
    #[serde(default)]
    pub space: Option<LinkEnvelope>,
}

impl SystemProperties {
    pub fn content_type_id(&self) -> Option<&str> {
        self.content_type.as_ref().map(|ct| ct.sys.id.as_str())
    }

    pub fn link_type(&self) -> Option<LinkType> {
        LinkType::from_str(&self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_link_from_json() {
        let raw = json!({"sys": {"type": "Link", "linkType": "Entry", "id": "happycat"}});
        assert_eq!(Link::from_json(&raw), Some(Link::entry("happycat")));
        assert_eq!(Link::from_json(&Link::asset("doge").to_json()), Some(Link::asset("doge")));
    }

    #[test]
    fn test_non_content_links_are_ignored() {
        let space = json!({"sys": {"type": "Link", "linkType": "Space", "id": "cfexampleapi"}});
        assert!(Link::from_json(&space).is_none());

        let entry = json!({"sys": {"type": "Entry", "id": "nyancat"}});
        assert!(Link::from_json(&entry).is_none());
        assert!(Link::from_json(&json!("nyancat")).is_none());
    }

    #[test]
    fn test_system_properties() {
        let sys: SystemProperties = serde_json::from_value(json!({
            "id": "nyancat",
            "type": "Entry",
            "createdAt": "2013-06-27T22:46:19.513Z",
            "revision": 5,
            "locale": "en-US",
            "contentType": {"sys": {"type": "Link", "linkType": "ContentType", "id": "cat"}}
        }))
        .unwrap();

        assert_eq!(sys.id, "nyancat");
        assert_eq!(sys.link_type(), Some(LinkType::Entry));
        assert_eq!(sys.content_type_id(), Some("cat"));
        assert_eq!(sys.revision, Some(5));
        assert!(sys.created_at.is_some());
        assert!(sys.updated_at.is_none());
    }
}
