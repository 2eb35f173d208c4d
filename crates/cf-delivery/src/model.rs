//! Entries, assets and their field values
//!
//! Field names are arbitrary and decided by the content model, so fields are
//! held as a map from name to a tagged [`FieldValue`]. Link placeholders are
//! kept as [`FieldValue::Link`] until the resolver swaps them for the linked
//! entry or asset.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use cf_core::{CfError, CfResult, Link, Resource, SystemProperties};

pub type Fields = BTreeMap<String, FieldValue>;

/// A single field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    /// Unresolved reference to an entry or asset
    Link(Link),
    /// Resolved entry link; shared by every link resolved to the same entry
    Entry(Arc<Entry>),
    /// Resolved asset link
    Asset(Arc<Asset>),
    Array(Vec<FieldValue>),
    Object(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    pub fn from_json(value: &Value) -> Self {
        if let Some(link) = Link::from_json(value) {
            return Self::Link(link);
        }
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => Self::Number(n.clone()),
            Value::String(s) => Self::String(s.clone()),
            Value::Array(items) => Self::Array(items.iter().map(Self::from_json).collect()),
            Value::Object(map) => Self::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Back to JSON; resolved links become the full linked object
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => Value::Number(n.clone()),
            Self::String(s) => Value::String(s.clone()),
            Self::Link(link) => link.to_json(),
            Self::Entry(entry) => entry.to_json(),
            Self::Asset(asset) => asset.to_json(),
            Self::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect::<Map<_, _>>(),
            ),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_link(&self) -> Option<&Link> {
        match self {
            Self::Link(link) => Some(link),
            _ => None,
        }
    }

    pub fn as_entry(&self) -> Option<&Entry> {
        match self {
            Self::Entry(entry) => Some(entry),
            _ => None,
        }
    }

    pub fn as_asset(&self) -> Option<&Asset> {
        match self {
            Self::Asset(asset) => Some(asset),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[FieldValue]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, FieldValue>> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Member of an object value
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.as_object().and_then(|map| map.get(key))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_link(&self) -> bool {
        matches!(self, Self::Link(_))
    }
}

fn parse_resource(value: &Value, kind: &str) -> CfResult<(SystemProperties, Fields)> {
    let object = value
        .as_object()
        .ok_or_else(|| CfError::malformed(format!("{} must be an object", kind)))?;
    let sys = object
        .get("sys")
        .ok_or_else(|| CfError::malformed(format!("{} is missing sys", kind)))?;
    let sys: SystemProperties = serde_json::from_value(sys.clone())
        .map_err(|e| CfError::malformed(format!("{} has invalid sys: {}", kind, e)))?;

    let fields = match object.get("fields") {
        None | Some(Value::Null) => Fields::new(),
        Some(Value::Object(map)) => map
            .iter()
            .map(|(k, v)| (k.clone(), FieldValue::from_json(v)))
            .collect(),
        Some(_) => {
            return Err(CfError::malformed(format!(
                "{} {} has non-object fields",
                kind, sys.id
            )))
        }
    };
    Ok((sys, fields))
}

fn resource_json(sys: &SystemProperties, fields: &Fields) -> Value {
    let fields: Map<String, Value> = fields
        .iter()
        .map(|(k, v)| (k.clone(), v.to_json()))
        .collect();
    serde_json::json!({
        "sys": serde_json::to_value(sys).unwrap_or(Value::Null),
        "fields": fields,
    })
}

/// Look a field up in one locale.
///
/// A payload fetched for a single locale carries plain values and names the
/// locale in `sys.locale`; one fetched with `locale=*` carries a
/// locale-to-value map per field.
fn localized<'a>(
    sys: &SystemProperties,
    fields: &'a Fields,
    name: &str,
    locale: &str,
) -> Option<&'a FieldValue> {
    let value = fields.get(name)?;
    match &sys.locale {
        Some(current) if current == locale => Some(value),
        Some(_) => None,
        None => value.get(locale),
    }
}

/// A structured content object
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub sys: SystemProperties,
    pub fields: Fields,
}

impl Entry {
    pub fn from_json(value: &Value) -> CfResult<Self> {
        let (sys, fields) = parse_resource(value, "Entry")?;
        Ok(Self { sys, fields })
    }

    pub fn to_json(&self) -> Value {
        resource_json(&self.sys, &self.fields)
    }

    pub fn id(&self) -> &str {
        &self.sys.id
    }

    pub fn content_type_id(&self) -> Option<&str> {
        self.sys.content_type_id()
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(FieldValue::as_str)
    }

    /// Linked entry in `name`, if the link was resolved
    pub fn entry_field(&self, name: &str) -> Option<&Entry> {
        self.field(name).and_then(FieldValue::as_entry)
    }

    /// Linked asset in `name`, if the link was resolved
    pub fn asset_field(&self, name: &str) -> Option<&Asset> {
        self.field(name).and_then(FieldValue::as_asset)
    }

    pub fn localized(&self, name: &str, locale: &str) -> Option<&FieldValue> {
        localized(&self.sys, &self.fields, name, locale)
    }

    /// Deserialize the fields into a caller-defined type
    pub fn deserialize_fields<T: DeserializeOwned>(&self) -> CfResult<T> {
        let fields: Map<String, Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        serde_json::from_value(Value::Object(fields)).map_err(|e| {
            CfError::malformed(format!("Entry {} fields do not match: {}", self.sys.id, e))
        })
    }
}

impl Resource for Entry {
    fn sys(&self) -> &SystemProperties {
        &self.sys
    }
}

/// Details of the binary behind an asset
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssetFile {
    pub url: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub details: Option<Value>,
}

impl AssetFile {
    pub fn size(&self) -> Option<u64> {
        self.details.as_ref()?.get("size")?.as_u64()
    }
}

/// A binary/media object with metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    pub sys: SystemProperties,
    pub fields: Fields,
}

impl Asset {
    pub fn from_json(value: &Value) -> CfResult<Self> {
        let (sys, fields) = parse_resource(value, "Asset")?;
        Ok(Self { sys, fields })
    }

    pub fn to_json(&self) -> Value {
        resource_json(&self.sys, &self.fields)
    }

    pub fn id(&self) -> &str {
        &self.sys.id
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn title(&self) -> Option<&str> {
        self.field("title").and_then(FieldValue::as_str)
    }

    pub fn description(&self) -> Option<&str> {
        self.field("description").and_then(FieldValue::as_str)
    }

    pub fn file(&self) -> Option<AssetFile> {
        let file = self.field("file")?.to_json();
        serde_json::from_value(file).ok()
    }

    pub fn localized(&self, name: &str, locale: &str) -> Option<&FieldValue> {
        localized(&self.sys, &self.fields, name, locale)
    }
}

impl Resource for Asset {
    fn sys(&self) -> &SystemProperties {
        &self.sys
    }
}
