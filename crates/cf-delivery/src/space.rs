//! Space metadata: the space with its locales, and content types

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use cf_core::{CfError, CfResult, Resource, SystemProperties};

use crate::page::PageItem;

fn parse<T: DeserializeOwned>(value: &Value, kind: &str) -> CfResult<T> {
    serde_json::from_value(value.clone())
        .map_err(|e| CfError::malformed(format!("invalid {}: {}", kind, e)))
}

/// A locale the space publishes content in
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Locale {
    /// e.g. `en-US`
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub default: bool,
    /// Locale consulted when a field has no value in this one
    #[serde(default)]
    pub fallback_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Space {
    pub sys: SystemProperties,
    pub name: String,
    #[serde(default)]
    pub locales: Vec<Locale>,
}

impl Space {
    pub fn from_json(value: &Value) -> CfResult<Self> {
        parse(value, "space")
    }

    /// The locale unlocalized queries are answered in
    pub fn default_locale(&self) -> Option<&Locale> {
        self.locales.iter().find(|l| l.default)
    }

    pub fn locale(&self, code: &str) -> Option<&Locale> {
        self.locales.iter().find(|l| l.code == code)
    }
}

impl Resource for Space {
    fn sys(&self) -> &SystemProperties {
        &self.sys
    }
}

/// One field declared by a content type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentTypeField {
    pub id: String,
    pub name: String,
    /// `Symbol`, `Text`, `Link`, `Array`, ...
    #[serde(rename = "type")]
    pub kind: String,
    /// `Entry` or `Asset` for link fields
    #[serde(default)]
    pub link_type: Option<String>,
    #[serde(default)]
    pub localized: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub disabled: bool,
    /// Element schema of array fields
    #[serde(default)]
    pub items: Option<Value>,
}

/// The schema shared by all entries of one type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentType {
    pub sys: SystemProperties,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Id of the field used as an entry's title
    #[serde(default)]
    pub display_field: Option<String>,
    #[serde(default)]
    pub fields: Vec<ContentTypeField>,
}

impl ContentType {
    pub fn from_json(value: &Value) -> CfResult<Self> {
        parse(value, "content type")
    }

    pub fn field(&self, id: &str) -> Option<&ContentTypeField> {
        self.fields.iter().find(|f| f.id == id)
    }
}

impl Resource for ContentType {
    fn sys(&self) -> &SystemProperties {
        &self.sys
    }
}

impl PageItem for ContentType {
    fn from_json(value: &Value) -> CfResult<Self> {
        ContentType::from_json(value)
    }
}
