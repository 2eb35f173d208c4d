//! Client configuration and loading

use serde::{Deserialize, Serialize};

use crate::error::{CfError, ValidationErrors};

pub const DELIVERY_BASE_URL: &str = "https://cdn.contentful.com";
pub const PREVIEW_BASE_URL: &str = "https://preview.contentful.com";
pub const DEFAULT_ENVIRONMENT: &str = "master";

/// Options for talking to one space
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ClientOptions {
    /// Space identifier, e.g. "cfexampleapi"
    pub space_id: String,
    /// Environment within the space
    pub environment: String,
    /// Content Delivery API key
    pub delivery_api_key: String,
    /// Content Preview API key (used when `use_preview_api` is set)
    pub preview_api_key: Option<String>,
    /// Content Management API key
    pub management_api_key: Option<String>,
    /// Route delivery reads through the preview API
    pub use_preview_api: bool,
    /// Locale sent when a query does not name one; `None` lets the space decide
    pub default_locale: Option<String>,
    /// Overrides the delivery/preview host, e.g. for a recording proxy
    pub base_url: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            space_id: String::new(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            delivery_api_key: String::new(),
            preview_api_key: None,
            management_api_key: None,
            use_preview_api: false,
            default_locale: None,
            base_url: None,
        }
    }
}

impl ClientOptions {
    pub fn new(space_id: impl Into<String>, delivery_api_key: impl Into<String>) -> Self {
        Self {
            space_id: space_id.into(),
            delivery_api_key: delivery_api_key.into(),
            ..Default::default()
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, CfError> {
        let mut options = Self::default();

        match std::env::var("CONTENTFUL_SPACE_ID") {
            Ok(space) => options.space_id = space,
            Err(_) => {
                return Err(CfError::Config(
                    "Environment variable not set: CONTENTFUL_SPACE_ID".to_string(),
                ))
            }
        }
        if let Ok(key) = std::env::var("CONTENTFUL_DELIVERY_API_KEY") {
            options.delivery_api_key = key;
        }
        options.preview_api_key = std::env::var("CONTENTFUL_PREVIEW_API_KEY").ok();
        options.management_api_key = std::env::var("CONTENTFUL_MANAGEMENT_API_KEY").ok();
        if let Ok(env) = std::env::var("CONTENTFUL_ENVIRONMENT") {
            options.environment = env;
        }
        if let Ok(v) = std::env::var("CONTENTFUL_USE_PREVIEW_API") {
            options.use_preview_api = v == "true" || v == "1" || v == "yes";
        }
        options.default_locale = std::env::var("CONTENTFUL_DEFAULT_LOCALE").ok();
        options.base_url = std::env::var("CONTENTFUL_BASE_URL").ok();

        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), CfError> {
        let mut errors = ValidationErrors::new();
        if self.space_id.trim().is_empty() {
            errors.add("space_id", "can't be blank");
        }
        if self.environment.trim().is_empty() {
            errors.add("environment", "can't be blank");
        }
        if self.use_preview_api {
            if self.preview_api_key.as_deref().map_or(true, str::is_empty) {
                errors.add("preview_api_key", "is required when the preview API is used");
            }
        } else if self.delivery_api_key.is_empty() {
            errors.add("delivery_api_key", "can't be blank");
        }
        errors.into_result()
    }

    /// Host the delivery client should talk to
    pub fn base_url(&self) -> &str {
        match (&self.base_url, self.use_preview_api) {
            (Some(url), _) => url.trim_end_matches('/'),
            (None, true) => PREVIEW_BASE_URL,
            (None, false) => DELIVERY_BASE_URL,
        }
    }

    /// API key matching the selected surface
    pub fn access_token(&self) -> &str {
        if self.use_preview_api {
            self.preview_api_key.as_deref().unwrap_or_default()
        } else {
            &self.delivery_api_key
        }
    }

    /// Path prefix for resources of the configured space and environment
    pub fn environment_path(&self) -> String {
        format!(
            "/spaces/{}/environments/{}",
            self.space_id, self.environment
        )
    }
}
