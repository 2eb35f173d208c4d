//! Core error types for Contentful RS
//!
//! Query construction fails fast with validation errors; response parsing
//! fails with malformed-response errors; transport failures pass through.

use std::collections::BTreeMap;
use thiserror::Error;

/// Core error type for all client operations
#[derive(Error, Debug)]
pub enum CfError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    #[error("Transport error: {message}")]
    Transport {
        message: String,
        status: Option<u16>,
    },

    #[error("Not found: {kind} with id={id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CfError {
    /// Shorthand for a single-field validation failure
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, message);
        CfError::Validation(errors)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        CfError::MalformedResponse {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>, status: Option<u16>) -> Self {
        CfError::Transport {
            message: message.into(),
            status,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, CfError::Validation(_))
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            CfError::Validation(_) => "validation_failed",
            CfError::MalformedResponse { .. } => "malformed_response",
            CfError::Transport { .. } => "transport_error",
            CfError::NotFound { .. } => "not_found",
            CfError::Config(_) => "configuration_error",
        }
    }
}

/// Validation errors collection, keyed by the offending parameter
#[derive(Error, Debug, Default, Clone, PartialEq, Eq)]
#[error("{}", self.full_messages().join("; "))]
pub struct ValidationErrors {
    /// Field-specific errors: parameter -> Vec<error_messages>
    pub errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Check if there are errors for a specific field
    pub fn has_error(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn full_messages(&self) -> Vec<String> {
        self.errors
            .iter()
            .flat_map(|(field, messages)| {
                messages.iter().map(move |msg| format!("{} {}", field, msg))
            })
            .collect()
    }

    /// Turn a non-empty collection into an error
    pub fn into_result(self) -> Result<(), CfError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(CfError::Validation(self))
        }
    }
}
