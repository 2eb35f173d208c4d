//! In-memory transport serving canned payloads
//!
//! Fixtures are keyed by request path and serialized query string, so a test
//! states exactly which request it expects the client to make.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use cf_core::{CfError, CfResult, Transport};

/// Transport that answers from recorded fixtures and logs every request
#[derive(Default)]
pub struct RecordedTransport {
    fixtures: RwLock<HashMap<(String, String), Value>>,
    requests: RwLock<Vec<(String, String)>>,
}

impl RecordedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fixture while the transport is still being set up
    pub fn with_fixture(
        mut self,
        path: impl Into<String>,
        query: impl Into<String>,
        payload: Value,
    ) -> Self {
        self.fixtures
            .get_mut()
            .insert((path.into(), query.into()), payload);
        self
    }

    pub async fn record(&self, path: impl Into<String>, query: impl Into<String>, payload: Value) {
        let mut fixtures = self.fixtures.write().await;
        fixtures.insert((path.into(), query.into()), payload);
    }

    /// Requests seen so far, oldest first
    pub async fn requests(&self) -> Vec<(String, String)> {
        self.requests.read().await.clone()
    }

    pub async fn request_count(&self) -> usize {
        self.requests.read().await.len()
    }
}

#[async_trait]
impl Transport for RecordedTransport {
    async fn execute(&self, path: &str, query: &str) -> CfResult<Value> {
        self.requests
            .write()
            .await
            .push((path.to_string(), query.to_string()));

        let fixtures = self.fixtures.read().await;
        match fixtures.get(&(path.to_string(), query.to_string())) {
            Some(payload) => Ok(payload.clone()),
            None => {
                debug!(path = %path, query = %query, "No recorded fixture");
                Err(CfError::transport(
                    format!("no fixture recorded for {}?{}", path, query),
                    Some(404),
                ))
            }
        }
    }
}
