//! Core traits shared by the query and delivery layers

use async_trait::async_trait;
use serde_json::Value;

use crate::result::CfResult;
use crate::types::SystemProperties;

/// HTTP collaborator the delivery client issues requests through.
///
/// Implementations own authentication, retries and timeouts; the core only
/// hands over a path and an already-serialized query string and expects the
/// decoded JSON body back. Failures should be reported as
/// [`CfError::Transport`](crate::error::CfError::Transport).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, path: &str, query: &str) -> CfResult<Value>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn execute(&self, path: &str, query: &str) -> CfResult<Value> {
        (**self).execute(path, query).await
    }
}

/// Anything carrying a `sys` block
pub trait Resource {
    fn sys(&self) -> &SystemProperties;

    fn id(&self) -> &str {
        &self.sys().id
    }
}
