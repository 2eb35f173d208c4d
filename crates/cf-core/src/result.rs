//! Result type alias

use crate::error::CfError;

/// Standard Result type for client operations
pub type CfResult<T> = Result<T, CfError>;
