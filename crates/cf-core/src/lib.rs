//! # cf-core
//!
//! Core types, traits, and utilities for Contentful RS.
//!
//! This crate provides the foundational building blocks used across all other crates:
//! - Common error types (`CfError`, `ValidationErrors`)
//! - Result type alias
//! - Link and system property types shared by queries and responses
//! - The `Transport` seam the delivery client talks through
//! - Client configuration

pub mod error;
pub mod result;
pub mod traits;
pub mod types;
pub mod config;

pub use error::*;
pub use result::*;
pub use traits::*;
pub use types::*;
