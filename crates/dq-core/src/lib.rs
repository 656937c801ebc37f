//! # dq-core
//!
//! Core types, traits, and utilities for dirquery.
//!
//! This crate provides the foundational building blocks used by the query engine:
//! - Error types (query construction, per-record diagnostics, settings)
//! - Result type aliases and the partial-success result
//! - The `Record` trait implemented by raw API records
//! - Field kinds and typed value coercion
//! - Pagination bounds
//! - Configuration types

pub mod error;
pub mod result;
pub mod traits;
pub mod types;
pub mod pagination;
pub mod config;

pub use error::*;
pub use result::*;
pub use traits::*;
pub use types::*;
pub use pagination::*;
