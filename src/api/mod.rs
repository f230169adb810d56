//! Remote query service client.
//!
//! This module provides:
//! * [`ApiService`]: async trait implemented by all service backends.
//! * [`HttpApiClient`]: reqwest implementation speaking the service's
//!   JSON/multipart HTTP contract.
//! * Wire types ([`QueryResponse`], [`SchemaResponse`], [`ExamplesResponse`])
//!   and the validated [`QueryResult`] domain type.
//! * [`ApiError`]: transport-level error variants.

pub mod client;
pub mod types;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use client::{ApiError, ApiService, HttpApiClient};
pub use types::{
    ColumnInfo, ExampleQuery, ExamplesResponse, QueryResponse, QueryResult, ResponseError, Row,
    Schema, SchemaResponse, TableInfo,
};
