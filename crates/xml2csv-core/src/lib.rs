#![forbid(unsafe_code)]
//! xml2csv-core: configuration, per-conversion row schema state, summaries and errors.
//!
//! This crate is pure data. Streaming readers/writers and the converter itself
//! live in `xml2csv-io`.

pub mod config;
pub mod error;
pub mod prelude;
pub mod schema;
pub mod summary;

pub use config::{ConvertConfig, ServeConfig, DEFAULT_ROW_TAG};
pub use error::{Error, Result};
pub use schema::{RowSchema, RowValues};
pub use summary::ConvertSummary;
