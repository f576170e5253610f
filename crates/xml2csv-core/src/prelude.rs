//! Convenient re-exports for downstream crates.

pub use crate::config::{ConvertConfig, ServeConfig, DEFAULT_ROW_TAG};
pub use crate::error::{Error, Result};
pub use crate::schema::{RowSchema, RowValues};
pub use crate::summary::ConvertSummary;
