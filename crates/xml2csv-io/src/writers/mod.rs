//! Streaming writers.

pub mod csv;
pub mod spreadsheet;
