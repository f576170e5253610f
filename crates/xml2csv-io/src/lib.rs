#![forbid(unsafe_code)]
//! xml2csv-io: streaming XML tokens in, CSV records out.
//!
//! The converter reads the input once, front to back, and never holds more
//! than one row plus the reader's buffer in memory.

pub mod buf;
pub mod convert;
pub mod readers;
pub mod writers;

pub use convert::{convert, StreamingRowConverter};
pub use readers::xml::{XmlToken, XmlTokens};
pub use writers::csv::CsvRecordWriter;
pub use writers::spreadsheet::SpreadsheetWriter;
