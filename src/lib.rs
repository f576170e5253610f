#![forbid(unsafe_code)]
//! xml2csv: stream repeated XML elements out as CSV records.
//!
//! ```no_run
//! use xml2csv::{convert, ConvertConfig};
//!
//! let xml = "<root><record><x>a</x><y>b</y></record></root>";
//! let mut out = Vec::new();
//! convert(xml.as_bytes(), &mut out, &ConvertConfig::default().with_row_tag("record"))?;
//! assert_eq!(out, b"x,y\na,b\n");
//! # Ok::<(), xml2csv::Error>(())
//! ```

pub use xml2csv_core::{
    config, error, schema, summary, ConvertConfig, ConvertSummary, Error, Result, RowSchema,
    RowValues, ServeConfig, DEFAULT_ROW_TAG,
};
pub use xml2csv_io::{
    buf, convert, readers, writers, CsvRecordWriter, SpreadsheetWriter, StreamingRowConverter,
    XmlToken, XmlTokens,
};
