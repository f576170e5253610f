//! Streaming CSV record writer.

use std::io::Write;

use xml2csv_core::error::{Error, Result};

/// Comma-delimited, LF-terminated, quoting only the fields that need it.
pub struct CsvRecordWriter<W: Write> {
    writer: ::csv::Writer<W>,
}

impl<W: Write> CsvRecordWriter<W> {
    pub fn new(writer: W) -> Self {
        let writer = ::csv::WriterBuilder::new()
            .has_headers(false)
            .delimiter(b',')
            .quote(b'"')
            .double_quote(true)
            .quote_style(::csv::QuoteStyle::Necessary)
            .terminator(::csv::Terminator::Any(b'\n'))
            .from_writer(writer);
        Self { writer }
    }

    /// Write one record. A record made of a single empty field is written as
    /// a bare line terminator, not as `""`.
    pub fn write_record<I, T>(&mut self, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let fields: Vec<T> = fields.into_iter().collect();
        if let [only] = fields.as_slice() {
            if only.as_ref().is_empty() {
                self.writer.flush()?;
                self.writer.get_mut().write_all(b"\n")?;
                return Ok(());
            }
        }
        self.writer.write_record(&fields).map_err(map_csv_error)
    }

    /// Flush and hand back the destination.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| Error::Io(e.into_error()))
    }
}

fn map_csv_error(err: ::csv::Error) -> Error {
    if !err.is_io_error() {
        return Error::Output(err.to_string());
    }
    match err.into_kind() {
        ::csv::ErrorKind::Io(e) => Error::Io(e),
        other => Error::Output(format!("{other:?}")),
    }
}
