//! Single-pass XML → CSV conversion.
//!
//! Every element whose local name equals the configured row tag becomes one
//! record; its direct children become columns. The header is taken from the
//! first row that captures any column and never changes afterwards, so a
//! child name that first appears in a later row is dropped from the output.
//!
//! States per run: scanning for a row start, inside a row (tracking depth and
//! the open column), then back to scanning. Any token error ends the run;
//! records already written stay written.

use std::io::{BufRead, Read, Write};

use xml2csv_core::prelude::*;

use crate::buf::{BoundedBufReader, CountingWriter};
use crate::readers::xml::{XmlToken, XmlTokens};
use crate::writers::csv::CsvRecordWriter;

/// Depth of a row's direct children, counting the row element as 1.
const COLUMN_DEPTH: usize = 2;

#[derive(Debug, Clone, Default)]
pub struct StreamingRowConverter {
    config: ConvertConfig,
}

impl StreamingRowConverter {
    pub fn new(config: ConvertConfig) -> Self {
        Self { config }
    }

    /// Convert `input` to CSV on `output`.
    ///
    /// Output starts streaming as soon as the first row closes. On failure,
    /// the records completed before the error are flushed to `output` and the
    /// error is returned; nothing is rolled back.
    pub fn convert<R: Read, W: Write>(&self, input: R, output: W) -> Result<ConvertSummary> {
        #[cfg(feature = "tracing")]
        tracing::debug!(row_tag = %self.config.row_tag, "starting conversion");

        let reader = BoundedBufReader::with_capacity(self.config.read_buffer_bytes, input);
        let mut tokens = XmlTokens::new(reader);
        let mut sink = CsvRecordWriter::new(CountingWriter::new(output));

        let outcome = self.scan(&mut tokens, &mut sink);
        let flushed = sink.into_inner();

        let mut summary = outcome?;
        summary.bytes_written = flushed?.bytes_written();

        #[cfg(feature = "tracing")]
        tracing::info!(
            rows = summary.rows_written,
            skipped = summary.rows_skipped,
            columns = summary.columns.len(),
            bytes = summary.bytes_written,
            "conversion finished"
        );
        Ok(summary)
    }

    fn scan<R: BufRead, W: Write>(
        &self,
        tokens: &mut XmlTokens<R>,
        sink: &mut CsvRecordWriter<W>,
    ) -> Result<ConvertSummary> {
        let row_tag = self.config.row_tag.as_str();
        let mut schema = RowSchema::new();
        let mut summary = ConvertSummary::default();

        while let Some(token) = tokens.next() {
            let XmlToken::Start { local_name } = token? else {
                continue;
            };
            if local_name != row_tag {
                continue;
            }

            let row = read_row(tokens, &mut schema)?;
            if row.is_empty() {
                summary.rows_skipped += 1;
                continue;
            }

            if !schema.is_frozen() {
                schema.freeze();
                #[cfg(feature = "tracing")]
                tracing::debug!(columns = ?schema.columns(), "inferred header from first row");
                sink.write_record(schema.columns())?;
            }
            sink.write_record(schema.project(&row))?;
            summary.rows_written += 1;
        }

        summary.columns = schema.columns().to_vec();
        Ok(summary)
    }
}

/// Consume one row element, starting just after its start tag, through its end tag.
fn read_row<R: BufRead>(tokens: &mut XmlTokens<R>, schema: &mut RowSchema) -> Result<RowValues> {
    let mut row = RowValues::new();
    let mut depth = 1usize;
    let mut column: Option<String> = None;
    let mut text = String::new();

    loop {
        let token = match tokens.next() {
            Some(token) => token?,
            None => {
                return Err(Error::UnexpectedEof {
                    position: tokens.byte_position(),
                    open_elements: depth,
                })
            }
        };

        match token {
            XmlToken::Start { local_name } => {
                depth += 1;
                if depth == COLUMN_DEPTH {
                    column = Some(local_name);
                    text.clear();
                }
            }
            XmlToken::Text(chunk) => {
                if depth == COLUMN_DEPTH {
                    text.push_str(&chunk);
                }
            }
            XmlToken::End => {
                if depth == COLUMN_DEPTH {
                    if let Some(name) = column.take() {
                        schema.observe(&name);
                        row.set(name, text.trim());
                    }
                }
                depth -= 1;
                if depth == 0 {
                    return Ok(row);
                }
            }
        }
    }
}

/// Convert with a one-off converter.
pub fn convert<R: Read, W: Write>(
    input: R,
    output: W,
    config: &ConvertConfig,
) -> Result<ConvertSummary> {
    StreamingRowConverter::new(config.clone()).convert(input, output)
}
