//! Byte-level adjustments for spreadsheet applications on Windows.
//!
//! Excel needs a UTF-8 byte-order mark to pick the right encoding and CRLF line
//! endings to split rows. This sits between the CSV writer and the transport;
//! the converter itself always writes plain UTF-8 with LF.

use std::io::{self, Write};

pub const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Rewrites every `\n` as `\r\n`, optionally after a leading BOM.
pub struct SpreadsheetWriter<W: Write> {
    inner: W,
}

impl<W: Write> SpreadsheetWriter<W> {
    /// CRLF translation only.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Write the BOM immediately, then translate line endings.
    pub fn with_bom(mut inner: W) -> io::Result<Self> {
        inner.write_all(&UTF8_BOM)?;
        Ok(Self { inner })
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for SpreadsheetWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut start = 0;
        for (i, b) in buf.iter().enumerate() {
            if *b == b'\n' {
                self.inner.write_all(&buf[start..i])?;
                self.inner.write_all(b"\r\n")?;
                start = i + 1;
            }
        }
        if start < buf.len() {
            self.inner.write_all(&buf[start..])?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
