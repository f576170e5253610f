//! Bounded buffered readers and byte-counting writers.
//!
//! The XML reader pulls from a `BufReader` with an explicit capacity so the
//! in-flight input never grows with document size.

use std::io::{self, BufRead, BufReader, Read, Write};

/// A thin wrapper over `BufReader` with a fixed capacity to bound in-flight bytes.
pub struct BoundedBufReader<R: Read> {
    inner: BufReader<R>,
}

impl<R: Read> BoundedBufReader<R> {
    /// Create a new bounded reader with a maximum internal buffer size.
    pub fn with_capacity(capacity: usize, reader: R) -> Self {
        Self {
            inner: BufReader::with_capacity(capacity.max(1), reader),
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    /// Bytes currently buffered and not yet consumed.
    pub fn buffer_len(&self) -> usize {
        self.inner.buffer().len()
    }
}

impl<R: Read> Read for BoundedBufReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Read> BufRead for BoundedBufReader<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }
    fn consume(&mut self, amt: usize) {
        self.inner.consume(amt)
    }
}

/// Forwards writes unchanged and counts the bytes the inner writer accepted.
pub struct CountingWriter<W: Write> {
    inner: W,
    written: u64,
}

impl<W: Write> CountingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_reader_respects_capacity() {
        let data = vec![b'x'; 100];
        let mut r = BoundedBufReader::with_capacity(16, data.as_slice());
        assert_eq!(r.capacity(), 16);
        let filled = r.fill_buf().unwrap().len();
        assert_eq!(filled, 16);
        assert_eq!(r.buffer_len(), 16);
        r.consume(4);
        assert_eq!(r.buffer_len(), 12);
    }

    #[test]
    fn counting_writer_counts() {
        let mut w = CountingWriter::new(Vec::new());
        w.write_all(b"a,b\n").unwrap();
        w.write_all(b"1,2\n").unwrap();
        assert_eq!(w.bytes_written(), 8);
        assert_eq!(w.into_inner(), b"a,b\n1,2\n");
    }
}
