//! Generic utilities

use std::io::{self, Write};

/// A writer that keeps track of the number of bytes that went through it.
///
/// Every xref offset is read from this counter, so it must see every byte
/// of the output, including the header and the trailer.
pub struct ByteCounter<W> {
    inner: W,
    count: usize,
}

impl<W> ByteCounter<W>
where
    W: Write,
{
    /// Create a new byte counter starting at offset 0
    pub fn new(inner: W) -> Self {
        ByteCounter { inner, count: 0 }
    }

    /// Return the inner writer
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Get the number of bytes written so far
    pub fn bytes_written(&self) -> usize {
        self.count
    }
}

impl<W> Write for ByteCounter<W>
where
    W: Write,
{
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let size = self.inner.write(buf)?;
        self.count += size;
        Ok(size)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Derive a six letter subset tag (e.g. `KXQBMA+`) for one subset of a font.
///
/// Readers only require the tag to be unique per embedded subset, so the
/// full `(font, subset)` pair goes into the digest.
pub fn subset_tag(font: u32, subset: usize) -> String {
    let mut ctx = md5::Context::new();
    ctx.consume(font.to_le_bytes());
    ctx.consume((subset as u64).to_le_bytes());
    let digest = ctx.compute();
    digest.0[..6]
        .iter()
        .map(|&b| (b'A' + b % 26) as char)
        .collect()
}
