use std::io::{Result, Write};

/// Write adapter that tracks how many bytes reached the inner writer.
pub struct CountingForward<W: Write> {
    inner: W,
    pub counted: u64,
}

impl<W: Write> CountingForward<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, counted: 0 }
    }
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for CountingForward<W> {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let n = self.inner.write(buf)?;
        self.counted += n as u64;
        Ok(n)
    }
    fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }
}

/// `written * 100 / total`, clamped to 0..=100. An empty total is complete.
pub fn percent_of(written: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    (written.min(total) * 100 / total) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_forwarded_bytes() {
        let mut w = CountingForward::new(Vec::new());
        w.write_all(b"hello").unwrap();
        w.write_all(b" world").unwrap();
        assert_eq!(w.counted, 11);
        assert_eq!(w.into_inner(), b"hello world");
    }

    #[test]
    fn percent_rounds_down_and_clamps() {
        assert_eq!(percent_of(0, 30), 0);
        assert_eq!(percent_of(10, 30), 33);
        assert_eq!(percent_of(30, 30), 100);
        assert_eq!(percent_of(31, 30), 100);
        assert_eq!(percent_of(0, 0), 100);
    }
}
