//! Streaming SHA-256 helpers. Hashing happens incrementally as bytes are
//! written so the packager never re-reads a chunk file to checksum it
//! (SPEC_FULL.md §4.1 step 4: "single pass, no second read").

use sha2::{Digest, Sha256};

/// A `std::io::Write` wrapper that feeds every written byte slice through a
/// running SHA-256 digest, then forwards the write unchanged.
pub struct HashingWriter<W> {
    inner: W,
    hasher: Sha256,
    bytes_written: u64,
}

impl<W: std::io::Write> HashingWriter<W> {
    /// Wrap `inner`, starting a fresh digest.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
            bytes_written: 0,
        }
    }

    /// Total bytes written through this wrapper so far.
    #[must_use]
    pub const fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Consume the wrapper, returning the inner writer and the lowercase
    /// hex digest of everything written.
    #[must_use]
    pub fn finish(self) -> (W, String) {
        let digest = self.hasher.finalize();
        (self.inner, hex_encode(&digest))
    }
}

impl<W: std::io::Write> std::io::Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.hasher.update(&buf[..written]);
        self.bytes_written += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Compute the SHA-256 of a byte slice directly, used by the downloader's
/// post-hoc integrity check against the database row.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex_encode(&digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn hashing_writer_matches_direct_digest() {
        let data = b"the quick brown fox";
        let mut writer = HashingWriter::new(Vec::new());
        writer.write_all(data).unwrap();
        let (buf, digest) = writer.finish();
        assert_eq!(buf, data);
        assert_eq!(digest, sha256_hex(data));
        assert_eq!(digest.len(), 64);
    }

    #[test]
    fn empty_input_produces_known_digest() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b85"
        );
    }
}
