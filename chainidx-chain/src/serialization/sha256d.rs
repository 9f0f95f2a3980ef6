//! Double-SHA256 ("sha256d"), the hash Bitcoin-family chains use for block
//! hashes, transaction hashes, and P2P message checksums.

use sha2::{Digest, Sha256};

/// Incrementally hashes written bytes, then finalizes as sha256(sha256(data)).
#[derive(Default, Clone)]
pub struct Writer(Sha256);

impl Writer {
    pub fn write_all(&mut self, bytes: &[u8]) -> Result<(), std::io::Error> {
        self.0.update(bytes);
        Ok(())
    }

    /// Consumes the writer, returning the double-SHA256 digest of everything written.
    pub fn finish(self) -> [u8; 32] {
        let first = self.0.finalize();
        let second = Sha256::digest(&first);
        let mut out = [0u8; 32];
        out.copy_from_slice(&second);
        out
    }
}

impl std::io::Write for Writer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// A 4-byte message checksum: the first 4 bytes of the payload's sha256d digest.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Checksum(pub [u8; 4]);

impl From<&[u8]> for Checksum {
    fn from(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(&Sha256::digest(bytes));
        let mut checksum = [0u8; 4];
        checksum.copy_from_slice(&digest[0..4]);
        Checksum(checksum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn empty_input_matches_known_digest() {
        // sha256d("") is a well-known test vector.
        let mut w = Writer::default();
        w.write_all(b"").unwrap();
        let digest = w.finish();
        assert_eq!(
            hex::encode(digest),
            "5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456"
        );
    }

    #[test]
    fn checksum_is_first_four_bytes_of_digest() {
        let mut w = Writer::default();
        w.write(b"hello").unwrap();
        let digest = w.finish();
        let checksum = Checksum::from(&b"hello"[..]);
        assert_eq!(checksum.0, digest[0..4]);
    }
}
