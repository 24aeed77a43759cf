//! Commodity byte transformations shared by both format variants.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::{GzEncoder, ZlibEncoder};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// A payload with the compression decision already made.
///
/// The on-disk format carries no stored/compressed flag; the read side recovers
/// the discriminator from the two size fields (payloads) or the record length
/// (table records).
#[derive(Debug)]
pub enum Payload<'a> {
    Stored(&'a [u8]),
    Compressed(Vec<u8>),
}

impl Payload<'_> {
    pub fn bytes(&self) -> &[u8] {
        match self {
            Payload::Stored(data) => data,
            Payload::Compressed(data) => data,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes().is_empty()
    }
}

/// GZIP-compress `data`, keeping the result only if strictly smaller.
pub fn gzip_payload(data: &[u8], level: u32) -> std::io::Result<Payload<'_>> {
    let compressed = gzip(data, level)?;
    Ok(if compressed.len() < data.len() {
        Payload::Compressed(compressed)
    } else {
        Payload::Stored(data)
    })
}

/// DEFLATE-compress `data`, keeping the result only if strictly smaller.
pub fn deflate_payload(data: &[u8], level: u32) -> std::io::Result<Payload<'_>> {
    let compressed = deflate(data, level)?;
    Ok(if compressed.len() < data.len() {
        Payload::Compressed(compressed)
    } else {
        Payload::Stored(data)
    })
}

pub fn gzip(data: &[u8], level: u32) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::new(level));
    encoder.write_all(data)?;
    encoder.finish()
}

/// zlib-framed DEFLATE, the framing the reference tool's deflate primitive emits.
pub fn deflate(data: &[u8], level: u32) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(level));
    encoder.write_all(data)?;
    encoder.finish()
}

/// Inflate either framing. The reference tool's inflate primitive accepts gzip
/// and zlib streams alike, so the framing is detected from the leading bytes.
pub fn inflate(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut output = Vec::new();
    if data.starts_with(&GZIP_MAGIC) {
        GzDecoder::new(data).read_to_end(&mut output)?;
    } else {
        ZlibDecoder::new(data).read_to_end(&mut output)?;
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gzip_round_trip() {
        let data = b"Hello, world! Hello, world! Hello, world!";
        let compressed = gzip(data, 6).unwrap();
        assert_eq!(inflate(&compressed).unwrap(), data);
    }

    #[test]
    fn test_deflate_round_trip() {
        let data = b"Hello, world! Hello, world! Hello, world!";
        let compressed = deflate(data, 6).unwrap();
        assert_eq!(inflate(&compressed).unwrap(), data);
    }

    #[test]
    fn test_inflate_rejects_garbage() {
        assert!(inflate(&[0xAA, 0x55, 0xAA, 0x55]).is_err());
    }

    #[test]
    fn test_payload_keeps_smaller_form_only() {
        // 5 bytes never shrink under the gzip framing overhead
        let small = b"AAAAA";
        assert!(matches!(gzip_payload(small, 6).unwrap(), Payload::Stored(_)));

        let zeros = vec![0u8; 4096];
        let payload = gzip_payload(&zeros, 6).unwrap();
        assert!(matches!(payload, Payload::Compressed(_)));
        assert!(payload.len() < zeros.len());
    }
}
