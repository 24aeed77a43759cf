use byteorder::{LE, ReadBytesExt, WriteBytesExt};
use serde::Serialize;

use crate::compression;
use crate::error::{PckError, Result};
use crate::filename;

/// On-disk size of a plain classic table record.
pub const RECORD_SIZE: usize = 272;
/// Size of the NUL-terminated path field opening each record.
pub const PATH_FIELD_SIZE: usize = 260;

/// One catalogued file: the metadata record of the classic file table.
///
/// `data_compressed_size == data_decompressed_size` is the only indicator that
/// the payload is stored raw; the format carries no flag. Entries are built once
/// (decoded from disk or assembled while packing) and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileTableEntry {
    /// Archive path, backslash-separated.
    pub path: String,
    /// Absolute payload offset.
    pub data_offset: u32,
    /// Original payload size.
    pub data_decompressed_size: i32,
    /// Stored payload size.
    pub data_compressed_size: i32,
}

/// Storage form of a payload, recovered from the two size fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Stored,
    Compressed,
}

impl FileTableEntry {
    /// Decode a raw table record.
    ///
    /// Records shorter than [`RECORD_SIZE`] are GZIP-compressed; anything of the
    /// full size is parsed literally, even bytes that would also inflate. Length
    /// is the discriminator, never content.
    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        if raw.len() < RECORD_SIZE {
            let plain = compression::inflate(raw).map_err(PckError::EntryInflate)?;
            Self::parse_record(&plain)
        } else {
            Self::parse_record(raw)
        }
    }

    /// Encode into the on-disk record form at the given compression level.
    ///
    /// The GZIP form is kept only when strictly smaller than [`RECORD_SIZE`], so
    /// the decoder's length gate stays intact.
    pub fn to_bytes(&self, level: u32) -> Result<Vec<u8>> {
        let plain = self.to_record(RECORD_SIZE)?;
        let compressed = compression::gzip(&plain, level)?;
        Ok(if compressed.len() < RECORD_SIZE { compressed } else { plain })
    }

    pub fn payload_kind(&self) -> PayloadKind {
        if self.data_compressed_size == self.data_decompressed_size {
            PayloadKind::Stored
        } else {
            PayloadKind::Compressed
        }
    }

    /// Parse the fixed first-272-byte layout shared by both variants.
    pub(crate) fn parse_record(record: &[u8]) -> Result<Self> {
        if record.len() < RECORD_SIZE {
            return Err(PckError::TruncatedEntry(record.len()));
        }
        let path = filename::decode_path(&record[..PATH_FIELD_SIZE])?;
        let mut tail = &record[PATH_FIELD_SIZE..RECORD_SIZE];
        let data_offset = tail.read_u32::<LE>()?;
        let data_decompressed_size = tail.read_i32::<LE>()?;
        let data_compressed_size = tail.read_i32::<LE>()?;

        let entry = FileTableEntry {
            path,
            data_offset,
            data_decompressed_size,
            data_compressed_size,
        };
        entry.check_payload_sizes()?;
        Ok(entry)
    }

    /// Build a plain record of `record_size` bytes (272 classic, up to 276 PW).
    pub(crate) fn to_record(&self, record_size: usize) -> Result<Vec<u8>> {
        if record_size < RECORD_SIZE {
            return Err(PckError::TruncatedEntry(record_size));
        }
        let encoded = filename::encode_path(&self.path)?;
        if encoded.len() > PATH_FIELD_SIZE {
            return Err(PckError::InvalidPathSize {
                path: self.path.clone(),
                size: encoded.len(),
                limit: PATH_FIELD_SIZE,
            });
        }

        let mut record = vec![0u8; record_size];
        record[..encoded.len()].copy_from_slice(&encoded);
        let mut tail = &mut record[PATH_FIELD_SIZE..RECORD_SIZE];
        tail.write_u32::<LE>(self.data_offset)?;
        tail.write_i32::<LE>(self.data_decompressed_size)?;
        tail.write_i32::<LE>(self.data_compressed_size)?;
        Ok(record)
    }

    pub(crate) fn check_payload_sizes(&self) -> Result<()> {
        if self.data_compressed_size < 0 || self.data_compressed_size > self.data_decompressed_size {
            return Err(PckError::InvalidPayloadSizes {
                path: self.path.clone(),
                compressed: self.data_compressed_size,
                decompressed: self.data_decompressed_size,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entry() -> FileTableEntry {
        FileTableEntry {
            path: "models\\npc\\守卫.mox".to_string(),
            data_offset: 0x1234,
            data_decompressed_size: 9000,
            data_compressed_size: 4321,
        }
    }

    #[test]
    fn test_round_trip_all_levels() {
        let entry = sample_entry();
        for level in 0..=9 {
            let bytes = entry.to_bytes(level).unwrap();
            assert!(bytes.len() <= RECORD_SIZE);
            assert_eq!(FileTableEntry::from_bytes(&bytes).unwrap(), entry);
        }
    }

    #[test]
    fn test_full_size_record_is_parsed_literally() {
        // A mostly-zero record compresses well, so level 6 yields the short form.
        let entry = sample_entry();
        let compressed = entry.to_bytes(6).unwrap();
        assert!(compressed.len() < RECORD_SIZE);

        // The plain form must parse as-is even though its leading bytes spell
        // the gzip magic: 0x1f is plain ASCII and (0x8b, 0xcd) a valid GBK pair.
        let mut record = sample_entry().to_record(RECORD_SIZE).unwrap();
        record[..4].copy_from_slice(&[0x1f, 0x8b, 0xcd, 0x00]);
        let parsed = FileTableEntry::from_bytes(&record).unwrap();
        assert_eq!(parsed.data_offset, 0x1234);
        assert!(parsed.path.starts_with('\u{1f}'));
    }

    #[test]
    fn test_short_record_must_inflate() {
        // shorter than 272 bytes and not a valid compressed stream
        let garbage = vec![0xAAu8; 100];
        assert!(matches!(
            FileTableEntry::from_bytes(&garbage),
            Err(PckError::EntryInflate(_))
        ));
    }

    #[test]
    fn test_path_size_limit() {
        let mut entry = sample_entry();
        entry.path = "a".repeat(261);
        assert!(matches!(
            entry.to_bytes(6),
            Err(PckError::InvalidPathSize { size: 261, .. })
        ));

        // two bytes per CJK character: 131 characters overflow, 130 fit exactly
        entry.path = "中".repeat(131);
        assert!(matches!(
            entry.to_bytes(6),
            Err(PckError::InvalidPathSize { size: 262, .. })
        ));
        entry.path = "中".repeat(130);
        let bytes = entry.to_bytes(6).unwrap();
        assert_eq!(FileTableEntry::from_bytes(&bytes).unwrap(), entry);
    }

    #[test]
    fn test_rejects_inconsistent_payload_sizes() {
        let mut record = sample_entry().to_record(RECORD_SIZE).unwrap();
        // compressed size larger than decompressed size
        record[PATH_FIELD_SIZE + 4..PATH_FIELD_SIZE + 8].copy_from_slice(&100i32.to_le_bytes());
        record[PATH_FIELD_SIZE + 8..PATH_FIELD_SIZE + 12].copy_from_slice(&200i32.to_le_bytes());
        assert!(matches!(
            FileTableEntry::from_bytes(&record),
            Err(PckError::InvalidPayloadSizes { .. })
        ));
    }

    #[test]
    fn test_stored_payload_discriminator() {
        let mut entry = sample_entry();
        assert_eq!(entry.payload_kind(), PayloadKind::Compressed);
        entry.data_compressed_size = entry.data_decompressed_size;
        assert_eq!(entry.payload_kind(), PayloadKind::Stored);
    }
}
