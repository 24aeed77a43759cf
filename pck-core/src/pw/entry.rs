use serde::Serialize;

use crate::compression;
use crate::error::Result;
use crate::pck::{FileTableEntry, PayloadKind};

/// Default on-disk size of a plain PW table record.
pub const PW_RECORD_SIZE: usize = 276;

/// PW table record: same first-272-byte layout as the classic record, but with a
/// variable on-disk size (272 or 276 bytes). Bytes past offset 272 hold a
/// sub-type tag this codec does not interpret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PwFileTableEntry {
    pub path: String,
    pub data_offset: u32,
    pub data_decompressed_size: i32,
    pub data_compressed_size: i32,
    /// Plain record length, remembered so a round trip reproduces identical
    /// bytes.
    pub entry_size: usize,
}

impl PwFileTableEntry {
    pub fn new(path: String, data_offset: u32, data_decompressed_size: i32, data_compressed_size: i32) -> Self {
        PwFileTableEntry {
            path,
            data_offset,
            data_decompressed_size,
            data_compressed_size,
            entry_size: PW_RECORD_SIZE,
        }
    }

    /// Decode a raw table record.
    ///
    /// Unlike the classic length gate, the reference decoder always attempts to
    /// inflate and silently keeps the raw bytes when that fails. Both behaviors
    /// are deliberate and must not be unified.
    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        let plain = match compression::inflate(raw) {
            Ok(plain) => plain,
            Err(_) => raw.to_vec(),
        };

        let base = FileTableEntry::parse_record(&plain)?;
        Ok(PwFileTableEntry {
            path: base.path,
            data_offset: base.data_offset,
            data_decompressed_size: base.data_decompressed_size,
            data_compressed_size: base.data_compressed_size,
            entry_size: plain.len(),
        })
    }

    /// Encode into the on-disk record form at the given compression level.
    ///
    /// The DEFLATE form is kept only when strictly smaller than the plain
    /// `entry_size`-byte record.
    pub fn to_bytes(&self, level: u32) -> Result<Vec<u8>> {
        let plain = self.as_classic().to_record(self.entry_size)?;
        let compressed = compression::deflate(&plain, level)?;
        Ok(if compressed.len() < self.entry_size { compressed } else { plain })
    }

    pub fn payload_kind(&self) -> PayloadKind {
        if self.data_compressed_size == self.data_decompressed_size {
            PayloadKind::Stored
        } else {
            PayloadKind::Compressed
        }
    }

    fn as_classic(&self) -> FileTableEntry {
        FileTableEntry {
            path: self.path.clone(),
            data_offset: self.data_offset,
            data_decompressed_size: self.data_decompressed_size,
            data_compressed_size: self.data_compressed_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pck::RECORD_SIZE;

    fn sample_entry() -> PwFileTableEntry {
        PwFileTableEntry::new("maps\\世界\\area.scn".to_string(), 0xBEEF, 4096, 1024)
    }

    #[test]
    fn test_round_trip_all_levels() {
        let entry = sample_entry();
        for level in 0..=9 {
            let bytes = entry.to_bytes(level).unwrap();
            assert!(bytes.len() <= PW_RECORD_SIZE);
            assert_eq!(PwFileTableEntry::from_bytes(&bytes).unwrap(), entry);
        }
    }

    #[test]
    fn test_legacy_record_size_round_trip() {
        let mut entry = sample_entry();
        entry.entry_size = RECORD_SIZE;
        let bytes = entry.to_bytes(6).unwrap();
        assert!(bytes.len() <= RECORD_SIZE);
        let decoded = PwFileTableEntry::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.entry_size, RECORD_SIZE);
        assert_eq!(decoded, entry);
    }

    #[test]
    fn test_plain_record_falls_back_to_raw() {
        // a plain 276-byte record is not a valid deflate stream; the decoder
        // must keep the raw bytes instead of failing like the classic codec
        let entry = sample_entry();
        let plain = entry.as_classic().to_record(PW_RECORD_SIZE).unwrap();
        let decoded = PwFileTableEntry::from_bytes(&plain).unwrap();
        assert_eq!(decoded, entry);
    }

    #[test]
    fn test_path_size_limit() {
        let mut entry = sample_entry();
        entry.path = "a".repeat(261);
        assert!(entry.to_bytes(6).is_err());
    }
}
