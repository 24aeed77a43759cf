use std::fs;
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

use byteorder::{LE, WriteBytesExt};

use crate::compression;
use crate::error::{PckError, Result};
use crate::keys::{self, Keys};
use crate::write::collect_files;

use super::{PW_ASIG_1, PW_ASIG_2, PW_BANNER_SIZE, PW_FSIG_1, PW_FSIG_2, PwFileTableEntry};

/// Writer for PW archives.
///
/// Differs from the classic writer in its compression (DEFLATE), its table
/// records (no zero separator), its 256-byte banner field and in masking the
/// trailer pointer with the instance key instead of the stock one. The
/// asymmetry with the classic writer is a preserved quirk of the reference
/// tool.
pub struct PwPckWriter<W: Write + Seek> {
    inner: W,
    keys: Keys,
}

impl<W: Write + Seek> PwPckWriter<W> {
    pub fn new(inner: W) -> Self {
        Self::with_keys(inner, Keys::PW)
    }

    pub fn with_keys(inner: W, keys: Keys) -> Self {
        PwPckWriter { inner, keys }
    }

    /// Pack every regular file under `source`, ordered lexicographically by
    /// archive path.
    pub fn pack(&mut self, source: impl AsRef<Path>, level: u32) -> Result<()> {
        let source = source.as_ref();
        let files = collect_files(source)?;

        self.write_header()?;
        let mut table = Vec::with_capacity(files.len());
        for (archive_path, disk_path) in files {
            let data = fs::read(&disk_path)?;
            table.push(self.write_payload(archive_path, &data, level)?);
        }
        self.finish(&table, level)
    }

    /// Pack in-memory files, in the order the iterator yields them.
    pub fn pack_files<I>(&mut self, files: I, level: u32) -> Result<()>
    where
        I: IntoIterator<Item = (String, Vec<u8>)>,
    {
        self.write_header()?;
        let mut table = Vec::new();
        for (archive_path, data) in files {
            table.push(self.write_payload(archive_path, &data, level)?);
        }
        self.finish(&table, level)
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    fn write_header(&mut self) -> Result<()> {
        self.inner.write_u32::<LE>(PW_FSIG_1)?;
        // total archive length, patched in finish()
        self.inner.write_u32::<LE>(0)?;
        self.inner.write_u32::<LE>(PW_FSIG_2)?;
        Ok(())
    }

    fn write_payload(&mut self, path: String, data: &[u8], level: u32) -> Result<PwFileTableEntry> {
        let data_offset = self.position()?;
        let payload = compression::deflate_payload(data, level)?;
        self.inner.write_all(payload.bytes())?;

        Ok(PwFileTableEntry::new(
            path,
            data_offset,
            data.len() as i32,
            payload.len() as i32,
        ))
    }

    fn finish(&mut self, table: &[PwFileTableEntry], level: u32) -> Result<()> {
        let file_table_pointer = self.position()?;
        for entry in table {
            let record = entry.to_bytes(level)?;
            let record_len = record.len() as i32;
            self.inner.write_i32::<LE>(record_len ^ self.keys.key1 as i32)?;
            self.inner.write_i32::<LE>(record_len ^ self.keys.key2 as i32)?;
            self.inner.write_all(&record)?;
        }

        self.inner.write_u32::<LE>(PW_ASIG_1)?;
        self.inner.write_i16::<LE>(keys::VERSION_MAJOR)?;
        self.inner.write_i16::<LE>(keys::VERSION_MINOR)?;
        // the instance key, not the stock one as in the classic trailer
        self.inner.write_u32::<LE>(file_table_pointer ^ self.keys.key1)?;
        self.write_banner()?;
        self.inner.write_u32::<LE>(PW_ASIG_2)?;
        self.inner.write_i32::<LE>(table.len() as i32)?;
        self.inner.write_i16::<LE>(keys::VERSION_MAJOR)?;
        self.inner.write_i16::<LE>(keys::VERSION_MINOR)?;

        let total = self.position()?;
        self.inner.seek(SeekFrom::Start(4))?;
        self.inner.write_u32::<LE>(total)?;
        self.inner.seek(SeekFrom::End(0))?;
        Ok(())
    }

    fn write_banner(&mut self) -> Result<()> {
        let mut banner = [0u8; PW_BANNER_SIZE];
        banner[..keys::COPYRIGHT.len()].copy_from_slice(keys::COPYRIGHT.as_bytes());
        self.inner.write_all(&banner)?;
        Ok(())
    }

    fn position(&mut self) -> Result<u32> {
        let position = self.inner.stream_position()?;
        u32::try_from(position).map_err(|_| PckError::OffsetOverflow(position))
    }
}
