use std::fs;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use byteorder::{LE, ReadBytesExt};

use crate::compression;
use crate::error::{PckError, Result};
use crate::filename;
use crate::keys::{self, Keys};
use crate::pck::PayloadKind;

use super::{PwFileTableEntry, PwPckType};

/// Reader for PW archives.
///
/// Same shape as the classic reader, except the table pointer is an unsigned
/// field, the table carries no per-record zero separator and payloads inflate
/// from DEFLATE streams.
pub struct PwPckReader<R> {
    reader: R,
    keys: Keys,
    archive_len: u64,
    file_count: u32,
    file_table_pointer: u32,
    file_table: Vec<PwFileTableEntry>,
}

impl<R> PwPckReader<R>
where
    R: Read + Seek,
{
    /// Open an archive with the stock PW keys.
    pub fn open(reader: R) -> Result<Self> {
        Self::open_with_keys(reader, Keys::PW)
    }

    pub fn open_with_keys(mut reader: R, keys: Keys) -> Result<Self> {
        let archive_len = reader.seek(SeekFrom::End(0))?;
        if archive_len < keys::HEADER_SIZE + keys::TRAILER_SIZE {
            return Err(PckError::Truncated(archive_len));
        }

        reader.seek(SeekFrom::Start(archive_len - keys::COUNT_ANCHOR))?;
        let file_count = reader.read_i32::<LE>()?;
        if file_count < 0 {
            return Err(PckError::InvalidFileCount(file_count));
        }

        reader.seek(SeekFrom::Start(archive_len - keys::TABLE_POINTER_ANCHOR))?;
        // unlike the classic trailer, the pointer field is unsigned
        let file_table_pointer = reader.read_u32::<LE>()? ^ keys.key1;
        if file_table_pointer as u64 >= archive_len {
            return Err(PckError::InvalidTablePointer {
                pointer: file_table_pointer,
                len: archive_len,
            });
        }

        let mut this = PwPckReader {
            reader,
            keys,
            archive_len,
            file_count: file_count as u32,
            file_table_pointer,
            file_table: Vec::new(),
        };
        this.read_file_table()?;
        Ok(this)
    }

    /// Infer the archive sub-type.
    ///
    /// Declared by the reference tool but never implemented there; always
    /// returns [`PwPckType::Undefined`]. Entries keep their on-disk record size
    /// instead, which is what the writer needs for identical round trips.
    pub fn detect_type(&self) -> PwPckType {
        PwPckType::Undefined
    }

    fn read_file_table(&mut self) -> Result<()> {
        self.reader.seek(SeekFrom::Start(self.file_table_pointer as u64))?;

        let mut table = Vec::with_capacity(self.file_count as usize);
        for _ in 0..self.file_count {
            // first length copy is masked with key1; the reference reader never
            // checks it
            self.reader.seek(SeekFrom::Current(4))?;
            let record_len = self.reader.read_i32::<LE>()? ^ self.keys.key2 as i32;
            if record_len <= 0 || record_len as u64 > self.archive_len {
                return Err(PckError::InvalidEntrySize(record_len));
            }

            let mut record = vec![0u8; record_len as usize];
            self.reader.read_exact(&mut record)?;
            table.push(PwFileTableEntry::from_bytes(&record)?);
        }

        self.file_table = table;
        Ok(())
    }

    pub fn entries(&self) -> &[PwFileTableEntry] {
        &self.file_table
    }

    pub fn file_count(&self) -> u32 {
        self.file_count
    }

    pub fn file_table_pointer(&self) -> u32 {
        self.file_table_pointer
    }

    /// Read one payload, inflating it when the size fields say it is compressed.
    pub fn read_file(&mut self, entry: &PwFileTableEntry) -> Result<Vec<u8>> {
        self.reader.seek(SeekFrom::Start(entry.data_offset as u64))?;
        let mut data = vec![0u8; entry.data_compressed_size as usize];
        self.reader.read_exact(&mut data)?;

        match entry.payload_kind() {
            PayloadKind::Stored => Ok(data),
            PayloadKind::Compressed => compression::inflate(&data).map_err(|source| PckError::Decompression {
                path: entry.path.clone(),
                source,
            }),
        }
    }

    /// Extract every entry under `target_dir`; first failure aborts with no
    /// rollback.
    pub fn extract_all(&mut self, target_dir: impl AsRef<Path>) -> Result<()> {
        let target_dir = target_dir.as_ref();
        fs::create_dir_all(target_dir)?;

        for index in 0..self.file_table.len() {
            let entry = self.file_table[index].clone();
            let data = self.read_file(&entry)?;

            let full_path = target_dir.join(filename::to_host_path(&entry.path));
            if let Some(parent) = full_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(full_path, data)?;
        }
        Ok(())
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}
