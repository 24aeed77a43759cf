use std::fs;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use byteorder::{LE, ReadBytesExt};

use crate::compression;
use crate::error::{PckError, Result};
use crate::filename;
use crate::keys::{self, Keys};
use crate::pck::{FileTableEntry, PayloadKind};

/// Reader for classic archives.
///
/// Parses the trailer anchors, decodes the whole file table up front and streams
/// individual payloads on demand. All I/O against one instance is strictly
/// sequential; independent instances share nothing.
pub struct PckReader<R> {
    reader: R,
    keys: Keys,
    archive_len: u64,
    file_count: u32,
    file_table_pointer: u32,
    file_table: Vec<FileTableEntry>,
}

impl<R> PckReader<R>
where
    R: Read + Seek,
{
    /// Open an archive with the stock keys.
    pub fn open(reader: R) -> Result<Self> {
        Self::open_with_keys(reader, Keys::CLASSIC)
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
        // the classic trailer pointer is read as a signed field
        let file_table_pointer = (reader.read_i32::<LE>()? ^ keys.key1 as i32) as u32;
        if file_table_pointer as u64 >= archive_len {
            return Err(PckError::InvalidTablePointer {
                pointer: file_table_pointer,
                len: archive_len,
            });
        }

        let mut this = PckReader {
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
            table.push(FileTableEntry::from_bytes(&record)?);

            // zero separator the classic writer puts after every record
            self.reader.seek(SeekFrom::Current(4))?;
        }

        self.file_table = table;
        Ok(())
    }

    pub fn entries(&self) -> &[FileTableEntry] {
        &self.file_table
    }

    pub fn file_count(&self) -> u32 {
        self.file_count
    }

    pub fn file_table_pointer(&self) -> u32 {
        self.file_table_pointer
    }

    /// Read one payload, inflating it when the size fields say it is compressed.
    pub fn read_file(&mut self, entry: &FileTableEntry) -> Result<Vec<u8>> {
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

    /// Extract every entry under `target_dir`, translating archive separators to
    /// the host convention. The first failure aborts; files already written stay
    /// on disk.
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
