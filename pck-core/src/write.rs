use std::fs;
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use byteorder::{LE, WriteBytesExt};
use walkdir::WalkDir;

use crate::compression;
use crate::error::{PckError, Result};
use crate::filename;
use crate::keys::{self, Keys};
use crate::pck::FileTableEntry;

/// Writer for classic archives.
///
/// Serializes a directory tree as header, payload region, file table and
/// trailer, patching the total length back into the header once everything is
/// written.
pub struct PckWriter<W: Write + Seek> {
    inner: W,
    keys: Keys,
}

impl<W: Write + Seek> PckWriter<W> {
    pub fn new(inner: W) -> Self {
        Self::with_keys(inner, Keys::CLASSIC)
    }

    pub fn with_keys(inner: W, keys: Keys) -> Self {
        PckWriter { inner, keys }
    }

    /// Pack every regular file under `source`, ordered lexicographically by
    /// archive path.
    ///
    /// The reference writer's order is filesystem-dependent; the fixed order
    /// keeps output deterministic but is not guaranteed to bit-match legacy
    /// archives.
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
        self.inner.write_u32::<LE>(keys::FSIG_1)?;
        // total archive length, patched in finish()
        self.inner.write_u32::<LE>(0)?;
        self.inner.write_u32::<LE>(keys::FSIG_2)?;
        Ok(())
    }

    fn write_payload(&mut self, path: String, data: &[u8], level: u32) -> Result<FileTableEntry> {
        let data_offset = self.position()?;
        let payload = compression::gzip_payload(data, level)?;
        self.inner.write_all(payload.bytes())?;

        Ok(FileTableEntry {
            path,
            data_offset,
            data_decompressed_size: data.len() as i32,
            data_compressed_size: payload.len() as i32,
        })
    }

    fn finish(&mut self, table: &[FileTableEntry], level: u32) -> Result<()> {
        let file_table_pointer = self.position()?;
        for entry in table {
            let record = entry.to_bytes(level)?;
            let record_len = record.len() as i32;
            self.inner.write_i32::<LE>(record_len ^ self.keys.key1 as i32)?;
            self.inner.write_i32::<LE>(record_len ^ self.keys.key2 as i32)?;
            self.inner.write_all(&record)?;
            // zero separator after every record
            self.inner.write_i32::<LE>(0)?;
        }

        self.inner.write_u32::<LE>(keys::ASIG_1)?;
        self.inner.write_i16::<LE>(keys::VERSION_MAJOR)?;
        self.inner.write_i16::<LE>(keys::VERSION_MINOR)?;
        // the reference writer masks the pointer with the stock key even when the
        // instance carries an override
        self.inner.write_u32::<LE>(file_table_pointer ^ keys::KEY_1)?;
        self.inner.write_i32::<LE>(0)?;
        self.write_banner()?;
        self.inner.write_u32::<LE>(keys::ASIG_2)?;
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
        let mut banner = [0u8; keys::BANNER_SIZE];
        banner[..keys::COPYRIGHT.len()].copy_from_slice(keys::COPYRIGHT.as_bytes());
        self.inner.write_all(&banner)?;
        Ok(())
    }

    fn position(&mut self) -> Result<u32> {
        let position = self.inner.stream_position()?;
        u32::try_from(position).map_err(|_| PckError::OffsetOverflow(position))
    }
}

/// Enumerate regular files under `source` as `(archive path, disk path)` pairs,
/// sorted lexicographically by archive path.
pub(crate) fn collect_files(source: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(source) {
        let entry = entry.map_err(|e| PckError::IO(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        files.push((filename::to_archive_path(relative)?, entry.path().to_path_buf()));
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use byteorder::ReadBytesExt;

    use super::*;
    use crate::pck::PayloadKind;
    use crate::read::PckReader;

    fn read_u32_at(buf: &[u8], at: usize) -> u32 {
        (&buf[at..at + 4]).read_u32::<LE>().unwrap()
    }

    fn read_i32_at(buf: &[u8], at: usize) -> i32 {
        (&buf[at..at + 4]).read_i32::<LE>().unwrap()
    }

    #[test]
    fn test_pack_two_files_layout_and_read_back() {
        let files = [
            ("a.txt".to_string(), b"AAAAA".to_vec()),
            ("dir\\b.bin".to_string(), vec![0u8; 10]),
        ];
        let mut writer = PckWriter::new(Cursor::new(Vec::new()));
        writer.pack_files(files, 6).unwrap();
        let buf = writer.into_inner().into_inner();
        let len = buf.len();

        // header with the patched total length
        assert_eq!(read_u32_at(&buf, 0), keys::FSIG_1);
        assert_eq!(read_u32_at(&buf, 4), len as u32);
        assert_eq!(read_u32_at(&buf, 8), keys::FSIG_2);

        // both payloads are too small to shrink under gzip, so they are stored
        // verbatim right after the header
        assert_eq!(&buf[12..17], b"AAAAA");
        assert_eq!(&buf[17..27], &[0u8; 10]);

        // trailer anchors
        assert_eq!(read_i32_at(&buf, len - 8), 2);
        let pointer = read_u32_at(&buf, len - 272) ^ keys::KEY_1;
        assert_eq!(pointer, 27);
        assert_eq!(read_u32_at(&buf, len - 280), keys::ASIG_1);
        assert_eq!(read_u32_at(&buf, len - 12), keys::ASIG_2);
        assert_eq!(&buf[len - 264..len - 264 + keys::COPYRIGHT.len()], keys::COPYRIGHT.as_bytes());
        assert_eq!(&buf[len - 4..], &[2, 0, 2, 0]);

        // read back
        let mut reader = PckReader::open(Cursor::new(buf)).unwrap();
        assert_eq!(reader.file_count(), 2);
        assert_eq!(reader.file_table_pointer(), 27);

        let entries = reader.entries().to_vec();
        assert_eq!(entries[0].path, "a.txt");
        assert_eq!(entries[0].data_offset, 12);
        assert_eq!(entries[0].payload_kind(), PayloadKind::Stored);
        assert_eq!(entries[1].path, "dir\\b.bin");

        assert_eq!(reader.read_file(&entries[0]).unwrap(), b"AAAAA");
        assert_eq!(reader.read_file(&entries[1]).unwrap(), vec![0u8; 10]);
    }

    #[test]
    fn test_compressible_payload_round_trip() {
        let zeros = vec![0u8; 10_000];
        let mut writer = PckWriter::new(Cursor::new(Vec::new()));
        writer
            .pack_files([("zeros.bin".to_string(), zeros.clone())], 9)
            .unwrap();

        let mut reader = PckReader::open(writer.into_inner()).unwrap();
        let entry = reader.entries()[0].clone();
        assert!(entry.data_compressed_size < entry.data_decompressed_size);
        assert_eq!(entry.payload_kind(), PayloadKind::Compressed);
        assert_eq!(reader.read_file(&entry).unwrap(), zeros);
    }

    #[test]
    fn test_incompressible_payload_stored_verbatim() {
        // an already-gzipped blob does not shrink again
        let blob = compression::gzip(&vec![0u8; 4096], 9).unwrap();
        let mut writer = PckWriter::new(Cursor::new(Vec::new()));
        writer.pack_files([("blob.gz".to_string(), blob.clone())], 9).unwrap();

        let mut reader = PckReader::open(writer.into_inner()).unwrap();
        let entry = reader.entries()[0].clone();
        assert_eq!(entry.data_compressed_size, entry.data_decompressed_size);
        assert_eq!(reader.read_file(&entry).unwrap(), blob);
    }

    #[test]
    fn test_empty_archive_round_trip() {
        let mut writer = PckWriter::new(Cursor::new(Vec::new()));
        writer.pack_files(std::iter::empty(), 6).unwrap();
        let buf = writer.into_inner().into_inner();
        assert_eq!(buf.len() as u64, keys::HEADER_SIZE + keys::TRAILER_SIZE);

        let reader = PckReader::open(Cursor::new(buf)).unwrap();
        assert_eq!(reader.file_count(), 0);
        assert!(reader.entries().is_empty());
    }

    #[test]
    fn test_key_override_masks_records_but_not_trailer_pointer() {
        let custom = Keys::new(0x1111_1111, 0x2222_2222);
        let mut writer = PckWriter::with_keys(Cursor::new(Vec::new()), custom);
        writer
            .pack_files([("a.txt".to_string(), b"AAAAA".to_vec())], 6)
            .unwrap();
        let buf = writer.into_inner().into_inner();

        // quirk: the trailer pointer is still masked with the stock key, so the
        // archive reads back with the stock key1 and the custom key2
        let mixed = Keys::new(keys::KEY_1, custom.key2);
        let mut reader = PckReader::open_with_keys(Cursor::new(buf.clone()), mixed).unwrap();
        let entry = reader.entries()[0].clone();
        assert_eq!(reader.read_file(&entry).unwrap(), b"AAAAA");

        // while the record lengths in the table are masked with the custom keys
        let pointer = (read_u32_at(&buf, buf.len() - 272) ^ keys::KEY_1) as usize;
        let record_len = read_i32_at(&buf, pointer + 4) ^ custom.key2 as i32;
        assert!(record_len > 0 && (record_len as usize) < buf.len());
        assert_eq!(read_i32_at(&buf, pointer) ^ custom.key1 as i32, record_len);
    }

    #[test]
    fn test_oversized_path_aborts_before_trailer() {
        let files = [("中".repeat(131), b"data".to_vec())];
        let mut writer = PckWriter::new(Cursor::new(Vec::new()));
        let result = writer.pack_files(files, 6);
        assert!(matches!(result, Err(PckError::InvalidPathSize { .. })));
    }
}
