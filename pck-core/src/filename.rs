//! gb2312 path field codec and separator translation.
//!
//! Archive paths always use backslash separators regardless of the host
//! convention, and are stored in a fixed 260-byte NUL-terminated field encoded
//! with the legacy gb2312 multi-byte encoding (`encoding_rs` maps that label to
//! its GBK superset).

use std::path::{Component, Path, PathBuf};

use encoding_rs::GBK;

use crate::error::{PckError, Result};

pub const ARCHIVE_SEPARATOR: char = '\\';

/// Encode an archive path into its legacy multi-byte form, terminator excluded.
pub fn encode_path(path: &str) -> Result<Vec<u8>> {
    let (bytes, _, had_errors) = GBK.encode(path);
    if had_errors {
        return Err(PckError::UnencodablePath(path.to_string()));
    }
    Ok(bytes.into_owned())
}

/// Decode a NUL-terminated path field.
pub fn decode_path(field: &[u8]) -> Result<String> {
    let len = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    let (text, _, had_errors) = GBK.decode(&field[..len]);
    if had_errors {
        return Err(PckError::UndecodablePath);
    }
    Ok(text.into_owned())
}

/// Turn a relative filesystem path into an archive path.
pub fn to_archive_path(relative: &Path) -> Result<String> {
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                let part = part
                    .to_str()
                    .ok_or_else(|| PckError::UnencodablePath(relative.display().to_string()))?;
                parts.push(part);
            }
            _ => return Err(PckError::UnencodablePath(relative.display().to_string())),
        }
    }
    Ok(parts.join("\\"))
}

/// Turn an archive path into a host path relative to the extraction root.
pub fn to_host_path(archive_path: &str) -> PathBuf {
    archive_path.split(ARCHIVE_SEPARATOR).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gb2312_round_trip() {
        let path = "data\\中文\\模型.mox";
        let encoded = encode_path(path).unwrap();
        // 10 ASCII bytes plus two bytes per CJK character
        assert_eq!(encoded.len(), 18);
        assert_eq!(decode_path(&encoded).unwrap(), path);
    }

    #[test]
    fn test_decode_stops_at_terminator() {
        let mut field = [0u8; 260];
        field[..5].copy_from_slice(b"a.txt");
        field[6] = b'x';
        assert_eq!(decode_path(&field).unwrap(), "a.txt");
    }

    #[test]
    fn test_host_path_translation() {
        let host = to_host_path("models\\npc\\guard.mox");
        let mut expected = PathBuf::from("models");
        expected.push("npc");
        expected.push("guard.mox");
        assert_eq!(host, expected);
    }

    #[test]
    fn test_archive_path_from_components() {
        let mut relative = PathBuf::from("dir");
        relative.push("b.bin");
        assert_eq!(to_archive_path(&relative).unwrap(), "dir\\b.bin");
    }
}
