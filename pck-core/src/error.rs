pub type Result<T> = std::result::Result<T, PckError>;

#[derive(Debug, thiserror::Error)]
pub enum PckError {
    #[error("Upstream IO Error: {0}")]
    IO(#[from] std::io::Error),

    #[error("invalid path size: `{path}` encodes to {size} bytes, limit is {limit}")]
    InvalidPathSize { path: String, size: usize, limit: usize },
    #[error("path `{0}` is not representable in the gb2312 table encoding")]
    UnencodablePath(String),
    #[error("undecodable gb2312 path bytes in table record")]
    UndecodablePath,

    #[error("archive too small for a trailer: {0} bytes")]
    Truncated(u64),
    #[error("file table pointer {pointer:#x} is outside the archive ({len} bytes)")]
    InvalidTablePointer { pointer: u32, len: u64 },
    #[error("negative file count in trailer: {0}")]
    InvalidFileCount(i32),
    #[error("inconsistent table record length: {0}")]
    InvalidEntrySize(i32),
    #[error("table record too short: {0} bytes")]
    TruncatedEntry(usize),
    #[error("inconsistent payload sizes for `{path}`: compressed {compressed}, decompressed {decompressed}")]
    InvalidPayloadSizes {
        path: String,
        compressed: i32,
        decompressed: i32,
    },
    #[error("failed to inflate table record: {0}")]
    EntryInflate(#[source] std::io::Error),

    #[error("failed to decompress payload `{path}`: {source}")]
    Decompression { path: String, source: std::io::Error },

    #[error("archive exceeds the 32-bit offset range at {0} bytes")]
    OffsetOverflow(u64),
}
