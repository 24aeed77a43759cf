//! Obfuscation keys and fixed layout constants of the classic format.

/// XOR keys masking the length and pointer fields scattered through the header,
/// table and trailer. Per-instance configuration, not process-wide state; they
/// defend against casual tooling, nothing more.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keys {
    pub key1: u32,
    pub key2: u32,
}

impl Keys {
    /// Stock keys of the classic format.
    pub const CLASSIC: Keys = Keys { key1: KEY_1, key2: KEY_2 };

    pub fn new(key1: u32, key2: u32) -> Self {
        Keys { key1, key2 }
    }
}

impl Default for Keys {
    fn default() -> Self {
        Self::CLASSIC
    }
}

/// Masks the table pointer and the first copy of each record length.
pub const KEY_1: u32 = 0xA893_7462;
/// Masks the second copy of each record length.
pub const KEY_2: u32 = 0xF1A4_3653;

/// Header signature A, at offset 0.
pub const FSIG_1: u32 = 0x4DCA_23EF;
/// Header signature B, at offset 8.
pub const FSIG_2: u32 = 0x56A0_89B7;
/// Trailer signature C, opening the trailer.
pub const ASIG_1: u32 = 0xFDFD_FEEE;
/// Trailer signature D, preceding the entry count.
pub const ASIG_2: u32 = 0xF00D_BEEF;

/// Format version, written twice into the trailer.
pub const VERSION_MAJOR: i16 = 2;
pub const VERSION_MINOR: i16 = 2;

/// ASCII banner text, zero-padded to the variant's banner field size.
pub const COPYRIGHT: &str = "Angelica File Package, Perfect World.";

/// Header size: signature A, total-length placeholder, signature B.
pub const HEADER_SIZE: u64 = 12;
/// Classic trailer size, banner field included.
pub const TRAILER_SIZE: u64 = 280;
/// Classic banner field size.
pub const BANNER_SIZE: usize = 252;

/// Distance of the trailer's entry count from the end of the archive.
pub const COUNT_ANCHOR: u64 = 8;
/// Distance of the masked table pointer from the end of the archive.
pub const TABLE_POINTER_ANCHOR: u64 = 272;
