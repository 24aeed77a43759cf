//! PW revision of the format: DEFLATE instead of GZIP, variable-size table
//! records and a slightly different trailer.

mod entry;
mod read;
mod write;

pub use entry::*;
pub use read::*;
pub use write::*;

use crate::keys::Keys;

impl Keys {
    /// Stock keys of the PW revision.
    pub const PW: Keys = Keys {
        key1: PW_KEY_1,
        key2: PW_KEY_2,
    };
}

/// PW table-length / pointer masks; published values match the classic ones.
pub const PW_KEY_1: u32 = 0xA893_7462;
pub const PW_KEY_2: u32 = 0xF1A4_3653;

/// PW header signatures.
pub const PW_FSIG_1: u32 = 0x4DCA_23EF;
pub const PW_FSIG_2: u32 = 0x56A0_89B7;
/// PW trailer signatures.
pub const PW_ASIG_1: u32 = 0xFDFD_FEEE;
pub const PW_ASIG_2: u32 = 0xF00D_BEEF;

/// PW banner field size; the extra four bytes over the classic field absorb the
/// zero word the classic trailer carries before its banner.
pub const PW_BANNER_SIZE: usize = 256;

/// Sub-type of a PW archive.
///
/// The reference tool declares these but never implemented the inference; see
/// [`PwPckReader::detect_type`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PwPckType {
    #[default]
    Undefined,
    /// Legacy: 272-byte table records, no sub-type tag.
    Type1,
    /// Newer: 276-byte table records with a 4-byte tag after the size fields.
    Type2,
}
