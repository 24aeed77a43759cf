pub mod compression;
pub mod error;
pub mod filename;
pub mod keys;
pub mod pck;
pub mod pw;
pub mod read;
pub mod write;
