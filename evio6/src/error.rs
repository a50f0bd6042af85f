use thiserror::Error;

use crate::types::Compression;

#[derive(Error, Debug)]
pub enum EvioError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("magic 0x{0:08X} matches 0xC0DA0100 in neither byte order")]
    BadMagic(u32),

    #[error("unsupported EVIO version {0} (only version 6 is supported)")]
    UnsupportedVersion(u32),

    #[error("bad header: {0}")]
    BadHeader(String),

    #[error("truncated: need {need} bytes at offset {offset}, mapping ends at {len}")]
    Truncated {
        offset: usize,
        need: usize,
        len: usize,
    },

    #[error("corrupted data: {0}")]
    Corruption(String),

    #[error("record uses {0} compression; compressed records are not supported")]
    UnsupportedCompression(Compression),

    #[error("bad composite format: {0}")]
    BadComposite(String),

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("index {index} out of range (count {count})")]
    OutOfRange { index: usize, count: usize },
}

pub type Result<T> = std::result::Result<T, EvioError>;
