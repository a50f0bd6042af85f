use crate::error::{EvioError, Result};
use crate::words::{bits, Endian};

/// File type id in word 0: "EVIO" in ASCII.
pub const FILE_TYPE_ID: u32 = 0x4556_494F;

/// Nominal file header length in 32-bit words. Extended header kinds may
/// carry more; `header_words` is always read from the header itself.
pub const FILE_HEADER_WORDS: u32 = 14;

/// File header kind (bit-info word, bits 28-31).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Evio,
    EvioExtended,
    Hipo,
    HipoExtended,
}

impl FileKind {
    pub fn from_code(code: u32) -> Option<FileKind> {
        match code {
            1 => Some(FileKind::Evio),
            2 => Some(FileKind::EvioExtended),
            5 => Some(FileKind::Hipo),
            6 => Some(FileKind::HipoExtended),
            _ => None,
        }
    }

    pub fn code(self) -> u32 {
        match self {
            FileKind::Evio => 1,
            FileKind::EvioExtended => 2,
            FileKind::Hipo => 5,
            FileKind::HipoExtended => 6,
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileKind::Evio => f.write_str("evio"),
            FileKind::EvioExtended => f.write_str("evio-extended"),
            FileKind::Hipo => f.write_str("hipo"),
            FileKind::HipoExtended => f.write_str("hipo-extended"),
        }
    }
}

/// The 14-word file header at offset 0.
///
/// Word layout: 0 file-type-id, 1 file-number, 2 header-length-words,
/// 3 record-count, 4 index-array bytes, 5 bit-info+version, 6 user-header
/// bytes, 7 magic, 8-9 user register, 10-11 trailer position, 12-13 user
/// ints. The byte order is elected from word 7 before anything else is read.
#[derive(Debug, Clone)]
pub struct FileHeader {
    pub endian: Endian,
    pub file_number: u32,
    pub header_words: u32,
    pub record_count: u32,
    pub index_bytes: u32,
    pub version: u32,
    pub has_dictionary: bool,
    pub has_first_event: bool,
    pub trailer_has_index: bool,
    pub user_header_pad: u32,
    pub kind: FileKind,
    pub user_header_bytes: u32,
    pub user_register: u64,
    pub trailer_position: u64,
    pub user_int1: u32,
    pub user_int2: u32,
}

impl FileHeader {
    /// Parse the file header from the start of the mapping.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let endian = Endian::detect(data, 7 * 4)?;

        let file_type_id = endian.read_u32(data, 0)?;
        if file_type_id != FILE_TYPE_ID {
            return Err(EvioError::BadHeader(format!(
                "file type id 0x{file_type_id:08X}, expected 0x{FILE_TYPE_ID:08X}"
            )));
        }

        let file_number = endian.read_u32(data, 4)?;
        let header_words = endian.read_u32(data, 2 * 4)?;
        if header_words < FILE_HEADER_WORDS {
            return Err(EvioError::BadHeader(format!(
                "file header length {header_words} words, expected at least {FILE_HEADER_WORDS}"
            )));
        }

        let record_count = endian.read_u32(data, 3 * 4)?;
        let index_bytes = endian.read_u32(data, 4 * 4)?;
        if index_bytes % 4 != 0 {
            return Err(EvioError::Corruption(format!(
                "file index array length {index_bytes} is not word aligned"
            )));
        }

        let bit_info = endian.read_u32(data, 5 * 4)?;
        let version = bits(bit_info, 0, 7);
        if version != 6 {
            return Err(EvioError::UnsupportedVersion(version));
        }
        let kind_code = bits(bit_info, 28, 31);
        let kind = FileKind::from_code(kind_code)
            .ok_or_else(|| EvioError::BadHeader(format!("file header kind code {kind_code}")))?;

        let user_header_bytes = endian.read_u32(data, 6 * 4)?;
        let user_register = endian.read_u64(data, 8 * 4)?;
        let trailer_position = endian.read_u64(data, 10 * 4)?;
        let user_int1 = endian.read_u32(data, 12 * 4)?;
        let user_int2 = endian.read_u32(data, 13 * 4)?;

        Ok(FileHeader {
            endian,
            file_number,
            header_words,
            record_count,
            index_bytes,
            version,
            has_dictionary: bits(bit_info, 8, 8) != 0,
            has_first_event: bits(bit_info, 9, 9) != 0,
            trailer_has_index: bits(bit_info, 10, 10) != 0,
            user_header_pad: bits(bit_info, 20, 21),
            kind,
            user_header_bytes,
            user_register,
            trailer_position,
            user_int1,
            user_int2,
        })
    }

    /// Byte offset of the file's record-length index array.
    pub fn index_offset(&self) -> usize {
        self.header_words as usize * 4
    }

    /// Byte offset of the user header region.
    pub fn user_header_offset(&self) -> usize {
        self.index_offset() + self.index_bytes as usize
    }

    /// User header length including its trailing pad.
    pub fn user_header_padded(&self) -> usize {
        self.user_header_bytes as usize + self.user_header_pad as usize
    }

    /// Byte offset of the first record.
    pub fn first_record_offset(&self) -> usize {
        self.user_header_offset() + self.user_header_padded()
    }
}
