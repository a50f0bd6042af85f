use std::fmt;

/// Content type codes carried in every container header.
///
/// The numeric codes are fixed by the wire format; any new code is added
/// here and nowhere else. Codes 0x21..=0x24 only ever occur inside composite
/// format descriptors and are rejected as top-level bank content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// 32-bit words of unknown meaning, surfaced verbatim (never swapped)
    Unknown32,
    Uint32,
    Float32,
    /// NUL-separated ASCII string array, 0x04-terminated
    StringArray,
    Int16,
    Uint16,
    Int8,
    Uint8,
    Float64,
    Int64,
    Uint64,
    Int32,
    TagSegment,
    Segment,
    Bank,
    Composite,
    AlsoBank,
    AlsoSegment,
    /// Composite-only: i32 holding 4 ASCII chars
    Hollerit,
    /// Composite-only: repeat count read from the data stream as i32
    NValue,
    /// Composite-only: repeat count read from the data stream as i16
    ShortNValue,
    /// Composite-only: repeat count read from the data stream as i8
    ByteNValue,
}

impl DataType {
    pub fn from_code(code: u32) -> Option<DataType> {
        match code {
            0x0 => Some(DataType::Unknown32),
            0x1 => Some(DataType::Uint32),
            0x2 => Some(DataType::Float32),
            0x3 => Some(DataType::StringArray),
            0x4 => Some(DataType::Int16),
            0x5 => Some(DataType::Uint16),
            0x6 => Some(DataType::Int8),
            0x7 => Some(DataType::Uint8),
            0x8 => Some(DataType::Float64),
            0x9 => Some(DataType::Int64),
            0xa => Some(DataType::Uint64),
            0xb => Some(DataType::Int32),
            0xc => Some(DataType::TagSegment),
            0xd => Some(DataType::Segment),
            0xe => Some(DataType::Bank),
            0xf => Some(DataType::Composite),
            0x10 => Some(DataType::AlsoBank),
            0x20 => Some(DataType::AlsoSegment),
            0x21 => Some(DataType::Hollerit),
            0x22 => Some(DataType::NValue),
            0x23 => Some(DataType::ShortNValue),
            0x24 => Some(DataType::ByteNValue),
            _ => None,
        }
    }

    pub fn code(self) -> u32 {
        match self {
            DataType::Unknown32 => 0x0,
            DataType::Uint32 => 0x1,
            DataType::Float32 => 0x2,
            DataType::StringArray => 0x3,
            DataType::Int16 => 0x4,
            DataType::Uint16 => 0x5,
            DataType::Int8 => 0x6,
            DataType::Uint8 => 0x7,
            DataType::Float64 => 0x8,
            DataType::Int64 => 0x9,
            DataType::Uint64 => 0xa,
            DataType::Int32 => 0xb,
            DataType::TagSegment => 0xc,
            DataType::Segment => 0xd,
            DataType::Bank => 0xe,
            DataType::Composite => 0xf,
            DataType::AlsoBank => 0x10,
            DataType::AlsoSegment => 0x20,
            DataType::Hollerit => 0x21,
            DataType::NValue => 0x22,
            DataType::ShortNValue => 0x23,
            DataType::ByteNValue => 0x24,
        }
    }

    /// Element size in bytes for leaf types; `None` for container types.
    pub fn element_size(self) -> Option<usize> {
        match self {
            DataType::Int8 | DataType::Uint8 | DataType::StringArray | DataType::ByteNValue => {
                Some(1)
            }
            DataType::Int16 | DataType::Uint16 | DataType::ShortNValue => Some(2),
            DataType::Unknown32
            | DataType::Uint32
            | DataType::Int32
            | DataType::Float32
            | DataType::Hollerit
            | DataType::NValue => Some(4),
            DataType::Float64 | DataType::Int64 | DataType::Uint64 => Some(8),
            DataType::TagSegment
            | DataType::Segment
            | DataType::Bank
            | DataType::AlsoBank
            | DataType::AlsoSegment
            | DataType::Composite => None,
        }
    }

    pub fn is_container(self) -> bool {
        matches!(
            self,
            DataType::TagSegment
                | DataType::Segment
                | DataType::Bank
                | DataType::AlsoBank
                | DataType::AlsoSegment
        )
    }

    /// True for the codes legal only inside composite format descriptors.
    pub fn is_composite_only(self) -> bool {
        matches!(
            self,
            DataType::Hollerit | DataType::NValue | DataType::ShortNValue | DataType::ByteNValue
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            DataType::Unknown32 => "unknown32",
            DataType::Uint32 => "uint32",
            DataType::Float32 => "float32",
            DataType::StringArray => "string",
            DataType::Int16 => "int16",
            DataType::Uint16 => "uint16",
            DataType::Int8 => "int8",
            DataType::Uint8 => "uint8",
            DataType::Float64 => "float64",
            DataType::Int64 => "int64",
            DataType::Uint64 => "uint64",
            DataType::Int32 => "int32",
            DataType::TagSegment => "tagsegment",
            DataType::Segment => "segment",
            DataType::Bank => "bank",
            DataType::Composite => "composite",
            DataType::AlsoBank => "bank",
            DataType::AlsoSegment => "segment",
            DataType::Hollerit => "hollerit",
            DataType::NValue => "N",
            DataType::ShortNValue => "n",
            DataType::ByteNValue => "m",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Record compression codes (record header word 9, high nibble).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Lz4Fast,
    Lz4Best,
    Gzip,
    Unknown(u8),
}

impl From<u8> for Compression {
    fn from(v: u8) -> Self {
        match v {
            0 => Compression::None,
            1 => Compression::Lz4Fast,
            2 => Compression::Lz4Best,
            3 => Compression::Gzip,
            other => Compression::Unknown(other),
        }
    }
}

impl Compression {
    pub fn code(self) -> u8 {
        match self {
            Compression::None => 0,
            Compression::Lz4Fast => 1,
            Compression::Lz4Best => 2,
            Compression::Gzip => 3,
            Compression::Unknown(v) => v,
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compression::None => f.write_str("none"),
            Compression::Lz4Fast => f.write_str("lz4"),
            Compression::Lz4Best => f.write_str("lz4-best"),
            Compression::Gzip => f.write_str("gzip"),
            Compression::Unknown(v) => write!(f, "unknown({v})"),
        }
    }
}
