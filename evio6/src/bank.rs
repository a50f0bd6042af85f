use crate::composite::{parse_composite, CompositeData};
use crate::error::{EvioError, Result};
use crate::types::DataType;
use crate::words::{bits, take, Endian};

/// Header shape of a container, which fixes its width and bit packing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderShape {
    /// Two-word header: length, then tag:16 | pad:2 | type:6 | num:8
    Bank,
    /// One-word header: tag:8 | pad:2 | type:6 | length:16
    Segment,
    /// One-word header: tag:12 | type:4 | length:16
    TagSegment,
}

impl HeaderShape {
    pub fn header_bytes(self) -> usize {
        match self {
            HeaderShape::Bank => 8,
            HeaderShape::Segment | HeaderShape::TagSegment => 4,
        }
    }
}

/// What a node holds: a container of a given child shape, a composite
/// leaf, or a plain typed leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankKind {
    Bank,
    Segment,
    TagSegment,
    Leaf,
    Composite,
}

impl std::fmt::Display for BankKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BankKind::Bank => f.write_str("bank"),
            BankKind::Segment => f.write_str("segment"),
            BankKind::TagSegment => f.write_str("tagsegment"),
            BankKind::Leaf => f.write_str("leaf"),
            BankKind::Composite => f.write_str("composite"),
        }
    }
}

/// The uniform tree node: a borrowed byte range plus the decoded header
/// fields. Children are recomputed on each traversal; nothing is copied.
#[derive(Debug, Clone)]
pub struct BankNode<'a> {
    data: &'a [u8],
    endian: Endian,
    pub offset: usize,
    pub shape: HeaderShape,
    pub tag: u16,
    /// BANK only; 0 for the one-word shapes
    pub num: u8,
    /// Padding bytes at the payload tail, meaningful for 8/16-bit content
    pub pad: u8,
    pub data_type: DataType,
    /// The raw length field: for a BANK the word count excluding word 0
    /// itself; for SEGMENT/TAGSEGMENT the payload word count.
    pub length_words: u32,
    payload_offset: usize,
}

impl<'a> BankNode<'a> {
    /// Parse one container header of the given shape at `offset`.
    pub fn parse(
        data: &'a [u8],
        offset: usize,
        endian: Endian,
        shape: HeaderShape,
    ) -> Result<BankNode<'a>> {
        let (tag, num, pad, type_code, length_words) = match shape {
            HeaderShape::Bank => {
                let length = endian.read_u32(data, offset)?;
                if length < 1 {
                    return Err(EvioError::Corruption(format!(
                        "bank at offset {offset} has length 0"
                    )));
                }
                let word = endian.read_u32(data, offset + 4)?;
                (
                    bits(word, 16, 31) as u16,
                    bits(word, 0, 7) as u8,
                    bits(word, 14, 15) as u8,
                    bits(word, 8, 13),
                    length,
                )
            }
            HeaderShape::Segment => {
                let word = endian.read_u32(data, offset)?;
                (
                    bits(word, 24, 31) as u16,
                    0,
                    bits(word, 22, 23) as u8,
                    bits(word, 16, 21),
                    bits(word, 0, 15),
                )
            }
            HeaderShape::TagSegment => {
                let word = endian.read_u32(data, offset)?;
                (
                    bits(word, 20, 31) as u16,
                    0,
                    0,
                    bits(word, 16, 19),
                    bits(word, 0, 15),
                )
            }
        };

        let data_type = DataType::from_code(type_code).ok_or_else(|| {
            EvioError::Corruption(format!(
                "unknown content type 0x{type_code:02X} at offset {offset}"
            ))
        })?;
        if data_type.is_composite_only() {
            return Err(EvioError::Corruption(format!(
                "content type 0x{type_code:02X} at offset {offset} is only legal inside composite data"
            )));
        }

        let node = BankNode {
            data,
            endian,
            offset,
            shape,
            tag,
            num,
            pad,
            data_type,
            length_words,
            payload_offset: offset + shape.header_bytes(),
        };

        // The full span must fit the mapping.
        take(data, offset, node.full_span())?;
        node.check_pad()?;
        Ok(node)
    }

    fn check_pad(&self) -> Result<()> {
        let legal = match self.data_type.element_size() {
            Some(1) => self.pad <= 3,
            Some(2) => self.pad == 0 || self.pad == 2,
            _ => self.pad == 0,
        };
        if !legal {
            return Err(EvioError::Corruption(format!(
                "pad {} is illegal for {} content at offset {}",
                self.pad, self.data_type, self.offset
            )));
        }
        if self.pad as usize > self.payload_bytes() {
            return Err(EvioError::Corruption(format!(
                "pad {} exceeds payload {} at offset {}",
                self.pad,
                self.payload_bytes(),
                self.offset
            )));
        }
        Ok(())
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Payload length in words (for a BANK, without the second header word).
    pub fn payload_words(&self) -> u32 {
        match self.shape {
            HeaderShape::Bank => self.length_words - 1,
            HeaderShape::Segment | HeaderShape::TagSegment => self.length_words,
        }
    }

    /// Raw payload bytes, including the pad tail.
    pub fn payload_bytes(&self) -> usize {
        self.payload_words() as usize * 4
    }

    /// Full span of the node, header included.
    pub fn full_span(&self) -> usize {
        (self.length_words as usize + 1) * 4
    }

    /// Data length in bytes: the payload minus the pad tail for 8/16-bit
    /// element types.
    pub fn data_len(&self) -> Result<usize> {
        match self.data_type.element_size() {
            Some(1) | Some(2) => {
                self.payload_bytes()
                    .checked_sub(self.pad as usize)
                    .ok_or_else(|| {
                        EvioError::Corruption(format!(
                            "pad {} exceeds payload {} at offset {}",
                            self.pad,
                            self.payload_bytes(),
                            self.offset
                        ))
                    })
            }
            _ => Ok(self.payload_bytes()),
        }
    }

    pub fn data_offset(&self) -> usize {
        self.payload_offset
    }

    pub fn data(&self) -> Result<&'a [u8]> {
        take(self.data, self.payload_offset, self.data_len()?)
    }

    pub fn kind(&self) -> BankKind {
        match self.data_type {
            DataType::Bank | DataType::AlsoBank => BankKind::Bank,
            DataType::Segment | DataType::AlsoSegment => BankKind::Segment,
            DataType::TagSegment => BankKind::TagSegment,
            DataType::Composite => BankKind::Composite,
            _ => BankKind::Leaf,
        }
    }

    pub fn is_container(&self) -> bool {
        self.data_type.is_container()
    }

    /// Iterate the child banks. Non-containers yield an empty iterator.
    /// Children must exactly tile the payload; an overshoot is reported as
    /// `Corruption` and ends the iteration.
    pub fn children(&self) -> Children<'a> {
        let child_shape = match self.data_type {
            DataType::Bank | DataType::AlsoBank => Some(HeaderShape::Bank),
            DataType::Segment | DataType::AlsoSegment => Some(HeaderShape::Segment),
            DataType::TagSegment => Some(HeaderShape::TagSegment),
            _ => None,
        };
        Children {
            data: self.data,
            endian: self.endian,
            shape: child_shape,
            cursor: self.payload_offset,
            end: self.payload_offset + self.payload_bytes(),
            done: false,
        }
    }

    /// The leaf payload as (dtype, byte range, byte order). Containers and
    /// composite banks have no typed slice.
    pub fn typed_data(&self) -> Result<TypedData<'a>> {
        if self.is_container() || self.data_type == DataType::Composite {
            return Err(EvioError::TypeMismatch(format!(
                "{} bank at offset {} has no typed payload",
                self.data_type, self.offset
            )));
        }
        Ok(TypedData {
            dtype: self.data_type,
            bytes: self.data()?,
            endian: self.endian,
        })
    }

    /// Decode a string-array leaf (content type 0x3).
    pub fn strings(&self) -> Result<StringData> {
        if self.data_type != DataType::StringArray {
            return Err(EvioError::TypeMismatch(format!(
                "{} bank at offset {} is not a string array",
                self.data_type, self.offset
            )));
        }
        parse_string_array(self.data()?)
    }

    /// Decode a composite leaf (content type 0xf).
    pub fn composite(&self) -> Result<CompositeData<'a>> {
        if self.data_type != DataType::Composite {
            return Err(EvioError::TypeMismatch(format!(
                "{} bank at offset {} is not composite",
                self.data_type, self.offset
            )));
        }
        let payload = take(self.data, self.payload_offset, self.payload_bytes())?;
        parse_composite(payload, self.endian)
    }
}

/// Child iterator over a container's payload.
pub struct Children<'a> {
    data: &'a [u8],
    endian: Endian,
    shape: Option<HeaderShape>,
    cursor: usize,
    end: usize,
    done: bool,
}

impl<'a> Iterator for Children<'a> {
    type Item = Result<BankNode<'a>>;

    fn next(&mut self) -> Option<Result<BankNode<'a>>> {
        if self.done || self.cursor >= self.end {
            return None;
        }
        let shape = self.shape?;

        match BankNode::parse(self.data, self.cursor, self.endian, shape) {
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
            Ok(child) => {
                let next = self.cursor + child.full_span();
                if next > self.end {
                    self.done = true;
                    return Some(Err(EvioError::Corruption(format!(
                        "child at offset {} overruns its container (ends at {}, container at {})",
                        self.cursor,
                        next,
                        self.end
                    ))));
                }
                self.cursor = next;
                Some(Ok(child))
            }
        }
    }
}

/// A leaf payload ready for typed materialization: dtype, raw bytes, and
/// the file's byte order. Elements are swapped on access; `Unknown32`
/// content is surfaced verbatim via `element`.
#[derive(Debug, Clone, Copy)]
pub struct TypedData<'a> {
    pub dtype: DataType,
    pub bytes: &'a [u8],
    pub endian: Endian,
}

impl<'a> TypedData<'a> {
    pub fn element_size(&self) -> usize {
        self.dtype.element_size().unwrap_or(1)
    }

    pub fn element_count(&self) -> usize {
        self.bytes.len() / self.element_size()
    }

    /// Raw bytes of element `i`, unswapped.
    pub fn element(&self, i: usize) -> Option<&'a [u8]> {
        let size = self.element_size();
        let start = i.checked_mul(size)?;
        self.bytes.get(start..start + size)
    }

    pub fn u8_at(&self, i: usize) -> Option<u8> {
        self.element(i).map(|b| b[0])
    }

    pub fn i8_at(&self, i: usize) -> Option<i8> {
        self.element(i).map(|b| b[0] as i8)
    }

    pub fn u16_at(&self, i: usize) -> Option<u16> {
        self.element(i).and_then(|b| self.endian.read_u16(b, 0).ok())
    }

    pub fn i16_at(&self, i: usize) -> Option<i16> {
        self.u16_at(i).map(|v| v as i16)
    }

    pub fn u32_at(&self, i: usize) -> Option<u32> {
        self.element(i).and_then(|b| self.endian.read_u32(b, 0).ok())
    }

    pub fn i32_at(&self, i: usize) -> Option<i32> {
        self.u32_at(i).map(|v| v as i32)
    }

    pub fn u64_at(&self, i: usize) -> Option<u64> {
        self.element(i).and_then(|b| self.endian.read_u64(b, 0).ok())
    }

    pub fn i64_at(&self, i: usize) -> Option<i64> {
        self.u64_at(i).map(|v| v as i64)
    }

    pub fn f32_at(&self, i: usize) -> Option<f32> {
        self.u32_at(i).map(f32::from_bits)
    }

    pub fn f64_at(&self, i: usize) -> Option<f64> {
        self.u64_at(i).map(f64::from_bits)
    }
}

/// Decoded string-array payload. `legacy_termination` marks the
/// backward-compatible single-string form with no 0x04 terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringData {
    pub strings: Vec<String>,
    pub legacy_termination: bool,
}

/// Split a string-array payload: NUL-separated strings terminated by a run
/// of 0x04 padding. Whatever sits between the last NUL and the terminator
/// run is discarded.
pub(crate) fn parse_string_array(bytes: &[u8]) -> Result<StringData> {
    let mut strings = Vec::new();
    let mut current = Vec::new();
    let mut terminated = false;

    for &b in bytes {
        match b {
            0x00 => {
                strings.push(String::from_utf8_lossy(&current).into_owned());
                current.clear();
            }
            0x04 => {
                terminated = true;
                break;
            }
            _ => current.push(b),
        }
    }

    if terminated {
        return Ok(StringData {
            strings,
            legacy_termination: false,
        });
    }

    // No 0x04 run: only the single-string form is readable. Trailing
    // empties come from NUL word padding.
    if strings.is_empty() && !current.is_empty() {
        return Ok(StringData {
            strings: vec![String::from_utf8_lossy(&current).into_owned()],
            legacy_termination: true,
        });
    }
    while strings.len() > 1 && strings.last().is_some_and(|s| s.is_empty()) {
        strings.pop();
    }
    if strings.len() == 1 && current.is_empty() {
        return Ok(StringData {
            strings,
            legacy_termination: true,
        });
    }
    Err(EvioError::Corruption(format!(
        "string array of {} bytes has no 0x04 terminator",
        bytes.len()
    )))
}
