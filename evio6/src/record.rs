use crate::error::{EvioError, Result};
use crate::event::EventView;
use crate::file::FileHeader;
use crate::types::Compression;
use crate::words::{bits, take, Endian, RECORD_MAGIC};

/// Nominal record header length in 32-bit words.
pub const RECORD_HEADER_WORDS: u32 = 14;

/// Record header kind (bit-info word, bits 28-31).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Record,
    Trailer,
    HipoRecord,
    HipoTrailer,
}

impl RecordKind {
    pub fn from_code(code: u32) -> Option<RecordKind> {
        match code {
            0 => Some(RecordKind::Record),
            3 => Some(RecordKind::Trailer),
            4 => Some(RecordKind::HipoRecord),
            7 => Some(RecordKind::HipoTrailer),
            _ => None,
        }
    }

    pub fn is_trailer(self) -> bool {
        matches!(self, RecordKind::Trailer | RecordKind::HipoTrailer)
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::Record => f.write_str("record"),
            RecordKind::Trailer => f.write_str("trailer"),
            RecordKind::HipoRecord => f.write_str("hipo-record"),
            RecordKind::HipoTrailer => f.write_str("hipo-trailer"),
        }
    }
}

/// The 14-word record header.
///
/// Word layout: 0 record-length-words (inclusive of the header), 1 record
/// number, 2 header-length-words, 3 event count, 4 event-index bytes,
/// 5 bit-info+version, 6 user-header bytes, 7 magic, 8 uncompressed data
/// bytes, 9 compression nibble + compressed words, 10-11 and 12-13 user
/// registers.
#[derive(Debug, Clone)]
pub struct RecordHeader {
    pub length_words: u32,
    pub record_number: u32,
    pub header_words: u32,
    pub event_count: u32,
    pub index_bytes: u32,
    pub version: u32,
    pub has_dictionary: bool,
    pub is_last: bool,
    /// CODA event category, 0-15
    pub event_type: u32,
    pub has_first_event: bool,
    pub pad1: u32,
    pub pad2: u32,
    pub pad3: u32,
    pub kind: RecordKind,
    pub user_header_bytes: u32,
    pub uncompressed_bytes: u32,
    pub compression: Compression,
    pub compressed_words: u32,
    pub user_register1: u64,
    pub user_register2: u64,
}

impl RecordHeader {
    pub fn parse(data: &[u8], offset: usize, endian: Endian) -> Result<Self> {
        let magic = endian.read_u32(data, offset + 7 * 4)?;
        if magic != RECORD_MAGIC {
            return Err(EvioError::Corruption(format!(
                "record magic 0x{magic:08X} at offset {offset}"
            )));
        }

        let length_words = endian.read_u32(data, offset)?;
        let record_number = endian.read_u32(data, offset + 4)?;
        let header_words = endian.read_u32(data, offset + 2 * 4)?;
        if header_words < RECORD_HEADER_WORDS {
            return Err(EvioError::BadHeader(format!(
                "record header length {header_words} words, expected at least {RECORD_HEADER_WORDS}"
            )));
        }
        if length_words < header_words {
            return Err(EvioError::Corruption(format!(
                "record length {length_words} words smaller than its header ({header_words})"
            )));
        }
        // The whole record must fit in the mapping.
        take(data, offset, length_words as usize * 4)?;

        let event_count = endian.read_u32(data, offset + 3 * 4)?;
        let index_bytes = endian.read_u32(data, offset + 4 * 4)?;

        let bit_info = endian.read_u32(data, offset + 5 * 4)?;
        let version = bits(bit_info, 0, 7);
        if version != 6 {
            return Err(EvioError::UnsupportedVersion(version));
        }
        let kind_code = bits(bit_info, 28, 31);
        let kind = RecordKind::from_code(kind_code)
            .ok_or_else(|| EvioError::BadHeader(format!("record header kind code {kind_code}")))?;

        let user_header_bytes = endian.read_u32(data, offset + 6 * 4)?;
        let uncompressed_bytes = endian.read_u32(data, offset + 8 * 4)?;
        let word9 = endian.read_u32(data, offset + 9 * 4)?;
        let user_register1 = endian.read_u64(data, offset + 10 * 4)?;
        let user_register2 = endian.read_u64(data, offset + 12 * 4)?;

        Ok(RecordHeader {
            length_words,
            record_number,
            header_words,
            event_count,
            index_bytes,
            version,
            has_dictionary: bits(bit_info, 8, 8) != 0,
            is_last: bits(bit_info, 9, 9) != 0,
            event_type: bits(bit_info, 10, 13),
            has_first_event: bits(bit_info, 14, 14) != 0,
            pad1: bits(bit_info, 20, 21),
            pad2: bits(bit_info, 22, 23),
            pad3: bits(bit_info, 24, 25),
            kind,
            user_header_bytes,
            uncompressed_bytes,
            compression: Compression::from(bits(word9, 28, 31) as u8),
            compressed_words: bits(word9, 0, 27),
            user_register1,
            user_register2,
        })
    }

    pub fn byte_len(&self) -> usize {
        self.length_words as usize * 4
    }

    /// User header length including its trailing pad1.
    pub fn user_header_padded(&self) -> usize {
        self.user_header_bytes as usize + self.pad1 as usize
    }
}

/// Trailer index, in either of its two on-disk shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrailerIndex {
    /// (record-length-bytes, event-count) pairs, one per record
    Pairs(Vec<(u32, u32)>),
    /// Bare record lengths in bytes
    Lengths(Vec<u32>),
}

impl TrailerIndex {
    pub fn len(&self) -> usize {
        match self {
            TrailerIndex::Pairs(v) => v.len(),
            TrailerIndex::Lengths(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn record_lengths(&self) -> Vec<u32> {
        match self {
            TrailerIndex::Pairs(v) => v.iter().map(|&(len, _)| len).collect(),
            TrailerIndex::Lengths(v) => v.clone(),
        }
    }
}

/// A parsed record: header plus the memoized event-length index.
///
/// For compressed records only the header is populated; any event or user
/// header access reports `UnsupportedCompression`.
#[derive(Debug, Clone)]
pub struct RecordView<'a> {
    data: &'a [u8],
    endian: Endian,
    offset: usize,
    header: RecordHeader,
    event_lengths: Vec<u32>,
    event_offsets: Vec<usize>,
}

impl<'a> RecordView<'a> {
    pub fn parse(data: &'a [u8], offset: usize, endian: Endian) -> Result<RecordView<'a>> {
        let header = RecordHeader::parse(data, offset, endian)?;
        let mut view = RecordView {
            data,
            endian,
            offset,
            header,
            event_lengths: Vec::new(),
            event_offsets: Vec::new(),
        };
        if view.header.compression == Compression::None && !view.header.kind.is_trailer() {
            view.load_event_index()?;
        }
        Ok(view)
    }

    fn load_event_index(&mut self) -> Result<()> {
        let h = &self.header;
        if h.index_bytes % 4 != 0 {
            return Err(EvioError::Corruption(format!(
                "event index length {} is not word aligned",
                h.index_bytes
            )));
        }
        if h.index_bytes / 4 != h.event_count {
            return Err(EvioError::Corruption(format!(
                "event index has {} entries but event count is {}",
                h.index_bytes / 4,
                h.event_count
            )));
        }
        if h.user_header_padded() % 4 != 0 {
            return Err(EvioError::Corruption(format!(
                "user header length {} + pad1 {} is not word aligned",
                h.user_header_bytes, h.pad1
            )));
        }

        let index_offset = self.offset + h.header_words as usize * 4;
        let mut lengths = Vec::with_capacity(h.event_count as usize);
        for i in 0..h.event_count as usize {
            lengths.push(self.endian.read_u32(self.data, index_offset + i * 4)?);
        }

        let overhead = h.header_words as usize * 4 + h.index_bytes as usize + h.user_header_padded();
        let region_bytes = h
            .byte_len()
            .checked_sub(overhead)
            .ok_or_else(|| EvioError::Corruption(format!(
                "record at offset {} too short for its index and user header",
                self.offset
            )))?;

        let total: usize = lengths.iter().map(|&len| len as usize).sum();
        if total + h.pad2 as usize != region_bytes {
            return Err(EvioError::Corruption(format!(
                "event lengths sum to {} + pad2 {} but the event region is {} bytes",
                total, h.pad2, region_bytes
            )));
        }

        let mut cursor = self.offset + overhead;
        let mut offsets = Vec::with_capacity(lengths.len());
        for &len in &lengths {
            offsets.push(cursor);
            cursor += len as usize;
        }

        self.event_lengths = lengths;
        self.event_offsets = offsets;
        Ok(())
    }

    pub fn header(&self) -> &RecordHeader {
        &self.header
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn byte_len(&self) -> usize {
        self.header.byte_len()
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn compression(&self) -> Compression {
        self.header.compression
    }

    pub fn is_trailer(&self) -> bool {
        self.header.kind.is_trailer()
    }

    pub fn is_last(&self) -> bool {
        self.header.is_last
    }

    pub fn event_count(&self) -> usize {
        self.event_lengths.len()
    }

    /// Memoized event byte lengths, in event order.
    pub fn event_index(&self) -> &[u32] {
        &self.event_lengths
    }

    fn refuse_compressed(&self) -> Result<()> {
        if self.header.compression != Compression::None {
            return Err(EvioError::UnsupportedCompression(self.header.compression));
        }
        Ok(())
    }

    pub fn event(&self, index: usize) -> Result<EventView<'a>> {
        self.refuse_compressed()?;
        if index >= self.event_offsets.len() {
            return Err(EvioError::OutOfRange {
                index,
                count: self.event_offsets.len(),
            });
        }
        Ok(EventView::new(
            self.data,
            self.endian,
            self.event_offsets[index],
            self.event_lengths[index] as usize,
        ))
    }

    pub fn events(&self) -> Result<Events<'a>> {
        self.refuse_compressed()?;
        Ok(Events {
            data: self.data,
            endian: self.endian,
            offsets: self.event_offsets.clone(),
            lengths: self.event_lengths.clone(),
            next: 0,
        })
    }

    /// Raw user header bytes (without pad1).
    pub fn user_header(&self) -> Result<&'a [u8]> {
        self.refuse_compressed()?;
        let offset = self.offset + self.header.header_words as usize * 4
            + self.header.index_bytes as usize;
        take(self.data, offset, self.header.user_header_bytes as usize)
    }

    /// Decode a trailer's record index, probing between the two on-disk
    /// shapes. `expected_records`, when known, disambiguates; without it a
    /// pair-aligned length is read as pairs first.
    pub fn trailer_index(&self, expected_records: Option<u32>) -> Result<TrailerIndex> {
        if !self.is_trailer() {
            return Err(EvioError::TypeMismatch(format!(
                "record at offset {} is not a trailer",
                self.offset
            )));
        }
        let h = &self.header;
        let index_offset = self.offset + h.header_words as usize * 4;
        let raw = take(self.data, index_offset, h.index_bytes as usize)?;

        let as_pairs = |raw: &[u8]| -> Result<TrailerIndex> {
            let mut pairs = Vec::with_capacity(raw.len() / 8);
            for i in 0..raw.len() / 8 {
                let len = self.endian.read_u32(raw, i * 8)?;
                let count = self.endian.read_u32(raw, i * 8 + 4)?;
                pairs.push((len, count));
            }
            Ok(TrailerIndex::Pairs(pairs))
        };
        let as_lengths = |raw: &[u8]| -> Result<TrailerIndex> {
            let mut lengths = Vec::with_capacity(raw.len() / 4);
            for i in 0..raw.len() / 4 {
                lengths.push(self.endian.read_u32(raw, i * 4)?);
            }
            Ok(TrailerIndex::Lengths(lengths))
        };

        match expected_records {
            Some(n) if n > 0 => {
                if raw.len() == n as usize * 8 {
                    as_pairs(raw)
                } else if raw.len() == n as usize * 4 {
                    as_lengths(raw)
                } else {
                    Err(EvioError::Corruption(format!(
                        "trailer index of {} bytes fits neither {n} pairs nor {n} lengths",
                        raw.len()
                    )))
                }
            }
            _ => {
                if raw.len() % 8 == 0 {
                    as_pairs(raw)
                } else if raw.len() % 4 == 0 {
                    as_lengths(raw)
                } else {
                    Err(EvioError::Corruption(format!(
                        "trailer index length {} is not word aligned",
                        raw.len()
                    )))
                }
            }
        }
    }
}

/// Iterator over the events of one record.
pub struct Events<'a> {
    data: &'a [u8],
    endian: Endian,
    offsets: Vec<usize>,
    lengths: Vec<u32>,
    next: usize,
}

impl<'a> Iterator for Events<'a> {
    type Item = EventView<'a>;

    fn next(&mut self) -> Option<EventView<'a>> {
        if self.next >= self.offsets.len() {
            return None;
        }
        let i = self.next;
        self.next += 1;
        Some(EventView::new(
            self.data,
            self.endian,
            self.offsets[i],
            self.lengths[i] as usize,
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.offsets.len() - self.next;
        (rest, Some(rest))
    }
}

/// Record locations discovered at open time.
#[derive(Debug)]
pub(crate) struct RecordTable {
    pub offsets: Vec<usize>,
    pub trailer: Option<usize>,
    /// Offset of the record a linear scan failed on; re-parsed on access so
    /// the original error is surfaced for that index.
    pub failed_offset: Option<usize>,
}

/// Build the record offset table. Priority: file-header index, trailer
/// index, linear scan. When both indexes exist they must agree.
pub(crate) fn discover(data: &[u8], endian: Endian, fh: &FileHeader) -> Result<RecordTable> {
    let base = fh.first_record_offset();

    let from_file_index = if fh.index_bytes > 0 {
        let entries = fh.index_bytes as usize / 4;
        if fh.record_count != 0 && entries != fh.record_count as usize {
            return Err(EvioError::Corruption(format!(
                "file index has {entries} entries but record count is {}",
                fh.record_count
            )));
        }
        let mut lengths = Vec::with_capacity(entries);
        for i in 0..entries {
            lengths.push(endian.read_u32(data, fh.index_offset() + i * 4)?);
        }
        Some(offsets_from_lengths(&lengths, base, data.len(), "file index")?)
    } else {
        None
    };

    let trailer_offset = if fh.trailer_position != 0 {
        Some(fh.trailer_position as usize)
    } else {
        None
    };

    let from_trailer_index = if fh.trailer_has_index && fh.trailer_position != 0 {
        let trailer = RecordView::parse(data, fh.trailer_position as usize, endian)?;
        if !trailer.is_trailer() {
            return Err(EvioError::Corruption(format!(
                "record at trailer position {} is not a trailer",
                fh.trailer_position
            )));
        }
        let expected = if fh.record_count != 0 {
            Some(fh.record_count)
        } else {
            from_file_index.as_ref().map(|v: &Vec<usize>| v.len() as u32)
        };
        let index = trailer.trailer_index(expected)?;
        let limit = fh.trailer_position as usize;
        Some(offsets_from_lengths(
            &index.record_lengths(),
            base,
            limit,
            "trailer index",
        )?)
    } else {
        None
    };

    match (from_file_index, from_trailer_index) {
        (Some(a), Some(b)) => {
            if a != b {
                return Err(EvioError::Corruption(
                    "file index and trailer index disagree".to_string(),
                ));
            }
            Ok(RecordTable {
                offsets: a,
                trailer: trailer_offset,
                failed_offset: None,
            })
        }
        (Some(a), None) => Ok(RecordTable {
            offsets: a,
            trailer: trailer_offset,
            failed_offset: None,
        }),
        (None, Some(b)) => Ok(RecordTable {
            offsets: b,
            trailer: trailer_offset,
            failed_offset: None,
        }),
        (None, None) => Ok(scan(data, endian, base, trailer_offset)),
    }
}

fn offsets_from_lengths(
    lengths: &[u32],
    base: usize,
    limit: usize,
    source: &str,
) -> Result<Vec<usize>> {
    let mut offsets = Vec::with_capacity(lengths.len());
    let mut cursor = base;
    for (i, &len) in lengths.iter().enumerate() {
        if len < RECORD_HEADER_WORDS * 4 || len % 4 != 0 {
            return Err(EvioError::Corruption(format!(
                "{source} entry {i} has record length {len}"
            )));
        }
        offsets.push(cursor);
        cursor += len as usize;
        if cursor > limit {
            return Err(EvioError::Corruption(format!(
                "{source} entry {i} runs past offset {limit}"
            )));
        }
    }
    Ok(offsets)
}

/// Linear scan from the first record. A failed header parse keeps all
/// preceding records and remembers the bad offset instead of failing.
fn scan(data: &[u8], endian: Endian, base: usize, trailer_hint: Option<usize>) -> RecordTable {
    let limit = trailer_hint.unwrap_or(data.len());
    let mut offsets = Vec::new();
    let mut trailer = trailer_hint;
    let mut failed_offset = None;
    let mut off = base;

    while off < limit {
        match RecordHeader::parse(data, off, endian) {
            Err(_) => {
                failed_offset = Some(off);
                break;
            }
            Ok(h) => {
                if h.kind.is_trailer() {
                    trailer = Some(off);
                    break;
                }
                offsets.push(off);
                let is_last = h.is_last;
                off += h.byte_len();
                if is_last {
                    break;
                }
            }
        }
    }

    RecordTable {
        offsets,
        trailer,
        failed_offset,
    }
}
