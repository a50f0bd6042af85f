//! Test-only builders for synthetic EVIO v6 byte images in either order.

use crate::words::{Endian, RECORD_MAGIC};

pub(crate) struct Writer {
    endian: Endian,
    pub buf: Vec<u8>,
}

impl Writer {
    pub fn new(endian: Endian) -> Writer {
        Writer {
            endian,
            buf: Vec::new(),
        }
    }

    pub fn u32(&mut self, v: u32) {
        match self.endian {
            Endian::Little => self.buf.extend_from_slice(&v.to_le_bytes()),
            Endian::Big => self.buf.extend_from_slice(&v.to_be_bytes()),
        }
    }

    pub fn u64(&mut self, v: u64) {
        match self.endian {
            Endian::Little => self.buf.extend_from_slice(&v.to_le_bytes()),
            Endian::Big => self.buf.extend_from_slice(&v.to_be_bytes()),
        }
    }

    pub fn u16(&mut self, v: u16) {
        match self.endian {
            Endian::Little => self.buf.extend_from_slice(&v.to_le_bytes()),
            Endian::Big => self.buf.extend_from_slice(&v.to_be_bytes()),
        }
    }

    pub fn f32(&mut self, v: f32) {
        self.u32(v.to_bits());
    }

    pub fn f64(&mut self, v: f64) {
        self.u64(v.to_bits());
    }

    pub fn bytes(&mut self, b: &[u8]) {
        self.buf.extend_from_slice(b);
    }
}

fn word_pad(len: usize) -> usize {
    (4 - len % 4) % 4
}

/// File header builder. `build_header` emits the 14 header words followed
/// by the index array and the padded user header; when `header_words` is
/// raised above 14 the caller appends the extra words itself.
pub(crate) struct FileSpec {
    pub endian: Endian,
    pub file_number: u32,
    pub header_words: u32,
    pub record_count: u32,
    pub index: Vec<u32>,
    pub user_header: Vec<u8>,
    pub version: u32,
    pub kind_code: u32,
    pub has_dictionary: bool,
    pub has_first_event: bool,
    pub trailer_has_index: bool,
    pub trailer_position: u64,
}

impl FileSpec {
    pub fn new(endian: Endian) -> FileSpec {
        FileSpec {
            endian,
            file_number: 1,
            header_words: 14,
            record_count: 0,
            index: Vec::new(),
            user_header: Vec::new(),
            version: 6,
            kind_code: 1,
            has_dictionary: false,
            has_first_event: false,
            trailer_has_index: false,
            trailer_position: 0,
        }
    }

    pub fn build_header(&self) -> Vec<u8> {
        let pad = word_pad(self.user_header.len()) as u32;
        let mut bit_info = self.version & 0xFF;
        if self.has_dictionary {
            bit_info |= 1 << 8;
        }
        if self.has_first_event {
            bit_info |= 1 << 9;
        }
        if self.trailer_has_index {
            bit_info |= 1 << 10;
        }
        bit_info |= pad << 20;
        bit_info |= self.kind_code << 28;

        let mut w = Writer::new(self.endian);
        w.u32(crate::file::FILE_TYPE_ID);
        w.u32(self.file_number);
        w.u32(self.header_words);
        w.u32(self.record_count);
        w.u32(self.index.len() as u32 * 4);
        w.u32(bit_info);
        w.u32(self.user_header.len() as u32);
        w.u32(RECORD_MAGIC);
        w.u64(0); // user register
        w.u64(self.trailer_position);
        w.u32(0);
        w.u32(0);
        for &len in &self.index {
            w.u32(len);
        }
        w.bytes(&self.user_header);
        w.bytes(&vec![0u8; pad as usize]);
        w.buf
    }
}

/// Record builder: header, event-length index, padded user header, events.
pub(crate) struct RecordSpec {
    pub endian: Endian,
    pub record_number: u32,
    pub events: Vec<Vec<u8>>,
    pub user_header: Vec<u8>,
    pub compression: u8,
    pub is_last: bool,
    pub kind_code: u32,
    pub event_type: u32,
    pub has_dictionary: bool,
    pub has_first_event: bool,
    pub version: u32,
}

impl RecordSpec {
    pub fn new(endian: Endian) -> RecordSpec {
        RecordSpec {
            endian,
            record_number: 1,
            events: Vec::new(),
            user_header: Vec::new(),
            compression: 0,
            is_last: false,
            kind_code: 0,
            event_type: 0,
            has_dictionary: false,
            has_first_event: false,
            version: 6,
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let index_bytes = self.events.len() as u32 * 4;
        let pad1 = word_pad(self.user_header.len()) as u32;
        let data_bytes: usize = self.events.iter().map(|e| e.len()).sum();
        let pad2 = word_pad(data_bytes) as u32;
        let length_words = 14
            + index_bytes / 4
            + (self.user_header.len() as u32 + pad1) / 4
            + (data_bytes as u32 + pad2) / 4;

        let mut bit_info = self.version & 0xFF;
        if self.has_dictionary {
            bit_info |= 1 << 8;
        }
        if self.is_last {
            bit_info |= 1 << 9;
        }
        bit_info |= (self.event_type & 0xF) << 10;
        if self.has_first_event {
            bit_info |= 1 << 14;
        }
        bit_info |= pad1 << 20;
        bit_info |= pad2 << 22;
        bit_info |= self.kind_code << 28;

        let mut w = Writer::new(self.endian);
        w.u32(length_words);
        w.u32(self.record_number);
        w.u32(14);
        w.u32(self.events.len() as u32);
        w.u32(index_bytes);
        w.u32(bit_info);
        w.u32(self.user_header.len() as u32);
        w.u32(RECORD_MAGIC);
        w.u32(data_bytes as u32);
        w.u32((self.compression as u32) << 28);
        w.u64(0);
        w.u64(0);
        for event in &self.events {
            w.u32(event.len() as u32);
        }
        w.bytes(&self.user_header);
        w.bytes(&vec![0u8; pad1 as usize]);
        for event in &self.events {
            w.bytes(event);
        }
        w.bytes(&vec![0u8; pad2 as usize]);
        w.buf
    }
}

/// Trailer record whose index is (record-length, event-count) pairs.
pub(crate) fn trailer_with_pairs(endian: Endian, pairs: &[(u32, u32)]) -> Vec<u8> {
    let index_bytes = pairs.len() as u32 * 8;
    let length_words = 14 + index_bytes / 4;
    let bit_info = 6 | (1 << 9) | (3 << 28);

    let mut w = Writer::new(endian);
    w.u32(length_words);
    w.u32(0);
    w.u32(14);
    w.u32(0);
    w.u32(index_bytes);
    w.u32(bit_info);
    w.u32(0);
    w.u32(RECORD_MAGIC);
    w.u32(index_bytes);
    w.u32(0);
    w.u64(0);
    w.u64(0);
    for &(len, count) in pairs {
        w.u32(len);
        w.u32(count);
    }
    w.buf
}

/// Leaf BANK with the pad computed from the element size.
pub(crate) fn leaf_bank(endian: Endian, tag: u16, type_code: u32, num: u8, data: &[u8]) -> Vec<u8> {
    let pad = word_pad(data.len());
    let payload_words = (data.len() + pad) / 4;
    let mut w = Writer::new(endian);
    w.u32(payload_words as u32 + 1);
    w.u32(((tag as u32) << 16) | ((pad as u32) << 14) | ((type_code & 0x3F) << 8) | num as u32);
    w.bytes(data);
    w.bytes(&vec![0u8; pad]);
    w.buf
}

/// Container BANK whose payload is the concatenated child images.
pub(crate) fn container_bank(
    endian: Endian,
    tag: u16,
    content_code: u32,
    num: u8,
    children: &[u8],
) -> Vec<u8> {
    assert_eq!(children.len() % 4, 0, "children must be word aligned");
    let mut w = Writer::new(endian);
    w.u32(children.len() as u32 / 4 + 1);
    w.u32(((tag as u32) << 16) | ((content_code & 0x3F) << 8) | num as u32);
    w.bytes(children);
    w.buf
}

/// Leaf SEGMENT with the pad computed from the data length.
pub(crate) fn leaf_segment(endian: Endian, tag: u8, type_code: u32, data: &[u8]) -> Vec<u8> {
    let pad = word_pad(data.len());
    let payload_words = (data.len() + pad) / 4;
    let mut w = Writer::new(endian);
    w.u32(
        ((tag as u32) << 24)
            | ((pad as u32) << 22)
            | ((type_code & 0x3F) << 16)
            | payload_words as u32,
    );
    w.bytes(data);
    w.bytes(&vec![0u8; pad]);
    w.buf
}

/// TAGSEGMENT (no pad field); data must be pre-padded to a word boundary.
pub(crate) fn tagsegment(endian: Endian, tag: u16, type_code: u32, data: &[u8]) -> Vec<u8> {
    let pad = word_pad(data.len());
    let payload_words = (data.len() + pad) / 4;
    let mut w = Writer::new(endian);
    w.u32((((tag as u32) & 0xFFF) << 20) | ((type_code & 0xF) << 16) | payload_words as u32);
    w.bytes(data);
    w.bytes(&vec![0u8; pad]);
    w.buf
}

/// Concatenate file parts into one image.
pub(crate) fn assemble(parts: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    for part in parts {
        out.extend_from_slice(part);
    }
    out
}
