//! Read-only decoder for EVIO version-6 event files.
//!
//! A file is mapped once, its byte order elected from the header magic, and
//! everything else is parsed lazily as borrowed views: records, events, and
//! nested bank trees down to typed leaf payloads.

pub mod bank;
pub mod composite;
pub mod dictionary;
pub mod error;
pub mod event;
pub mod file;
pub mod record;
pub mod types;
pub mod words;

#[cfg(test)]
pub(crate) mod testutil;

pub use bank::{BankKind, BankNode, Children, HeaderShape, StringData, TypedData};
pub use composite::{CompositeData, CompositeItem};
pub use dictionary::{DictEntry, Dictionary};
pub use error::{EvioError, Result};
pub use event::EventView;
pub use file::{FileHeader, FileKind};
pub use record::{RecordHeader, RecordKind, RecordView, TrailerIndex};
pub use types::{Compression, DataType};
pub use words::Endian;

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use record::RecordTable;

enum Mapping {
    Mmap(Mmap),
    Bytes(Vec<u8>),
}

impl Mapping {
    fn as_bytes(&self) -> &[u8] {
        match self {
            Mapping::Mmap(m) => &m[..],
            Mapping::Bytes(b) => b,
        }
    }
}

/// An open EVIO v6 file: the read-only mapping, the parsed file header, and
/// the record offset table. Immutable after open; the mapping and its file
/// descriptor are released on drop.
pub struct EvioFile {
    mapping: Mapping,
    header: FileHeader,
    records: RecordTable,
}

impl EvioFile {
    /// Map a file read-only and parse its header and record locations.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<EvioFile> {
        let file = File::open(path)?;
        // Safety: the mapping is read-only; callers must not truncate the
        // file while the view is alive.
        let mmap = unsafe { Mmap::map(&file)? };
        EvioFile::new(Mapping::Mmap(mmap))
    }

    /// Decode an in-memory byte image instead of a file on disk.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<EvioFile> {
        EvioFile::new(Mapping::Bytes(bytes))
    }

    fn new(mapping: Mapping) -> Result<EvioFile> {
        let header = FileHeader::parse(mapping.as_bytes())?;
        let records = record::discover(mapping.as_bytes(), header.endian, &header)?;
        Ok(EvioFile {
            mapping,
            header,
            records,
        })
    }

    /// The whole mapped byte range.
    pub fn data(&self) -> &[u8] {
        self.mapping.as_bytes()
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    pub fn endian(&self) -> Endian {
        self.header.endian
    }

    pub fn version(&self) -> u32 {
        self.header.version
    }

    /// Number of accessible data records (the trailer is not one of them).
    pub fn record_count(&self) -> usize {
        self.records.offsets.len()
    }

    /// Parse record `index`. One index past the last accessible record
    /// re-parses the offset a linear scan failed on, surfacing its error.
    pub fn record(&self, index: usize) -> Result<RecordView<'_>> {
        let count = self.records.offsets.len();
        if index < count {
            return RecordView::parse(self.data(), self.records.offsets[index], self.endian());
        }
        if index == count {
            if let Some(offset) = self.records.failed_offset {
                return RecordView::parse(self.data(), offset, self.endian());
            }
        }
        Err(EvioError::OutOfRange { index, count })
    }

    /// Iterate records in file order. After a corrupt record is surfaced
    /// the iterator terminates; preceding records are unaffected.
    pub fn records(&self) -> Records<'_> {
        Records {
            file: self,
            next: 0,
            done: false,
        }
    }

    /// The trailer record, if the file has one.
    pub fn trailer(&self) -> Result<Option<RecordView<'_>>> {
        let Some(offset) = self.records.trailer else {
            return Ok(None);
        };
        let record = RecordView::parse(self.data(), offset, self.endian())?;
        if !record.is_trailer() {
            return Err(EvioError::Corruption(format!(
                "record at trailer position {offset} is not a trailer"
            )));
        }
        Ok(Some(record))
    }

    /// Raw file user header bytes (without padding).
    pub fn user_header(&self) -> Result<&[u8]> {
        words::take(
            self.data(),
            self.header.user_header_offset(),
            self.header.user_header_bytes as usize,
        )
    }

    /// The record embedded in the user header when a dictionary or first
    /// event is present.
    fn user_header_record(&self) -> Result<Option<RecordView<'_>>> {
        if !self.header.has_dictionary && !self.header.has_first_event {
            return Ok(None);
        }
        if self.header.user_header_bytes == 0 {
            return Ok(None);
        }
        let record = RecordView::parse(self.data(), self.header.user_header_offset(), self.endian())?;
        Ok(Some(record))
    }

    /// Raw bytes of the dictionary event, if the file carries one.
    pub fn dictionary_bytes(&self) -> Result<Option<&[u8]>> {
        if !self.header.has_dictionary {
            return Ok(None);
        }
        match self.user_header_record()? {
            Some(record) if record.event_count() > 0 => Ok(Some(record.event(0)?.bytes()?)),
            _ => Ok(None),
        }
    }

    /// The dictionary XML text, decoded from its string bank.
    pub fn dictionary_xml(&self) -> Result<Option<String>> {
        if !self.header.has_dictionary {
            return Ok(None);
        }
        let Some(record) = self.user_header_record()? else {
            return Ok(None);
        };
        if record.event_count() == 0 {
            return Ok(None);
        }
        let root = record.event(0)?.root()?;
        Ok(Some(root.strings()?.strings.concat()))
    }

    /// The decoded dictionary, when present and parseable.
    pub fn dictionary(&self) -> Result<Option<Dictionary>> {
        match self.dictionary_xml()? {
            Some(xml) => Ok(Some(Dictionary::parse(&xml)?)),
            None => Ok(None),
        }
    }

    /// Raw bytes of the first event, if the file carries one.
    pub fn first_event_bytes(&self) -> Result<Option<&[u8]>> {
        match self.first_event()? {
            Some(event) => Ok(Some(event.bytes()?)),
            None => Ok(None),
        }
    }

    /// The first event, if the file carries one in its user header.
    pub fn first_event(&self) -> Result<Option<EventView<'_>>> {
        if !self.header.has_first_event {
            return Ok(None);
        }
        let Some(record) = self.user_header_record()? else {
            return Ok(None);
        };
        let index = usize::from(self.header.has_dictionary);
        if index >= record.event_count() {
            return Ok(None);
        }
        Ok(Some(record.event(index)?))
    }
}

/// Iterator over a file's records.
pub struct Records<'a> {
    file: &'a EvioFile,
    next: usize,
    done: bool,
}

impl<'a> Iterator for Records<'a> {
    type Item = Result<RecordView<'a>>;

    fn next(&mut self) -> Option<Result<RecordView<'a>>> {
        if self.done {
            return None;
        }
        let count = self.file.record_count();
        if self.next >= count {
            if self.next == count && self.file.records.failed_offset.is_some() {
                self.done = true;
                return Some(self.file.record(count));
            }
            return None;
        }
        let i = self.next;
        self.next += 1;
        match self.file.record(i) {
            Ok(record) => Some(Ok(record)),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
