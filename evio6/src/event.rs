use crate::bank::{BankNode, HeaderShape};
use crate::error::{EvioError, Result};
use crate::words::{take, Endian};

/// One event: a byte span inside a record's event region, holding a single
/// top-level BANK.
#[derive(Debug, Clone, Copy)]
pub struct EventView<'a> {
    data: &'a [u8],
    endian: Endian,
    offset: usize,
    length: usize,
}

impl<'a> EventView<'a> {
    pub(crate) fn new(data: &'a [u8], endian: Endian, offset: usize, length: usize) -> Self {
        EventView {
            data,
            endian,
            offset,
            length,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Raw event bytes.
    pub fn bytes(&self) -> Result<&'a [u8]> {
        take(self.data, self.offset, self.length)
    }

    /// Parse the top-level bank. The first container in an event is always
    /// a BANK, and it must span the event exactly.
    pub fn root(&self) -> Result<BankNode<'a>> {
        let node = BankNode::parse(self.data, self.offset, self.endian, HeaderShape::Bank)?;
        if node.full_span() != self.length {
            return Err(EvioError::Corruption(format!(
                "event at offset {} is {} bytes but its bank spans {}",
                self.offset,
                self.length,
                node.full_span()
            )));
        }
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::leaf_bank;
    use crate::types::DataType;

    #[test]
    fn test_root_parses_bank() {
        let endian = Endian::Little;
        let bank = leaf_bank(endian, 0x42, 0xb, 7, &1i32.to_le_bytes());
        let event = EventView::new(&bank, endian, 0, bank.len());
        let root = event.root().unwrap();
        assert_eq!(root.tag, 0x42);
        assert_eq!(root.num, 7);
        assert_eq!(root.data_type, DataType::Int32);
    }

    #[test]
    fn test_root_span_mismatch() {
        let endian = Endian::Little;
        let mut bank = leaf_bank(endian, 0x42, 0xb, 7, &1i32.to_le_bytes());
        bank.extend_from_slice(&[0u8; 4]);
        let event = EventView::new(&bank, endian, 0, bank.len());
        assert!(matches!(event.root(), Err(EvioError::Corruption(_))));
    }
}
