use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::error::{EvioError, Result};

/// Magic constant in word 7 of every file and record header.
pub const RECORD_MAGIC: u32 = 0xC0DA_0100;

/// Byte order elected from the header magic and threaded through every
/// decoder call. Never a process-wide flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    pub fn host() -> Endian {
        if cfg!(target_endian = "big") {
            Endian::Big
        } else {
            Endian::Little
        }
    }

    /// Read the 4 magic bytes at `offset` both ways and elect the order
    /// that matches `RECORD_MAGIC`.
    pub fn detect(data: &[u8], offset: usize) -> Result<Endian> {
        let raw = take(data, offset, 4)?;
        if LittleEndian::read_u32(raw) == RECORD_MAGIC {
            Ok(Endian::Little)
        } else if BigEndian::read_u32(raw) == RECORD_MAGIC {
            Ok(Endian::Big)
        } else {
            Err(EvioError::BadMagic(LittleEndian::read_u32(raw)))
        }
    }

    pub fn read_u16(self, data: &[u8], offset: usize) -> Result<u16> {
        let raw = take(data, offset, 2)?;
        Ok(match self {
            Endian::Little => LittleEndian::read_u16(raw),
            Endian::Big => BigEndian::read_u16(raw),
        })
    }

    pub fn read_u32(self, data: &[u8], offset: usize) -> Result<u32> {
        let raw = take(data, offset, 4)?;
        Ok(match self {
            Endian::Little => LittleEndian::read_u32(raw),
            Endian::Big => BigEndian::read_u32(raw),
        })
    }

    pub fn read_u64(self, data: &[u8], offset: usize) -> Result<u64> {
        let raw = take(data, offset, 8)?;
        Ok(match self {
            Endian::Little => LittleEndian::read_u64(raw),
            Endian::Big => BigEndian::read_u64(raw),
        })
    }

    pub fn read_i8(self, data: &[u8], offset: usize) -> Result<i8> {
        let raw = take(data, offset, 1)?;
        Ok(raw[0] as i8)
    }

    pub fn read_i16(self, data: &[u8], offset: usize) -> Result<i16> {
        Ok(self.read_u16(data, offset)? as i16)
    }

    pub fn read_i32(self, data: &[u8], offset: usize) -> Result<i32> {
        Ok(self.read_u32(data, offset)? as i32)
    }

    pub fn read_i64(self, data: &[u8], offset: usize) -> Result<i64> {
        Ok(self.read_u64(data, offset)? as i64)
    }

    pub fn read_f32(self, data: &[u8], offset: usize) -> Result<f32> {
        Ok(f32::from_bits(self.read_u32(data, offset)?))
    }

    pub fn read_f64(self, data: &[u8], offset: usize) -> Result<f64> {
        Ok(f64::from_bits(self.read_u64(data, offset)?))
    }
}

impl std::fmt::Display for Endian {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endian::Little => f.write_str("little"),
            Endian::Big => f.write_str("big"),
        }
    }
}

/// Bounds-checked sub-slice. Every decoder read goes through here; an
/// out-of-range access is `Truncated`, never a panic.
pub fn take(data: &[u8], offset: usize, need: usize) -> Result<&[u8]> {
    let end = offset.checked_add(need).ok_or(EvioError::Truncated {
        offset,
        need,
        len: data.len(),
    })?;
    if end > data.len() {
        return Err(EvioError::Truncated {
            offset,
            need,
            len: data.len(),
        });
    }
    Ok(&data[offset..end])
}

/// Extract the inclusive bit range `lo..=hi` from a host-ordered word.
pub fn bits(word: u32, lo: u32, hi: u32) -> u32 {
    debug_assert!(lo <= hi && hi < 32);
    let width = hi - lo + 1;
    if width == 32 {
        word
    } else {
        (word >> lo) & ((1u32 << width) - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_little() {
        let mut buf = vec![0u8; 8];
        buf[4..8].copy_from_slice(&RECORD_MAGIC.to_le_bytes());
        assert_eq!(Endian::detect(&buf, 4).unwrap(), Endian::Little);
    }

    #[test]
    fn test_detect_big() {
        let mut buf = vec![0u8; 8];
        buf[4..8].copy_from_slice(&RECORD_MAGIC.to_be_bytes());
        assert_eq!(Endian::detect(&buf, 4).unwrap(), Endian::Big);
    }

    #[test]
    fn test_detect_neither() {
        let buf = [0xDEu8, 0xAD, 0xBE, 0xEF];
        let result = Endian::detect(&buf, 0);
        assert!(matches!(result, Err(EvioError::BadMagic(_))));
    }

    #[test]
    fn test_detect_truncated() {
        let buf = [0u8; 2];
        assert!(matches!(
            Endian::detect(&buf, 0),
            Err(EvioError::Truncated { .. })
        ));
    }

    #[test]
    fn test_reads_both_orders() {
        let buf = [0x01u8, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        assert_eq!(Endian::Little.read_u32(&buf, 0).unwrap(), 0x04030201);
        assert_eq!(Endian::Big.read_u32(&buf, 0).unwrap(), 0x01020304);
        assert_eq!(Endian::Little.read_u16(&buf, 0).unwrap(), 0x0201);
        assert_eq!(Endian::Big.read_u16(&buf, 0).unwrap(), 0x0102);
        assert_eq!(Endian::Little.read_u64(&buf, 0).unwrap(), 0x0807060504030201);
        assert_eq!(Endian::Big.read_u64(&buf, 0).unwrap(), 0x0102030405060708);
    }

    #[test]
    fn test_take_bounds() {
        let buf = [0u8; 4];
        assert!(take(&buf, 0, 4).is_ok());
        assert!(matches!(
            take(&buf, 1, 4),
            Err(EvioError::Truncated {
                offset: 1,
                need: 4,
                len: 4
            })
        ));
        assert!(matches!(
            take(&buf, usize::MAX, 2),
            Err(EvioError::Truncated { .. })
        ));
    }

    #[test]
    fn test_bits() {
        let word = 0xABCD_1234u32;
        assert_eq!(bits(word, 0, 7), 0x34);
        assert_eq!(bits(word, 8, 15), 0x12);
        assert_eq!(bits(word, 16, 31), 0xABCD);
        assert_eq!(bits(word, 0, 31), word);
        assert_eq!(bits(word, 28, 31), 0xA);
    }
}
