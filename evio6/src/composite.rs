//! Composite-leaf decoding: an ASCII format descriptor compiled to a small
//! bytecode, then run over the packed data blob.
//!
//! A composite payload is a TAGSEGMENT holding the descriptor string,
//! immediately followed by a BANK holding the data it describes.

use crate::bank::{BankNode, HeaderShape};
use crate::error::{EvioError, Result};
use crate::types::DataType;
use crate::words::Endian;

/// One decoded value: its dtype plus the raw (unswapped) bytes.
#[derive(Debug, Clone, Copy)]
pub struct CompositeItem<'a> {
    pub dtype: DataType,
    pub bytes: &'a [u8],
}

/// A decoded composite leaf.
#[derive(Debug, Clone)]
pub struct CompositeData<'a> {
    pub format: String,
    pub format_tag: u16,
    pub data_tag: u16,
    pub data_num: u8,
    pub endian: Endian,
    items: Vec<CompositeItem<'a>>,
}

impl<'a> CompositeData<'a> {
    pub fn items(&self) -> &[CompositeItem<'a>] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CompositeItem<'a>> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a, 'b> IntoIterator for &'b CompositeData<'a> {
    type Item = &'b CompositeItem<'a>;
    type IntoIter = std::slice::Iter<'b, CompositeItem<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Decode a composite bank payload (descriptor tagsegment + data bank).
pub(crate) fn parse_composite(payload: &[u8], endian: Endian) -> Result<CompositeData<'_>> {
    let fmt_seg = BankNode::parse(payload, 0, endian, HeaderShape::TagSegment)?;
    if fmt_seg.data_type != DataType::StringArray {
        return Err(EvioError::BadComposite(format!(
            "format descriptor has content type {}, expected a string",
            fmt_seg.data_type
        )));
    }
    let raw_format = fmt_seg.data()?;
    let trimmed: &[u8] = {
        let mut end = raw_format.len();
        while end > 0 && (raw_format[end - 1] == 0x00 || raw_format[end - 1] == 0x04) {
            end -= 1;
        }
        &raw_format[..end]
    };
    if !trimmed.is_ascii() {
        return Err(EvioError::BadComposite(
            "format descriptor is not ASCII".to_string(),
        ));
    }
    let format = String::from_utf8_lossy(trimmed).into_owned();

    let data_bank = BankNode::parse(payload, fmt_seg.full_span(), endian, HeaderShape::Bank)?;
    if fmt_seg.full_span() + data_bank.full_span() != payload.len() {
        return Err(EvioError::Corruption(format!(
            "composite payload is {} bytes but descriptor and data span {}",
            payload.len(),
            fmt_seg.full_span() + data_bank.full_span()
        )));
    }

    let ops = compile(&format)?;
    let items = run(&ops, data_bank.data()?, endian)?;

    Ok(CompositeData {
        format,
        format_tag: fmt_seg.tag,
        data_tag: data_bank.tag,
        data_num: data_bank.num,
        endian,
        items,
    })
}

/// Repeat-count source for one op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Count {
    Fixed(u32),
    /// 'N': read an i32 from the data stream
    StreamI32,
    /// 'n': read an i16
    StreamI16,
    /// 'm': read an i8
    StreamI8,
}

/// Compiled format bytecode: straight-line scalars plus group loops.
#[derive(Debug, Clone, Copy)]
enum Op {
    Scalar { dtype: DataType, count: Count },
    Open { count: Count, close: usize },
    Close { open: usize },
}

fn scalar_dtype(ch: char) -> Option<DataType> {
    match ch {
        'i' => Some(DataType::Uint32),
        'I' => Some(DataType::Int32),
        'F' => Some(DataType::Float32),
        'D' => Some(DataType::Float64),
        'L' => Some(DataType::Int64),
        'l' => Some(DataType::Uint64),
        'S' => Some(DataType::Int16),
        's' => Some(DataType::Uint16),
        'C' => Some(DataType::Int8),
        'c' => Some(DataType::Uint8),
        'a' => Some(DataType::StringArray),
        'A' => Some(DataType::Hollerit),
        _ => None,
    }
}

fn compile(format: &str) -> Result<Vec<Op>> {
    let mut ops: Vec<Op> = Vec::new();
    let mut open_stack: Vec<usize> = Vec::new();
    let mut pending: Option<Count> = None;
    let mut digits = String::new();

    fn finalize_digits(digits: &mut String, pending: &mut Option<Count>) -> Result<()> {
        if digits.is_empty() {
            return Ok(());
        }
        if pending.is_some() {
            return Err(EvioError::BadComposite(format!(
                "multiplier '{digits}' follows another multiplier"
            )));
        }
        let n: u32 = digits
            .parse()
            .map_err(|_| EvioError::BadComposite(format!("multiplier '{digits}'")))?;
        if !(2..=15).contains(&n) {
            return Err(EvioError::BadComposite(format!(
                "multiplier {n} out of range 2..=15"
            )));
        }
        *pending = Some(Count::Fixed(n));
        digits.clear();
        Ok(())
    }

    for ch in format.chars() {
        match ch {
            '0'..='9' => digits.push(ch),
            ',' | ' ' | '\t' => finalize_digits(&mut digits, &mut pending)?,
            'N' | 'n' | 'm' => {
                finalize_digits(&mut digits, &mut pending)?;
                if pending.is_some() {
                    return Err(EvioError::BadComposite(format!(
                        "'{ch}' follows another multiplier"
                    )));
                }
                pending = Some(match ch {
                    'N' => Count::StreamI32,
                    'n' => Count::StreamI16,
                    _ => Count::StreamI8,
                });
            }
            '(' => {
                finalize_digits(&mut digits, &mut pending)?;
                let count = pending.take().unwrap_or(Count::Fixed(1));
                open_stack.push(ops.len());
                ops.push(Op::Open { count, close: 0 });
            }
            ')' => {
                finalize_digits(&mut digits, &mut pending)?;
                if pending.is_some() {
                    return Err(EvioError::BadComposite(
                        "multiplier directly before ')'".to_string(),
                    ));
                }
                let open = open_stack
                    .pop()
                    .ok_or_else(|| EvioError::BadComposite("unmatched ')'".to_string()))?;
                if ops.len() == open + 1 {
                    return Err(EvioError::BadComposite("empty group".to_string()));
                }
                let close = ops.len();
                ops.push(Op::Close { open });
                if let Op::Open { close: slot, .. } = &mut ops[open] {
                    *slot = close;
                }
            }
            _ => {
                finalize_digits(&mut digits, &mut pending)?;
                let dtype = scalar_dtype(ch).ok_or_else(|| {
                    EvioError::BadComposite(format!("illegal character '{ch}'"))
                })?;
                let count = pending.take().unwrap_or(Count::Fixed(1));
                ops.push(Op::Scalar { dtype, count });
            }
        }
    }

    finalize_digits(&mut digits, &mut pending)?;
    if pending.is_some() {
        return Err(EvioError::BadComposite("dangling multiplier".to_string()));
    }
    if !open_stack.is_empty() {
        return Err(EvioError::BadComposite("unmatched '('".to_string()));
    }
    if ops.is_empty() {
        return Err(EvioError::BadComposite("empty format".to_string()));
    }
    Ok(ops)
}

struct Frame {
    open: usize,
    remaining: u32,
}

/// A scalar token that would read past the data end.
fn token_slice(data: &[u8], pos: usize, size: usize) -> Result<&[u8]> {
    if pos + size > data.len() {
        return Err(EvioError::BadComposite(format!(
            "data ends mid-token: byte {pos} of {}, token needs {size}",
            data.len()
        )));
    }
    Ok(&data[pos..pos + size])
}

/// Resolve a repeat count. Returns `None` when the data is exhausted at the
/// count's own boundary (a clean stop). Stream-read counts are emitted as
/// items of their own dtype.
fn read_count<'a>(
    count: Count,
    data: &'a [u8],
    pos: &mut usize,
    endian: Endian,
    items: &mut Vec<CompositeItem<'a>>,
) -> Result<Option<u32>> {
    let (dtype, size) = match count {
        Count::Fixed(n) => return Ok(Some(n)),
        Count::StreamI32 => (DataType::NValue, 4),
        Count::StreamI16 => (DataType::ShortNValue, 2),
        Count::StreamI8 => (DataType::ByteNValue, 1),
    };
    if *pos >= data.len() {
        return Ok(None);
    }
    let bytes = token_slice(data, *pos, size)?;
    let value: i64 = match count {
        Count::StreamI32 => endian.read_i32(data, *pos)? as i64,
        Count::StreamI16 => endian.read_i16(data, *pos)? as i64,
        _ => endian.read_i8(data, *pos)? as i64,
    };
    if value < 0 {
        return Err(EvioError::BadComposite(format!(
            "negative repeat count {value} at byte {pos}"
        )));
    }
    items.push(CompositeItem { dtype, bytes });
    *pos += size;
    Ok(Some(value as u32))
}

/// Interpret the bytecode over the data blob. On format exhaustion with
/// data remaining, execution resumes from the last group entered, else from
/// the format start, until the data runs dry at a token boundary.
fn run<'a>(ops: &[Op], data: &'a [u8], endian: Endian) -> Result<Vec<CompositeItem<'a>>> {
    let mut items = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut last_open: Option<usize> = None;
    let mut pos = 0usize;
    let mut pc = 0usize;

    'run: loop {
        if pc >= ops.len() {
            if pos >= data.len() {
                break;
            }
            match last_open {
                Some(open) => {
                    stack.push(Frame {
                        open,
                        remaining: u32::MAX,
                    });
                    pc = open + 1;
                }
                None => pc = 0,
            }
            continue;
        }
        match ops[pc] {
            Op::Scalar { dtype, count } => {
                let n = match read_count(count, data, &mut pos, endian, &mut items)? {
                    Some(n) => n,
                    None => break 'run,
                };
                let size = dtype.element_size().unwrap_or(1);
                for _ in 0..n {
                    if pos >= data.len() {
                        break 'run;
                    }
                    let bytes = token_slice(data, pos, size)?;
                    items.push(CompositeItem { dtype, bytes });
                    pos += size;
                }
                pc += 1;
            }
            Op::Open { count, close } => {
                last_open = Some(pc);
                let n = match read_count(count, data, &mut pos, endian, &mut items)? {
                    Some(n) => n,
                    None => break 'run,
                };
                if n == 0 {
                    pc = close + 1;
                } else {
                    stack.push(Frame {
                        open: pc,
                        remaining: n - 1,
                    });
                    pc += 1;
                }
            }
            Op::Close { open } => match stack.last_mut() {
                Some(frame) if frame.open == open => {
                    if frame.remaining > 0 {
                        frame.remaining -= 1;
                        pc = open + 1;
                    } else {
                        stack.pop();
                        pc += 1;
                    }
                }
                _ => {
                    return Err(EvioError::BadComposite(
                        "group nesting error during interpretation".to_string(),
                    ));
                }
            },
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{leaf_bank, tagsegment, Writer};

    fn run_format(format: &str, data: &[u8], endian: Endian) -> Result<Vec<(DataType, usize)>> {
        let ops = compile(format)?;
        let items = run(&ops, data, endian)?;
        Ok(items.iter().map(|it| (it.dtype, it.bytes.len())).collect())
    }

    #[test]
    fn test_compile_rejects_malformed() {
        for bad in [
            "q",      // illegal character
            "16D",    // multiplier out of range
            "1D",     // multiplier out of range
            "(i",     // unmatched open
            "i)",     // unmatched close
            "2",      // dangling multiplier
            "N",      // dangling multiplier
            "2N(i)",  // double multiplier
            "()",     // empty group
            "",       // empty format
        ] {
            assert!(
                matches!(compile(bad), Err(EvioError::BadComposite(_))),
                "'{bad}' should not compile"
            );
        }
    }

    #[test]
    fn test_simple_scalars() {
        let endian = Endian::Big;
        let mut w = Writer::new(endian);
        w.u32(7);
        w.f64(2.5);
        let seq = run_format("i,D", &w.buf, endian).unwrap();
        assert_eq!(
            seq,
            vec![(DataType::Uint32, 4), (DataType::Float64, 8)]
        );
    }

    #[test]
    fn test_stream_count_emitted() {
        let endian = Endian::Little;
        let mut w = Writer::new(endian);
        w.u32(3); // N
        w.u32(10);
        w.u32(11);
        w.u32(12);
        let seq = run_format("NI", &w.buf, endian).unwrap();
        assert_eq!(
            seq,
            vec![
                (DataType::NValue, 4),
                (DataType::Int32, 4),
                (DataType::Int32, 4),
                (DataType::Int32, 4),
            ]
        );
    }

    #[test]
    fn test_stream_count_zero() {
        let endian = Endian::Little;
        let mut w = Writer::new(endian);
        w.u32(0);
        let seq = run_format("N(i)", &w.buf, endian).unwrap();
        assert_eq!(seq, vec![(DataType::NValue, 4)]);
    }

    #[test]
    fn test_negative_count_rejected() {
        let endian = Endian::Little;
        let mut w = Writer::new(endian);
        w.u32(-1i32 as u32);
        assert!(matches!(
            run_format("NI", &w.buf, endian),
            Err(EvioError::BadComposite(_))
        ));
    }

    #[test]
    fn test_mid_token_exhaustion() {
        let endian = Endian::Little;
        assert!(matches!(
            run_format("D", &[0u8; 4], endian),
            Err(EvioError::BadComposite(_))
        ));
    }

    #[test]
    fn test_replay_from_format_start() {
        let endian = Endian::Big;
        let mut w = Writer::new(endian);
        w.u32(1);
        w.u32(2);
        w.u32(3);
        let seq = run_format("i", &w.buf, endian).unwrap();
        assert_eq!(seq.len(), 3);
        assert!(seq.iter().all(|&(dt, _)| dt == DataType::Uint32));
    }

    fn group_pass(w: &mut Writer, m: i8) {
        w.u16(0x1111);
        w.f64(1.0);
        w.f64(2.0);
        w.bytes(&[m as u8]);
        for _ in 0..m {
            w.f32(0.5);
        }
    }

    #[test]
    fn test_grouped_format_with_tail_replay() {
        for endian in [Endian::Little, Endian::Big] {
            let mut w = Writer::new(endian);
            w.u32(99);
            w.u64(77);
            group_pass(&mut w, 1); // two passes from the fixed multiplier
            group_pass(&mut w, 2);
            group_pass(&mut w, 0); // tail: the group reapplies until dry

            let seq = run_format("i,L,2(s,2D,mF)", &w.buf, endian).unwrap();
            let pass = |m: usize| {
                let mut v = vec![
                    (DataType::Uint16, 2),
                    (DataType::Float64, 8),
                    (DataType::Float64, 8),
                    (DataType::ByteNValue, 1),
                ];
                v.extend(std::iter::repeat((DataType::Float32, 4)).take(m));
                v
            };
            let mut expected = vec![(DataType::Uint32, 4), (DataType::Int64, 8)];
            expected.extend(pass(1));
            expected.extend(pass(2));
            expected.extend(pass(0));
            assert_eq!(seq, expected);
        }
    }

    #[test]
    fn test_parse_composite_payload() {
        let endian = Endian::Little;
        let fmt = tagsegment(endian, 0x9, 0x3, b"N(i)\0\0\0\0");
        let mut w = Writer::new(endian);
        w.u32(2);
        w.u32(0xAAAA);
        w.u32(0xBBBB);
        let blob = leaf_bank(endian, 0x12, 0x1, 0x34, &w.buf);

        let mut payload = fmt.clone();
        payload.extend_from_slice(&blob);
        let composite = parse_composite(&payload, endian).unwrap();
        assert_eq!(composite.format, "N(i)");
        assert_eq!(composite.format_tag, 0x9);
        assert_eq!(composite.data_tag, 0x12);
        assert_eq!(composite.data_num, 0x34);
        assert_eq!(composite.len(), 3);
        assert_eq!(composite.items()[0].dtype, DataType::NValue);
        assert_eq!(composite.items()[1].dtype, DataType::Uint32);
        assert_eq!(
            endian.read_u32(composite.items()[2].bytes, 0).unwrap(),
            0xBBBB
        );
    }

    #[test]
    fn test_parse_composite_trailing_slack() {
        let endian = Endian::Little;
        let fmt = tagsegment(endian, 0x9, 0x3, b"i\0\0\0");
        let mut w = Writer::new(endian);
        w.u32(1);
        let blob = leaf_bank(endian, 0x12, 0x1, 0, &w.buf);
        let mut payload = fmt.clone();
        payload.extend_from_slice(&blob);
        payload.extend_from_slice(&[0u8; 4]);
        assert!(matches!(
            parse_composite(&payload, endian),
            Err(EvioError::Corruption(_))
        ));
    }
}
