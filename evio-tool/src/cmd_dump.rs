use std::process;

use evio6::{BankKind, BankNode, DataType, EvioError, EvioFile, TypedData};

use crate::common::parse_index;
use crate::style::*;

pub(crate) fn run(args: &[String]) -> Result<(), EvioError> {
    if args.len() < 3 {
        eprintln!("Usage: evio-tool dump <file> <record> <event> [--hex]");
        process::exit(2);
    }
    let path = &args[0];
    let record_index = parse_index(&args[1], "record index");
    let event_index = parse_index(&args[2], "event index");
    let hex = args[3..].iter().any(|a| a == "--hex");

    let file = EvioFile::open(path)?;
    let record = file.record(record_index)?;
    let event = record.event(event_index)?;
    let root = event.root()?;

    header(&format!(
        "Payloads: {path} record {record_index} event {event_index}"
    ));
    let mut trail = Vec::new();
    dump_node(&root, &mut trail, hex)?;
    println!();
    Ok(())
}

fn dump_node(node: &BankNode, trail: &mut Vec<String>, hex: bool) -> Result<(), EvioError> {
    trail.push(format!("0x{:04x}.{}", node.tag, node.num));

    match node.kind() {
        BankKind::Bank | BankKind::Segment | BankKind::TagSegment => {
            for child in node.children() {
                dump_node(&child?, trail, hex)?;
            }
        }
        BankKind::Leaf | BankKind::Composite => {
            section(&format!(
                "{}  {DIM}{}{RESET}",
                trail.join(" / "),
                node.data_type
            ));
            dump_leaf(node, hex)?;
        }
    }

    trail.pop();
    Ok(())
}

fn dump_leaf(node: &BankNode, hex: bool) -> Result<(), EvioError> {
    if hex || node.data_type == DataType::Unknown32 {
        hex_dump(node.data()?, node.data_offset());
        return Ok(());
    }

    match node.data_type {
        DataType::StringArray => {
            let decoded = node.strings()?;
            for (i, s) in decoded.strings.iter().enumerate() {
                println!("  {DIM}{i:>5}{RESET}  {s:?}");
            }
            if decoded.legacy_termination {
                println!("  {YELLOW}(legacy termination: no 0x04 run){RESET}");
            }
        }
        DataType::Composite => {
            let composite = node.composite()?;
            println!("  {DIM}format{RESET} \"{}\"", composite.format);
            for (i, item) in composite.iter().enumerate() {
                let typed = TypedData {
                    dtype: item.dtype,
                    bytes: item.bytes,
                    endian: composite.endian,
                };
                println!(
                    "  {DIM}{i:>5}  {:<10}{RESET}  {}",
                    item.dtype.to_string(),
                    format_element(&typed, 0)
                );
            }
        }
        _ => {
            let typed = node.typed_data()?;
            let count = typed.element_count();
            for row_start in (0..count).step_by(8) {
                let row: Vec<String> = (row_start..count.min(row_start + 8))
                    .map(|i| format!("{:>12}", format_element(&typed, i)))
                    .collect();
                println!("  {DIM}{row_start:>5}{RESET}  {}", row.join(" "));
            }
        }
    }
    Ok(())
}

fn hex_dump(bytes: &[u8], base: usize) {
    for (row, chunk) in bytes.chunks(16).enumerate() {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{b:02x}")).collect();
        let ascii: String = chunk
            .iter()
            .map(|&b| {
                if (0x20..0x7f).contains(&b) {
                    b as char
                } else {
                    '.'
                }
            })
            .collect();
        println!(
            "  {DIM}{:08x}{RESET}  {:<47}  {DIM}{ascii}{RESET}",
            base + row * 16,
            hex.join(" "),
        );
    }
}
