use std::process;

use evio6::{EvioError, EvioFile};

use crate::common::parse_index;
use crate::style::*;

pub(crate) fn run(args: &[String]) -> Result<(), EvioError> {
    if args.len() < 2 {
        eprintln!("Usage: evio-tool events <file> <record>");
        process::exit(2);
    }
    let path = &args[0];
    let record_index = parse_index(&args[1], "record index");

    let file = EvioFile::open(path)?;
    let record = file.record(record_index)?;

    header(&format!("Events: {path} record {record_index}"));
    kv("Record offset", &record.offset().to_string());
    kv("Event type", &record.header().event_type.to_string());
    kv_highlight("Events", &record.event_count().to_string());
    println!();
    println!(
        "  {DIM}{:>5}  {:>12}  {:>10}  {:>8}  {:>5}  {:>4}  Type{RESET}",
        "ID", "Offset", "Size", "Tag", "Num", "Len"
    );
    println!("  {DIM}{}{RESET}", "-".repeat(64));

    for (i, event) in record.events()?.enumerate() {
        match event.root() {
            Ok(root) => {
                println!(
                    "  {:>5}  {:>12}  {:>10}  {:>8}  {:>5}  {:>4}  {}",
                    i,
                    event.offset(),
                    format_size(event.length() as u64),
                    format!("0x{:04x}", root.tag),
                    root.num,
                    root.length_words,
                    root.data_type,
                );
            }
            Err(e) => {
                println!("  {:>5}  {:>12}  {RED}{e}{RESET}", i, event.offset());
            }
        }
    }
    println!();
    Ok(())
}
