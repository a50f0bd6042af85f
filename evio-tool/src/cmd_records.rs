use std::process;

use evio6::{Compression, EvioError, EvioFile};

use crate::style::*;

pub(crate) fn run(args: &[String]) -> Result<(), EvioError> {
    if args.is_empty() {
        eprintln!("Usage: evio-tool ls <file>");
        process::exit(2);
    }
    let path = &args[0];
    let file = EvioFile::open(path)?;

    header(&format!("Records: {path}"));
    println!();
    println!(
        "  {DIM}{:>4}  {:>12}  {:>10}  {:>7}  {:>9}  Kind{RESET}",
        "ID", "Offset", "Size", "Events", "Comp"
    );
    println!("  {DIM}{}{RESET}", "-".repeat(58));

    for (i, record) in file.records().enumerate() {
        match record {
            Ok(record) => {
                let h = record.header();
                let comp = match record.compression() {
                    Compression::None => format!("{:>9}", "-"),
                    other => format!("{YELLOW}{:>9}{RESET}", other.to_string()),
                };
                let mut kind = h.kind.to_string();
                if record.is_last() {
                    kind.push_str(" (last)");
                }
                println!(
                    "  {:>4}  {:>12}  {:>10}  {:>7}  {}  {}",
                    i,
                    record.offset(),
                    format_size(record.byte_len() as u64),
                    h.event_count,
                    comp,
                    kind,
                );
            }
            Err(e) => {
                println!("  {:>4}  {RED}{e}{RESET}", i);
                break;
            }
        }
    }

    if let Some(trailer) = file.trailer()? {
        println!(
            "  {DIM}{:>4}  {:>12}  {:>10}  {:>7}  {:>9}  {}{RESET}",
            "T",
            trailer.offset(),
            format_size(trailer.byte_len() as u64),
            "-",
            "-",
            trailer.header().kind,
        );
    }
    println!();
    Ok(())
}
