use std::process;

use evio6::{Compression, EvioError, EvioFile};

use crate::style::*;

pub(crate) fn run(args: &[String]) -> Result<(), EvioError> {
    if args.is_empty() {
        eprintln!("Usage: evio-tool info <file>");
        process::exit(2);
    }
    let path = &args[0];
    let file = EvioFile::open(path)?;
    let h = file.header();

    header(&format!("EVIO file: {path}"));

    section("File header");
    kv("Byte order", &h.endian.to_string());
    kv("Version", &h.version.to_string());
    kv("Header kind", &h.kind.to_string());
    kv("File number", &h.file_number.to_string());
    kv("Header length", &format!("{} words", h.header_words));
    kv("File size", &format_size(file.data().len() as u64));
    kv_highlight("Records", &format_commas(file.record_count() as u64));
    kv(
        "Record index",
        if h.index_bytes > 0 {
            "in file header"
        } else if h.trailer_has_index && h.trailer_position != 0 {
            "in trailer"
        } else {
            "none (sequential scan)"
        },
    );
    kv(
        "User header",
        &if h.user_header_bytes > 0 {
            format_size(h.user_header_bytes as u64)
        } else {
            "none".to_string()
        },
    );
    kv("Dictionary", if h.has_dictionary { "yes" } else { "no" });
    kv("First event", if h.has_first_event { "yes" } else { "no" });
    kv(
        "Trailer",
        &if h.trailer_position != 0 {
            format!("at offset {}", h.trailer_position)
        } else {
            "none".to_string()
        },
    );

    section("Records");
    let mut total_events = 0u64;
    let mut total_bytes = 0u64;
    let mut compressed = 0u64;
    let mut scan_error = None;
    for record in file.records() {
        match record {
            Ok(record) => {
                total_events += record.header().event_count as u64;
                total_bytes += record.byte_len() as u64;
                if record.compression() != Compression::None {
                    compressed += 1;
                }
            }
            Err(e) => {
                scan_error = Some(e);
                break;
            }
        }
    }
    kv_highlight("Events", &format_commas(total_events));
    kv("Record bytes", &format_size(total_bytes));
    if compressed > 0 {
        kv(
            "Compressed records",
            &format!("{YELLOW}{compressed} (payloads not readable){RESET}"),
        );
    }
    if let Some(e) = scan_error {
        println!("  {YELLOW}corrupt record stopped the walk: {e}{RESET}");
    }

    if let Some(trailer) = file.trailer()? {
        section("Trailer");
        kv("Offset", &trailer.offset().to_string());
        kv("Kind", &trailer.header().kind.to_string());
        if h.trailer_has_index {
            let index = trailer.trailer_index(Some(file.record_count() as u32))?;
            kv("Index entries", &format_commas(index.len() as u64));
        }
    }

    if h.has_dictionary {
        section("Dictionary");
        match file.dictionary() {
            Ok(Some(dict)) => kv_highlight("Entries", &dict.len().to_string()),
            Ok(None) => kv("Entries", "flagged but not present"),
            Err(e) => println!("  {YELLOW}unreadable dictionary: {e}{RESET}"),
        }
    }

    println!();
    Ok(())
}
