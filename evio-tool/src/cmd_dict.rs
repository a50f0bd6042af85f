use std::process;

use evio6::{EvioError, EvioFile};

use crate::style::*;

pub(crate) fn run(args: &[String]) -> Result<(), EvioError> {
    if args.is_empty() {
        eprintln!("Usage: evio-tool dict <file>");
        process::exit(2);
    }
    let path = &args[0];
    let file = EvioFile::open(path)?;

    header(&format!("Dictionary: {path}"));

    if !file.header().has_dictionary {
        println!("  {DIM}File carries no dictionary{RESET}");
        println!();
        return Ok(());
    }

    let Some(dict) = file.dictionary()? else {
        println!("  {YELLOW}Dictionary flagged but not present{RESET}");
        println!();
        return Ok(());
    };

    println!();
    println!("  {DIM}{:>8}  {:>5}  Name{RESET}", "Tag", "Num");
    println!("  {DIM}{}{RESET}", "-".repeat(48));
    for entry in &dict.entries {
        let num = entry
            .num
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:>8}  {:>5}  {GREEN}{}{RESET}",
            format!("0x{:04x}", entry.tag),
            num,
            entry.name,
        );
    }
    println!();
    println!("  {DIM}{} entries{RESET}", dict.len());
    println!();
    Ok(())
}
