//! evio-tool — CLI explorer for EVIO v6 event files
//!
//! Walk the container layers of a CODA data file:
//! file header → records → events → bank trees → typed payloads
//!
//! # Usage
//!
//! ```text
//! evio-tool info   <file>                  File header and record summary
//! evio-tool ls     <file>                  Record table
//! evio-tool events <file> <record>         Event table for one record
//! evio-tool tree   <file> <record> [evt]   Bank tree of one or all events
//! evio-tool dump   <file> <record> <evt>   Leaf payloads as typed values
//! evio-tool dump   <file> <record> <evt> --hex    ... as a hex dump
//! evio-tool dict   <file>                  Decoded dictionary entries
//! ```
//!
//! Exit codes: 0 ok, 2 usage, 3 open failure, 4 malformed file,
//! 5 unsupported feature (e.g. compressed records).

mod cmd_dict;
mod cmd_dump;
mod cmd_events;
mod cmd_info;
mod cmd_records;
mod cmd_tree;
mod common;
mod style;

use std::env;
use std::process;

use evio6::EvioError;

use style::{BOLD, DIM, GREEN, RED, RESET};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(2);
    }

    let result = match args[1].as_str() {
        "info" => cmd_info::run(&args[2..]),
        "ls" | "records" => cmd_records::run(&args[2..]),
        "events" => cmd_events::run(&args[2..]),
        "tree" => cmd_tree::run(&args[2..]),
        "dump" => cmd_dump::run(&args[2..]),
        "dict" => cmd_dict::run(&args[2..]),
        "-h" | "--help" | "help" => {
            print_usage();
            Ok(())
        }
        _ => {
            eprintln!("{RED}Unknown command: {}{RESET}", args[1]);
            print_usage();
            process::exit(2);
        }
    };

    if let Err(e) = result {
        eprintln!("{RED}error:{RESET} {e}");
        process::exit(exit_code(&e));
    }
}

fn exit_code(e: &EvioError) -> i32 {
    match e {
        EvioError::Io(_) => 3,
        EvioError::UnsupportedCompression(_) => 5,
        _ => 4,
    }
}

fn print_usage() {
    eprintln!(
        r#"
{BOLD}evio-tool{RESET} — EVIO v6 event file explorer

{DIM}Walk the layers: file → records → events → banks → values{RESET}

{BOLD}USAGE:{RESET}
    evio-tool <COMMAND> [OPTIONS]

{BOLD}COMMANDS:{RESET}
    {GREEN}info{RESET}    <file>                  File header and record summary
    {GREEN}ls{RESET}      <file>                  Record table
    {GREEN}events{RESET}  <file> <record>         Event table for one record
    {GREEN}tree{RESET}    <file> <record> [evt]   Bank tree of one or all events
    {GREEN}dump{RESET}    <file> <record> <evt> [--hex]   Leaf payloads
    {GREEN}dict{RESET}    <file>                  Decoded dictionary entries

{BOLD}EXAMPLES:{RESET}
    evio-tool info run_003842.evio
    evio-tool ls run_003842.evio
    evio-tool tree run_003842.evio 0 5
    evio-tool dump run_003842.evio 0 5 --hex
"#
    );
}
