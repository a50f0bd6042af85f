use std::process;

use evio6::{BankKind, BankNode, Dictionary, EvioFile, Result};

use crate::common::parse_index;
use crate::style::*;

pub(crate) fn run(args: &[String]) -> Result<()> {
    if args.len() < 2 {
        eprintln!("Usage: evio-tool tree <file> <record> [event]");
        process::exit(2);
    }
    let path = &args[0];
    let record_index = parse_index(&args[1], "record index");
    let event_index = args.get(2).map(|s| parse_index(s, "event index"));

    let file = EvioFile::open(path)?;
    let record = file.record(record_index)?;
    let dict = file.dictionary().unwrap_or(None);

    header(&format!("Bank tree: {path} record {record_index}"));

    match event_index {
        Some(i) => {
            let event = record.event(i)?;
            print_event(i, &event.root()?, dict.as_ref())?;
        }
        None => {
            for (i, event) in record.events()?.enumerate() {
                print_event(i, &event.root()?, dict.as_ref())?;
            }
        }
    }
    println!();
    Ok(())
}

fn print_event(index: usize, root: &BankNode, dict: Option<&Dictionary>) -> Result<()> {
    println!();
    println!("  {BOLD}event {index}{RESET}");
    print_node(root, "  ", true, dict)
}

fn node_label(node: &BankNode, dict: Option<&Dictionary>) -> String {
    let color = kind_color(node.kind());
    let mut label = format!(
        "{color}tag 0x{:04x}{RESET} num {:<3} {DIM}{:<10}{RESET} {:>5} words",
        node.tag,
        node.num,
        node.data_type.to_string(),
        node.length_words,
    );
    if let Some(entry) = dict.and_then(|d| d.find(node.tag, Some(node.num))) {
        label.push_str(&format!("  {GREEN}{}{RESET}", entry.name));
    }
    label
}

fn print_node(node: &BankNode, prefix: &str, is_last: bool, dict: Option<&Dictionary>) -> Result<()> {
    let connector = if is_last { ELBOW } else { TEE };
    let mut line = format!("{prefix}{DIM}{connector}{RESET} {}", node_label(node, dict));

    match node.kind() {
        BankKind::Leaf => {
            if node.data_type == evio6::DataType::StringArray {
                let decoded = node.strings()?;
                line.push_str(&format!("  {:?}", decoded.strings));
                if decoded.legacy_termination {
                    line.push_str(&format!("  {YELLOW}(legacy termination){RESET}"));
                }
            } else {
                let typed = node.typed_data()?;
                line.push_str(&format!(
                    "  {DIM}x{}{RESET} {}",
                    typed.element_count(),
                    leaf_preview(&typed, 4)
                ));
            }
            println!("{line}");
        }
        BankKind::Composite => {
            let composite = node.composite()?;
            line.push_str(&format!(
                "  {DIM}fmt{RESET} \"{}\" {DIM}x{}{RESET}",
                composite.format,
                composite.len()
            ));
            println!("{line}");
        }
        BankKind::Bank | BankKind::Segment | BankKind::TagSegment => {
            println!("{line}");
            let children: Vec<BankNode> = node.children().collect::<Result<_>>()?;
            let child_prefix = if is_last {
                format!("{prefix}    ")
            } else {
                format!("{prefix}{DIM}{PIPE}{RESET}   ")
            };
            for (i, child) in children.iter().enumerate() {
                print_node(child, &child_prefix, i == children.len() - 1, dict)?;
            }
        }
    }
    Ok(())
}
