use evio6::{BankKind, TypedData};

// ── ANSI styling ─────────────────────────────────────────────────────────

pub(crate) const RESET: &str = "\x1b[0m";
pub(crate) const BOLD: &str = "\x1b[1m";
pub(crate) const DIM: &str = "\x1b[2m";
pub(crate) const GREEN: &str = "\x1b[32m";
pub(crate) const CYAN: &str = "\x1b[36m";
pub(crate) const YELLOW: &str = "\x1b[33m";
pub(crate) const BLUE: &str = "\x1b[34m";
pub(crate) const RED: &str = "\x1b[31m";
pub(crate) const WHITE: &str = "\x1b[37m";

// ── Box-drawing ──────────────────────────────────────────────────────────

pub(crate) const PIPE: &str = "│";
pub(crate) const TEE: &str = "├──";
pub(crate) const ELBOW: &str = "└──";
pub(crate) const DASH_LINE: &str = "────────────────────────────────────────────────────────────";
pub(crate) const DOUBLE_LINE: &str = "════════════════════════════════════════════════════════════";

// ── Formatting ───────────────────────────────────────────────────────────

pub(crate) fn format_size(bytes: u64) -> String {
    if bytes >= 1024 * 1024 * 1024 {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    } else if bytes >= 1024 * 1024 {
        format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}

pub(crate) fn format_commas(n: u64) -> String {
    let s = n.to_string();
    let bytes = s.as_bytes();
    let mut result = Vec::new();
    for (i, &b) in bytes.iter().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(b',');
        }
        result.push(b);
    }
    result.reverse();
    String::from_utf8(result).unwrap()
}

pub(crate) fn kind_color(kind: BankKind) -> &'static str {
    match kind {
        BankKind::Bank | BankKind::Segment | BankKind::TagSegment => BLUE,
        BankKind::Leaf => WHITE,
        BankKind::Composite => CYAN,
    }
}

/// One leaf element rendered for display, swapped to host order.
pub(crate) fn format_element(typed: &TypedData, i: usize) -> String {
    use evio6::DataType::*;
    match typed.dtype {
        Uint32 => typed.u32_at(i).map(|v| v.to_string()),
        Int32 => typed.i32_at(i).map(|v| v.to_string()),
        Float32 => typed.f32_at(i).map(|v| format!("{v:.6}")),
        Float64 => typed.f64_at(i).map(|v| format!("{v:.6}")),
        Int64 => typed.i64_at(i).map(|v| v.to_string()),
        Uint64 => typed.u64_at(i).map(|v| v.to_string()),
        Int16 => typed.i16_at(i).map(|v| v.to_string()),
        Uint16 => typed.u16_at(i).map(|v| v.to_string()),
        Int8 | ByteNValue => typed.i8_at(i).map(|v| v.to_string()),
        Uint8 => typed.u8_at(i).map(|v| v.to_string()),
        ShortNValue => typed.i16_at(i).map(|v| v.to_string()),
        NValue => typed.i32_at(i).map(|v| v.to_string()),
        Hollerit => typed.element(i).map(|b| {
            if b.iter().all(|&c| (0x20..0x7f).contains(&c)) {
                format!("'{}'", b.iter().map(|&c| c as char).collect::<String>())
            } else {
                b.iter().map(|c| format!("{c:02x}")).collect()
            }
        }),
        StringArray => typed.u8_at(i).map(|c| {
            if (0x20..0x7f).contains(&c) {
                format!("'{}'", c as char)
            } else {
                format!("{c:#04x}")
            }
        }),
        // Unknown words are surfaced verbatim, never swapped.
        _ => typed
            .element(i)
            .map(|b| b.iter().map(|x| format!("{x:02x}")).collect::<String>()),
    }
    .unwrap_or_else(|| "?".to_string())
}

/// First few elements of a leaf, for tree annotations.
pub(crate) fn leaf_preview(typed: &TypedData, max: usize) -> String {
    let count = typed.element_count();
    let shown: Vec<String> = (0..count.min(max)).map(|i| format_element(typed, i)).collect();
    if count > max {
        format!("[{}, …]", shown.join(", "))
    } else {
        format!("[{}]", shown.join(", "))
    }
}

// ── UI output ────────────────────────────────────────────────────────────

pub(crate) fn header(title: &str) {
    println!();
    println!("  {BOLD}{title}{RESET}");
    println!("  {DIM}{DOUBLE_LINE}{RESET}");
}

pub(crate) fn section(title: &str) {
    println!();
    println!("  {CYAN}{BOLD}{title}{RESET}");
    println!("  {DIM}{DASH_LINE}{RESET}");
}

pub(crate) fn kv(key: &str, value: &str) {
    println!("  {DIM}{key:<24}{RESET} {value}");
}

pub(crate) fn kv_highlight(key: &str, value: &str) {
    println!("  {DIM}{key:<24}{RESET} {BOLD}{GREEN}{value}{RESET}");
}
