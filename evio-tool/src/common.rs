use std::process;

/// Parse a numeric argument; bad input is a usage error.
pub(crate) fn parse_index(s: &str, what: &str) -> usize {
    s.parse().unwrap_or_else(|_| {
        eprintln!("invalid {what}: {s}");
        process::exit(2);
    })
}
