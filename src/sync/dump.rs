//! Human-readable dump of local and shared register state
//!
//! Output is meant for troubleshooting and test assertions. Every line of the
//! dump starts with `| ` between the `BEGIN` and `END` markers.

use std::fmt::Write as _;

use crate::{
    layout::{SharedHeader, SharedLayout, ENTRY_SENTINEL},
    registers::{name::name_of, RegisterStore},
};

/// First line of every dump
pub const DUMP_BEGIN: &str = "BEGIN register dump";
/// Last line of every dump
pub const DUMP_END: &str = "END register dump";

/// Render every nonempty local register, entries in insertion order
pub fn render_local(out: &mut String, store: &RegisterStore) {
    let _ = writeln!(out, "| local registers:");
    for reg in store.iter().filter(|reg| !reg.is_empty()) {
        let _ = writeln!(out, "|   \"{} ({} entries)", reg.name(), reg.len());
        for file in reg.files() {
            let _ = writeln!(out, "|     {}", file);
        }
    }
}

/// Render the shared header, each register's metadata and its raw bytes
pub fn render_shared<B: AsRef<[u8]>>(out: &mut String, header: &SharedHeader, layout: &SharedLayout<B>) {
    let _ = writeln!(
        out,
        "| shared header: size_backed={}, write_counter={}, length_area_used={}, slack={}",
        header.size_backed,
        header.write_counter,
        header.length_area_used,
        header.slack()
    );

    for (slot, meta) in header.registers.iter().enumerate() {
        let name = name_of(slot).unwrap_or('?');
        let _ = writeln!(
            out,
            "|   \"{}: write_counter={}, num_entries={}, offset={}, length_used={}, length_available={}",
            name, meta.write_counter, meta.num_entries, meta.offset, meta.length_used, meta.length_available
        );

        let used = meta.used_range();
        let slack = meta.slack_range();
        match (
            layout.bytes_at(used.start, used.len()),
            layout.bytes_at(slack.start, slack.len()),
        ) {
            (Ok(used), Ok(slack)) => {
                let _ = writeln!(out, "|     used:  {}", escape_bytes(used));
                let _ = writeln!(out, "|     slack: {}", escape_bytes(slack));
            }
            (Err(e), _) | (_, Err(e)) => {
                let _ = writeln!(out, "|     unreadable: {}", e);
            }
        }
    }
}

/// Printable ASCII verbatim, sentinels as `(0)`, anything else as `\xNN`
pub fn escape_bytes(bytes: &[u8]) -> String {
    let mut escaped = String::with_capacity(bytes.len());
    for &byte in bytes {
        match byte {
            ENTRY_SENTINEL => escaped.push_str("(0)"),
            0x20..=0x7e => escaped.push(byte as char),
            _ => {
                let _ = write!(escaped, "\\x{:02x}", byte);
            }
        }
    }
    escaped
}
