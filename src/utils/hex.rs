//! Hex+ASCII payload dump used by the `subscribe` command.

/// Bytes per dump row.
const ROW_WIDTH: usize = 16;

/// Format `bytes` as a classic offset / hex / ASCII dump, 16 bytes per row.
///
/// Unprintable bytes render as `.` in the ASCII column. An empty slice
/// produces an empty string.
pub fn dump(bytes: &[u8]) -> String {
    let mut out = String::new();

    for (row, chunk) in bytes.chunks(ROW_WIDTH).enumerate() {
        out.push_str(&format!("{:08x}  ", row * ROW_WIDTH));

        for col in 0..ROW_WIDTH {
            match chunk.get(col) {
                Some(b) => out.push_str(&format!("{b:02x} ")),
                None => out.push_str("   "),
            }
        }

        out.push_str(" |");
        for &b in chunk {
            if b.is_ascii_graphic() || b == b' ' {
                out.push(b as char);
            } else {
                out.push('.');
            }
        }
        out.push_str("|\n");
    }

    out
}
