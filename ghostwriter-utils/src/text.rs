/// Single-line, length-capped rendering of free text for log fields.
pub fn log_preview(raw: &str, max_chars: usize) -> String {
    let flattened = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if flattened.chars().count() <= max_chars {
        return flattened;
    }

    let mut out: String = flattened.chars().take(max_chars).collect();
    out.push('…');
    out
}

/// Human-readable byte size (e.g. 512 B, 1.5 KiB, 2.0 MiB).
pub fn format_byte_size(bytes: usize) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;

    let value = bytes as f64;
    if value >= MIB {
        format!("{:.1} MiB", value / MIB)
    } else if value >= KIB {
        format!("{:.1} KiB", value / KIB)
    } else {
        format!("{} B", bytes)
    }
}
