/// Format a byte count with binary units, e.g. `1.50 KiB`.
pub fn human_readable_bytes(size: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];

    if size < 1024 {
        return format!("{size} B");
    }
    let mut value = size as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", UNITS[unit])
}

/// Chunk `items` into rows of at most `width` elements.
pub fn sublists<T: Clone>(items: &[T], width: usize) -> Vec<Vec<T>> {
    items.chunks(width.max(1)).map(<[T]>::to_vec).collect()
}
