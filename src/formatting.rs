//! Human-readable quantity formatting under a fixed output-width budget.

/// Divisor for binary (IEC) unit prefixes.
pub const BINARY: u64 = 1024;
/// Divisor for decimal (SI) unit prefixes.
pub const DECIMAL: u64 = 1000;

/// Unit prefix ladder; index 0 is the base unit.
const PREFIXES: [&str; 7] = ["", "K", "M", "G", "T", "P", "E"];

/// Build a reusable formatter closure for a fixed width budget and divisor.
///
/// The returned closure is pure and can be shared across columns; typical use
/// is one closure per (width, divisor) configuration for the whole table.
pub fn humanize(max_len: usize, divisor: u64) -> impl Fn(u64) -> String {
    move |value| shorten(value, max_len, divisor)
}

/// Shorten a non-negative count to at most `max_len` characters using the
/// largest prefix that keeps the scaled magnitude in `[1, divisor)`.
///
/// Exact multiples of `divisor^index` print without decimals (2 GiB is "2G",
/// not "2.00G"). Otherwise precision backs off from two decimal places to
/// zero until the result fits; the zero-decimal rendering is returned even if
/// it still exceeds the budget.
pub fn shorten(value: u64, max_len: usize, divisor: u64) -> String {
    let mut scaled = value as f64;
    let mut index = 0usize;
    while scaled >= divisor as f64 && index + 1 < PREFIXES.len() {
        scaled /= divisor as f64;
        index += 1;
    }
    let prefix = PREFIXES[index];

    let step = divisor.pow(index as u32);
    if index == 0 || value % step == 0 {
        return format!("{}{}", value / step, prefix);
    }

    let mut candidate = String::new();
    for decimals in [2usize, 1, 0] {
        candidate = format!("{scaled:.decimals$}{prefix}");
        if candidate.len() <= max_len {
            return candidate;
        }
    }
    candidate
}
