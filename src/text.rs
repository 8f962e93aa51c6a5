//! Helpers for raw cell text captured from rendered pages.

/// First number in `text`, with `,` accepted as decimal separator.
/// `"1.95"` → 1.95, `"Back 2,5k"` → 2.5, `"-"` → None.
pub fn first_float(text: &str) -> Option<f64> {
    let normalized = text.replace(',', ".");
    let bytes = normalized.as_bytes();
    let start = bytes.iter().position(|b| b.is_ascii_digit())?;

    let mut end = start;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end + 1 < bytes.len() && bytes[end] == b'.' && bytes[end + 1].is_ascii_digit() {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    normalized[start..end].parse().ok()
}

/// Collapse all whitespace runs to single spaces and trim.
pub fn collapse_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
