//! A1-style cell reference handling.

/// Zero-based column index from a cell reference such as `B7` or `AA12`.
///
/// Only the leading ASCII letters participate; case is ignored. Returns
/// `None` when the reference has no letter prefix, leaving the caller free to
/// fall back to positional placement.
pub(crate) fn column_index(cell_ref: &str) -> Option<usize> {
    let mut index: usize = 0;
    let mut seen = false;
    for byte in cell_ref.bytes() {
        if !byte.is_ascii_alphabetic() {
            break;
        }
        seen = true;
        let digit = usize::from(byte.to_ascii_uppercase() - b'A');
        index = index.checked_mul(26)?.checked_add(digit + 1)?;
    }
    if seen {
        index.checked_sub(1)
    } else {
        None
    }
}

/// One-based row number from the digit suffix of a cell reference.
pub(crate) fn row_number(cell_ref: &str) -> Option<usize> {
    let digits: String = cell_ref.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}
