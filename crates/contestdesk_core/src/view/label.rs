//! Position labels (`A`, `B`, …, `Z`, `AA`, …).
//!
//! Labels depend on list position only, never on ids or names.

/// Converts a zero-based position into its letter label.
pub fn position_label(position: usize) -> String {
    let mut remaining = position as u128 + 1;
    let mut letters = Vec::new();
    while remaining > 0 {
        remaining -= 1;
        letters.push(char::from(b'A' + (remaining % 26) as u8));
        remaining /= 26;
    }
    letters.iter().rev().collect()
}

/// Parses a letter label back into a zero-based position.
///
/// Accepts lowercase input. Returns `None` for empty input, non-letters, or
/// labels past `usize::MAX`.
pub fn parse_position_label(label: &str) -> Option<usize> {
    let label = label.trim();
    if label.is_empty() {
        return None;
    }

    let mut value: usize = 0;
    for ch in label.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let digit = (ch.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        value = value.checked_mul(26)?.checked_add(digit)?;
    }
    Some(value - 1)
}
