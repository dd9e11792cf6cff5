//! String validation functions

/// Presence check: any non-empty string counts as filled in.
///
/// Whitespace is deliberately not trimmed, a single space is a value.
pub fn is_filled(s: &str) -> bool {
    !s.is_empty()
}

/// Validates minimum length, counted in UTF-16 code units as browsers
/// report string length
pub fn validate_min_length(s: &str, min: usize) -> Result<(), String> {
    if s.encode_utf16().count() >= min {
        Ok(())
    } else {
        Err(format!("Please enter at least {} characters", min))
    }
}

/// Equality validator
pub fn equals(value: &str, expected: &str) -> bool {
    value == expected
}
