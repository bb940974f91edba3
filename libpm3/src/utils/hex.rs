//! Hexadecimal helpers used for frame dumps, keys and card images.
//!
//! Rendering is uppercase, two digits per byte. Parsing is lenient: any
//! character that is not a hex digit is skipped, so dumps copied with
//! spaces, dashes or colons parse directly.

/// Convert a byte slice to an uppercase hex string without separators.
///
/// Example: `&[0xde, 0xad]` -> `"DEAD"`
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    hex::encode_upper(bytes)
}

/// Convert a byte slice to an uppercase hex string with a single space
/// between each byte.
///
/// Example: `&[0xde, 0xad]` -> `"DE AD"`
pub fn bytes_to_hex_spaced(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Hex of the bytes in reverse order, for byte-order-flipped display.
pub fn bytes_to_rhex(bytes: &[u8]) -> String {
    let reversed: Vec<u8> = bytes.iter().rev().copied().collect();
    hex::encode_upper(reversed)
}

/// Parse a hex string into bytes.
///
/// Non-hex characters are dropped before decoding. Returns an error
/// message string when the remaining digits have odd length.
pub fn parse_hex(s: &str) -> Result<Vec<u8>, String> {
    let cleaned: String = s.chars().filter(|c| c.is_ascii_hexdigit()).collect();
    hex::decode(&cleaned).map_err(|e| format!("invalid hex '{}': {}", cleaned, e))
}
