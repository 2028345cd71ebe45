//! Hex rendering of NFCIDs and frames for logs, and parsing for fixtures.

use std::fmt::Write;

use crate::{Error, Result};

fn render(bytes: &[u8], sep: &str) -> String {
    let mut s = String::with_capacity(bytes.len() * (2 + sep.len()));
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            s.push_str(sep);
        }
        // Writing to a String cannot fail
        let _ = write!(s, "{:02x}", b);
    }
    s
}

/// `04a1b2` style, used for NFCIDs
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    render(bytes, "")
}

/// `04 a1 b2` style, used for frame dumps
pub fn bytes_to_hex_spaced(bytes: &[u8]) -> String {
    render(bytes, " ")
}

/// Parse hex digits, ignoring whitespace between them
pub fn parse_hex(s: &str) -> Result<Vec<u8>> {
    let digits = s
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_digit(16).ok_or(Error::Param("not a hex digit")))
        .collect::<Result<Vec<u32>>>()?;
    if digits.len() % 2 != 0 {
        return Err(Error::Param("odd number of hex digits"));
    }
    Ok(digits
        .chunks_exact(2)
        .map(|pair| ((pair[0] << 4) | pair[1]) as u8)
        .collect())
}
