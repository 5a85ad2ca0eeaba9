//! Retail barcode handling
//!
//! Normalizes EAN-8, UPC-A and EAN-13 strings as they come out of a scanner
//! or a form field. UPC-A codes are widened to EAN-13 so a product has one
//! canonical key regardless of how it was scanned.

use serde::Serialize;
use thiserror::Error;

/// Barcode validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BarcodeError {
    #[error("barcode is empty")]
    Empty,

    #[error("barcode contains invalid character '{0}'")]
    InvalidCharacter(char),

    #[error("barcode has {0} digits, expected 8, 12 or 13")]
    InvalidLength(usize),

    #[error("barcode check digit is {found}, expected {expected}")]
    ChecksumMismatch { expected: u8, found: u8 },
}

/// Symbology the input was recognized as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BarcodeFormat {
    Ean8,
    UpcA,
    Ean13,
}

impl BarcodeFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            BarcodeFormat::Ean8 => "ean8",
            BarcodeFormat::UpcA => "upc_a",
            BarcodeFormat::Ean13 => "ean13",
        }
    }
}

/// A validated barcode in canonical form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedEan {
    pub code: String,
    pub format: BarcodeFormat,
}

/// GS1 mod-10 check digit for the payload digits (check digit excluded)
fn check_digit(payload: &[u8]) -> u8 {
    let sum: u32 = payload
        .iter()
        .rev()
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { *d as u32 * 3 } else { *d as u32 })
        .sum();
    ((10 - sum % 10) % 10) as u8
}

/// Validate and canonicalize a scanned barcode
///
/// Whitespace and hyphens are ignored.
pub fn normalize_ean(raw: &str) -> Result<NormalizedEan, BarcodeError> {
    let mut digits = Vec::with_capacity(13);
    for c in raw.chars() {
        if c.is_whitespace() || c == '-' {
            continue;
        }
        match c.to_digit(10) {
            Some(d) => digits.push(d as u8),
            None => return Err(BarcodeError::InvalidCharacter(c)),
        }
    }

    let format = match digits.len() {
        0 => return Err(BarcodeError::Empty),
        8 => BarcodeFormat::Ean8,
        12 => BarcodeFormat::UpcA,
        13 => BarcodeFormat::Ean13,
        n => return Err(BarcodeError::InvalidLength(n)),
    };

    let (payload, check) = digits.split_at(digits.len() - 1);
    let expected = check_digit(payload);
    if check[0] != expected {
        return Err(BarcodeError::ChecksumMismatch { expected, found: check[0] });
    }

    let mut code: String = digits.iter().map(|d| char::from(b'0' + d)).collect();
    if format == BarcodeFormat::UpcA {
        code.insert(0, '0');
    }

    Ok(NormalizedEan { code, format })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ean13() {
        let ean = normalize_ean("4006381333931").unwrap();
        assert_eq!(ean.code, "4006381333931");
        assert_eq!(ean.format, BarcodeFormat::Ean13);
    }

    #[test]
    fn test_ean8() {
        let ean = normalize_ean("9638 5074").unwrap();
        assert_eq!(ean.code, "96385074");
        assert_eq!(ean.format, BarcodeFormat::Ean8);
    }

    #[test]
    fn test_upc_a_widened() {
        let ean = normalize_ean("0-36000-29145-2").unwrap();
        assert_eq!(ean.code, "0036000291452");
        assert_eq!(ean.format, BarcodeFormat::UpcA);
    }

    #[test]
    fn test_checksum_mismatch() {
        assert_eq!(
            normalize_ean("4006381333932"),
            Err(BarcodeError::ChecksumMismatch { expected: 1, found: 2 })
        );
    }

    #[test]
    fn test_bad_input() {
        assert_eq!(normalize_ean("  "), Err(BarcodeError::Empty));
        assert_eq!(normalize_ean("40063813X3931"), Err(BarcodeError::InvalidCharacter('X')));
        assert_eq!(normalize_ean("12345"), Err(BarcodeError::InvalidLength(5)));
    }
}
