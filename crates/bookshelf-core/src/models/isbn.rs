//! ISBN normalization and checksum validation

use std::fmt;

/// Why an ISBN was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsbnError {
    /// Nothing left after normalization
    Empty,
    /// Neither 10 nor 13 characters long
    InvalidLength(usize),
    /// ISBN-10 check digit mismatch (or non-digit body)
    InvalidIsbn10,
    /// ISBN-13 check digit mismatch (or non-digit body)
    InvalidIsbn13,
}

impl fmt::Display for IsbnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "ISBN is empty"),
            Self::InvalidLength(len) => {
                write!(f, "ISBN must have 10 or 13 characters, got {len}")
            }
            Self::InvalidIsbn10 => write!(f, "invalid ISBN-10 checksum"),
            Self::InvalidIsbn13 => write!(f, "invalid ISBN-13 checksum"),
        }
    }
}

impl std::error::Error for IsbnError {}

/// Strip dashes and spaces and uppercase the result.
///
/// ```
/// use bookshelf_core::models::normalize_isbn;
///
/// assert_eq!(normalize_isbn("0-306-40615-x"), "030640615X");
/// ```
pub fn normalize_isbn(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != '-' && *c != ' ')
        .flat_map(char::to_uppercase)
        .collect()
}

/// Normalize and validate an ISBN-10 or ISBN-13, returning the normalized form.
pub fn validate_isbn(raw: &str) -> Result<String, IsbnError> {
    let isbn = normalize_isbn(raw);
    if isbn.trim().is_empty() {
        return Err(IsbnError::Empty);
    }

    match isbn.len() {
        10 if is_valid_isbn10(&isbn) => Ok(isbn),
        10 => Err(IsbnError::InvalidIsbn10),
        13 if is_valid_isbn13(&isbn) => Ok(isbn),
        13 => Err(IsbnError::InvalidIsbn13),
        other => Err(IsbnError::InvalidLength(other)),
    }
}

fn is_valid_isbn10(isbn: &str) -> bool {
    let bytes = isbn.as_bytes();
    if bytes.len() != 10 || !bytes[..9].iter().all(u8::is_ascii_digit) {
        return false;
    }

    let last = match bytes[9] {
        b'X' => 10,
        digit if digit.is_ascii_digit() => u32::from(digit - b'0'),
        _ => return false,
    };

    let body: u32 = bytes[..9]
        .iter()
        .zip((2..=10).rev())
        .map(|(digit, weight)| u32::from(digit - b'0') * weight)
        .sum();

    (body + last) % 11 == 0
}

fn is_valid_isbn13(isbn: &str) -> bool {
    let bytes = isbn.as_bytes();
    if bytes.len() != 13 || !bytes.iter().all(u8::is_ascii_digit) {
        return false;
    }

    let sum: u32 = bytes[..12]
        .iter()
        .enumerate()
        .map(|(index, digit)| {
            let value = u32::from(digit - b'0');
            if index % 2 == 0 {
                value
            } else {
                value * 3
            }
        })
        .sum();

    let check = (10 - sum % 10) % 10;
    check == u32::from(bytes[12] - b'0')
}
