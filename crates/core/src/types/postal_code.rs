//! Postal code type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`PostalCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PostalCodeError {
    /// The input is empty (or only whitespace and hyphens).
    #[error("postal code cannot be empty")]
    Empty,
    /// The input contains something other than digits and hyphens.
    #[error("postal code contains invalid character {0:?}")]
    InvalidCharacter(char),
    /// The input has too many digits.
    #[error("postal code must be at most {max} digits")]
    TooLong {
        /// Maximum allowed number of digits.
        max: usize,
    },
}

/// A postal code in canonical form (ASCII digits only).
///
/// Postal codes are the natural key for stored addresses, so two spellings of
/// the same code must compare equal. Parsing trims surrounding whitespace and
/// drops hyphens; anything else that is not a digit is rejected.
///
/// ## Examples
///
/// ```
/// use client_registry_core::PostalCode;
///
/// let a = PostalCode::parse("01001-000").unwrap();
/// let b = PostalCode::parse(" 01001000 ").unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "01001000");
///
/// assert!(PostalCode::parse("").is_err());
/// assert!(PostalCode::parse("01001/000").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct PostalCode(String);

impl PostalCode {
    /// Maximum number of digits accepted.
    pub const MAX_DIGITS: usize = 16;

    /// Parse a `PostalCode` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input:
    /// - Has no digits
    /// - Contains characters other than digits and hyphens
    /// - Has more than 16 digits
    pub fn parse(s: &str) -> Result<Self, PostalCodeError> {
        let mut digits = String::with_capacity(s.len());

        for c in s.trim().chars() {
            match c {
                '0'..='9' => digits.push(c),
                '-' => {}
                other => return Err(PostalCodeError::InvalidCharacter(other)),
            }
        }

        if digits.is_empty() {
            return Err(PostalCodeError::Empty);
        }

        if digits.len() > Self::MAX_DIGITS {
            return Err(PostalCodeError::TooLong {
                max: Self::MAX_DIGITS,
            });
        }

        Ok(Self(digits))
    }

    /// Returns the canonical digit string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PostalCode {
    type Err = PostalCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PostalCode {
    type Error = PostalCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PostalCode> for String {
    fn from(code: PostalCode) -> Self {
        code.0
    }
}
