//! Ivorian phone number type.
//!
//! Phone numbers are the natural dedup key for guest checkout and the lookup
//! key for self-service order tracking, so normalization has to be stable:
//! the same real-world number must always map to the same stored string.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Country-code prefix stripped during normalization.
const COUNTRY_PREFIX: &str = "+225";

/// Minimum number of digits after normalization.
const MIN_DIGITS: usize = 10;

/// Errors that can occur when parsing a [`Phone`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input string is empty.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input contains characters other than digits, spaces, or a
    /// leading `+225`.
    #[error("phone number may only contain digits, spaces, and an optional +225 prefix")]
    InvalidCharacters,
    /// Fewer digits than required after normalization.
    #[error("phone number must have at least {min} digits")]
    TooShort {
        /// Minimum required digit count.
        min: usize,
    },
}

/// A normalized Ivorian phone number.
///
/// Normalization removes all whitespace and strips a leading `+225` country
/// prefix, so `"+225 07 12 34 56 78"` and `"0712345678"` are the same number.
///
/// ## Examples
///
/// ```
/// use cafe_lagune_core::Phone;
///
/// let a = Phone::parse("+225 07 12 34 56 78").unwrap();
/// let b = Phone::parse("0712345678").unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "0712345678");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Parse and normalize a phone number.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, contains characters other
    /// than digits/spaces/a leading `+225`, or has fewer than 10 digits
    /// after normalization.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();

        if compact.is_empty() {
            return Err(PhoneError::Empty);
        }

        let digits = compact.strip_prefix(COUNTRY_PREFIX).unwrap_or(&compact);

        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(PhoneError::InvalidCharacters);
        }

        if digits.len() < MIN_DIGITS {
            return Err(PhoneError::TooShort { min: MIN_DIGITS });
        }

        Ok(Self(digits.to_owned()))
    }

    /// Returns the normalized number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Phone` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Extract the trailing digits used for order tracking lookups.
    ///
    /// Strips everything that is not a digit and keeps the last 8 digits,
    /// which is enough to identify a local subscriber number regardless of
    /// how the caller wrote the prefix. Returns `None` if the input has no
    /// digits at all.
    #[must_use]
    pub fn search_fragment(raw: &str) -> Option<String> {
        let digits: Vec<char> = raw.chars().filter(char::is_ascii_digit).collect();
        if digits.is_empty() {
            return None;
        }
        let start = digits.len().saturating_sub(8);
        Some(digits.get(start..).unwrap_or_default().iter().collect())
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Phone {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Phone {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
