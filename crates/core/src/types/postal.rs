//! US postal (ZIP) code type.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Errors that can occur when parsing a [`PostalCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PostalCodeError {
    /// The input string is empty.
    #[error("postal code cannot be empty")]
    Empty,
    /// The input is not a 5-digit ZIP or a ZIP+4.
    #[error("postal code must be 5 digits (got {0:?})")]
    InvalidFormat(String),
}

/// A validated 5-digit US postal code.
///
/// ## Constraints
///
/// - Exactly five ASCII digits, or
/// - A ZIP+4 (`12345-6789`), of which only the 5-digit head is kept
///
/// Anything looser (partial ZIPs, letters) is rejected here; the zone lookup
/// has its own lenient prefix coercion for untrusted input.
///
/// ## Examples
///
/// ```
/// use delivery_estimate_core::PostalCode;
///
/// assert_eq!(PostalCode::parse("07105").unwrap().as_str(), "07105");
/// assert_eq!(PostalCode::parse("07105-1234").unwrap().as_str(), "07105");
///
/// assert!(PostalCode::parse("").is_err());
/// assert!(PostalCode::parse("7105").is_err());
/// assert!(PostalCode::parse("ABCDE").is_err());
/// ```
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PostalCode(String);

impl PostalCode {
    /// Number of digits in a US ZIP code.
    pub const LENGTH: usize = 5;

    /// Parse a `PostalCode` from a string, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty or is neither a 5-digit ZIP nor
    /// a ZIP+4.
    pub fn parse(s: &str) -> Result<Self, PostalCodeError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PostalCodeError::Empty);
        }

        let (head, tail) = match trimmed.split_once('-') {
            Some((head, tail)) => (head, Some(tail)),
            None => (trimmed, None),
        };

        let head_ok = head.len() == Self::LENGTH && head.bytes().all(|b| b.is_ascii_digit());
        let tail_ok = tail.is_none_or(|t| t.len() == 4 && t.bytes().all(|b| b.is_ascii_digit()));

        if !head_ok || !tail_ok {
            return Err(PostalCodeError::InvalidFormat(trimmed.to_owned()));
        }

        Ok(Self(head.to_owned()))
    }

    /// Returns the postal code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `PostalCode` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
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

impl AsRef<str> for PostalCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for PostalCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert!(PostalCode::parse("07105").is_ok());
        assert!(PostalCode::parse("90210").is_ok());
        assert!(PostalCode::parse(" 10001 ").is_ok());
    }

    #[test]
    fn test_parse_zip_plus_four_keeps_head() {
        let zip = PostalCode::parse("10001-0001").unwrap();
        assert_eq!(zip.as_str(), "10001");
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(PostalCode::parse(""), Err(PostalCodeError::Empty)));
    }

    #[test]
    fn test_parse_wrong_length() {
        assert!(matches!(
            PostalCode::parse("1234"),
            Err(PostalCodeError::InvalidFormat(_))
        ));
        assert!(matches!(
            PostalCode::parse("123456"),
            Err(PostalCodeError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_parse_bad_plus_four() {
        assert!(PostalCode::parse("10001-12").is_err());
        assert!(PostalCode::parse("10001-").is_err());
    }

    #[test]
    fn test_parse_letters() {
        assert!(PostalCode::parse("1000A").is_err());
        assert!(PostalCode::parse("SW1A 1AA").is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: PostalCode = serde_json::from_str("\"07105\"").unwrap();
        assert_eq!(ok.as_str(), "07105");
        let bad: Result<PostalCode, _> = serde_json::from_str("\"07\"");
        assert!(bad.is_err());
    }
}
