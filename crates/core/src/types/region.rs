//! Region (state / province) code type.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when parsing a [`RegionCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RegionCodeError {
    /// The input string is empty.
    #[error("region code cannot be empty")]
    Empty,
    /// The input is not exactly two characters long.
    #[error("region code must be exactly 2 characters (got {0})")]
    InvalidLength(usize),
    /// The input contains something other than ASCII letters.
    #[error("region code must contain only ASCII letters")]
    NonAlphabetic,
}

/// A two-letter jurisdiction code such as `NJ` or `CA`.
///
/// This is the unit of zone classification. Codes are stored upper-case, so
/// `RegionCode::parse("nj")` and `RegionCode::parse("NJ")` compare equal.
///
/// ## Examples
///
/// ```
/// use delivery_estimate_core::RegionCode;
///
/// let nj = RegionCode::parse("nj").unwrap();
/// assert_eq!(nj.as_str(), "NJ");
///
/// assert!(RegionCode::parse("").is_err());
/// assert!(RegionCode::parse("New Jersey").is_err());
/// assert!(RegionCode::parse("N1").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionCode([u8; 2]);

impl RegionCode {
    /// Parse a `RegionCode` from a string, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, is not two characters
    /// long, or contains non-letter characters.
    pub fn parse(s: &str) -> Result<Self, RegionCodeError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(RegionCodeError::Empty);
        }

        let bytes = trimmed.as_bytes();
        let [first, second] = bytes else {
            return Err(RegionCodeError::InvalidLength(trimmed.chars().count()));
        };

        if !first.is_ascii_alphabetic() || !second.is_ascii_alphabetic() {
            return Err(RegionCodeError::NonAlphabetic);
        }

        Ok(Self([first.to_ascii_uppercase(), second.to_ascii_uppercase()]))
    }

    /// Build a code from a literal known to be valid at compile time.
    ///
    /// Used by the static lookup tables. Invalid input falls back to `"??"`
    /// rather than panicking, which keeps the tables total.
    #[must_use]
    pub const fn from_static(s: &'static str) -> Self {
        match s.as_bytes() {
            [a, b] if a.is_ascii_alphabetic() && b.is_ascii_alphabetic() => {
                Self([a.to_ascii_uppercase(), b.to_ascii_uppercase()])
            }
            _ => Self(*b"??"),
        }
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        // Both bytes are ASCII by construction.
        core::str::from_utf8(&self.0).unwrap_or("??")
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RegionCode {
    type Err = RegionCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for RegionCode {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Serialize for RegionCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RegionCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
