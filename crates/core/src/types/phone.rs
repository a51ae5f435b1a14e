//! Pakistani mobile number type.

use core::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

#[allow(clippy::expect_used)]
static MOBILE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\+92|0)3\d{9}$").expect("valid mobile regex"));

/// Errors that can occur when parsing a [`PakistaniMobile`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input is empty once separators are removed.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input does not look like a Pakistani mobile number.
    #[error("phone number must look like 03XXXXXXXXX or +923XXXXXXXXX")]
    InvalidFormat,
}

/// A Pakistani mobile number, stored with spaces and dashes removed.
///
/// Accepted shapes are `03XXXXXXXXX` and `+923XXXXXXXXX`.
///
/// ```
/// use uniformly_core::PakistaniMobile;
///
/// let phone = PakistaniMobile::parse("0300-123 4567").unwrap();
/// assert_eq!(phone.as_str(), "03001234567");
/// assert!(PakistaniMobile::parse("+92 300 1234567").is_ok());
/// assert!(PakistaniMobile::parse("02112345678").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PakistaniMobile(String);

impl PakistaniMobile {
    /// Parse a mobile number, ignoring spaces and dashes.
    ///
    /// # Errors
    ///
    /// Returns [`PhoneError::Empty`] for blank input and
    /// [`PhoneError::InvalidFormat`] when the cleaned digits do not match.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let cleaned = clean(s);
        if cleaned.is_empty() {
            return Err(PhoneError::Empty);
        }
        if !MOBILE_PATTERN.is_match(&cleaned) {
            return Err(PhoneError::InvalidFormat);
        }
        Ok(Self(cleaned))
    }

    /// The cleaned number.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Strip the separators customers commonly type into phone fields.
#[must_use]
pub fn clean(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

impl fmt::Display for PakistaniMobile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PakistaniMobile {
    type Error = PhoneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PakistaniMobile> for String {
    fn from(phone: PakistaniMobile) -> Self {
        phone.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_local_and_international() {
        assert_eq!(
            PakistaniMobile::parse("03001234567").unwrap().as_str(),
            "03001234567"
        );
        assert_eq!(
            PakistaniMobile::parse("+92 321-765 4321").unwrap().as_str(),
            "+923217654321"
        );
    }

    #[test]
    fn test_rejects_wrong_lengths_and_prefixes() {
        assert_eq!(
            PakistaniMobile::parse("0300123456"),
            Err(PhoneError::InvalidFormat)
        );
        assert_eq!(
            PakistaniMobile::parse("030012345678"),
            Err(PhoneError::InvalidFormat)
        );
        assert_eq!(
            PakistaniMobile::parse("04001234567"),
            Err(PhoneError::InvalidFormat)
        );
        assert_eq!(
            PakistaniMobile::parse("+913001234567"),
            Err(PhoneError::InvalidFormat)
        );
    }

    #[test]
    fn test_rejects_blank() {
        assert_eq!(PakistaniMobile::parse(" - "), Err(PhoneError::Empty));
    }
}
