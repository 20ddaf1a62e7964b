use crate::{
    Result,
    constants::{MAX_UID_LENGTH, MIN_UID_LENGTH},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// Credential identifier (UID) read from a presented tag.
///
/// Opaque bytes, compared by exact equality. The text form is uppercase hex
/// with one space between bytes (`99 B6 B3 02`), the same form the reader
/// driver prints.
///
/// # Security
/// Equality is constant-time so allow-list checks do not leak how many
/// leading bytes matched.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>")]
pub struct CredentialId(pub(crate) Vec<u8>);

impl CredentialId {
    /// Create a credential identifier from raw bytes.
    ///
    /// # Errors
    /// Returns `Error::InvalidCredential` if the length is outside
    /// `MIN_UID_LENGTH..=MAX_UID_LENGTH`.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        let len = bytes.len();
        if !(MIN_UID_LENGTH..=MAX_UID_LENGTH).contains(&len) {
            return Err(Error::InvalidCredential(format!(
                "UID must be {MIN_UID_LENGTH}-{MAX_UID_LENGTH} bytes, got {len}"
            )));
        }
        Ok(CredentialId(bytes))
    }

    /// Parse a hex string, with or without separators.
    ///
    /// Spaces, colons and dashes between bytes are ignored, so `"99B6B302"`,
    /// `"99 b6 b3 02"` and `"99:B6:B3:02"` are the same identifier.
    ///
    /// # Errors
    /// Returns `Error::InvalidCredential` on non-hex characters, an odd
    /// number of digits, or an out-of-range length.
    pub fn parse_hex(s: &str) -> Result<Self> {
        let digits: Vec<u8> = s
            .bytes()
            .filter(|b| !matches!(b, b' ' | b':' | b'-'))
            .collect();

        if digits.len() % 2 != 0 {
            return Err(Error::InvalidCredential(format!(
                "Odd number of hex digits in '{s}'"
            )));
        }

        let bytes = digits
            .chunks(2)
            .map(|pair| {
                let hi = hex_value(pair[0]);
                let lo = hex_value(pair[1]);
                match (hi, lo) {
                    (Some(hi), Some(lo)) => Ok((hi << 4) | lo),
                    _ => Err(Error::InvalidCredential(format!(
                        "Invalid hex digit in '{s}'"
                    ))),
                }
            })
            .collect::<Result<Vec<u8>>>()?;

        CredentialId::new(bytes)
    }

    /// Get the raw identifier bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Number of bytes in the identifier.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; construction rejects empty identifiers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Text form used in logs and access log entries (`99 B6 B3 02`).
    #[must_use]
    pub fn to_text(&self) -> String {
        self.0
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn hex_value(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        _ => None,
    }
}

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

impl TryFrom<Vec<u8>> for CredentialId {
    type Error = Error;

    fn try_from(bytes: Vec<u8>) -> Result<Self> {
        CredentialId::new(bytes)
    }
}

impl std::str::FromStr for CredentialId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        CredentialId::parse_hex(s)
    }
}

/// Constant-time comparison; identifiers of different length are unequal.
impl PartialEq for CredentialId {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_slice().ct_eq(other.0.as_slice()).into()
    }
}

impl std::hash::Hash for CredentialId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

/// Outcome of classifying a credential against the allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityCategory {
    /// Not on the allow-list (the default).
    Unknown,
    /// Matches the first reference identifier.
    CategoryA,
    /// Matches the second reference identifier.
    CategoryB,
}

impl IdentityCategory {
    /// Returns `true` for `CategoryA` and `CategoryB`.
    #[inline]
    #[must_use]
    pub fn is_recognized(self) -> bool {
        !matches!(self, IdentityCategory::Unknown)
    }
}

impl fmt::Display for IdentityCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            IdentityCategory::Unknown => write!(f, "Unknown"),
            IdentityCategory::CategoryA => write!(f, "CategoryA"),
            IdentityCategory::CategoryB => write!(f, "CategoryB"),
        }
    }
}

/// One access event as submitted to the remote log.
///
/// Serializes to exactly `{"uid": "..", "timestamp": ".."}`. Built once per
/// detection and consumed by the submission attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessLogEntry {
    uid: String,
    timestamp: String,
}

impl AccessLogEntry {
    /// Create an entry from a credential and a formatted timestamp.
    #[must_use]
    pub fn new(id: &CredentialId, timestamp: impl Into<String>) -> Self {
        AccessLogEntry {
            uid: id.to_text(),
            timestamp: timestamp.into(),
        }
    }

    /// Identifier text of the entry.
    #[must_use]
    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Formatted timestamp of the entry.
    #[must_use]
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }
}
