//! Wallet address identifier.
//!
//! The wallet address is the primary user key. It is normalized to lowercase
//! on construction so that lookups are case-insensitive.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix accepted (and stripped) in front of a wallet address credential.
pub const BEARER_PREFIX: &str = "Bearer ";

/// A user's on-chain account identifier, always lowercase.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Parse a wallet address from an `Authorization` header value.
    ///
    /// A leading `Bearer ` is removed if present.
    ///
    /// # Errors
    ///
    /// Returns `WalletError::Empty` if nothing remains after stripping.
    pub fn from_credential(value: &str) -> Result<Self, WalletError> {
        let raw = value.strip_prefix(BEARER_PREFIX).unwrap_or(value);
        raw.parse()
    }

    /// Return the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the address bytes (the lowercase string, not the decoded hex).
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl FromStr for WalletAddress {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(WalletError::Empty);
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(WalletError::Malformed(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_lowercase()))
    }
}

impl fmt::Debug for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WalletAddress({})", self.0)
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = WalletError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WalletAddress> for String {
    fn from(address: WalletAddress) -> Self {
        address.0
    }
}

impl AsRef<str> for WalletAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Errors that can occur when parsing a wallet address.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    /// No address was supplied.
    #[error("wallet address is empty")]
    Empty,

    /// The address contains characters that can never appear in one.
    #[error("malformed wallet address: {0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_is_lowercased() {
        let address: WalletAddress = "0xABCdef0123".parse().unwrap();
        assert_eq!(address.as_str(), "0xabcdef0123");
    }

    #[test]
    fn credential_strips_bearer_prefix() {
        let address = WalletAddress::from_credential("Bearer 0xAbC").unwrap();
        assert_eq!(address.as_str(), "0xabc");

        let bare = WalletAddress::from_credential("0xAbC").unwrap();
        assert_eq!(address, bare);
    }

    #[test]
    fn empty_credential_is_rejected() {
        assert_eq!(WalletAddress::from_credential(""), Err(WalletError::Empty));
        assert_eq!(
            WalletAddress::from_credential("Bearer "),
            Err(WalletError::Empty)
        );
        assert_eq!(WalletAddress::from_credential("   "), Err(WalletError::Empty));
    }

    #[test]
    fn embedded_whitespace_is_rejected() {
        assert!(matches!(
            "0xabc 0xdef".parse::<WalletAddress>(),
            Err(WalletError::Malformed(_))
        ));
    }

    #[test]
    fn serde_normalizes_case() {
        let address: WalletAddress = serde_json::from_str("\"0xDEADbeef\"").unwrap();
        assert_eq!(address.as_str(), "0xdeadbeef");
        assert_eq!(serde_json::to_string(&address).unwrap(), "\"0xdeadbeef\"");
    }
}
