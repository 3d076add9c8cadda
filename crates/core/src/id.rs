//! Strongly-typed chain identifiers.
//!
//! Sui object ids and account addresses are both 32-byte values rendered as
//! `0x`-prefixed hex. Short forms (`0x2`) and mixed case are accepted on input
//! and normalized to the full 64-digit lowercase form, so two spellings of the
//! same id compare and hash equal.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

const HEX_LEN: usize = 64;

/// Identifier of an on-chain object (cafe, order, table...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(String);

/// Address of an account (e.g. a cafe creator).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SuiAddress(String);

fn normalize(raw: &str, name: &str) -> Result<String, DomainError> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if digits.is_empty() {
        return Err(DomainError::invalid_id(format!("{name}: empty")));
    }
    if digits.len() > HEX_LEN {
        return Err(DomainError::invalid_id(format!(
            "{name}: {} hex digits (max {HEX_LEN})",
            digits.len()
        )));
    }
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(DomainError::invalid_id(format!("{name}: not hex: {raw}")));
    }

    Ok(format!("0x{:0>width$}", digits.to_ascii_lowercase(), width = HEX_LEN))
}

macro_rules! impl_hex_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Parse and normalize an identifier.
            pub fn parse(raw: &str) -> Result<Self, DomainError> {
                normalize(raw, $name).map(Self)
            }

            /// Normalized `0x`-prefixed, 64-digit lowercase form.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $t {
            type Error = DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }
    };
}

impl_hex_newtype!(ObjectId, "ObjectId");
impl_hex_newtype!(SuiAddress, "SuiAddress");
