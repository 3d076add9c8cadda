//! Errors raised while turning raw chain values into domain types.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// A chain value that does not map onto the domain model.
///
/// Only parsing failures live here; I/O and storage errors are owned by the
/// infra layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Not a `0x`-prefixed hex object id or address.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A Move enum variant this crate does not know about.
    #[error("unknown {kind} variant: {variant}")]
    UnknownVariant { kind: &'static str, variant: String },
}

impl DomainError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn unknown_variant(kind: &'static str, variant: impl Into<String>) -> Self {
        Self::UnknownVariant {
            kind,
            variant: variant.into(),
        }
    }
}
