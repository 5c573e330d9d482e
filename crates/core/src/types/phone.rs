//! Phone number normalization for OTP authentication.
//!
//! The hub API expects phone numbers in international form with a leading
//! `+`. User input frequently omits it, so the wrapper adds one on
//! construction rather than at every call site.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors validating a phone number.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PhoneError {
    #[error("phone number is empty")]
    Empty,
}

/// A phone number normalized to a leading `+`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Normalize raw input into a phone number.
    ///
    /// Surrounding whitespace is trimmed and a missing leading `+` is added.
    /// Digit validation is left to the hub, which is the authority on which
    /// numbers can receive an OTP.
    ///
    /// # Errors
    ///
    /// Returns [`PhoneError::Empty`] if the input is empty after trimming.
    pub fn new(raw: &str) -> Result<Self, PhoneError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PhoneError::Empty);
        }

        if trimmed.starts_with('+') {
            Ok(Self(trimmed.to_string()))
        } else {
            Ok(Self(format!("+{trimmed}")))
        }
    }

    /// The normalized number, always with a leading `+`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Phone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
