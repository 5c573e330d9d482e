//! Order status as reported by the hub.
//!
//! The set of statuses is defined server-side and may grow without notice,
//! so the client carries the raw string instead of an exhaustive enum.

use serde::{Deserialize, Serialize};

/// Server-defined order status string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderStatus(String);

impl OrderStatus {
    /// Wrap a raw status string.
    #[must_use]
    pub fn new(status: impl Into<String>) -> Self {
        Self(status.into())
    }

    /// The raw status string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OrderStatus {
    fn from(status: &str) -> Self {
        Self(status.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_passthrough() {
        let status = OrderStatus::from("approved");
        assert_eq!(status.as_str(), "approved");
        assert_eq!(status.to_string(), "approved");
    }

    #[test]
    fn test_status_serde_transparent() {
        let status: OrderStatus = serde_json::from_str("\"shipped\"").unwrap();
        assert_eq!(status, OrderStatus::new("shipped"));
    }
}
