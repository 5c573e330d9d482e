//! Domain types for the storefront.
//!
//! These are the validated in-memory shapes the stores, synchronizers, and
//! templates work with. Wire-format types live in [`crate::hub::types`] and
//! are converted on the way in.

pub mod catalog;
pub mod order;
pub mod user;

pub use catalog::{Category, Product, ProductLayout, Tag, Vendor};
pub use order::{Order, OrderLineItem};
pub use user::{PersistedState, User};

/// Keys for values stored in the tower-sessions record.
pub mod session_keys {
    /// UUID tying this browser session to its engine.
    pub const ENGINE_ID: &str = "engine_id";
    /// Serialized [`super::PersistedState`] snapshot.
    pub const STATE: &str = "state";
    /// Phone number awaiting OTP verification.
    pub const PENDING_PHONE: &str = "pending_phone";
}
