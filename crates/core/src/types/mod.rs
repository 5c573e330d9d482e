//! Core types for Hubcart.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod phone;
pub mod price;
pub mod status;

pub use id::*;
pub use phone::Phone;
pub use price::format_minor_units;
pub use status::OrderStatus;
