//! Hubcart Core - Shared types library.
//!
//! This crate provides common types used across the Hubcart components:
//! - `storefront` - Public-facing storefront over the remote hub API
//! - `integration-tests` - End-to-end tests against a stub hub
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps
//! it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, minor-unit prices,
//!   phone numbers, and order statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
