//! Hubcart storefront library.
//!
//! Presentation and state-sync layer over the remote hub catalog/order
//! API. Exposed as a library so the binary stays thin and the
//! integration tests can drive the full stack in-process.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod filters;
pub mod hub;
pub mod middleware;
pub mod models;
pub mod nav;
pub mod notify;
pub mod routes;
pub mod sanitize;
pub mod session;
pub mod state;
pub mod stores;
pub mod sync;
