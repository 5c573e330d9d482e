//! App-lifetime shared state: the authenticated user and the cart.
//!
//! Both stores are owned by the session engine and mutated only through
//! their own operations so derived values stay consistent.

pub mod cart;
pub mod user;

pub use cart::{CartItem, CartStore, CartSummary};
pub use user::{RestoreOutcome, UserStore};
