//! View-driven data synchronizers.
//!
//! Each synchronizer owns one slice of remote-derived state and reconciles
//! it against the hub when its inputs change. Every refresh runs under a
//! sequence number taken at dispatch; a response whose sequence is no
//! longer the latest is discarded wholesale, so out-of-order completions
//! can never show stale data for the current view.

pub mod catalog;
pub mod orders;
pub mod product;

pub use catalog::{CatalogInputs, CatalogSnapshot, CatalogSynchronizer};
pub use orders::{OrderDraft, OrdersSnapshot, OrdersSynchronizer, SaveOutcome};
pub use product::{ProductDetailSnapshot, ProductDetailSynchronizer};

/// Result of one refresh dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// This refresh was the latest when it finished; state was updated.
    Committed,
    /// A newer refresh was dispatched in the meantime; nothing was changed.
    Superseded,
}
