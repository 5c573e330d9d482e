//! User identity and per-session persisted state.

use serde::{Deserialize, Serialize};

use hubcart_core::{HubId, UserId};

use super::ProductLayout;

/// The authenticated customer.
///
/// Created on successful OTP verification. A snapshot is cached in the
/// session record for instant UI feedback on reload; the hub session
/// endpoint remains the authoritative source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Tenant scope; the hub serves one storefront per hub id.
    pub hub_id: HubId,
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
}

/// State mirrored into the session record so it survives reloads.
///
/// Cleared on logout (except display preferences). A corrupt stored value
/// deserializes as absent and is dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    pub user: Option<User>,
    #[serde(default)]
    pub product_layout: ProductLayout,
    #[serde(default)]
    pub amount_preset_id: Option<String>,
}
