//! Application state shared across handlers.

use std::sync::Arc;

use tower_sessions::Session;
use uuid::Uuid;

use crate::config::StorefrontConfig;
use crate::error::{AppError, Result};
use crate::models::{PersistedState, session_keys};
use crate::session::{Engine, EngineRegistry};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Per-session state lives in the engine
/// registry; this struct only carries what every request needs.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Arc<StorefrontConfig>,
    registry: EngineRegistry,
}

impl AppState {
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let config = Arc::new(config);
        Self {
            inner: Arc::new(AppStateInner {
                registry: EngineRegistry::new(Arc::clone(&config)),
                config,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Resolve the engine for this browser session, creating one on first
    /// touch.
    ///
    /// The session record carries the engine id plus the persisted state
    /// snapshot; a fresh engine applies the snapshot optimistically and
    /// starts confirming it against the hub in the background. A corrupt
    /// snapshot deserializes as absent and is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails or the hub client
    /// cannot be constructed.
    pub async fn engine(&self, session: &Session) -> Result<Engine> {
        let engine_id = match session.get::<Uuid>(session_keys::ENGINE_ID).await? {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4();
                session.insert(session_keys::ENGINE_ID, id).await?;
                id
            }
        };

        let persisted = session
            .get::<PersistedState>(session_keys::STATE)
            .await
            .unwrap_or_default()
            .unwrap_or_default();

        self.inner
            .registry
            .engine_for(engine_id, &persisted)
            .await
            .map_err(|e| AppError::Internal(format!("failed to build hub client: {e}")))
    }
}

/// Mirror the engine's persistable slice back into the session record.
///
/// Called after every mutating request so a reload (or engine eviction)
/// restores the latest user snapshot and display preferences.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn persist(session: &Session, engine: &Engine) -> Result<()> {
    session
        .insert(session_keys::STATE, engine.persisted_state())
        .await?;
    Ok(())
}
