pub mod events;
pub mod match_machine;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{
    auth::IdentityResolver, config::AppConfig, dao::match_store::DuelStore, error::ServiceError,
};

pub use self::events::MatchEventHub;

pub type SharedState = Arc<AppState>;

/// Central application state shared by every request handler.
///
/// Holds the storage handle behind a lock so the supervisor can swap it,
/// the per-match event hub, and the identity resolver for bearer lookups.
pub struct AppState {
    store: RwLock<Option<Arc<dyn DuelStore>>>,
    events: MatchEventHub,
    degraded: watch::Sender<bool>,
    identity: Arc<dyn IdentityResolver>,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig, identity: Arc<dyn IdentityResolver>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            store: RwLock::new(None),
            events: MatchEventHub::new(16),
            degraded: degraded_tx,
            identity,
            config,
        })
    }

    /// Obtain the current store or fail with the degraded-mode error.
    pub async fn require_store(&self) -> Result<Arc<dyn DuelStore>, ServiceError> {
        let guard = self.store.read().await;
        guard.as_ref().cloned().ok_or(ServiceError::Degraded)
    }

    /// Install a new store implementation and leave degraded mode.
    pub async fn set_store(&self, store: Arc<dyn DuelStore>) {
        {
            let mut guard = self.store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Update the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        if self.is_degraded() == value {
            return;
        }

        let _ = self.degraded.send(value);
    }

    /// Broadcast hub fanning out events to per-match SSE streams.
    pub fn events(&self) -> &MatchEventHub {
        &self.events
    }

    /// Resolver used to turn bearer credentials into user identities.
    pub fn identity(&self) -> Arc<dyn IdentityResolver> {
        self.identity.clone()
    }

    /// Runtime configuration loaded at startup.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
