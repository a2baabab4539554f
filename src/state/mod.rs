pub mod feed;
pub mod session;

use std::sync::Arc;

use time::OffsetDateTime;
use tokio::sync::{RwLock, watch};

use crate::{
    config::AppConfig,
    dao::{game_store::ArenaStore, identity::IdentityProvider},
    error::ServiceError,
};

pub use self::feed::{ChangeEvent, ChangeFeed, ChangeFilter, ChangeKind, Subscription, Table};
pub use self::session::CurrentUser;

pub type SharedState = Arc<AppState>;

/// Capacity of the change feed broadcast channel.
const FEED_CAPACITY: usize = 64;

/// Central application context: store handle, identity provider, configuration and change feed.
pub struct AppState {
    store: RwLock<Option<Arc<dyn ArenaStore>>>,
    identity: Arc<dyn IdentityProvider>,
    config: AppConfig,
    feed: ChangeFeed,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig, identity: Arc<dyn IdentityProvider>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            store: RwLock::new(None),
            identity,
            config,
            feed: ChangeFeed::new(FEED_CAPACITY),
            degraded: degraded_tx,
        })
    }

    /// Obtain a handle to the current store, if one is installed.
    pub async fn store(&self) -> Option<Arc<dyn ArenaStore>> {
        let guard = self.store.read().await;
        guard.as_ref().cloned()
    }

    /// Current store or [`ServiceError::Degraded`] when none is installed.
    pub async fn require_store(&self) -> Result<Arc<dyn ArenaStore>, ServiceError> {
        self.store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new store implementation and leave degraded mode.
    pub async fn install_store(&self, store: Arc<dyn ArenaStore>) {
        {
            let mut guard = self.store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current store and enter degraded mode.
    pub async fn clear_store(&self) {
        {
            let mut guard = self.store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Session authority.
    pub fn identity(&self) -> &Arc<dyn IdentityProvider> {
        &self.identity
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Row-level change notifications.
    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    /// Wall-clock instant used by lifecycle and listing rules.
    pub fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }
}
