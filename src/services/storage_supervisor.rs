//! Keeps the shared store handle alive and drives degraded mode.
//!
//! The hosted REST API has no session to restore: `health_check` and
//! `try_reconnect` are both a ping. A ping answered with a client error
//! (`StorageError::Rejected`) proves the API is reachable, so only
//! `StorageError::Unavailable` counts as an outage.

use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::{MissedTickBehavior, interval, sleep};
use tracing::{error, info, warn};

use crate::{
    dao::{game_store::ArenaStore, storage::StorageError},
    state::SharedState,
};

/// Delays and attempt budget used by [`run_with`].
#[derive(Debug, Clone, Copy)]
pub struct SupervisorTimings {
    /// First backoff delay for connects and reconnect pings.
    pub initial_delay: Duration,
    /// Backoff ceiling.
    pub max_delay: Duration,
    /// Period between health pings while the API answers.
    pub health_interval: Duration,
    /// Failed reconnect pings tolerated before the handle is dropped.
    pub reconnect_attempts: u32,
}

impl Default for SupervisorTimings {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            health_interval: Duration::from_secs(5),
            reconnect_attempts: 3,
        }
    }
}

/// Connect, watch and reconnect forever with the default timings.
pub async fn run<F, Fut>(state: SharedState, connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn ArenaStore>, StorageError>> + Send,
{
    run_with(state, SupervisorTimings::default(), connect).await
}

/// Install a store from `connect`, watch it until it is lost, drop it and
/// start over. Never returns.
pub async fn run_with<F, Fut>(state: SharedState, timings: SupervisorTimings, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn ArenaStore>, StorageError>> + Send,
{
    loop {
        let store = connect_with_backoff(&mut connect, &timings).await;
        state.install_store(store.clone()).await;
        info!("storage connection established; leaving degraded mode");

        watch(&state, store.as_ref(), &timings).await;

        warn!("storage unreachable after reconnect attempts; dropping the store handle");
        state.clear_store().await;
    }
}

async fn connect_with_backoff<F, Fut>(
    connect: &mut F,
    timings: &SupervisorTimings,
) -> Arc<dyn ArenaStore>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Arc<dyn ArenaStore>, StorageError>>,
{
    let mut delay = timings.initial_delay;
    loop {
        match connect().await {
            Ok(store) => return store,
            Err(err) => {
                warn!(error = %err, ?delay, "storage connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(timings.max_delay);
            }
        }
    }
}

/// Ping until the API stops answering and cannot be recovered.
async fn watch(state: &SharedState, store: &dyn ArenaStore, timings: &SupervisorTimings) {
    let mut ticker = interval(timings.health_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match store.health_check().await {
            Ok(()) => mark_reachable(state),
            Err(err @ StorageError::Rejected { .. }) => {
                // Reachable; a bad key or policy will not be fixed by reconnecting.
                error!(error = %err, "storage ping refused");
                mark_reachable(state);
            }
            Err(err @ StorageError::Unavailable { .. }) => {
                warn!(error = %err, "storage ping failed; entering degraded mode");
                state.update_degraded(true);
                if !reconnect(store, timings).await {
                    return;
                }
                mark_reachable(state);
            }
        }
    }
}

/// Retry the ping with backoff; `true` once anything answers.
async fn reconnect(store: &dyn ArenaStore, timings: &SupervisorTimings) -> bool {
    let mut delay = timings.initial_delay;
    for attempt in 1..=timings.reconnect_attempts {
        match store.try_reconnect().await {
            Ok(()) | Err(StorageError::Rejected { .. }) => {
                info!(attempt, "storage answering again");
                return true;
            }
            Err(err) => {
                warn!(attempt, error = %err, "storage reconnect attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(timings.max_delay);
            }
        }
    }
    false
}

fn mark_reachable(state: &SharedState) {
    if state.is_degraded() {
        info!("storage healthy again; leaving degraded mode");
        state.update_degraded(false);
    }
}
