//! Arena Back binary entrypoint wiring REST, SSE, identity and storage layers.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arena_back::{
    config::AppConfig,
    dao::{
        game_store::{ArenaStore, memory::MemoryStore},
        identity::{IdentityProvider, memory::MemoryIdentityProvider},
    },
    routes,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let identity = build_identity(&config)?;
    let app_state = AppState::new(config, identity);

    start_storage(&app_state).await;
    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Hosted identity provider when a Supabase project is configured, otherwise an
/// in-process registry seeded with the configured development users.
fn build_identity(config: &AppConfig) -> anyhow::Result<Arc<dyn IdentityProvider>> {
    #[cfg(feature = "supabase-store")]
    {
        use arena_back::dao::{
            game_store::supabase::SupabaseConfig,
            identity::supabase::{SupabaseAuthConfig, SupabaseIdentityProvider},
        };

        if SupabaseConfig::is_configured() {
            let auth_config =
                SupabaseAuthConfig::from_env().context("reading Supabase auth settings")?;
            let provider =
                SupabaseIdentityProvider::new(auth_config).context("building auth client")?;
            info!("using Supabase identity provider");
            return Ok(Arc::new(provider));
        }
    }

    let provider = MemoryIdentityProvider::new();
    for user in config.dev_users() {
        provider.insert(user.token.clone(), user.identity.clone());
    }
    info!(
        dev_users = config.dev_users().len(),
        "using in-memory identity provider"
    );
    Ok(Arc::new(provider))
}

/// Spawn the storage supervisor against Supabase, or install the in-memory store.
async fn start_storage(state: &SharedState) {
    #[cfg(feature = "supabase-store")]
    {
        use arena_back::{
            dao::{
                game_store::supabase::{SupabaseConfig, SupabaseGameStore},
                storage::StorageError,
            },
            services::storage_supervisor,
        };

        if SupabaseConfig::is_configured() {
            tokio::spawn(storage_supervisor::run(state.clone(), || async {
                let config = SupabaseConfig::from_env().map_err(StorageError::from)?;
                let store = SupabaseGameStore::connect(config)
                    .await
                    .map_err(StorageError::from)?;
                Ok::<_, StorageError>(Arc::new(store) as Arc<dyn ArenaStore>)
            }));
            return;
        }
    }

    info!("SUPABASE_URL not set; using the in-memory store");
    state
        .install_store(Arc::new(MemoryStore::new()) as Arc<dyn ArenaStore>)
        .await;
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
