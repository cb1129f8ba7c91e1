//! Listening party binary entrypoint wiring the webhook, storage supervisor and collaborators.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use futures::future::BoxFuture;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use listening_party::{
    config::{AppConfig, StoreBackend},
    dao::{
        kv_store::{KvStore, MemoryKvStore},
        storage::StorageError,
    },
    routes,
    services::{catalog::YouTubeCatalog, storage_supervisor, verification::verifier_from_env},
    state::{AppState, SharedState},
};

type Connect = Box<dyn FnMut() -> BoxFuture<'static, Result<Arc<dyn KvStore>, StorageError>> + Send>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let catalog = YouTubeCatalog::from_env().context("building catalog client")?;
    let app_state = AppState::new(config, Arc::new(catalog), verifier_from_env());

    let backend = StoreBackend::from_env();
    info!(?backend, "selected storage backend");
    tokio::spawn(storage_supervisor::run(app_state.clone(), connector(backend)));

    let app = build_router(app_state);
    let addr = listen_addr();
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// `PORT`, then `SERVER_PORT`, then 8080, on every interface.
fn listen_addr() -> SocketAddr {
    let port = ["PORT", "SERVER_PORT"]
        .into_iter()
        .find_map(|name| env::var(name).ok()?.parse::<u16>().ok())
        .unwrap_or(8080);
    SocketAddr::from(([0, 0, 0, 0], port))
}

/// Build the connect closure handed to the storage supervisor for `backend`.
fn connector(backend: StoreBackend) -> Connect {
    match backend {
        StoreBackend::Memory => memory_connector(),
        #[cfg(feature = "couch-store")]
        StoreBackend::Couch => Box::new(|| {
            Box::pin(async {
                use listening_party::dao::kv_store::couchdb::{CouchConfig, CouchKvStore};

                let config = CouchConfig::from_env()?;
                let store = CouchKvStore::connect(config).await?;
                Ok(Arc::new(store) as Arc<dyn KvStore>)
            })
        }),
        #[cfg(feature = "mongo-store")]
        StoreBackend::Mongo => Box::new(|| {
            Box::pin(async {
                use listening_party::dao::kv_store::mongodb::{MongoConfig, MongoKvStore};

                let config = MongoConfig::from_env()?;
                let store = MongoKvStore::connect(config).await?;
                Ok(Arc::new(store) as Arc<dyn KvStore>)
            })
        }),
        #[allow(unreachable_patterns)]
        other => {
            error!(backend = ?other, "backend not compiled in; using in-memory store");
            memory_connector()
        }
    }
}

/// The same in-memory store is reinstalled on every reconnect.
fn memory_connector() -> Connect {
    let store = MemoryKvStore::new();
    Box::new(move || {
        let store = store.clone();
        Box::pin(async move { Ok(Arc::new(store) as Arc<dyn KvStore>) })
    })
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
                error!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
