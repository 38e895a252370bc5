//! HTTP surface of the game finder.
//!
//! [`router`] builds the axum application: session and venue CRUD, the
//! GeoJSON map endpoints, county lookups and the embedded map page. Store
//! calls run on the blocking thread pool because [`GameStore`]
//! implementations are synchronous.
#![forbid(unsafe_code)]

mod api;
mod error;
mod params;
mod resources;

use std::{io, sync::Arc};

use axum::Router;
use finder_core::GameStore;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use error::ApiError;
pub use resources::{SessionBody, SessionResource, VenueBody, VenueResource};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn GameStore>,
}

impl AppState {
    /// Wrap a store for use by the handlers.
    pub fn new(store: impl GameStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Run `op` against the store on the blocking thread pool.
    pub(crate) async fn with_store<T, F>(&self, op: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn GameStore) -> Result<T, ApiError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || op(store.as_ref())).await?
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

/// Build the application router.
///
/// Cross-origin requests are allowed from any origin and every request is
/// traced.
pub fn router(state: AppState) -> Router {
    api::router()
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the application on `listener` until Ctrl+C or SIGTERM.
///
/// # Errors
/// Returns IO errors raised by the listener.
pub async fn serve(listener: TcpListener, state: AppState) -> io::Result<()> {
    let address = listener.local_addr()?;
    tracing::info!(%address, "game finder listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("game finder stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
