//! Authenticated read API over the harvested records.
//!
//! Serves `GET /records?page=N` as JSON, ten records per page, behind HTTP
//! Basic authentication. The API shares the crawl's store handle and only
//! ever reads from it.

mod auth;
mod handlers;
mod routes;

pub use auth::{basic_header, AuthError, Credentials};
pub use handlers::{RecordsPage, RecordsQuery, PAGE_SIZE};
pub use routes::create_router;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::ApiConfig;
use crate::storage::{RecordStore, SharedStorage};

/// Shared state for the web server.
pub struct AppState<S> {
    pub storage: SharedStorage<S>,
    pub credentials: Arc<Credentials>,
}

impl<S> AppState<S> {
    pub fn new(storage: SharedStorage<S>, credentials: Credentials) -> Self {
        Self {
            storage,
            credentials: Arc::new(credentials),
        }
    }
}

// Manual impl: cloning the handles must not require `S: Clone`
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            credentials: Arc::clone(&self.credentials),
        }
    }
}

/// Bind the API listener.
pub async fn bind(config: &ApiConfig) -> anyhow::Result<TcpListener> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Server running on http://{}", listener.local_addr()?);
    Ok(listener)
}

/// Serve the API on an already-bound listener until `shutdown` resolves.
pub async fn serve<S, F>(listener: TcpListener, state: AppState<S>, shutdown: F) -> anyhow::Result<()>
where
    S: RecordStore + Send + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
