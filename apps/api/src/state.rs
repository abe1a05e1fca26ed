use std::sync::Arc;

use crate::backend::JobBoardBackend;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Job-board REST backend. `HttpBackend` in production, swapped for an
    /// in-memory fake in router tests.
    pub backend: Arc<dyn JobBoardBackend>,
    pub config: Config,
}
