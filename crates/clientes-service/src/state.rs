//! Application state.

use std::sync::Arc;

use clientes_store::Store;

use crate::config::ServiceConfig;
use crate::customers::CustomerService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Customer operations, including the balance engine.
    pub customers: CustomerService,

    /// Service configuration.
    pub config: ServiceConfig,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: ServiceConfig) -> Self {
        Self {
            customers: CustomerService::new(store),
            config,
        }
    }
}
