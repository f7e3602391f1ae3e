//! Shared application state for request handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::stores::Stores;

/// Shared application state, cloneable across handlers via Arc-wrapped fields.
///
/// Store slots start empty and are filled by the startup task once each
/// connection opens.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub stores: Arc<Stores>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config: Arc::new(config),
            stores: Arc::new(Stores::new()),
        }
    }
}
