//! Shared application state.

use std::fmt;
use std::sync::Arc;

use storyloom_core::gateway::GenerationGateway;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Gateway that produces story text.
    pub gateway: Arc<dyn GenerationGateway>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(gateway: Arc<dyn GenerationGateway>) -> Self {
        Self { gateway }
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}
