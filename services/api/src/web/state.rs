//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use recitation_core::planner::Planner;
use std::sync::Arc;
use tokio::sync::Mutex;

/// The shared application state, created once at startup and passed to all handlers.
///
/// The planner is the single writer of its persisted record, so every handler takes
/// the lock for the whole operation.
pub struct AppState {
    pub planner: Mutex<Planner>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(planner: Planner, config: Arc<Config>) -> Self {
        Self {
            planner: Mutex::new(planner),
            config,
        }
    }
}
