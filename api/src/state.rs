use pipeline::Pipeline;
use prometheus::Registry;
use std::sync::Arc;
use std::time::Instant;

use crate::actions::ProfileStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub profiles: ProfileStore,
    pub started_at: Instant,
    pub registry: Registry,
}

impl AppState {
    pub fn new(pipeline: Pipeline, profiles: ProfileStore, registry: Registry) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            profiles,
            started_at: Instant::now(),
            registry,
        }
    }
}
