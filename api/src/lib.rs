pub mod actions;
pub mod config;
pub mod forms;
pub mod metrics;
pub mod observability;
pub mod roles;
pub mod routes;
pub mod state;
pub mod uploads;
pub mod validators;
pub mod views;

use std::sync::Arc;

use pipeline::{ModuleDispatcher, Pipeline, TracingSink};
use prometheus::Registry;
use shared::ModuleConfig;

use crate::actions::ProfileStore;
use crate::metrics::{MeteredValidator, MetricsSink};
use crate::roles::HeaderRoleChecker;
use crate::state::AppState;
use crate::uploads::MultipartUploads;
use crate::views::JsonViewRenderer;

/// Wire the demo collaborators into a pipeline for one module
pub fn build_pipeline(module: Arc<ModuleConfig>, profiles: ProfileStore) -> Pipeline {
    let dispatcher = ModuleDispatcher::new(module.controller.module_prefix.clone(), JsonViewRenderer);

    Pipeline::builder(module, dispatcher)
        .multipart(MultipartUploads::default())
        .roles(HeaderRoleChecker::default())
        .validator(MeteredValidator::new(forms::form_validators()))
        .diagnostics(Arc::new(MetricsSink::new(Arc::new(TracingSink))))
        .actions(actions::default_actions(profiles))
        .build()
}

pub fn build_state(module: ModuleConfig, registry: Registry) -> AppState {
    let profiles = ProfileStore::new();
    let pipeline = build_pipeline(Arc::new(module), profiles.clone());
    AppState::new(pipeline, profiles, registry)
}
