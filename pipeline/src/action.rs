use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use shared::{Forward, MappingConfig};

use crate::context::RequestContext;
use crate::form::FormState;

/// Where an action wants the request to go next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionForward {
    /// Looked up among the mapping's forwards, then the global ones
    Named(String),
    To(Forward),
}

impl ActionForward {
    pub fn named(name: impl Into<String>) -> Self {
        ActionForward::Named(name.into())
    }
}

/// Application logic bound to a mapping.
///
/// One instance serves every request for its key, so implementations must not
/// keep per-request state.
#[async_trait]
pub trait Action: Send + Sync {
    async fn perform(
        &self,
        mapping: &MappingConfig,
        form: Option<&FormState>,
        ctx: &mut RequestContext,
    ) -> anyhow::Result<Option<ActionForward>>;
}

/// Shared action instances keyed by `MappingConfig::action`
#[derive(Default, Clone)]
pub struct ActionRegistry {
    actions: HashMap<String, Arc<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, key: impl Into<String>, action: impl Action + 'static) -> &mut Self {
        self.actions.insert(key.into(), Arc::new(action));
        self
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn Action>> {
        self.actions.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
