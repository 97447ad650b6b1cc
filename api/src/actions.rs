//! Demo actions for the profile screens

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pipeline::{Action, ActionForward, ActionRegistry, FormState, RequestContext};
use serde::Serialize;
use shared::{ErrorMessageSet, Forward, MappingConfig};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub website: Option<String>,
    pub bio: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Profiles keyed by e-mail address
#[derive(Debug, Clone, Default)]
pub struct ProfileStore {
    profiles: Arc<RwLock<HashMap<String, Profile>>>,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, email: &str) -> anyhow::Result<Option<Profile>> {
        let profiles = self
            .profiles
            .read()
            .map_err(|_| anyhow!("profile store lock poisoned"))?;
        Ok(profiles.get(email).cloned())
    }

    pub fn len(&self) -> usize {
        self.profiles.read().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert or update by e-mail; `false` when the address belongs to someone else
    fn upsert(&self, name: &str, form: &FormState) -> anyhow::Result<bool> {
        let email = form.get("email").unwrap_or_default().trim().to_lowercase();
        let mut profiles = self
            .profiles
            .write()
            .map_err(|_| anyhow!("profile store lock poisoned"))?;

        let id = match profiles.get(&email) {
            Some(existing) if existing.name != name => return Ok(false),
            Some(existing) => existing.id,
            None => Uuid::new_v4(),
        };

        let optional = |field: &str| {
            form.get(field)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        profiles.insert(
            email.clone(),
            Profile {
                id,
                name: name.to_string(),
                email,
                website: optional("website"),
                bio: optional("bio"),
                updated_at: Utc::now(),
            },
        );
        Ok(true)
    }
}

/// Shows the edit screen, or leaves it when the user cancels
pub struct EditProfile;

#[async_trait]
impl Action for EditProfile {
    async fn perform(
        &self,
        _mapping: &MappingConfig,
        _form: Option<&FormState>,
        ctx: &mut RequestContext,
    ) -> anyhow::Result<Option<ActionForward>> {
        if ctx.is_cancelled() {
            return Ok(Some(ActionForward::named("cancel")));
        }
        Ok(Some(ActionForward::named("success")))
    }
}

pub struct SaveProfile {
    store: ProfileStore,
}

impl SaveProfile {
    pub fn new(store: ProfileStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Action for SaveProfile {
    async fn perform(
        &self,
        mapping: &MappingConfig,
        form: Option<&FormState>,
        ctx: &mut RequestContext,
    ) -> anyhow::Result<Option<ActionForward>> {
        if ctx.is_cancelled() {
            return Ok(Some(ActionForward::named("cancel")));
        }

        let form = form.ok_or_else(|| anyhow!("no form bound to {}", mapping.path))?;
        let name = form.get("name").unwrap_or_default().trim();

        if !self.store.upsert(name, form)? {
            let mut errors = ErrorMessageSet::new();
            errors.add("email", "is already registered");
            ctx.attach_errors(errors);

            let input = mapping
                .input
                .as_deref()
                .ok_or_else(|| anyhow!("no input view for {}", mapping.path))?;
            return Ok(Some(ActionForward::To(Forward::to_path(input))));
        }

        info!(%name, "Profile saved");
        Ok(Some(ActionForward::named("success")))
    }
}

pub struct AdminDashboard {
    store: ProfileStore,
}

#[async_trait]
impl Action for AdminDashboard {
    async fn perform(
        &self,
        _mapping: &MappingConfig,
        _form: Option<&FormState>,
        _ctx: &mut RequestContext,
    ) -> anyhow::Result<Option<ActionForward>> {
        info!(profiles = self.store.len(), "Admin dashboard viewed");
        Ok(Some(ActionForward::To(Forward::to_path("/admin.view"))))
    }
}

pub fn default_actions(store: ProfileStore) -> ActionRegistry {
    let mut actions = ActionRegistry::new();
    actions
        .register("editProfile", EditProfile)
        .register("saveProfile", SaveProfile::new(store.clone()))
        .register("adminDashboard", AdminDashboard { store });
    actions
}
