//! Module configuration: the mapping table shared by every request

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

use crate::error::ConfigError;
use crate::models::{
    ControllerConfig, ExceptionConfig, ExceptionKind, FormBeanConfig, ForwardConfig, MappingConfig,
};

/// Immutable configuration of one application module
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    pub controller: ControllerConfig,
    pub form_beans: Vec<FormBeanConfig>,
    pub mappings: Vec<MappingConfig>,
    /// Global forwards, consulted after a mapping's own forwards
    pub forwards: Vec<ForwardConfig>,
    /// Global exception handlers, consulted after a mapping's own handlers
    pub exceptions: Vec<ExceptionConfig>,
}

impl ModuleConfig {
    /// Read, parse and check a module configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json(&raw)?;

        info!(
            "Module configuration loaded: path={}, mappings={}, form_beans={}, forwards={}",
            path.display(),
            config.mappings.len(),
            config.form_beans.len(),
            config.forwards.len()
        );

        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: ModuleConfig = serde_json::from_str(raw)?;
        config.check()?;
        Ok(config)
    }

    /// Verify the cross-references between mappings, forms and targets
    pub fn check(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        let mut unknown = None;

        for mapping in &self.mappings {
            if !mapping.path.starts_with('/') {
                return Err(ConfigError::InvalidPath(mapping.path.clone()));
            }
            if !seen.insert(mapping.path.as_str()) {
                return Err(ConfigError::DuplicateMapping(mapping.path.clone()));
            }
            if let Some(form) = &mapping.form {
                if self.find_form_bean(form).is_none() {
                    return Err(ConfigError::UnknownFormBean {
                        mapping: mapping.path.clone(),
                        form: form.clone(),
                    });
                }
            }

            let targets = [
                mapping.action.is_some(),
                mapping.forward.is_some(),
                mapping.include.is_some(),
            ];
            if targets.iter().filter(|t| **t).count() > 1 {
                return Err(ConfigError::ConflictingTargets(mapping.path.clone()));
            }

            if mapping.unknown {
                if let Some(previous) = unknown.replace(mapping.path.as_str()) {
                    return Err(ConfigError::DuplicateUnknown(format!(
                        "{}, {}",
                        previous, mapping.path
                    )));
                }
            }
        }

        Ok(())
    }

    /// Exact match on the logical path
    pub fn find_mapping(&self, path: &str) -> Option<&MappingConfig> {
        self.mappings.iter().find(|m| m.path == path)
    }

    /// The catch-all mapping, if one is configured
    pub fn unknown_mapping(&self) -> Option<&MappingConfig> {
        self.mappings.iter().find(|m| m.unknown)
    }

    pub fn find_form_bean(&self, name: &str) -> Option<&FormBeanConfig> {
        self.form_beans.iter().find(|f| f.name == name)
    }

    /// Named forward lookup: the mapping's forwards first, then global ones
    pub fn find_forward<'a>(
        &'a self,
        mapping: &'a MappingConfig,
        name: &str,
    ) -> Option<&'a ForwardConfig> {
        mapping
            .find_forward(name)
            .or_else(|| self.forwards.iter().find(|f| f.name == name))
    }

    /// Exception handler lookup: the mapping's handlers first, then global ones
    pub fn find_exception<'a>(
        &'a self,
        mapping: &'a MappingConfig,
        kind: ExceptionKind,
    ) -> Option<&'a ExceptionConfig> {
        mapping
            .find_exception(kind)
            .or_else(|| self.exceptions.iter().find(|e| e.kind == kind))
    }
}
