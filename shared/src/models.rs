use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════
// ROUTE CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════

/// Static per-route configuration, loaded once and shared read-only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingConfig {
    /// Logical path this mapping answers to, e.g. `/profile/save`
    pub path: String,
    /// Key of the action registered for this mapping
    #[serde(default)]
    pub action: Option<String>,
    /// Name of the form bean bound to this mapping
    #[serde(default)]
    pub form: Option<String>,
    #[serde(default = "default_true")]
    pub validate: bool,
    #[serde(default)]
    pub cancellable: bool,
    /// Input recovery target used when validation fails
    #[serde(default)]
    pub input: Option<String>,
    /// Module-relative path dispatched instead of invoking an action
    #[serde(default)]
    pub forward: Option<String>,
    /// Module-relative path included instead of invoking an action
    #[serde(default)]
    pub include: Option<String>,
    /// Roles allowed to use this mapping; empty means public
    #[serde(default)]
    pub roles: Vec<String>,
    /// Catch-all mapping used when no path matches
    #[serde(default)]
    pub unknown: bool,
    #[serde(default)]
    pub forwards: Vec<ForwardConfig>,
    #[serde(default)]
    pub exceptions: Vec<ExceptionConfig>,
}

fn default_true() -> bool {
    true
}

impl MappingConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            action: None,
            form: None,
            validate: true,
            cancellable: false,
            input: None,
            forward: None,
            include: None,
            roles: Vec::new(),
            unknown: false,
            forwards: Vec::new(),
            exceptions: Vec::new(),
        }
    }

    /// Forward declared locally on this mapping
    pub fn find_forward(&self, name: &str) -> Option<&ForwardConfig> {
        self.forwards.iter().find(|f| f.name == name)
    }

    /// Exception handler declared locally on this mapping
    pub fn find_exception(&self, kind: ExceptionKind) -> Option<&ExceptionConfig> {
        self.exceptions.iter().find(|e| e.kind == kind)
    }

    pub fn is_public(&self) -> bool {
        self.roles.is_empty()
    }
}

/// A named navigation target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardConfig {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub redirect: bool,
}

impl ForwardConfig {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            redirect: false,
        }
    }

    pub fn redirect(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            redirect: true,
            ..Self::new(name, path)
        }
    }
}

/// Failure categories that may be routed to a configured forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionKind {
    /// A cancel submitted to a mapping that does not allow cancellation
    InvalidCancel,
    /// An application action returned an error
    Action,
}

impl std::fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExceptionKind::InvalidCancel => write!(f, "invalid_cancel"),
            ExceptionKind::Action => write!(f, "action"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionConfig {
    pub kind: ExceptionKind,
    pub path: String,
    #[serde(default)]
    pub redirect: bool,
}

/// Declaration of a form bean that mappings may bind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormBeanConfig {
    pub name: String,
    /// Accepted request parameters; empty accepts every parameter
    #[serde(default)]
    pub fields: Vec<String>,
}

impl FormBeanConfig {
    pub fn accepts(&self, field: &str) -> bool {
        self.fields.is_empty() || self.fields.iter().any(|f| f == field)
    }
}

/// Module-wide request processing settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Resolve `input` through named forwards instead of as a module-relative path
    pub input_forward: bool,
    /// Prefix stripped from request URIs, e.g. `/app`
    pub module_prefix: String,
    /// Extension stripped from request URIs, e.g. `.do`
    pub path_suffix: Option<String>,
    pub content_type: Option<String>,
    pub nocache: bool,
    pub locale: bool,
    /// Request parameter that marks a submission as cancelled
    pub cancel_param: String,
    /// Maximum accepted request body, in bytes
    pub max_body_bytes: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            input_forward: false,
            module_prefix: String::new(),
            path_suffix: None,
            content_type: None,
            nocache: false,
            locale: true,
            cancel_param: "cancel".to_string(),
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// RUNTIME NAVIGATION
// ═══════════════════════════════════════════════════════════════════════════

/// A resolved navigation instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forward {
    pub name: Option<String>,
    pub path: String,
    pub redirect: bool,
}

impl Forward {
    /// Internal forward to a module-relative path
    pub fn to_path(path: impl Into<String>) -> Self {
        Self {
            name: None,
            path: path.into(),
            redirect: false,
        }
    }

    pub fn redirect_to(path: impl Into<String>) -> Self {
        Self {
            redirect: true,
            ..Self::to_path(path)
        }
    }
}

impl From<&ForwardConfig> for Forward {
    fn from(config: &ForwardConfig) -> Self {
        Self {
            name: Some(config.name.clone()),
            path: config.path.clone(),
            redirect: config.redirect,
        }
    }
}

impl From<&ExceptionConfig> for Forward {
    fn from(config: &ExceptionConfig) -> Self {
        Self {
            name: Some(config.kind.to_string()),
            path: config.path.clone(),
            redirect: config.redirect,
        }
    }
}
