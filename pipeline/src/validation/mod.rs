//! Input validation
//!
//! 1. **Validator** - pure check of a populated form, returning an
//!    [`ErrorMessageSet`]
//! 2. **ValidationBuilder** - accumulates field errors inside a validator
//! 3. **ValidationStage** - decides whether the request may proceed, and runs
//!    the recovery path when it may not
//!
//! ```ignore
//! use pipeline::validation::{FormValidators, ValidationBuilder};
//!
//! let mut validators = FormValidators::new();
//! validators.register("profileForm", |_mapping: &MappingConfig, form: &FormState, _ctx: &RequestContext| {
//!     let mut builder = ValidationBuilder::new();
//!     builder.check_condition(form.get("email").unwrap_or("").is_empty(), "email", "required");
//!     builder.finish()
//! });
//! ```

pub mod builder;
pub mod stage;

use std::collections::HashMap;

use shared::{ErrorMessageSet, MappingConfig};

use crate::context::RequestContext;
use crate::form::FormState;

pub use builder::ValidationBuilder;
pub use stage::{AcceptReason, ValidationOutcome, ValidationStage};

/// Pure check of a populated form.
///
/// `None` and an empty set both mean "no errors".
pub trait Validator: Send + Sync {
    fn validate(
        &self,
        mapping: &MappingConfig,
        form: &FormState,
        ctx: &RequestContext,
    ) -> Option<ErrorMessageSet>;
}

impl<F> Validator for F
where
    F: Fn(&MappingConfig, &FormState, &RequestContext) -> Option<ErrorMessageSet> + Send + Sync,
{
    fn validate(
        &self,
        mapping: &MappingConfig,
        form: &FormState,
        ctx: &RequestContext,
    ) -> Option<ErrorMessageSet> {
        self(mapping, form, ctx)
    }
}

/// Validators keyed by form bean name
#[derive(Default)]
pub struct FormValidators {
    validators: HashMap<String, Box<dyn Validator>>,
}

impl FormValidators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, form: impl Into<String>, validator: impl Validator + 'static) -> &mut Self {
        self.validators.insert(form.into(), Box::new(validator));
        self
    }

    pub fn contains(&self, form: &str) -> bool {
        self.validators.contains_key(form)
    }
}

impl Validator for FormValidators {
    fn validate(
        &self,
        mapping: &MappingConfig,
        form: &FormState,
        ctx: &RequestContext,
    ) -> Option<ErrorMessageSet> {
        self.validators
            .get(form.name())
            .and_then(|v| v.validate(mapping, form, ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, Uri};

    #[test]
    fn test_registry_dispatches_by_form_name() {
        let mut validators = FormValidators::new();
        validators.register(
            "profileForm",
            |_: &MappingConfig, form: &FormState, _: &RequestContext| {
                let mut builder = ValidationBuilder::new();
                builder.check_condition(form.get("email").is_none(), "email", "required");
                builder.finish()
            },
        );

        let mapping = MappingConfig::new("/profile/save");
        let ctx = RequestContext::new(Method::POST, Uri::from_static("/profile/save"));

        let errors = validators
            .validate(&mapping, &FormState::new("profileForm"), &ctx)
            .unwrap();
        assert_eq!(errors.len(), 1);

        assert!(validators
            .validate(&mapping, &FormState::new("otherForm"), &ctx)
            .is_none());
        assert!(validators.contains("profileForm"));
    }
}
