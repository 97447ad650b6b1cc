//! Validators for the demo form beans

use pipeline::{FormState, FormValidators, RequestContext, ValidationBuilder};
use shared::{ErrorMessageSet, MappingConfig};

use crate::validators::{
    validate_email, validate_length, validate_no_html, validate_no_xss, validate_required,
    validate_url,
};

pub const PROFILE_FORM: &str = "profileForm";

/// Checks a profile form: name and email are required, bio and website optional
pub fn validate_profile(form: &FormState) -> Option<ErrorMessageSet> {
    let name = form.get("name").unwrap_or_default();
    let email = form.get("email").unwrap_or_default();
    let website = form.get("website").unwrap_or_default();
    let bio = form.get("bio").unwrap_or_default();

    let mut builder = ValidationBuilder::new();

    builder.check("name", || validate_required(name, "name"));
    if !name.trim().is_empty() {
        builder
            .check("name", || validate_length(name, 2, 64))
            .check("name", || validate_no_html(name));
    }

    builder.check("email", || validate_required(email, "email"));
    if !email.trim().is_empty() {
        builder.check("email", || validate_email(email));
    }

    builder
        .check("website", || validate_url(website))
        .check("bio", || validate_length(bio, 0, 500))
        .check("bio", || validate_no_xss(bio));

    builder.finish()
}

pub fn form_validators() -> FormValidators {
    let mut validators = FormValidators::new();
    validators.register(
        PROFILE_FORM,
        |_mapping: &MappingConfig, form: &FormState, _ctx: &RequestContext| validate_profile(form),
    );
    validators
}
