//! The validation decision for one request/form/mapping triple.
//!
//! Single pass, no loops:
//!
//! ```text
//! no form ──────────────► Accept(NoForm)
//! validate = false ─────► Accept(ValidationDisabled)
//! cancel + cancellable ─► Accept(Cancelled)
//! cancel, not allowed ──► Fatal(InvalidCancellation)       (signal cleared)
//! validator: no errors ─► Accept(Valid)
//! validator: errors ────► recover
//!     rollback upload
//!     no input target ──► ConfigurationError(500 noInput)
//!     attach errors, log them, dispatch input target
//!                       ► Abort(recovery page)
//! ```
//!
//! Side effects of the recovery path run strictly in that order.

use axum::{http::StatusCode, response::IntoResponse, response::Response};
use shared::{ErrorMessageSet, Forward, MappingConfig, MessageCode, ModuleConfig};
use tracing::{debug, trace};

use crate::context::RequestContext;
use crate::diagnostics::{log_errors, DiagnosticSink};
use crate::dispatch::ForwardDispatcher;
use crate::error::{ApiError, InvalidCancellation};
use crate::form::FormState;
use crate::validation::Validator;

/// Why a request was allowed to continue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptReason {
    NoForm,
    ValidationDisabled,
    Cancelled,
    Valid,
}

/// Terminal state of the validation stage
#[derive(Debug)]
pub enum ValidationOutcome {
    /// Continue with the next pipeline stage
    Accept(AcceptReason),
    /// Validation failed and the input page was dispatched; stop
    Abort(Response),
    /// Cancel on a non-cancellable mapping; hand to exception handling
    Fatal(InvalidCancellation),
    /// Validation failed with nowhere to return to; a 500 was produced; stop
    ConfigurationError(Response),
}

impl ValidationOutcome {
    pub fn is_accept(&self) -> bool {
        matches!(self, ValidationOutcome::Accept(_))
    }
}

/// Stateless; holds only borrowed collaborators
pub struct ValidationStage<'a> {
    module: &'a ModuleConfig,
    validator: &'a dyn Validator,
    diagnostics: &'a dyn DiagnosticSink,
    dispatcher: &'a dyn ForwardDispatcher,
}

impl<'a> ValidationStage<'a> {
    pub fn new(
        module: &'a ModuleConfig,
        validator: &'a dyn Validator,
        diagnostics: &'a dyn DiagnosticSink,
        dispatcher: &'a dyn ForwardDispatcher,
    ) -> Self {
        Self {
            module,
            validator,
            diagnostics,
            dispatcher,
        }
    }

    pub fn run(
        &self,
        ctx: &mut RequestContext,
        form: Option<&FormState>,
        mapping: &MappingConfig,
    ) -> ValidationOutcome {
        let Some(form) = form else {
            return ValidationOutcome::Accept(AcceptReason::NoForm);
        };

        if !mapping.validate {
            return ValidationOutcome::Accept(AcceptReason::ValidationDisabled);
        }

        if ctx.is_cancelled() {
            if mapping.cancellable {
                debug!(path = %mapping.path, "Cancelled transaction, skipping validation");
                return ValidationOutcome::Accept(AcceptReason::Cancelled);
            }
            ctx.clear_cancel();
            return ValidationOutcome::Fatal(InvalidCancellation {
                path: mapping.path.clone(),
            });
        }

        debug!(path = %mapping.path, form = form.name(), "Validating input form properties");
        match self.validator.validate(mapping, form, ctx) {
            Some(errors) if !errors.is_empty() => self.recover(ctx, form, mapping, errors),
            _ => {
                trace!("No errors detected, accepting input");
                ValidationOutcome::Accept(AcceptReason::Valid)
            }
        }
    }

    fn recover(
        &self,
        ctx: &mut RequestContext,
        form: &FormState,
        mapping: &MappingConfig,
        errors: ErrorMessageSet,
    ) -> ValidationOutcome {
        if let Some(upload) = form.upload_handler() {
            trace!("Rolling back multipart request");
            upload.rollback();
        }

        let Some(input) = mapping.input.as_deref() else {
            trace!("Validation failed but no input form available");
            let error = ApiError::from_code(
                StatusCode::INTERNAL_SERVER_ERROR,
                MessageCode::NoInput,
                &[&mapping.path],
            );
            return ValidationOutcome::ConfigurationError(error.into_response());
        };

        let forward = if self.module.controller.input_forward {
            match self.module.find_forward(mapping, input) {
                Some(config) => Forward::from(config),
                None => {
                    let error = ApiError::from_code(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        MessageCode::ForwardNotFound,
                        &[input, &mapping.path],
                    );
                    return ValidationOutcome::ConfigurationError(error.into_response());
                }
            }
        } else {
            Forward::to_path(input)
        };

        debug!(path = %mapping.path, input, errors = errors.len(), "Validation failed, returning to input");
        ctx.attach_errors(errors);
        log_errors(ctx.errors(), self.diagnostics);

        ValidationOutcome::Abort(self.dispatcher.dispatch(&forward, ctx, Some(form)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, Uri};
    use shared::{FieldError, ForwardConfig};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use crate::form::UploadHandler;

    type Events = Arc<Mutex<Vec<String>>>;

    struct ScriptedValidator {
        result: Option<ErrorMessageSet>,
        calls: AtomicUsize,
        events: Events,
    }

    impl ScriptedValidator {
        fn returning(result: Option<ErrorMessageSet>, events: &Events) -> Self {
            Self {
                result,
                calls: AtomicUsize::new(0),
                events: events.clone(),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Validator for ScriptedValidator {
        fn validate(
            &self,
            _mapping: &MappingConfig,
            _form: &FormState,
            _ctx: &RequestContext,
        ) -> Option<ErrorMessageSet> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.events.lock().unwrap().push("validate".into());
            self.result.clone()
        }
    }

    struct RecordingUpload {
        rollbacks: AtomicUsize,
        events: Events,
    }

    impl UploadHandler for RecordingUpload {
        fn rollback(&self) {
            self.rollbacks.fetch_add(1, Ordering::SeqCst);
            self.events.lock().unwrap().push("rollback".into());
        }
    }

    struct RecordingSink(Events);

    impl DiagnosticSink for RecordingSink {
        fn record(&self, error: &FieldError) {
            self.0.lock().unwrap().push(format!("log {}", error));
        }
    }

    struct RecordingDispatcher {
        events: Events,
        seen_errors: Mutex<Option<ErrorMessageSet>>,
    }

    impl ForwardDispatcher for RecordingDispatcher {
        fn dispatch(
            &self,
            forward: &Forward,
            ctx: &RequestContext,
            _form: Option<&FormState>,
        ) -> Response {
            self.events
                .lock()
                .unwrap()
                .push(format!("dispatch {}", forward.path));
            *self.seen_errors.lock().unwrap() = ctx.errors().cloned();
            StatusCode::OK.into_response()
        }

        fn include(&self, path: &str, _ctx: &RequestContext, _form: Option<&FormState>) -> Response {
            self.events.lock().unwrap().push(format!("include {}", path));
            StatusCode::OK.into_response()
        }
    }

    struct Harness {
        events: Events,
        module: ModuleConfig,
        validator: ScriptedValidator,
        sink: RecordingSink,
        dispatcher: RecordingDispatcher,
    }

    impl Harness {
        fn new(result: Option<ErrorMessageSet>) -> Self {
            let events: Events = Arc::default();
            Self {
                module: ModuleConfig::default(),
                validator: ScriptedValidator::returning(result, &events),
                sink: RecordingSink(events.clone()),
                dispatcher: RecordingDispatcher {
                    events: events.clone(),
                    seen_errors: Mutex::new(None),
                },
                events,
            }
        }

        fn run(
            &self,
            ctx: &mut RequestContext,
            form: Option<&FormState>,
            mapping: &MappingConfig,
        ) -> ValidationOutcome {
            ValidationStage::new(&self.module, &self.validator, &self.sink, &self.dispatcher)
                .run(ctx, form, mapping)
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        fn upload(&self) -> Arc<RecordingUpload> {
            Arc::new(RecordingUpload {
                rollbacks: AtomicUsize::new(0),
                events: self.events.clone(),
            })
        }
    }

    fn email_required() -> ErrorMessageSet {
        let mut errors = ErrorMessageSet::new();
        errors.add("email", "required");
        errors
    }

    fn ctx() -> RequestContext {
        RequestContext::new(Method::POST, Uri::from_static("/profile/save"))
    }

    fn form() -> FormState {
        FormState::new("profileForm").with_field("email", "")
    }

    #[test]
    fn test_absent_form_accepts_without_validating() {
        let harness = Harness::new(Some(email_required()));
        let mapping = MappingConfig::new("/profile/save");

        let outcome = harness.run(&mut ctx(), None, &mapping);

        assert!(matches!(outcome, ValidationOutcome::Accept(AcceptReason::NoForm)));
        assert_eq!(harness.validator.calls(), 0);
    }

    #[test]
    fn test_validation_disabled_accepts_any_content() {
        let harness = Harness::new(Some(email_required()));
        let mapping = MappingConfig {
            validate: false,
            ..MappingConfig::new("/profile/save")
        };

        for form in [form(), FormState::new("profileForm"), form().with_field("x", "<script>")] {
            let mut ctx = ctx();
            ctx.set_cancel();
            let outcome = harness.run(&mut ctx, Some(&form), &mapping);
            assert!(matches!(
                outcome,
                ValidationOutcome::Accept(AcceptReason::ValidationDisabled)
            ));
        }
        assert_eq!(harness.validator.calls(), 0);
    }

    #[test]
    fn test_cancellable_cancel_skips_validator_and_keeps_signal() {
        let harness = Harness::new(Some(email_required()));
        let mapping = MappingConfig {
            cancellable: true,
            ..MappingConfig::new("/profile/edit")
        };
        let mut ctx = ctx();
        ctx.set_cancel();

        let outcome = harness.run(&mut ctx, Some(&form()), &mapping);

        assert!(matches!(outcome, ValidationOutcome::Accept(AcceptReason::Cancelled)));
        assert_eq!(harness.validator.calls(), 0);
        assert!(ctx.is_cancelled());
    }

    #[test]
    fn test_forbidden_cancel_is_fatal_and_clears_signal() {
        let harness = Harness::new(None);
        let mapping = MappingConfig::new("/profile/save");
        let mut ctx = ctx();
        ctx.set_cancel();

        let outcome = harness.run(&mut ctx, Some(&form()), &mapping);

        match outcome {
            ValidationOutcome::Fatal(err) => assert_eq!(err.path, "/profile/save"),
            other => panic!("expected Fatal, got {:?}", other),
        }
        assert!(!ctx.is_cancelled());
        assert_eq!(harness.validator.calls(), 0);
        assert!(harness.events().is_empty());
    }

    #[test]
    fn test_empty_and_absent_error_sets_both_accept() {
        for result in [None, Some(ErrorMessageSet::new())] {
            let harness = Harness::new(result);
            let mapping = MappingConfig::new("/profile/save");
            let mut ctx = ctx();

            let outcome = harness.run(&mut ctx, Some(&form()), &mapping);

            assert!(matches!(outcome, ValidationOutcome::Accept(AcceptReason::Valid)));
            assert_eq!(harness.validator.calls(), 1);
            assert!(ctx.errors().is_none());
        }
    }

    #[test]
    fn test_failure_returns_to_input_with_exact_errors() {
        let harness = Harness::new(Some(email_required()));
        let mapping = MappingConfig {
            input: Some("editForm".into()),
            ..MappingConfig::new("/profile/edit")
        };
        let mut ctx = ctx();

        let outcome = harness.run(&mut ctx, Some(&form()), &mapping);

        assert!(matches!(outcome, ValidationOutcome::Abort(_)));
        assert_eq!(ctx.errors(), Some(&email_required()));
        assert_eq!(
            *harness.dispatcher.seen_errors.lock().unwrap(),
            Some(email_required())
        );
        assert_eq!(
            harness.events(),
            vec!["validate", "log email: required", "dispatch editForm"]
        );
    }

    #[test]
    fn test_rollback_once_before_anything_else() {
        let harness = Harness::new(Some(email_required()));
        let upload = harness.upload();
        let mapping = MappingConfig {
            input: Some("/profile/edit.view".into()),
            ..MappingConfig::new("/profile/save")
        };
        let form = form().with_upload_handler(upload.clone());

        let outcome = harness.run(&mut ctx(), Some(&form), &mapping);

        assert!(matches!(outcome, ValidationOutcome::Abort(_)));
        assert_eq!(upload.rollbacks.load(Ordering::SeqCst), 1);
        assert_eq!(
            harness.events(),
            vec![
                "validate",
                "rollback",
                "log email: required",
                "dispatch /profile/edit.view"
            ]
        );
    }

    #[test]
    fn test_missing_input_is_configuration_error() {
        let harness = Harness::new(Some(email_required()));
        let upload = harness.upload();
        let mapping = MappingConfig::new("/broken/save");
        let form = form().with_upload_handler(upload.clone());
        let mut ctx = ctx();

        let outcome = harness.run(&mut ctx, Some(&form), &mapping);

        match outcome {
            ValidationOutcome::ConfigurationError(response) => {
                assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR)
            }
            other => panic!("expected ConfigurationError, got {:?}", other),
        }
        assert_eq!(upload.rollbacks.load(Ordering::SeqCst), 1);
        assert!(ctx.errors().is_none());
        assert_eq!(harness.events(), vec!["validate", "rollback"]);
    }

    #[test]
    fn test_input_forward_resolves_named_forward() {
        let mut harness = Harness::new(Some(email_required()));
        harness.module.controller.input_forward = true;
        harness.module.forwards = vec![ForwardConfig::new("editForm", "/profile/edit.view")];
        let mapping = MappingConfig {
            input: Some("editForm".into()),
            ..MappingConfig::new("/profile/save")
        };

        let outcome = harness.run(&mut ctx(), Some(&form()), &mapping);

        assert!(matches!(outcome, ValidationOutcome::Abort(_)));
        assert_eq!(
            harness.events().last().map(String::as_str),
            Some("dispatch /profile/edit.view")
        );
    }

    #[test]
    fn test_input_forward_without_named_forward_is_configuration_error() {
        let mut harness = Harness::new(Some(email_required()));
        harness.module.controller.input_forward = true;
        let mapping = MappingConfig {
            input: Some("editForm".into()),
            ..MappingConfig::new("/profile/save")
        };

        let mut ctx = ctx();
        let form = form().with_upload_handler(harness.upload());

        let outcome = harness.run(&mut ctx, Some(&form), &mapping);

        assert!(matches!(outcome, ValidationOutcome::ConfigurationError(_)));
        assert_eq!(harness.events(), vec!["validate", "rollback"]);
        assert!(!ctx.has_errors());
    }
}
