//! The request processor: every stage in a fixed order.
//!
//! ```text
//! multipart → path → log → locale → content/no-cache → preprocess
//!   → cached messages → mapping → roles → form → populate → validate
//!   → forward/include → action lookup → perform → post-process → dispatch
//! ```
//!
//! A stage that stops hands back a finished response; no later stage runs and
//! nothing else is written.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
};
use shared::{Forward, MappingConfig, MessageCode, ModuleConfig};
use tracing::{debug, warn};

use crate::action::{ActionForward, ActionRegistry};
use crate::context::RequestContext;
use crate::diagnostics::{log_errors, DiagnosticSink, TracingSink};
use crate::dispatch::ForwardDispatcher;
use crate::error::{ApiError, DispatchError, DispatchResult};
use crate::form::FormState;
use crate::hooks::{
    stage_content_headers, AcceptLanguage, DenyAllRoles, LocaleResolver, MessageCache,
    ModulePathResolver, MultipartResolver, NoMessageCache, NoMultipart, NoPreprocess, PathResolver,
    Preprocessor, RoleChecker, Step,
};
use crate::populate::populate;
use crate::validation::{FormValidators, ValidationOutcome, ValidationStage, Validator};

/// Unwrap a `Step`, returning its response from the enclosing function on stop
macro_rules! proceed {
    ($step:expr) => {
        match $step {
            Step::Continue(value) => value,
            Step::Stop(response) => return Ok(response),
        }
    };
}

pub struct Pipeline {
    module: Arc<ModuleConfig>,
    multipart: Box<dyn MultipartResolver>,
    paths: Box<dyn PathResolver>,
    locale: Box<dyn LocaleResolver>,
    preprocessor: Box<dyn Preprocessor>,
    messages: Box<dyn MessageCache>,
    roles: Box<dyn RoleChecker>,
    validator: Box<dyn Validator>,
    diagnostics: Arc<dyn DiagnosticSink>,
    dispatcher: Box<dyn ForwardDispatcher>,
    actions: ActionRegistry,
}

impl Pipeline {
    pub fn builder(
        module: Arc<ModuleConfig>,
        dispatcher: impl ForwardDispatcher + 'static,
    ) -> PipelineBuilder {
        PipelineBuilder::new(module, dispatcher)
    }

    pub fn module(&self) -> &ModuleConfig {
        &self.module
    }

    /// Buffer the request and run it through every stage.
    ///
    /// `Err` is returned only for transport failures and for exceptions that
    /// no configured handler claimed.
    pub async fn process(&self, request: Request<Body>) -> DispatchResult<Response> {
        let ctx = RequestContext::from_request(request, self.module.controller.max_body_bytes).await?;
        self.handle(ctx).await
    }

    pub async fn handle(&self, mut ctx: RequestContext) -> DispatchResult<Response> {
        let response = self.run(&mut ctx).await?;
        Ok(ctx.finish(response))
    }

    async fn run(&self, ctx: &mut RequestContext) -> DispatchResult<Response> {
        let controller = &self.module.controller;

        if ctx.is_multipart() {
            if let Some(upload) = proceed!(self.multipart.resolve(ctx).await) {
                ctx.set_upload_handler(upload);
            }
        }

        let path = proceed!(self.paths.resolve_path(ctx, controller));
        debug!("Processing a '{}' for path '{}'", ctx.method(), path);

        self.locale.resolve_locale(ctx, controller);
        stage_content_headers(ctx, controller);

        proceed!(self.preprocessor.preprocess(ctx));
        self.messages.restore(ctx);

        let mapping = proceed!(self.process_mapping(&path));
        ctx.set_mapping_path(mapping.path.as_str());
        proceed!(self.process_roles(ctx, mapping));

        let mut form = self.process_form(mapping);
        if let (Some(form), Some(bean)) = (
            form.as_mut(),
            mapping.form.as_deref().and_then(|f| self.module.find_form_bean(f)),
        ) {
            proceed!(populate(ctx, form, bean, controller));
        }

        let stage = ValidationStage::new(
            &self.module,
            self.validator.as_ref(),
            self.diagnostics.as_ref(),
            self.dispatcher.as_ref(),
        );
        match stage.run(ctx, form.as_ref(), mapping) {
            ValidationOutcome::Accept(reason) => debug!(?reason, "Validation accepted"),
            ValidationOutcome::Abort(response) | ValidationOutcome::ConfigurationError(response) => {
                return Ok(response)
            }
            ValidationOutcome::Fatal(cancel) => {
                return self.process_exception(ctx, form.as_ref(), mapping, cancel.into());
            }
        }

        if let Some(path) = mapping.forward.as_deref() {
            return Ok(self
                .dispatcher
                .dispatch(&Forward::to_path(path), ctx, form.as_ref()));
        }
        if let Some(path) = mapping.include.as_deref() {
            return Ok(self.dispatcher.include(path, ctx, form.as_ref()));
        }

        let Some(action) = mapping.action.as_deref().and_then(|key| self.actions.get(key)) else {
            warn!(path = %mapping.path, action = ?mapping.action, "No action instance available");
            return Ok(ApiError::from_code(
                StatusCode::INTERNAL_SERVER_ERROR,
                MessageCode::ActionCreate,
                &[&mapping.path],
            )
            .into_response());
        };

        let next = match action.perform(mapping, form.as_ref(), ctx).await {
            Ok(next) => next,
            Err(source) => {
                let error = DispatchError::Action {
                    path: mapping.path.clone(),
                    source,
                };
                return self.process_exception(ctx, form.as_ref(), mapping, error);
            }
        };

        log_errors(ctx.errors(), self.diagnostics.as_ref());

        Ok(self.process_forward(ctx, form.as_ref(), mapping, next))
    }

    fn process_mapping(&self, path: &str) -> Step<&MappingConfig> {
        if let Some(mapping) = self.module.find_mapping(path) {
            return Step::Continue(mapping);
        }
        if let Some(mapping) = self.module.unknown_mapping() {
            debug!(path, unknown = %mapping.path, "Using catch-all mapping");
            return Step::Continue(mapping);
        }

        warn!(path, "No mapping for path");
        Step::stop(ApiError::from_code(
            StatusCode::NOT_FOUND,
            MessageCode::NoMapping,
            &[path],
        ))
    }

    fn process_roles(&self, ctx: &RequestContext, mapping: &MappingConfig) -> Step<()> {
        if mapping.is_public() {
            return Step::Continue(());
        }

        if let Some(role) = mapping.roles.iter().find(|r| self.roles.has_role(ctx, r)) {
            debug!(path = %mapping.path, %role, "User authorized");
            return Step::Continue(());
        }

        warn!(path = %mapping.path, "User is not in any required role");
        Step::stop(ApiError::from_code(
            StatusCode::FORBIDDEN,
            MessageCode::NotAuthorized,
            &[&mapping.path],
        ))
    }

    fn process_form(&self, mapping: &MappingConfig) -> Option<FormState> {
        let name = mapping.form.as_deref()?;
        let bean = self.module.find_form_bean(name)?;
        Some(FormState::new(bean.name.clone()))
    }

    /// Route an error to the forward configured for its kind, or propagate it
    fn process_exception(
        &self,
        ctx: &mut RequestContext,
        form: Option<&FormState>,
        mapping: &MappingConfig,
        error: DispatchError,
    ) -> DispatchResult<Response> {
        let Some(config) = error
            .kind()
            .and_then(|kind| self.module.find_exception(mapping, kind))
        else {
            return Err(error);
        };

        warn!(path = %mapping.path, target = %config.path, "Handling exception: {}", error);
        ctx.set_exception(error.to_string());
        Ok(self.dispatcher.dispatch(&Forward::from(config), ctx, form))
    }

    fn process_forward(
        &self,
        ctx: &RequestContext,
        form: Option<&FormState>,
        mapping: &MappingConfig,
        next: Option<ActionForward>,
    ) -> Response {
        let forward = match next {
            None => return StatusCode::OK.into_response(),
            Some(ActionForward::To(forward)) => forward,
            Some(ActionForward::Named(name)) => match self.module.find_forward(mapping, &name) {
                Some(config) => Forward::from(config),
                None => {
                    return ApiError::from_code(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        MessageCode::ForwardNotFound,
                        &[&name, &mapping.path],
                    )
                    .into_response()
                }
            },
        };

        self.dispatcher.dispatch(&forward, ctx, form)
    }
}

/// Assembles a [`Pipeline`]; every hook has a default
pub struct PipelineBuilder {
    module: Arc<ModuleConfig>,
    multipart: Box<dyn MultipartResolver>,
    paths: Box<dyn PathResolver>,
    locale: Box<dyn LocaleResolver>,
    preprocessor: Box<dyn Preprocessor>,
    messages: Box<dyn MessageCache>,
    roles: Box<dyn RoleChecker>,
    validator: Box<dyn Validator>,
    diagnostics: Arc<dyn DiagnosticSink>,
    dispatcher: Box<dyn ForwardDispatcher>,
    actions: ActionRegistry,
}

impl PipelineBuilder {
    pub fn new(module: Arc<ModuleConfig>, dispatcher: impl ForwardDispatcher + 'static) -> Self {
        Self {
            module,
            multipart: Box::new(NoMultipart),
            paths: Box::new(ModulePathResolver),
            locale: Box::new(AcceptLanguage),
            preprocessor: Box::new(NoPreprocess),
            messages: Box::new(NoMessageCache),
            roles: Box::new(DenyAllRoles),
            validator: Box::new(FormValidators::new()),
            diagnostics: Arc::new(TracingSink),
            dispatcher: Box::new(dispatcher),
            actions: ActionRegistry::new(),
        }
    }

    pub fn multipart(mut self, resolver: impl MultipartResolver + 'static) -> Self {
        self.multipart = Box::new(resolver);
        self
    }

    pub fn paths(mut self, resolver: impl PathResolver + 'static) -> Self {
        self.paths = Box::new(resolver);
        self
    }

    pub fn locale(mut self, resolver: impl LocaleResolver + 'static) -> Self {
        self.locale = Box::new(resolver);
        self
    }

    pub fn preprocessor(mut self, preprocessor: impl Preprocessor + 'static) -> Self {
        self.preprocessor = Box::new(preprocessor);
        self
    }

    pub fn messages(mut self, cache: impl MessageCache + 'static) -> Self {
        self.messages = Box::new(cache);
        self
    }

    pub fn roles(mut self, checker: impl RoleChecker + 'static) -> Self {
        self.roles = Box::new(checker);
        self
    }

    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Box::new(validator);
        self
    }

    pub fn diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = sink;
        self
    }

    pub fn actions(mut self, actions: ActionRegistry) -> Self {
        self.actions = actions;
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline {
            module: self.module,
            multipart: self.multipart,
            paths: self.paths,
            locale: self.locale,
            preprocessor: self.preprocessor,
            messages: self.messages,
            roles: self.roles,
            validator: self.validator,
            diagnostics: self.diagnostics,
            dispatcher: self.dispatcher,
            actions: self.actions,
        }
    }
}
