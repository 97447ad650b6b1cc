//! Request-dispatch pipeline for server-side MVC applications.
//!
//! A request is resolved to a [`MappingConfig`](shared::MappingConfig), its
//! form is populated and validated, and the bound [`Action`] decides where
//! the request goes next. Every stage is a small hook that either continues
//! or stops with a finished response.

pub mod action;
pub mod context;
pub mod diagnostics;
pub mod dispatch;
pub mod error;
pub mod form;
pub mod hooks;
pub mod populate;
pub mod processor;
pub mod validation;

pub use action::{Action, ActionForward, ActionRegistry};
pub use context::{CancelSignal, MatchedMapping, RequestContext};
pub use diagnostics::{log_errors, DiagnosticSink, TracingSink};
pub use dispatch::{ForwardDispatcher, ModuleDispatcher, ViewRenderer};
pub use error::{ApiError, DispatchError, DispatchResult, InvalidCancellation};
pub use form::{FormState, UploadHandler};
pub use hooks::{
    AcceptLanguage, DenyAllRoles, LocaleResolver, MessageCache, ModulePathResolver,
    MultipartResolver, NoMessageCache, NoMultipart, NoPreprocess, PathResolver, Preprocessor,
    RoleChecker, Step,
};
pub use processor::{Pipeline, PipelineBuilder};
pub use validation::{
    AcceptReason, FormValidators, ValidationBuilder, ValidationOutcome, ValidationStage, Validator,
};
