//! Collaborator hooks consumed by the pipeline, with default implementations.
//!
//! A hook that cannot let the request continue returns [`Step::Stop`] with a
//! finished response; the pipeline then sends that response unchanged.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use shared::{ControllerConfig, MessageCode};
use tracing::debug;

use crate::context::RequestContext;
use crate::error::ApiError;
use crate::form::UploadHandler;

/// Continue with a value, or stop with a response that is already final
#[derive(Debug)]
pub enum Step<T> {
    Continue(T),
    Stop(Response),
}

impl<T> Step<T> {
    pub fn stop(response: impl IntoResponse) -> Self {
        Step::Stop(response.into_response())
    }

    pub fn is_stop(&self) -> bool {
        matches!(self, Step::Stop(_))
    }
}

// ── Multipart ───────────────────────────────────────────────────────────────

/// Prepares multipart bodies; called only for `multipart/form-data` requests
#[async_trait]
pub trait MultipartResolver: Send + Sync {
    async fn resolve(&self, ctx: &RequestContext) -> Step<Option<Arc<dyn UploadHandler>>>;
}

/// Leaves multipart bodies untouched
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMultipart;

#[async_trait]
impl MultipartResolver for NoMultipart {
    async fn resolve(&self, _ctx: &RequestContext) -> Step<Option<Arc<dyn UploadHandler>>> {
        Step::Continue(None)
    }
}

// ── Path ────────────────────────────────────────────────────────────────────

/// Derives the logical mapping path from the request URI
pub trait PathResolver: Send + Sync {
    fn resolve_path(&self, ctx: &RequestContext, controller: &ControllerConfig) -> Step<String>;
}

/// Strips the module prefix and the optional path suffix
#[derive(Debug, Default, Clone, Copy)]
pub struct ModulePathResolver;

impl ModulePathResolver {
    fn strip(uri_path: &str, controller: &ControllerConfig) -> Option<String> {
        let path = uri_path.strip_prefix(controller.module_prefix.as_str())?;
        let path = match controller.path_suffix.as_deref() {
            Some(suffix) if !suffix.is_empty() => path.strip_suffix(suffix)?,
            _ => path,
        };

        if path.is_empty() {
            return Some("/".to_string());
        }
        if !path.starts_with('/') {
            return None;
        }
        Some(path.to_string())
    }
}

impl PathResolver for ModulePathResolver {
    fn resolve_path(&self, ctx: &RequestContext, controller: &ControllerConfig) -> Step<String> {
        let uri_path = ctx.uri().path();
        match Self::strip(uri_path, controller) {
            Some(path) => Step::Continue(path),
            None => Step::stop(ApiError::from_code(
                StatusCode::BAD_REQUEST,
                MessageCode::ProcessPath,
                &[uri_path],
            )),
        }
    }
}

// ── Locale ──────────────────────────────────────────────────────────────────

pub trait LocaleResolver: Send + Sync {
    fn resolve_locale(&self, ctx: &mut RequestContext, controller: &ControllerConfig);
}

/// First tag of `Accept-Language`; quality values are ignored
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptLanguage;

impl LocaleResolver for AcceptLanguage {
    fn resolve_locale(&self, ctx: &mut RequestContext, controller: &ControllerConfig) {
        if !controller.locale || ctx.locale().is_some() {
            return;
        }

        let locale = ctx
            .header(header::ACCEPT_LANGUAGE.as_str())
            .and_then(|value| value.split(',').next())
            .map(|tag| tag.split(';').next().unwrap_or("").trim().to_string())
            .filter(|tag| !tag.is_empty() && tag != "*");

        if let Some(locale) = locale {
            debug!(%locale, "Locale selected");
            ctx.set_locale(locale);
        }
    }
}

/// Stage content-type and no-cache headers for the eventual response
pub fn stage_content_headers(ctx: &mut RequestContext, controller: &ControllerConfig) {
    if let Some(content_type) = controller.content_type.as_deref() {
        if let Ok(value) = HeaderValue::from_str(content_type) {
            ctx.stage_header(header::CONTENT_TYPE, value);
        }
    }

    if controller.nocache {
        ctx.stage_header(header::PRAGMA, HeaderValue::from_static("no-cache"));
        ctx.stage_header(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache,no-store,max-age=0"),
        );
        ctx.stage_header(header::EXPIRES, HeaderValue::from_static("0"));
    }
}

// ── Generic preprocessing and cached messages ───────────────────────────────

pub trait Preprocessor: Send + Sync {
    fn preprocess(&self, ctx: &mut RequestContext) -> Step<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoPreprocess;

impl Preprocessor for NoPreprocess {
    fn preprocess(&self, _ctx: &mut RequestContext) -> Step<()> {
        Step::Continue(())
    }
}

/// Restores messages carried over from an earlier request
pub trait MessageCache: Send + Sync {
    fn restore(&self, ctx: &mut RequestContext);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoMessageCache;

impl MessageCache for NoMessageCache {
    fn restore(&self, _ctx: &mut RequestContext) {}
}

// ── Authorization ───────────────────────────────────────────────────────────

/// Answers whether the current user holds a role
pub trait RoleChecker: Send + Sync {
    fn has_role(&self, ctx: &RequestContext, role: &str) -> bool;
}

/// Grants no role; only public mappings are reachable
#[derive(Debug, Default, Clone, Copy)]
pub struct DenyAllRoles;

impl RoleChecker for DenyAllRoles {
    fn has_role(&self, _ctx: &RequestContext, _role: &str) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, Uri};

    fn ctx(uri: &'static str) -> RequestContext {
        RequestContext::new(Method::GET, Uri::from_static(uri))
    }

    #[test]
    fn test_path_strips_prefix_and_suffix() {
        let controller = ControllerConfig {
            module_prefix: "/app".into(),
            path_suffix: Some(".do".into()),
            ..ControllerConfig::default()
        };

        match ModulePathResolver.resolve_path(&ctx("/app/profile/save.do"), &controller) {
            Step::Continue(path) => assert_eq!(path, "/profile/save"),
            Step::Stop(_) => panic!("path should resolve"),
        }
    }

    #[test]
    fn test_path_outside_module_stops_with_bad_request() {
        let controller = ControllerConfig {
            module_prefix: "/app".into(),
            ..ControllerConfig::default()
        };

        match ModulePathResolver.resolve_path(&ctx("/other/profile"), &controller) {
            Step::Stop(response) => assert_eq!(response.status(), StatusCode::BAD_REQUEST),
            Step::Continue(path) => panic!("unexpected path {}", path),
        }
    }

    #[test]
    fn test_missing_suffix_is_unresolved() {
        let controller = ControllerConfig {
            path_suffix: Some(".do".into()),
            ..ControllerConfig::default()
        };
        assert!(ModulePathResolver
            .resolve_path(&ctx("/profile/save"), &controller)
            .is_stop());
    }

    #[test]
    fn test_locale_from_accept_language() {
        let controller = ControllerConfig::default();
        let mut ctx = ctx("/home").with_header(header::ACCEPT_LANGUAGE, "fr-CH;q=0.9, en;q=0.8");

        AcceptLanguage.resolve_locale(&mut ctx, &controller);
        assert_eq!(ctx.locale(), Some("fr-CH"));
    }

    #[test]
    fn test_locale_disabled() {
        let controller = ControllerConfig {
            locale: false,
            ..ControllerConfig::default()
        };
        let mut ctx = ctx("/home").with_header(header::ACCEPT_LANGUAGE, "de");

        AcceptLanguage.resolve_locale(&mut ctx, &controller);
        assert_eq!(ctx.locale(), None);
    }

    #[test]
    fn test_nocache_headers_staged() {
        let controller = ControllerConfig {
            nocache: true,
            content_type: Some("text/html;charset=UTF-8".into()),
            ..ControllerConfig::default()
        };
        let mut ctx = ctx("/home");

        stage_content_headers(&mut ctx, &controller);

        let staged = ctx.staged_headers();
        assert_eq!(staged[header::PRAGMA], "no-cache");
        assert_eq!(staged[header::EXPIRES], "0");
        assert_eq!(staged[header::CONTENT_TYPE], "text/html;charset=UTF-8");
    }
}
