//! Turning navigation decisions into responses

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use shared::Forward;
use tracing::debug;

use crate::context::RequestContext;
use crate::form::FormState;

/// Produces the response for a view path; template rendering lives behind this
pub trait ViewRenderer: Send + Sync {
    fn render(&self, path: &str, ctx: &RequestContext, form: Option<&FormState>) -> Response;
}

/// Executes forwards and includes
pub trait ForwardDispatcher: Send + Sync {
    fn dispatch(&self, forward: &Forward, ctx: &RequestContext, form: Option<&FormState>)
        -> Response;

    fn include(&self, path: &str, ctx: &RequestContext, form: Option<&FormState>) -> Response;
}

/// Redirects become `302 Found`; everything else goes to the view renderer
pub struct ModuleDispatcher<R> {
    module_prefix: String,
    renderer: R,
}

impl<R: ViewRenderer> ModuleDispatcher<R> {
    pub fn new(module_prefix: impl Into<String>, renderer: R) -> Self {
        Self {
            module_prefix: module_prefix.into(),
            renderer,
        }
    }

    /// Qualify a module-relative path with the module prefix
    pub fn module_path(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.module_prefix, path)
        } else {
            format!("{}/{}", self.module_prefix, path)
        }
    }
}

impl<R: ViewRenderer> ForwardDispatcher for ModuleDispatcher<R> {
    fn dispatch(
        &self,
        forward: &Forward,
        ctx: &RequestContext,
        form: Option<&FormState>,
    ) -> Response {
        let path = self.module_path(&forward.path);
        if forward.redirect {
            debug!(location = %path, "Redirecting");
            return (StatusCode::FOUND, [(header::LOCATION, path)]).into_response();
        }

        debug!(view = %path, "Forwarding");
        self.renderer.render(&path, ctx, form)
    }

    fn include(&self, path: &str, ctx: &RequestContext, form: Option<&FormState>) -> Response {
        let path = self.module_path(path);
        debug!(view = %path, "Including");
        self.renderer.render(&path, ctx, form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, Uri};

    struct PathEcho;

    impl ViewRenderer for PathEcho {
        fn render(&self, path: &str, _ctx: &RequestContext, _form: Option<&FormState>) -> Response {
            (StatusCode::OK, path.to_string()).into_response()
        }
    }

    #[test]
    fn test_redirect_uses_location_with_prefix() {
        let dispatcher = ModuleDispatcher::new("/app", PathEcho);
        let ctx = RequestContext::new(Method::GET, Uri::from_static("/app/home"));

        let response = dispatcher.dispatch(&Forward::redirect_to("/home"), &ctx, None);
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/app/home");
    }

    #[test]
    fn test_module_path_handles_relative() {
        let dispatcher = ModuleDispatcher::new("", PathEcho);
        assert_eq!(dispatcher.module_path("edit.view"), "/edit.view");
        assert_eq!(dispatcher.module_path("/edit.view"), "/edit.view");
    }

    #[tokio::test]
    async fn test_forward_renders_view() {
        let dispatcher = ModuleDispatcher::new("", PathEcho);
        let ctx = RequestContext::new(Method::GET, Uri::from_static("/x"));

        let response = dispatcher.dispatch(&Forward::to_path("/profile/edit.view"), &ctx, None);
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body.as_ref(), b"/profile/edit.view");
    }
}
