//! Request-scoped state threaded through every pipeline stage

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, Request, Uri},
    response::Response,
};
use shared::ErrorMessageSet;

use crate::error::DispatchResult;
use crate::form::UploadHandler;

/// Marker recorded when a submission was a "cancel" action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelSignal;

/// Response extension naming the mapping that served a request.
///
/// Bounded by the module configuration, unlike the raw request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedMapping(pub String);

/// Everything one request carries through the pipeline.
///
/// Owned by a single request; nothing in here is shared across requests.
pub struct RequestContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    mapping: Option<String>,
    locale: Option<String>,
    cancel: Option<CancelSignal>,
    errors: Option<ErrorMessageSet>,
    exception: Option<String>,
    upload: Option<Arc<dyn UploadHandler>>,
    response_headers: HeaderMap,
}

impl RequestContext {
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            mapping: None,
            locale: None,
            cancel: None,
            errors: None,
            exception: None,
            upload: None,
            response_headers: HeaderMap::new(),
        }
    }

    /// Buffer the request body and capture the request head
    pub async fn from_request(request: Request<Body>, limit: usize) -> DispatchResult<Self> {
        let (parts, body) = request.into_parts();
        let body = axum::body::to_bytes(body, limit).await?;

        let mut ctx = Self::new(parts.method, parts.uri);
        ctx.headers = parts.headers;
        ctx.body = body;
        Ok(ctx)
    }

    pub fn with_header(mut self, name: HeaderName, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.append(name, value);
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    fn has_media_type(&self, media_type: &str) -> bool {
        self.content_type()
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().eq_ignore_ascii_case(media_type))
            .unwrap_or(false)
    }

    pub fn is_multipart(&self) -> bool {
        self.has_media_type("multipart/form-data")
    }

    pub fn is_form_urlencoded(&self) -> bool {
        self.has_media_type("application/x-www-form-urlencoded")
    }

    /// Path of the mapping selected for this request
    pub fn mapping_path(&self) -> Option<&str> {
        self.mapping.as_deref()
    }

    pub fn set_mapping_path(&mut self, path: impl Into<String>) {
        self.mapping = Some(path.into());
    }

    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    pub fn set_locale(&mut self, locale: impl Into<String>) {
        self.locale = Some(locale.into());
    }

    // ── Cancel signal ──────────────────────────────────────────────────────

    pub fn set_cancel(&mut self) {
        self.cancel = Some(CancelSignal);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_some()
    }

    pub fn clear_cancel(&mut self) {
        self.cancel = None;
    }

    // ── Attached validation errors ─────────────────────────────────────────

    /// Attach a validation result, replacing whatever was attached before
    pub fn attach_errors(&mut self, errors: ErrorMessageSet) {
        self.errors = Some(errors);
    }

    pub fn errors(&self) -> Option<&ErrorMessageSet> {
        self.errors.as_ref()
    }

    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().map_or(false, |e| !e.is_empty())
    }

    // ── Exception routed to a configured forward ───────────────────────────

    pub fn set_exception(&mut self, description: impl Into<String>) {
        self.exception = Some(description.into());
    }

    pub fn exception(&self) -> Option<&str> {
        self.exception.as_deref()
    }

    // ── Multipart upload ───────────────────────────────────────────────────

    pub fn set_upload_handler(&mut self, handler: Arc<dyn UploadHandler>) {
        self.upload = Some(handler);
    }

    pub fn upload_handler(&self) -> Option<&Arc<dyn UploadHandler>> {
        self.upload.as_ref()
    }

    // ── Response headers staged by early stages ────────────────────────────

    pub fn stage_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.response_headers.insert(name, value);
    }

    pub fn staged_headers(&self) -> &HeaderMap {
        &self.response_headers
    }

    /// Copy staged headers onto the final response unless it already sets them
    pub fn apply_staged_headers(&self, mut response: Response) -> Response {
        for (name, value) in &self.response_headers {
            if !response.headers().contains_key(name) {
                response.headers_mut().insert(name.clone(), value.clone());
            }
        }
        response
    }

    /// Staged headers plus the [`MatchedMapping`] extension, when a mapping was selected
    pub fn finish(&self, response: Response) -> Response {
        let mut response = self.apply_staged_headers(response);
        if let Some(path) = self.mapping_path() {
            response
                .extensions_mut()
                .insert(MatchedMapping(path.to_string()));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[test]
    fn test_media_type_detection() {
        let ctx = RequestContext::new(Method::POST, Uri::from_static("/upload")).with_header(
            header::CONTENT_TYPE,
            "multipart/form-data; boundary=X-BOUNDARY",
        );
        assert!(ctx.is_multipart());
        assert!(!ctx.is_form_urlencoded());

        let ctx = RequestContext::new(Method::POST, Uri::from_static("/save"))
            .with_header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        assert!(ctx.is_form_urlencoded());
    }

    #[test]
    fn test_attach_replaces_previous_errors() {
        let mut ctx = RequestContext::new(Method::POST, Uri::from_static("/save"));
        let mut first = ErrorMessageSet::new();
        first.add("email", "is required");
        ctx.attach_errors(first);

        let mut second = ErrorMessageSet::new();
        second.add("name", "is too long");
        ctx.attach_errors(second.clone());

        assert_eq!(ctx.errors(), Some(&second));
        assert!(ctx.has_errors());
    }

    #[test]
    fn test_staged_headers_do_not_override() {
        let mut ctx = RequestContext::new(Method::GET, Uri::from_static("/"));
        ctx.stage_header(header::CONTENT_TYPE, HeaderValue::from_static("text/html"));
        ctx.stage_header(header::PRAGMA, HeaderValue::from_static("no-cache"));

        let response = (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            "{}",
        )
            .into_response();
        let response = ctx.apply_staged_headers(response);

        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(response.headers()[header::PRAGMA], "no-cache");
    }

    #[test]
    fn test_finish_tags_response_with_mapping() {
        let mut ctx = RequestContext::new(Method::GET, Uri::from_static("/profile/edit?id=7"));
        let untagged = ctx.finish(StatusCode::OK.into_response());
        assert!(untagged.extensions().get::<MatchedMapping>().is_none());

        ctx.set_mapping_path("/profile/edit");
        let tagged = ctx.finish(StatusCode::OK.into_response());
        assert_eq!(
            tagged.extensions().get::<MatchedMapping>(),
            Some(&MatchedMapping("/profile/edit".into()))
        );
    }

    #[tokio::test]
    async fn test_from_request_buffers_body() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/profile/save?x=1")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("email=a%40b.c"))
            .unwrap();

        let ctx = RequestContext::from_request(request, 1024).await.unwrap();
        assert_eq!(ctx.uri().path(), "/profile/save");
        assert_eq!(ctx.body().as_ref(), b"email=a%40b.c");
    }

    #[tokio::test]
    async fn test_from_request_rejects_oversized_body() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/profile/save")
            .body(Body::from(vec![b'a'; 64]))
            .unwrap();

        let result = RequestContext::from_request(request, 16).await;
        assert!(matches!(result, Err(crate::error::DispatchError::Transport(_))));
    }
}
