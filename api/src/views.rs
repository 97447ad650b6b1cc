use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pipeline::{FormState, RequestContext, ViewRenderer};
use serde_json::json;

/// Renders every view as a JSON document describing what a template would see
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonViewRenderer;

impl ViewRenderer for JsonViewRenderer {
    fn render(&self, path: &str, ctx: &RequestContext, form: Option<&FormState>) -> Response {
        let body = json!({
            "view": path,
            "form": form.map(FormState::to_json),
            "errors": ctx.errors(),
            "locale": ctx.locale(),
            "exception": ctx.exception(),
        });
        (StatusCode::OK, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, Uri};
    use shared::ErrorMessageSet;

    #[tokio::test]
    async fn test_render_includes_errors_and_form() {
        let mut ctx = RequestContext::new(Method::POST, Uri::from_static("/profile/save"));
        let mut errors = ErrorMessageSet::new();
        errors.add("email", "email is required");
        ctx.attach_errors(errors);
        let form = FormState::new("profileForm").with_field("name", "Ada");

        let response = JsonViewRenderer.render("/editForm", &ctx, Some(&form));
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["view"], "/editForm");
        assert_eq!(value["form"]["name"], "Ada");
        assert_eq!(value["errors"][0]["field"], "email");
        assert_eq!(value["errors"][0]["message"], "email is required");
        assert!(value["exception"].is_null());
    }
}
