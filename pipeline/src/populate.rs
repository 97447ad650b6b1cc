//! Filling a form from request parameters

use axum::http::StatusCode;
use shared::{ControllerConfig, FormBeanConfig};
use tracing::{debug, warn};

use crate::context::RequestContext;
use crate::error::ApiError;
use crate::form::FormState;
use crate::hooks::Step;

/// Query string parameters followed by url-encoded body parameters
pub fn request_parameters(ctx: &RequestContext) -> Result<Vec<(String, String)>, String> {
    let mut params: Vec<(String, String)> = match ctx.uri().query() {
        Some(query) => serde_urlencoded::from_str(query).map_err(|e| e.to_string())?,
        None => Vec::new(),
    };

    if ctx.is_form_urlencoded() && !ctx.body().is_empty() {
        let body: Vec<(String, String)> =
            serde_urlencoded::from_bytes(ctx.body()).map_err(|e| e.to_string())?;
        params.extend(body);
    }

    if let Some(upload) = ctx.upload_handler() {
        params.extend(upload.parameters());
    }

    Ok(params)
}

/// Reset the form, copy accepted parameters into it and detect a cancel.
///
/// The cancel parameter itself is never stored on the form.
pub fn populate(
    ctx: &mut RequestContext,
    form: &mut FormState,
    bean: &FormBeanConfig,
    controller: &ControllerConfig,
) -> Step<()> {
    form.reset();

    let params = match request_parameters(ctx) {
        Ok(params) => params,
        Err(reason) => {
            warn!(%reason, "Malformed request parameters");
            return Step::stop(ApiError::new(
                StatusCode::BAD_REQUEST,
                "MalformedParameters",
                format!("Request parameters could not be decoded: {}", reason),
            ));
        }
    };

    for (name, value) in params {
        if name == controller.cancel_param {
            ctx.set_cancel();
            continue;
        }
        if bean.accepts(&name) {
            form.append(name, value);
        }
    }

    if let Some(upload) = ctx.upload_handler() {
        form.set_upload_handler(upload.clone());
    }

    debug!(form = form.name(), cancelled = ctx.is_cancelled(), "Form populated");
    Step::Continue(())
}
