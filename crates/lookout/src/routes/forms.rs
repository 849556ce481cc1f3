//! Form description and submission endpoints.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, Path, State},
    http::{Extensions, HeaderMap, StatusCode},
    Form, Json,
};
use serde::Serialize;

use argus_common::constants::{form_fields, headers};
use argus_common::{ArgusError, SubmissionContext};
use super::ApiError;
use crate::captcha::FormWidget;
use crate::state::AppState;

#[derive(Serialize)]
pub struct FormResponse {
    form_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    recaptcha: Option<RecaptchaView>,
    fields: Vec<FieldView>,
}

#[derive(Serialize)]
pub struct RecaptchaView {
    site_key: String,
    submit_label: String,
    /// Legacy field type this widget replaced
    replaces: String,
    /// Name of the hidden input carrying the token
    token_field: &'static str,
    /// Name of the invisible honeypot input
    honeypot_field: &'static str,
}

#[derive(Serialize)]
pub struct FieldView {
    #[serde(rename = "type")]
    field_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

/// Describe a form's widgets so the page can render them
pub async fn describe_form(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
) -> Result<Json<FormResponse>, ApiError> {
    let form = state
        .forms
        .get(&form_id)
        .ok_or_else(|| ArgusError::NotFound(format!("form '{}'", form_id)))?;

    let recaptcha = form.recaptcha().map(|widget| RecaptchaView {
        site_key: widget.site_key.clone(),
        submit_label: widget.submit_label.clone(),
        replaces: widget.legacy_type.clone(),
        token_field: form_fields::RECAPTCHA_TOKEN,
        honeypot_field: form_fields::HONEYPOT,
    });

    let fields = form
        .widgets
        .iter()
        .map(|widget| match widget {
            FormWidget::Recaptcha(_) => FieldView {
                field_type: "recaptcha_v3".to_string(),
                name: None,
            },
            FormWidget::Standard(field) => FieldView {
                field_type: field.field_type.clone(),
                name: field.name.clone(),
            },
        })
        .collect();

    Ok(Json(FormResponse {
        form_id,
        recaptcha,
        fields,
    }))
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

/// Validate a URL-encoded form submission
///
/// Returns:
/// - 200: Submission accepted
/// - 404: Unknown form
/// - 422: Rejected by the spam gate (fixed, non-diagnostic message)
pub async fn submit_form(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
    request_headers: HeaderMap,
    extensions: Extensions,
    Form(fields): Form<HashMap<String, String>>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let form = state
        .forms
        .get(&form_id)
        .ok_or_else(|| ArgusError::NotFound(format!("form '{}'", form_id)))?;

    let Some(widget) = form.recaptcha() else {
        tracing::debug!(form_id = %form_id, "Form has no spam protection, accepting");
        return Ok((
            StatusCode::OK,
            Json(SubmitResponse {
                accepted: true,
                message: None,
            }),
        ));
    };

    let field = |name: &str| fields.get(name).cloned().unwrap_or_default();
    let ctx = SubmissionContext::new(
        field(form_fields::HONEYPOT),
        field(form_fields::RECAPTCHA_TOKEN),
        client_ip(&request_headers, &extensions, &state.config.trusted_proxies),
        widget.secret.clone(),
    );

    let verdict = state.spam_gate.evaluate(&ctx).await;
    state.metrics.record_verdict(&verdict);

    tracing::debug!(
        form_id = %form_id,
        ip = %ctx.client_ip,
        kind = ?verdict.rejection_kind(),
        "Submission evaluated"
    );

    let status = if verdict.is_accepted() {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };

    Ok((
        status,
        Json(SubmitResponse {
            accepted: verdict.is_accepted(),
            message: verdict.user_message(),
        }),
    ))
}

/// Client address: the socket peer, unless the peer is a trusted proxy, in
/// which case the first `X-Forwarded-For` hop, then `X-Real-Ip`, win
fn client_ip(
    request_headers: &HeaderMap,
    extensions: &Extensions,
    trusted_proxies: &[IpAddr],
) -> String {
    let Some(peer) = extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
    else {
        return String::new();
    };

    if !trusted_proxies.contains(&peer) {
        return peer.to_string();
    }

    let header = |name: &str| {
        request_headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    header(headers::X_FORWARDED_FOR)
        .or_else(|| header(headers::X_REAL_IP))
        .unwrap_or_else(|| peer.to_string())
}
