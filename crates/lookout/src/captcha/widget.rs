//! Legacy reCAPTCHA widget swap.
//!
//! Forms built with the old reCAPTCHA extension declare one of several
//! legacy field types. At load time those fields are replaced by a v3
//! widget whose keys come from the field's attribute bag.

use argus_common::ArgusError;
use argus_common::constants::LEGACY_RECAPTCHA_TYPES;
use serde::Deserialize;
use serde_json::{Map, Value};

/// A form field exactly as declared in configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FieldDefinition {
    #[serde(rename = "type")]
    pub field_type: String,

    #[serde(default)]
    pub name: Option<String>,

    /// Loosely-typed attribute bag; must be a key/value map when present
    #[serde(default)]
    pub attributes: Value,
}

/// A form as declared in configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FormDefinition {
    pub id: String,

    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

/// reCAPTCHA v3 widget, replacing a legacy field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecaptchaWidget {
    /// Public site key (legacy `placeholder` attribute)
    pub site_key: String,

    /// Verification secret (legacy `text` attribute, or the process-wide secret)
    pub secret: String,

    pub submit_label: String,

    /// Field type that triggered the swap
    pub legacy_type: String,
}

/// A field after load-time resolution
#[derive(Debug, Clone)]
pub enum FormWidget {
    Recaptcha(RecaptchaWidget),
    Standard(FieldDefinition),
}

/// A form with its widgets resolved
#[derive(Debug, Clone)]
pub struct LoadedForm {
    pub id: String,
    pub widgets: Vec<FormWidget>,
}

impl LoadedForm {
    pub fn load(
        definition: &FormDefinition,
        fallback_secret: &str,
        default_label: &str,
    ) -> Result<Self, ArgusError> {
        let widgets = definition
            .fields
            .iter()
            .map(|field| load_form_field(field, fallback_secret, default_label))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ArgusError::Config(format!("form '{}': {}", definition.id, e)))?;

        Ok(Self {
            id: definition.id.clone(),
            widgets,
        })
    }

    /// The form's spam-protection widget, if it has one
    pub fn recaptcha(&self) -> Option<&RecaptchaWidget> {
        self.widgets.iter().find_map(|widget| match widget {
            FormWidget::Recaptcha(recaptcha) => Some(recaptcha),
            FormWidget::Standard(_) => None,
        })
    }
}

pub fn is_legacy_recaptcha(field_type: &str) -> bool {
    LEGACY_RECAPTCHA_TYPES.contains(&field_type)
}

/// Resolve one declared field, swapping legacy reCAPTCHA types for the v3 widget
pub fn load_form_field(
    field: &FieldDefinition,
    fallback_secret: &str,
    default_label: &str,
) -> Result<FormWidget, ArgusError> {
    if !is_legacy_recaptcha(&field.field_type) {
        return Ok(FormWidget::Standard(field.clone()));
    }

    let attributes = attribute_map(&field.attributes, &field.field_type)?;

    let site_key = string_attribute(&attributes, "placeholder")?.unwrap_or_default();
    let secret = string_attribute(&attributes, "text")?
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| fallback_secret.trim().to_string());
    let submit_label = match string_attribute(&attributes, "svalue")? {
        Some(label) if !label.is_empty() => label,
        _ => string_attribute(&attributes, "label")?
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| default_label.to_string()),
    };

    tracing::info!(
        field_type = %field.field_type,
        site_key = %site_key,
        "Legacy reCAPTCHA field swapped for v3 widget"
    );

    if secret.is_empty() {
        tracing::warn!(
            field_type = %field.field_type,
            "reCAPTCHA widget has no secret; every submission will fail verification"
        );
    }

    Ok(FormWidget::Recaptcha(RecaptchaWidget {
        site_key,
        secret,
        submit_label,
        legacy_type: field.field_type.clone(),
    }))
}

/// An absent bag is empty; anything other than a map is rejected
fn attribute_map(bag: &Value, field_type: &str) -> Result<Map<String, Value>, ArgusError> {
    match bag {
        Value::Null => Ok(Map::new()),
        Value::Object(map) => Ok(map.clone()),
        other => Err(ArgusError::InvalidInput(format!(
            "attributes of '{}' field must be a key/value map, got {}",
            field_type,
            json_kind(other)
        ))),
    }
}

fn string_attribute(map: &Map<String, Value>, key: &str) -> Result<Option<String>, ArgusError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(other) => Err(ArgusError::InvalidInput(format!(
            "attribute '{}' must be a string, got {}",
            key,
            json_kind(other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a map",
    }
}
