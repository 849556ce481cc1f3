//! Configuration management for Lookout.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::net::IpAddr;
use std::path::Path;

use argus_common::ActiveSelection;
use argus_common::constants::{
    DEFAULT_CATALOG_PATH, DEFAULT_CATEGORY_SEPARATOR, DEFAULT_FILTER_PARAM, DEFAULT_LISTEN_ADDR,
    DEFAULT_RESET_LABEL, DEFAULT_RESET_TITLE, DEFAULT_SUBMIT_LABEL, RECAPTCHA_VERIFY_URL,
    VERIFY_TIMEOUT_SECS,
};

use crate::captcha::FormDefinition;
use crate::categories::TargetPage;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Category catalog (JSON)
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// Reverse proxies whose `X-Forwarded-For`/`X-Real-Ip` headers are honoured
    #[serde(default)]
    pub trusted_proxies: Vec<IpAddr>,

    /// reCAPTCHA configuration
    #[serde(default)]
    pub recaptcha: RecaptchaConfig,

    /// Forms accepting submissions
    #[serde(default)]
    pub forms: Vec<FormDefinition>,

    /// Category filter instances
    #[serde(default)]
    pub filters: Vec<FilterConfig>,
}

/// reCAPTCHA-specific configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RecaptchaConfig {
    /// siteverify endpoint
    #[serde(default = "default_verify_url")]
    pub verify_url: String,

    /// Verification request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Secret used by widgets that carry none of their own
    #[serde(default)]
    pub secret: String,

    /// Submit label used by widgets that carry none of their own
    #[serde(default = "default_submit_label")]
    pub submit_label: String,
}

impl Default for RecaptchaConfig {
    fn default() -> Self {
        Self {
            verify_url: default_verify_url(),
            timeout_secs: default_timeout(),
            secret: String::new(),
            submit_label: default_submit_label(),
        }
    }
}

/// One category filter instance
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    /// Name used in `/filters/{name}`
    pub name: String,

    /// Category whose children form the first level (0 = top level)
    #[serde(default)]
    pub root_id: u32,

    /// Categories to offer; empty means every published category below the root
    #[serde(default)]
    pub category_ids: Vec<u32>,

    /// URL parameter introducing the alias segment
    #[serde(default = "default_param_name")]
    pub param_name: String,

    /// Separator between aliases in the segment
    #[serde(default = "default_separator")]
    pub separator: String,

    /// Prepend a "reset categories" item at the first level
    #[serde(default)]
    pub reset_categories: bool,

    #[serde(default = "default_reset_label")]
    pub reset_label: String,

    #[serde(default = "default_reset_title")]
    pub reset_title: String,

    /// Deepest level to render (0 = unlimited)
    #[serde(default)]
    pub max_depth: u32,

    /// Show the news count next to each category
    #[serde(default)]
    pub show_quantity: bool,

    /// Emit the unfiltered page as canonical URL for filtered views
    #[serde(default)]
    pub enable_canonical_urls: bool,

    /// Page listing the filtered news
    #[serde(default)]
    pub target_page: TargetPage,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            root_id: 0,
            category_ids: Vec::new(),
            param_name: default_param_name(),
            separator: default_separator(),
            reset_categories: false,
            reset_label: default_reset_label(),
            reset_title: default_reset_title(),
            max_depth: 0,
            show_quantity: false,
            enable_canonical_urls: false,
            target_page: TargetPage::default(),
        }
    }
}

// Default value functions
fn default_listen_addr() -> String { DEFAULT_LISTEN_ADDR.to_string() }
fn default_catalog_path() -> String { DEFAULT_CATALOG_PATH.to_string() }
fn default_verify_url() -> String { RECAPTCHA_VERIFY_URL.to_string() }
fn default_timeout() -> u64 { VERIFY_TIMEOUT_SECS }
fn default_submit_label() -> String { DEFAULT_SUBMIT_LABEL.to_string() }
fn default_param_name() -> String { DEFAULT_FILTER_PARAM.to_string() }
fn default_separator() -> String { DEFAULT_CATEGORY_SEPARATOR.to_string() }
fn default_reset_label() -> String { DEFAULT_RESET_LABEL.to_string() }
fn default_reset_title() -> String { DEFAULT_RESET_TITLE.to_string() }

impl AppConfig {
    /// Load configuration from file, with CLI overrides
    pub fn load(config_path: &str, args: &super::Args) -> Result<Self> {
        let mut config = if Path::new(config_path).exists() {
            let settings = config::Config::builder()
                .add_source(config::File::with_name(config_path))
                .build()
                .context("Failed to load config file")?;

            settings
                .try_deserialize()
                .context("Failed to parse config")?
        } else {
            // Use defaults if config file doesn't exist
            tracing::warn!("Config file not found, using defaults");
            Self::default()
        };

        // Apply CLI overrides
        if let Some(ref listen) = args.listen {
            config.listen_addr = listen.clone();
        }
        if let Some(ref catalog) = args.catalog {
            config.catalog_path = catalog.clone();
        }
        if let Some(ref secret) = args.recaptcha_secret {
            config.recaptcha.secret = secret.clone();
        }

        config.validate()?;

        Ok(config)
    }

    /// Reject settings that would only fail later, per request
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for filter in &self.filters {
            if filter.name.is_empty() {
                anyhow::bail!("Filter without a name");
            }
            if !seen.insert(filter.name.as_str()) {
                anyhow::bail!("Duplicate filter name '{}'", filter.name);
            }
            if filter.param_name.is_empty() || filter.param_name.contains('/') {
                anyhow::bail!("Filter '{}' has an invalid param_name", filter.name);
            }
            if !ActiveSelection::is_valid_separator(&filter.separator) {
                anyhow::bail!(
                    "Filter '{}' has an invalid separator '{}' (no letters, digits, '%' or '/')",
                    filter.name,
                    filter.separator
                );
            }
            if filter.enable_canonical_urls && filter.target_page.base_url.is_empty() {
                anyhow::bail!(
                    "Filter '{}' enables canonical URLs but has no target_page.base_url",
                    filter.name
                );
            }
        }

        let mut seen = std::collections::HashSet::new();
        for form in &self.forms {
            if !seen.insert(form.id.as_str()) {
                anyhow::bail!("Duplicate form id '{}'", form.id);
            }
        }

        if self.recaptcha.timeout_secs == 0 {
            anyhow::bail!("recaptcha.timeout_secs must be positive");
        }

        Ok(())
    }

    pub fn filter(&self, name: &str) -> Option<&FilterConfig> {
        self.filters.iter().find(|filter| filter.name == name)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            catalog_path: default_catalog_path(),
            trusted_proxies: Vec::new(),
            recaptcha: RecaptchaConfig::default(),
            forms: Vec::new(),
            filters: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> Result<AppConfig> {
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.recaptcha.timeout_secs, 15);
        assert_eq!(config.recaptcha.verify_url, RECAPTCHA_VERIFY_URL);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_forms_and_filters() {
        let config = parse(
            r#"
            listen_addr = "0.0.0.0:9000"

            [recaptcha]
            secret = "global"

            [[forms]]
            id = "contact"

            [[forms.fields]]
            type = "google_recaptcha"
            attributes = { placeholder = "site-key", text = "form-secret" }

            [[filters]]
            name = "news"
            root_id = 1
            reset_categories = true
            max_depth = 2

            [filters.target_page]
            path = "/blog"
            "#,
        )
        .unwrap();

        assert_eq!(config.listen_addr, "0.0.0.0:9000");
        assert_eq!(config.forms[0].fields[0].field_type, "google_recaptcha");
        assert!(config.forms[0].fields[0].attributes.is_object());

        let filter = config.filter("news").unwrap();
        assert_eq!(filter.separator, "+");
        assert_eq!(filter.param_name, "category");
        assert_eq!(filter.max_depth, 2);
        assert_eq!(filter.target_page.path, "/blog");
    }

    #[test]
    fn test_rejects_duplicate_filters() {
        let err = parse(
            r#"
            [[filters]]
            name = "news"
            [[filters]]
            name = "news"
            "#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_separator_validation() {
        let with_separator = |separator: &str| {
            parse(&format!(
                "[[filters]]\nname = \"news\"\nseparator = \"{}\"\n",
                separator
            ))
        };

        for separator in ["/", "%", "a", "1"] {
            assert!(with_separator(separator).is_err(), "{separator}");
        }
        for separator in ["+", "-", ","] {
            assert!(with_separator(separator).is_ok(), "{separator}");
        }
    }

    #[test]
    fn test_canonical_urls_need_base_url() {
        let err = parse(
            r#"
            [[filters]]
            name = "news"
            enable_canonical_urls = true
            "#,
        );
        assert!(err.is_err());

        let config = parse(
            r#"
            [[filters]]
            name = "news"
            enable_canonical_urls = true

            [filters.target_page]
            base_url = "https://example.org"
            "#,
        )
        .unwrap();
        assert!(config.filter("news").unwrap().enable_canonical_urls);
    }

    #[test]
    fn test_trusted_proxies() {
        let config = parse(r#"trusted_proxies = ["127.0.0.1", "::1"]"#).unwrap();
        assert_eq!(config.trusted_proxies.len(), 2);
        assert!(config.trusted_proxies.contains(&"::1".parse().unwrap()));

        assert!(parse(r#"trusted_proxies = ["not-an-ip"]"#).is_err());
    }
}
