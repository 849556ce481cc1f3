//! Shared constants for Argus components.

/// Default Lookout HTTP listen address
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8890";

/// Default location of the category catalog
pub const DEFAULT_CATALOG_PATH: &str = "config/categories.json";

/// Google reCAPTCHA verification endpoint
pub const RECAPTCHA_VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

/// Minimum reCAPTCHA v3 score for a submission to pass (exclusive lower bound for rejection)
pub const SCORE_THRESHOLD: f64 = 0.7;

/// Verification request timeout (15 seconds)
pub const VERIFY_TIMEOUT_SECS: u64 = 15;

/// Error code reported when the verification API gives none
pub const UNKNOWN_ERROR_CODE: &str = "unknown";

/// Submit button label when a widget defines none
pub const DEFAULT_SUBMIT_LABEL: &str = "Send form";

/// Separator between aliases in the category filter segment
pub const DEFAULT_CATEGORY_SEPARATOR: &str = "+";

/// URL parameter name introducing the category filter segment
pub const DEFAULT_FILTER_PARAM: &str = "category";

/// Label of the "reset categories" navigation item
pub const DEFAULT_RESET_LABEL: &str = "All categories";

/// Title of the "reset categories" navigation item
pub const DEFAULT_RESET_TITLE: &str = "Show all categories";

/// Form field types of the legacy reCAPTCHA extension
pub const LEGACY_RECAPTCHA_TYPES: &[&str] = &[
    "google_recaptcha",
    "googlerecaptcha",
    "recaptcha",
    "FormGoogleRecaptcha",
];

/// Submitted form field names
pub mod form_fields {
    /// Invisible field that only bots fill in
    pub const HONEYPOT: &str = "website_url";

    /// Token produced by the reCAPTCHA v3 client script
    pub const RECAPTCHA_TOKEN: &str = "g-recaptcha-response";
}

/// HTTP header names
pub mod headers {
    /// Client address chain set by reverse proxies
    pub const X_FORWARDED_FOR: &str = "X-Forwarded-For";

    /// Single client address set by Nginx
    pub const X_REAL_IP: &str = "X-Real-Ip";
}
