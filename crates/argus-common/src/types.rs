//! Core types shared across Argus components.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{SCORE_THRESHOLD, UNKNOWN_ERROR_CODE};

/// Audit log severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit log category (which system journal the entry belongs to)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogCategory {
    /// Routine lifecycle entries
    General,
    /// Access decisions (accept, bot rejection)
    Access,
    /// Failures that need an operator
    Error,
}

impl LogCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Access => "access",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the spam gate needs to judge one form submission.
///
/// Built once at the request boundary from the raw form body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionContext {
    /// Value of the invisible honeypot field (expected empty)
    pub honeypot: String,

    /// reCAPTCHA v3 token posted by the client script
    pub token: String,

    /// Client IP address, forwarded to the verification API
    pub client_ip: String,

    /// Secret credential for the verification API
    pub secret: String,
}

impl SubmissionContext {
    pub fn new(
        honeypot: impl Into<String>,
        token: impl Into<String>,
        client_ip: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            honeypot: honeypot.into(),
            token: token.into(),
            client_ip: client_ip.into(),
            secret: secret.into(),
        }
    }
}

/// Parsed `siteverify` response.
///
/// Fields beyond `success`, `score` and `error-codes` are informational.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    #[serde(default)]
    pub success: bool,

    /// Score in [0, 1]; absent for v2 tokens
    #[serde(default)]
    pub score: Option<f64>,

    #[serde(default, rename = "error-codes")]
    pub error_codes: Vec<String>,

    /// Action name the token was issued for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    /// Hostname of the site where the token was issued
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    /// Issue timestamp (ISO 8601, as sent by Google)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge_ts: Option<String>,
}

impl VerificationResult {
    /// Error codes reported by the API, or `["unknown"]` when it reported none
    pub fn error_codes_or_unknown(&self) -> Vec<String> {
        if self.error_codes.is_empty() {
            vec![UNKNOWN_ERROR_CODE.to_string()]
        } else {
            self.error_codes.clone()
        }
    }

    /// Parsed token issue time, if present and well-formed
    pub fn challenge_time(&self) -> Option<DateTime<Utc>> {
        self.challenge_ts
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Why a submission was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    HoneypotTriggered,
    MissingCredential,
    /// No usable answer from the verification API (network, timeout, parse)
    UpstreamUnavailable,
    /// The verification API answered with `success: false`
    UpstreamRejected,
    ThresholdNotMet,
}

/// Outcome of one spam-gate evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Accepted {
        score: f64,
    },
    RejectedHoneypot {
        /// What the bot wrote into the invisible field
        value: String,
    },
    RejectedMissingToken,
    RejectedApiFailure {
        error_codes: Vec<String>,
        /// False when the API never produced a parseable answer
        upstream_answered: bool,
    },
    RejectedLowScore {
        score: f64,
    },
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    pub fn rejection_kind(&self) -> Option<RejectionKind> {
        match self {
            Self::Accepted { .. } => None,
            Self::RejectedHoneypot { .. } => Some(RejectionKind::HoneypotTriggered),
            Self::RejectedMissingToken => Some(RejectionKind::MissingCredential),
            Self::RejectedApiFailure {
                upstream_answered: true,
                ..
            } => Some(RejectionKind::UpstreamRejected),
            Self::RejectedApiFailure {
                upstream_answered: false,
                ..
            } => Some(RejectionKind::UpstreamUnavailable),
            Self::RejectedLowScore { .. } => Some(RejectionKind::ThresholdNotMet),
        }
    }

    /// Fixed, non-diagnostic message shown to the submitter
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            Self::Accepted { .. } => None,
            Self::RejectedHoneypot { .. } => {
                Some("System validation error. Please refresh the page.")
            }
            Self::RejectedMissingToken => Some("Please complete the reCAPTCHA check."),
            Self::RejectedApiFailure { .. } => {
                Some("reCAPTCHA verification failed. Please try again.")
            }
            Self::RejectedLowScore { .. } => Some(
                "Suspicious activity detected. Please try again or contact us another way.",
            ),
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::Accepted { .. } => Severity::Info,
            Self::RejectedHoneypot { .. } | Self::RejectedLowScore { .. } => Severity::Warning,
            Self::RejectedMissingToken | Self::RejectedApiFailure { .. } => Severity::Error,
        }
    }

    pub fn log_category(&self) -> LogCategory {
        match self {
            Self::Accepted { .. }
            | Self::RejectedHoneypot { .. }
            | Self::RejectedLowScore { .. } => LogCategory::Access,
            Self::RejectedMissingToken | Self::RejectedApiFailure { .. } => LogCategory::Error,
        }
    }

    /// Operator-facing detail for the audit log
    pub fn log_message(&self) -> String {
        match self {
            Self::Accepted { score } => format!(
                "[ACCEPTED] reCAPTCHA check passed. Score: {} (threshold: {}).",
                score, SCORE_THRESHOLD
            ),
            Self::RejectedHoneypot { value } => format!(
                "[HONEYPOT REJECT] Bot detected. The invisible field contained: '{}'. Submission blocked.",
                value
            ),
            Self::RejectedMissingToken => {
                "[ERROR] Missing g-recaptcha-response token. Submission rejected.".to_string()
            }
            Self::RejectedApiFailure { error_codes, .. } => format!(
                "[CRITICAL] reCAPTCHA API verification failed (success=false). Error codes: {}",
                error_codes.join(", ")
            ),
            Self::RejectedLowScore { score } => format!(
                "[REJECT] Score too low. Got: {} (threshold: {}).",
                score, SCORE_THRESHOLD
            ),
        }
    }
}

/// One news category as stored in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryNode {
    /// Unique, non-zero identifier
    pub id: u32,

    /// Parent category; `None` (or 0 in source data) for top-level categories
    #[serde(default, alias = "parent_id")]
    pub pid: Option<u32>,

    /// URL alias, unique within the catalog
    pub alias: String,

    pub title: String,

    #[serde(default = "default_published")]
    pub published: bool,

    /// Sort key among siblings (ascending)
    #[serde(default)]
    pub sorting: i64,

    /// Extra CSS class configured on the category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css_class: Option<String>,

    /// Number of news items in this category
    #[serde(default)]
    pub quantity: u32,
}

fn default_published() -> bool {
    true
}

/// Category aliases currently toggled on, decoded from the URL.
///
/// Behaves as a set (no duplicates) but remembers insertion order so that
/// generated URLs are stable. Aliases are plain strings: an alias that no
/// longer resolves to a category is kept and can still be toggled off.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActiveSelection(Vec<String>);

impl ActiveSelection {
    pub fn new<I, S>(aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut selection = Self::default();
        for alias in aliases {
            let alias = alias.into();
            if !alias.is_empty() && !selection.contains(&alias) {
                selection.0.push(alias);
            }
        }
        selection
    }

    /// Decode a raw (still percent-encoded) URL path segment
    pub fn decode(segment: &str, separator: &str) -> Self {
        let decode_one = |raw: &str| -> String {
            urlencoding::decode(raw)
                .map(|alias| alias.into_owned())
                .unwrap_or_else(|_| raw.to_string())
        };

        if separator.is_empty() {
            return Self::new([decode_one(segment)]);
        }

        Self::new(segment.split(separator).map(decode_one))
    }

    /// Encode as a single URL path segment.
    ///
    /// Separator characters that percent-encoding leaves alone (`-`, `.`,
    /// `_`, `~`) are escaped inside aliases as well. Separators must not
    /// contain alphanumerics, `%` or `/`; see [`ActiveSelection::is_valid_separator`].
    pub fn encode(&self, separator: &str) -> String {
        self.0
            .iter()
            .map(|alias| escape_alias(alias, separator))
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// Whether `separator` survives an encode/decode round trip
    pub fn is_valid_separator(separator: &str) -> bool {
        !separator.is_empty()
            && separator
                .chars()
                .all(|c| !c.is_alphanumeric() && c != '%' && c != '/')
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.0.iter().any(|a| a == alias)
    }

    /// Selection after clicking `alias`: removed if present, appended otherwise
    pub fn toggled(&self, alias: &str) -> Self {
        if self.contains(alias) {
            Self(self.0.iter().filter(|a| *a != alias).cloned().collect())
        } else {
            let mut next = self.0.clone();
            next.push(alias.to_string());
            Self(next)
        }
    }

    /// Set equality, ignoring order
    pub fn same_set(&self, other: &Self) -> bool {
        self.len() == other.len() && self.0.iter().all(|alias| other.contains(alias))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

fn escape_alias(alias: &str, separator: &str) -> String {
    let encoded = urlencoding::encode(alias);
    if separator.is_empty() {
        return encoded.into_owned();
    }

    let mut escaped = String::with_capacity(encoded.len());
    for c in encoded.chars() {
        if separator.contains(c) {
            escaped.push_str(&format!("%{:02X}", c as u32));
        } else {
            escaped.push(c);
        }
    }
    escaped
}

/// One entry of the rendered category navigation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderItem {
    /// Link that applies this item's toggle
    pub url: String,

    /// Visible text
    pub label: String,

    /// Accessible title
    pub title: String,

    pub css_class: String,

    pub is_active: bool,

    /// Nesting depth, starting at 1
    pub level: u32,

    /// News count, when quantity display is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RenderItem>,

    /// Source category (`None` for the reset item)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryNode>,
}

/// Metrics snapshot for monitoring
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Submissions that passed the spam gate
    pub submissions_accepted: u64,

    pub rejected_honeypot: u64,

    pub rejected_missing_token: u64,

    /// Verification API unreachable, timed out, or unparseable
    pub rejected_upstream_unavailable: u64,

    /// Verification API answered `success: false`
    pub rejected_upstream: u64,

    pub rejected_low_score: u64,

    /// Category navigations rendered
    pub filter_renders: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_twice_is_identity() {
        let base = ActiveSelection::new(["a", "b"]);

        for alias in ["a", "c", "stale"] {
            let back = base.toggled(alias).toggled(alias);
            assert!(back.same_set(&base), "toggle of {alias} is not an involution");
        }
    }

    #[test]
    fn test_toggle_preserves_other_aliases() {
        let base = ActiveSelection::new(["a", "stale"]);

        let on = base.toggled("b");
        assert_eq!(on.iter().collect::<Vec<_>>(), vec!["a", "stale", "b"]);

        let off = base.toggled("a");
        assert_eq!(off.iter().collect::<Vec<_>>(), vec!["stale"]);
    }

    #[test]
    fn test_decode_dedups_and_skips_empty() {
        let selection = ActiveSelection::decode("a++b+a", "+");
        assert_eq!(selection.iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_encode_escapes_separator_in_alias() {
        let selection = ActiveSelection::new(["c++", "news"]);
        let segment = selection.encode("+");
        assert_eq!(segment, "c%2B%2B+news");
        assert_eq!(ActiveSelection::decode(&segment, "+"), selection);
    }

    #[test]
    fn test_unreserved_separator_inside_alias() {
        let selection = ActiveSelection::new(["a-child", "b"]);
        let segment = selection.encode("-");
        assert_eq!(segment, "a%2Dchild-b");
        assert_eq!(ActiveSelection::decode(&segment, "-"), selection);

        let selection = ActiveSelection::new(["v1.2", "x_y"]);
        let segment = selection.encode("._");
        assert_eq!(ActiveSelection::decode(&segment, "._"), selection);
    }

    #[test]
    fn test_separator_validity() {
        for separator in ["+", "-", ",", "~", "._"] {
            assert!(ActiveSelection::is_valid_separator(separator), "{separator}");
        }
        for separator in ["", "/", "%", "a", "x+", "9"] {
            assert!(!ActiveSelection::is_valid_separator(separator), "{separator:?}");
        }
    }

    #[test]
    fn test_verification_result_defaults() {
        let parsed: VerificationResult = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(parsed.success);
        assert_eq!(parsed.score, None);
        assert_eq!(parsed.error_codes_or_unknown(), vec!["unknown".to_string()]);

        let parsed: VerificationResult = serde_json::from_str(
            r#"{"success": false, "error-codes": ["invalid-input-secret"], "challenge_ts": "2024-05-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(parsed.error_codes_or_unknown(), vec!["invalid-input-secret".to_string()]);
        assert!(parsed.challenge_time().is_some());
    }

    #[test]
    fn test_verdict_taxonomy() {
        let unavailable = Verdict::RejectedApiFailure {
            error_codes: vec!["unknown".into()],
            upstream_answered: false,
        };
        assert_eq!(unavailable.rejection_kind(), Some(RejectionKind::UpstreamUnavailable));
        assert_eq!(unavailable.severity(), Severity::Error);

        let low = Verdict::RejectedLowScore { score: 0.3 };
        assert_eq!(low.rejection_kind(), Some(RejectionKind::ThresholdNotMet));
        assert_eq!(low.log_category(), LogCategory::Access);

        let ok = Verdict::Accepted { score: 0.9 };
        assert!(ok.is_accepted());
        assert!(ok.user_message().is_none());
    }

    #[test]
    fn test_user_messages_do_not_leak_codes() {
        let verdict = Verdict::RejectedApiFailure {
            error_codes: vec!["invalid-input-secret".into()],
            upstream_answered: true,
        };
        assert!(!verdict.user_message().unwrap().contains("invalid-input-secret"));
        assert!(verdict.log_message().contains("invalid-input-secret"));
    }
}
