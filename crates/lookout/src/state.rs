//! Application state and shared resources.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::audit::{AuditLog, TracingAuditLog};
use crate::captcha::{LoadedForm, RecaptchaVerifier, SiteVerifier, SpamGate};
use crate::categories::{Catalog, InMemoryCatalog};
use crate::config::AppConfig;
use argus_common::{MetricsSnapshot, RejectionKind, Verdict};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,

    /// Category catalog (read-only after start-up)
    pub catalog: Arc<dyn Catalog>,

    /// Forms with their widgets resolved, by id
    pub forms: Arc<HashMap<String, LoadedForm>>,

    /// reCAPTCHA spam gate
    pub spam_gate: Arc<SpamGate>,

    /// Verdict and render counters
    pub metrics: Arc<Metrics>,
}

impl AppState {
    /// Create application state, loading the catalog and wiring the live verifier
    pub fn new(config: AppConfig) -> Result<Self> {
        let catalog = InMemoryCatalog::load(&config.catalog_path)
            .with_context(|| format!("Failed to load catalog from {}", config.catalog_path))?;
        tracing::info!(categories = catalog.len(), "Catalog loaded");

        let verifier = RecaptchaVerifier::new(
            config.recaptcha.verify_url.clone(),
            Duration::from_secs(config.recaptcha.timeout_secs),
        )
        .context("Failed to build reCAPTCHA client")?;

        Self::with_parts(
            config,
            Arc::new(catalog),
            Arc::new(verifier),
            Arc::new(TracingAuditLog),
        )
    }

    /// Assemble state from already-built collaborators
    pub fn with_parts(
        config: AppConfig,
        catalog: Arc<dyn Catalog>,
        verifier: Arc<dyn SiteVerifier>,
        audit: Arc<dyn AuditLog>,
    ) -> Result<Self> {
        let mut forms = HashMap::with_capacity(config.forms.len());
        for definition in &config.forms {
            let form = LoadedForm::load(
                definition,
                &config.recaptcha.secret,
                &config.recaptcha.submit_label,
            )
            .context("Failed to load form definitions")?;
            forms.insert(form.id.clone(), form);
        }

        Ok(Self {
            config: Arc::new(config),
            catalog,
            forms: Arc::new(forms),
            spam_gate: Arc::new(SpamGate::new(verifier, audit)),
            metrics: Arc::new(Metrics::default()),
        })
    }
}

/// Lock-free counters exposed on `/metrics`
#[derive(Debug, Default)]
pub struct Metrics {
    accepted: AtomicU64,
    rejected_honeypot: AtomicU64,
    rejected_missing_token: AtomicU64,
    rejected_upstream_unavailable: AtomicU64,
    rejected_upstream: AtomicU64,
    rejected_low_score: AtomicU64,
    filter_renders: AtomicU64,
}

impl Metrics {
    pub fn record_verdict(&self, verdict: &Verdict) {
        let counter = match verdict.rejection_kind() {
            None => &self.accepted,
            Some(RejectionKind::HoneypotTriggered) => &self.rejected_honeypot,
            Some(RejectionKind::MissingCredential) => &self.rejected_missing_token,
            Some(RejectionKind::UpstreamUnavailable) => &self.rejected_upstream_unavailable,
            Some(RejectionKind::UpstreamRejected) => &self.rejected_upstream,
            Some(RejectionKind::ThresholdNotMet) => &self.rejected_low_score,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_render(&self) {
        self.filter_renders.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            submissions_accepted: self.accepted.load(Ordering::Relaxed),
            rejected_honeypot: self.rejected_honeypot.load(Ordering::Relaxed),
            rejected_missing_token: self.rejected_missing_token.load(Ordering::Relaxed),
            rejected_upstream_unavailable: self
                .rejected_upstream_unavailable
                .load(Ordering::Relaxed),
            rejected_upstream: self.rejected_upstream.load(Ordering::Relaxed),
            rejected_low_score: self.rejected_low_score.load(Ordering::Relaxed),
            filter_renders: self.filter_renders.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_by_verdict() {
        let metrics = Metrics::default();
        metrics.record_verdict(&Verdict::Accepted { score: 0.9 });
        metrics.record_verdict(&Verdict::RejectedMissingToken);
        metrics.record_verdict(&Verdict::RejectedApiFailure {
            error_codes: vec!["unknown".into()],
            upstream_answered: false,
        });
        metrics.record_render();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.submissions_accepted, 1);
        assert_eq!(snapshot.rejected_missing_token, 1);
        assert_eq!(snapshot.rejected_upstream_unavailable, 1);
        assert_eq!(snapshot.rejected_upstream, 0);
        assert_eq!(snapshot.filter_renders, 1);
    }
}
