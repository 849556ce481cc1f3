//! Spam gate: honeypot check followed by reCAPTCHA v3 scoring.

use std::sync::Arc;

use argus_common::constants::{SCORE_THRESHOLD, UNKNOWN_ERROR_CODE};
use argus_common::{LogCategory, Severity, SubmissionContext, Verdict};

use super::verifier::SiteVerifier;
use crate::audit::AuditLog;

/// Judges form submissions. Fails closed: any verification trouble rejects.
pub struct SpamGate {
    verifier: Arc<dyn SiteVerifier>,
    audit: Arc<dyn AuditLog>,
}

impl SpamGate {
    pub fn new(verifier: Arc<dyn SiteVerifier>, audit: Arc<dyn AuditLog>) -> Self {
        Self { verifier, audit }
    }

    /// Evaluate one submission.
    ///
    /// Checks run in a fixed order and the first rejection wins:
    /// honeypot, token presence, upstream verification, score threshold.
    /// Emits a debug entry on entry and exactly one outcome entry.
    pub async fn evaluate(&self, ctx: &SubmissionContext) -> Verdict {
        self.log(
            ctx,
            Severity::Debug,
            LogCategory::General,
            "Validation started: honeypot armed.",
        );

        let verdict = self.decide(ctx).await;

        self.log(ctx, verdict.severity(), verdict.log_category(), &verdict.log_message());

        verdict
    }

    async fn decide(&self, ctx: &SubmissionContext) -> Verdict {
        if !ctx.honeypot.is_empty() {
            return Verdict::RejectedHoneypot {
                value: ctx.honeypot.clone(),
            };
        }

        if ctx.token.trim().is_empty() {
            return Verdict::RejectedMissingToken;
        }

        let result = match self
            .verifier
            .verify(&ctx.secret, &ctx.token, &ctx.client_ip)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(ip = %ctx.client_ip, error = %e, "siteverify call failed");
                return Verdict::RejectedApiFailure {
                    error_codes: vec![UNKNOWN_ERROR_CODE.to_string()],
                    upstream_answered: false,
                };
            }
        };

        tracing::debug!(
            ip = %ctx.client_ip,
            success = result.success,
            score = ?result.score,
            action = ?result.action,
            hostname = ?result.hostname,
            issued_at = ?result.challenge_time(),
            "siteverify answered"
        );

        if !result.success {
            return Verdict::RejectedApiFailure {
                error_codes: result.error_codes_or_unknown(),
                upstream_answered: true,
            };
        }

        let score = result.score.unwrap_or(0.0);
        if score < SCORE_THRESHOLD {
            return Verdict::RejectedLowScore { score };
        }

        Verdict::Accepted { score }
    }

    fn log(&self, ctx: &SubmissionContext, severity: Severity, category: LogCategory, detail: &str) {
        let ip = if ctx.client_ip.is_empty() {
            "unknown"
        } else {
            ctx.client_ip.as_str()
        };

        self.audit.log(
            severity,
            &format!("reCAPTCHA | IP:{} | {}", ip, detail),
            category,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::testing::MemoryAuditLog;
    use crate::captcha::verifier::VerifyError;
    use crate::captcha::verifier::testing::StaticVerifier;
    use argus_common::{RejectionKind, VerificationResult};
    use std::time::Duration;

    fn build_gate(verifier: Arc<StaticVerifier>) -> (SpamGate, Arc<MemoryAuditLog>) {
        let audit = Arc::new(MemoryAuditLog::default());
        (SpamGate::new(verifier, audit.clone()), audit)
    }

    fn submission(honeypot: &str, token: &str) -> SubmissionContext {
        SubmissionContext::new(honeypot, token, "198.51.100.4", "secret")
    }

    #[test]
    fn test_honeypot_wins_over_everything() {
        let verifier = Arc::new(StaticVerifier::score(1.0));
        let (gate, audit) = build_gate(verifier.clone());

        for token in ["", "valid-token"] {
            let verdict = tokio_test::block_on(gate.evaluate(&submission("http://spam.example", token)));
            assert_eq!(
                verdict,
                Verdict::RejectedHoneypot {
                    value: "http://spam.example".into()
                }
            );
        }

        assert_eq!(verifier.calls(), 0);
        let (severity, message, category) = audit.entries().pop().unwrap();
        assert_eq!(severity, Severity::Warning);
        assert_eq!(category, LogCategory::Access);
        assert!(message.contains("IP:198.51.100.4"));
    }

    #[test]
    fn test_missing_token() {
        let verifier = Arc::new(StaticVerifier::score(1.0));
        let (gate, audit) = build_gate(verifier.clone());

        let verdict = tokio_test::block_on(gate.evaluate(&submission("", "")));

        assert_eq!(verdict, Verdict::RejectedMissingToken);
        assert_eq!(verdict.rejection_kind(), Some(RejectionKind::MissingCredential));
        assert_eq!(verifier.calls(), 0);
        assert_eq!(audit.entries().last().unwrap().0, Severity::Error);
    }

    #[tokio::test]
    async fn test_high_score_accepted() {
        let (gate, audit) = build_gate(Arc::new(StaticVerifier::score(0.9)));

        let verdict = gate.evaluate(&submission("", "tok")).await;

        assert_eq!(verdict, Verdict::Accepted { score: 0.9 });
        let entries = audit.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, Severity::Debug);
        assert_eq!(entries[1].0, Severity::Info);
    }

    #[tokio::test]
    async fn test_threshold_boundary() {
        let cases = [
            (0.5, false),
            (0.699999, false),
            (0.7, true),
            (0.71, true),
        ];

        for (score, accepted) in cases {
            let (gate, _) = build_gate(Arc::new(StaticVerifier::score(score)));
            let verdict = gate.evaluate(&submission("", "tok")).await;
            assert_eq!(verdict.is_accepted(), accepted, "score {score}");
            if !accepted {
                assert_eq!(verdict, Verdict::RejectedLowScore { score });
            }
        }
    }

    #[tokio::test]
    async fn test_missing_score_counts_as_zero() {
        let verifier = StaticVerifier::with(|| {
            Ok(VerificationResult {
                success: true,
                ..Default::default()
            })
        });
        let (gate, _) = build_gate(Arc::new(verifier));

        let verdict = gate.evaluate(&submission("", "tok")).await;
        assert_eq!(verdict, Verdict::RejectedLowScore { score: 0.0 });
    }

    #[tokio::test]
    async fn test_timeout_is_api_failure_with_unknown_code() {
        let verifier = StaticVerifier::with(|| Err(VerifyError::Timeout(Duration::from_secs(15))));
        let (gate, audit) = build_gate(Arc::new(verifier));

        let verdict = gate.evaluate(&submission("", "tok")).await;

        assert_eq!(
            verdict,
            Verdict::RejectedApiFailure {
                error_codes: vec!["unknown".into()],
                upstream_answered: false,
            }
        );
        let (severity, message, category) = audit.entries().pop().unwrap();
        assert_eq!(severity, Severity::Error);
        assert_eq!(category, LogCategory::Error);
        assert!(message.contains("unknown"));
    }

    #[tokio::test]
    async fn test_upstream_refusal_keeps_codes() {
        let verifier = StaticVerifier::with(|| {
            Ok(VerificationResult {
                success: false,
                error_codes: vec!["timeout-or-duplicate".into()],
                ..Default::default()
            })
        });
        let (gate, _) = build_gate(Arc::new(verifier));

        let verdict = gate.evaluate(&submission("", "tok")).await;

        assert_eq!(verdict.rejection_kind(), Some(RejectionKind::UpstreamRejected));
        assert_eq!(
            verdict,
            Verdict::RejectedApiFailure {
                error_codes: vec!["timeout-or-duplicate".into()],
                upstream_answered: true,
            }
        );
    }

    #[tokio::test]
    async fn test_empty_ip_logged_as_unknown() {
        let (gate, audit) = build_gate(Arc::new(StaticVerifier::score(0.9)));

        gate.evaluate(&SubmissionContext::new("", "tok", "", "secret")).await;

        assert!(audit.entries().iter().all(|(_, m, _)| m.contains("IP:unknown")));
    }
}
