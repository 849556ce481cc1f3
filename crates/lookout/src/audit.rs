//! Audit log sink.
//!
//! Components decide severity, category, and message; where the entry ends
//! up is the sink's business.

use argus_common::{LogCategory, Severity};

/// Fire-and-forget audit log
pub trait AuditLog: Send + Sync {
    fn log(&self, severity: Severity, message: &str, category: LogCategory);
}

/// Forwards audit entries into `tracing` under the `audit` target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditLog;

impl AuditLog for TracingAuditLog {
    fn log(&self, severity: Severity, message: &str, category: LogCategory) {
        match severity {
            Severity::Debug => tracing::debug!(target: "audit", category = %category, "{}", message),
            Severity::Info => tracing::info!(target: "audit", category = %category, "{}", message),
            Severity::Warning => tracing::warn!(target: "audit", category = %category, "{}", message),
            Severity::Error => tracing::error!(target: "audit", category = %category, "{}", message),
        }
    }
}
