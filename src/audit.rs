//! Audit gating and the default structured-log auditor. Audit calls are
//! fire-and-forget and always run after the table-set guard is released,
//! so logging latency never holds up concurrent decisions.

use serde::Serialize;
use tracing::{info, warn};

/// What the auditor wants to hear about. Deny and grant logging gate
/// independently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuditMode(u8);

impl AuditMode {
    pub const NONE: AuditMode = AuditMode(0);
    pub const DENY: AuditMode = AuditMode(1);
    pub const GRANT: AuditMode = AuditMode(2);
    pub const ALL: AuditMode = AuditMode(3);

    pub fn is_on(self) -> bool {
        self.0 != 0
    }

    pub fn logs_grant(self) -> bool {
        self.0 & Self::GRANT.0 != 0
    }

    pub fn logs_deny(self) -> bool {
        self.0 & Self::DENY.0 != 0
    }
}

/// Grant/deny notification sink. Return values are ignored and
/// implementations must not block the decision path.
pub trait Auditor: Send + Sync {
    fn mode(&self) -> AuditMode;

    fn grant(&self, op: &str, tident: &str, prot: &str, id: &str, host: &str, path: &str);

    fn deny(&self, op: &str, tident: &str, prot: &str, id: &str, host: &str, path: &str);
}

#[derive(Debug, Serialize)]
struct AuditRecord<'a> {
    op: &'a str,
    tident: &'a str,
    prot: &'a str,
    id: &'a str,
    host: &'a str,
    path: &'a str,
}

/// Default auditor: one structured line per event through `tracing`.
#[derive(Debug, Clone, Copy)]
pub struct LogAuditor {
    mode: AuditMode,
}

impl LogAuditor {
    pub fn new(mode: AuditMode) -> Self {
        Self { mode }
    }
}

impl Auditor for LogAuditor {
    fn mode(&self) -> AuditMode {
        self.mode
    }

    fn grant(&self, op: &str, tident: &str, prot: &str, id: &str, host: &str, path: &str) {
        let rec = AuditRecord { op, tident, prot, id, host, path };
        info!(
            target: "pathwarden::audit",
            "grant {}",
            serde_json::to_string(&rec).unwrap_or_default()
        );
    }

    fn deny(&self, op: &str, tident: &str, prot: &str, id: &str, host: &str, path: &str) {
        let rec = AuditRecord { op, tident, prot, id, host, path };
        warn!(
            target: "pathwarden::audit",
            "deny {}",
            serde_json::to_string(&rec).unwrap_or_default()
        );
    }
}

/// Disabled auditor; `mode()` reports off so the engine skips the audit
/// branch entirely.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAudit;

impl Auditor for NoAudit {
    fn mode(&self) -> AuditMode {
        AuditMode::NONE
    }
    fn grant(&self, _: &str, _: &str, _: &str, _: &str, _: &str, _: &str) {}
    fn deny(&self, _: &str, _: &str, _: &str, _: &str, _: &str, _: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_flags() {
        assert!(!AuditMode::NONE.is_on());
        assert!(AuditMode::DENY.is_on());
        assert!(AuditMode::DENY.logs_deny());
        assert!(!AuditMode::DENY.logs_grant());
        assert!(AuditMode::GRANT.logs_grant());
        assert!(!AuditMode::GRANT.logs_deny());
        assert!(AuditMode::ALL.logs_grant() && AuditMode::ALL.logs_deny());
    }

    #[test]
    fn no_audit_reports_off() {
        assert_eq!(NoAudit.mode(), AuditMode::NONE);
    }
}
