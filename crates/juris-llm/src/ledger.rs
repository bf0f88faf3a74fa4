//! Credential ledger: per-credential usage bookkeeping.
//!
//! One `Credential` per configured secret, ordered by ascending priority.
//! Counters are shared by every concurrent orchestration run, so each
//! credential keeps its stats behind its own mutex. Nothing here blocks
//! across an await point.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CredentialStats {
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
    pub last_attempt: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct Credential {
    id: String,
    display_name: String,
    priority: u32,
    secret: SecretString,
    stats: Mutex<CredentialStats>,
}

impl Credential {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        priority: u32,
        secret: SecretString,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            priority,
            secret,
            stats: Mutex::new(CredentialStats::default()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    pub fn expose_secret(&self) -> &str {
        self.secret.expose_secret()
    }

    pub fn stats(&self) -> CredentialStats {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, CredentialStats> {
        // Counters stay meaningful even if a holder panicked mid-update.
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Read-only view of a credential for the quota endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct UsageRecord {
    pub id: String,
    pub name: String,
    pub priority: u32,
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
    pub success_rate: f64,
    pub last_attempt: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
}

/// Compact per-credential line carried by a failed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialSummary {
    pub name: String,
    pub successes: u64,
    pub attempts: u64,
}

impl std::fmt::Display for CredentialSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}/{}", self.name, self.successes, self.attempts)
    }
}

#[derive(Debug, Default)]
pub struct CredentialLedger {
    credentials: Vec<Arc<Credential>>,
}

impl CredentialLedger {
    /// Credentials are ordered by ascending priority; ties keep input order.
    pub fn new(mut credentials: Vec<Credential>) -> Self {
        credentials.sort_by_key(|c| c.priority);
        Self {
            credentials: credentials.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn credentials(&self) -> &[Arc<Credential>] {
        &self.credentials
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Credential>> {
        self.credentials.iter().find(|c| c.id == id)
    }

    /// Must run before the outbound call so in-flight attempts are visible.
    pub fn record_attempt(&self, credential: &Credential) {
        let mut stats = credential.lock();
        stats.attempts += 1;
        stats.last_attempt = Some(Utc::now());
    }

    pub fn record_success(&self, credential: &Credential) {
        let mut stats = credential.lock();
        stats.successes += 1;
        stats.last_success = Some(Utc::now());
    }

    pub fn record_failure(&self, credential: &Credential) {
        credential.lock().failures += 1;
    }

    pub fn snapshot(&self) -> Vec<UsageRecord> {
        self.credentials
            .iter()
            .map(|c| {
                let stats = c.stats();
                let success_rate = if stats.attempts == 0 {
                    0.0
                } else {
                    stats.successes as f64 / stats.attempts as f64
                };
                UsageRecord {
                    id: c.id.clone(),
                    name: c.display_name.clone(),
                    priority: c.priority,
                    attempts: stats.attempts,
                    successes: stats.successes,
                    failures: stats.failures,
                    success_rate,
                    last_attempt: stats.last_attempt,
                    last_success: stats.last_success,
                }
            })
            .collect()
    }

    pub fn summary(&self) -> Vec<CredentialSummary> {
        self.credentials
            .iter()
            .map(|c| {
                let stats = c.stats();
                CredentialSummary {
                    name: c.display_name.clone(),
                    successes: stats.successes,
                    attempts: stats.attempts,
                }
            })
            .collect()
    }
}
