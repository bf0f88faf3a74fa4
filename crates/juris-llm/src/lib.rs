//! juris-llm: multi-model, multi-credential fallback layer.
//! Routes a legal-analysis prompt across an ordered model list and an
//! ordered credential list until one provider returns a usable answer.
//!
//! Modules (leaves first):
//!   transport    - single outbound call with an enforced wall-clock timeout
//!   ledger       - per-credential usage counters shared across requests
//!   retry        - retry policy and the per-pair retry state machine
//!   orchestrator - model × credential × retry traversal
//!   reporter     - maps an outcome onto a caller-facing payload
//!   probe        - lightweight reachability check per credential

pub mod error;
pub mod wire;
pub mod model;
pub mod ledger;
pub mod transport;
pub mod retry;
pub mod orchestrator;
pub mod reporter;
pub mod probe;

pub use error::{AttemptFailure, FailureKind, FailureReport, OrchestrationError, TransportError};
pub use ledger::{Credential, CredentialLedger, CredentialSummary, UsageRecord};
pub use model::ModelDescriptor;
pub use orchestrator::{FallbackOrchestrator, Success};
pub use reporter::{ErrorCategory, Report};
pub use retry::RetryPolicy;
pub use transport::{HttpTransport, RawResponse, Transport};
