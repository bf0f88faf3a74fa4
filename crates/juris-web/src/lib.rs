//! juris-web: HTTP host for the Juris legal-analysis router.
//! Provides:
//!   - POST /api/analyze  query → analysis via the fallback orchestrator
//!   - GET  /api/health   model list and per-credential reachability
//!   - GET  /api/quota    credential usage counters

pub mod router;
pub mod handlers;
pub mod state;
pub mod prompt;
pub mod error;
