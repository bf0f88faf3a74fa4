//! Timed transport: one outbound call, one enforced deadline.
//!
//! HTTP-level failure is not a transport failure: any status with a readable
//! body comes back as a `RawResponse`. Only timeouts, connection-level
//! problems and malformed requests become `TransportError`s.

use std::error::Error as StdError;
use std::io;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::ledger::Credential;
use crate::wire::GenerateRequest;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `payload` to `endpoint` authenticated with `credential`,
    /// giving up after `timeout`.
    async fn send(
        &self,
        endpoint: &str,
        credential: &Credential,
        payload: &GenerateRequest,
        timeout: Duration,
    ) -> Result<RawResponse, TransportError>;
}

// ── reqwest implementation ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        endpoint: &str,
        credential: &Credential,
        payload: &GenerateRequest,
        timeout: Duration,
    ) -> Result<RawResponse, TransportError> {
        if timeout.is_zero() {
            return Err(TransportError::Request("timeout must be greater than zero".into()));
        }

        // The deadline covers both the response head and the full body.
        let call = async {
            let resp = self
                .client
                .post(endpoint)
                .query(&[("key", credential.expose_secret())])
                .json(payload)
                .send()
                .await?;
            let status = resp.status().as_u16();
            let body = resp.text().await?;
            Ok::<_, reqwest::Error>(RawResponse { status, body })
        };

        match tokio::time::timeout(timeout, call).await {
            Err(_elapsed) => Err(TransportError::Timeout { after: timeout }),
            Ok(Ok(raw)) => Ok(raw),
            // The URL carries the API key; never let it reach logs.
            Ok(Err(err)) => Err(classify_reqwest_error(err.without_url(), timeout)),
        }
    }
}

pub(crate) fn classify_reqwest_error(err: reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        return TransportError::Timeout { after: timeout };
    }
    if err.is_connect() || has_connection_io_error(&err) {
        return TransportError::Network(error_chain(&err));
    }
    TransportError::Request(error_chain(&err))
}

fn has_connection_io_error(err: &(dyn StdError + 'static)) -> bool {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            if matches!(
                io_err.kind(),
                io::ErrorKind::ConnectionRefused
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::NotConnected
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::UnexpectedEof
            ) {
                return true;
            }
        }
        source = cause.source();
    }
    false
}

fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
