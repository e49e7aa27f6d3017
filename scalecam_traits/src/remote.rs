//! Network-side collaborators: upload transport, realtime database, auth.

use thiserror::Error;

/// Result of an HTTP exchange.
///
/// `code` follows the embedded HTTP client convention: a positive value is
/// the server's status code, zero or negative is a client-side transport
/// error (connection refused, timeout, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub code: i32,
    pub body: String,
}

impl HttpResponse {
    pub fn transport_error(code: i32) -> Self {
        Self {
            code,
            body: String::new(),
        }
    }
}

pub trait HttpTransport {
    fn post(&mut self, url: &str, content_type: &str, body: &[u8]) -> HttpResponse;
}

/// Error reported by the realtime database client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (code {code})")]
pub struct RemoteError {
    pub code: i32,
    pub message: String,
}

impl RemoteError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

pub trait RealtimeDb {
    fn set_f32(&mut self, path: &str, value: f32) -> Result<(), RemoteError>;

    /// Drive the client's background work; called once per loop tick.
    fn service(&mut self) {}
}

/// Token-based session owned by the cloud SDK.
pub trait AuthSession {
    fn is_initialized(&self) -> bool;
    fn is_ready(&self) -> bool;
    /// Advance the token exchange by one step.
    fn step(&mut self);
}
